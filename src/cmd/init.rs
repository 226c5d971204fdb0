//! `cf-realip init`: generate a starter configuration file.
//!
//! Serializes a default [`Config`] pointing at the chosen upstream as YAML,
//! JSON, or TOML.

use std::path::{Path, PathBuf};

use crate::cli::{ConfigFormat, InitArgs};
use crate::config::validation::validate_upstream_url;
use crate::config::{Config, TrustConfig, Upstream};
use crate::error::{Error, ValidationError};

pub fn execute(args: &InitArgs) -> Result<(), Error> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("cf-realip.{}", args.format.extension())));

    if let Err(message) = validate_upstream_url(&args.upstream) {
        return Err(Error::ConfigValidation {
            errors: vec![ValidationError {
                section: "upstream".into(),
                field: "url".into(),
                message,
                suggestion: None,
            }],
        });
    }

    write_template(&output, &args.format, &args.upstream, args.force)?;
    println!("Created {}", output.display());
    Ok(())
}

/// Serialize a starter config for `upstream` in the chosen format.
///
/// YAML and TOML output carry a short comment header; JSON has no comment
/// syntax and is emitted bare.
pub fn render(format: &ConfigFormat, upstream: &str) -> Result<String, Error> {
    let config = Config {
        trust: TrustConfig::default(),
        upstream: Upstream::new(upstream),
    };

    match format {
        #[cfg(feature = "yaml")]
        ConfigFormat::Yaml => serde_yml::to_string(&config)
            .map(|body| format!("{YAML_HEADER}{body}"))
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "yaml"))]
        ConfigFormat::Yaml => Err(Error::UnsupportedFormat("yaml".into())),

        ConfigFormat::Json => serde_json::to_string_pretty(&config)
            .map(|body| body + "\n")
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string()))),

        #[cfg(feature = "toml")]
        ConfigFormat::Toml => toml::to_string_pretty(&config)
            .map(|body| format!("{TOML_HEADER}{body}"))
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "toml"))]
        ConfigFormat::Toml => Err(Error::UnsupportedFormat("toml".into())),
    }
}

fn write_template(
    output: &Path,
    format: &ConfigFormat,
    upstream: &str,
    force: bool,
) -> Result<(), Error> {
    if output.exists() && !force {
        return Err(Error::FileExists {
            path: output.to_path_buf(),
        });
    }
    std::fs::write(output, render(format, upstream)?)?;
    Ok(())
}

#[cfg(feature = "yaml")]
const YAML_HEADER: &str = "\
# cf-realip config
#
# Requests from trusted proxy ranges get X-Trusted-Proxy, and their
# CF-Connecting-IP header is copied into X-Real-IP and X-Forwarded-For.
#
# The built-in ranges (loopback, private networks and the Cloudflare edge)
# are trusted unless `trust.include_default: false` is set. Extra CIDRs go
# in `trust.trusted_proxies`; a malformed entry stops startup:
#
#   trust:
#     trusted_proxies: [\"203.0.113.0/24\", \"2001:db8::/32\"]
#
# `upstream.timeout` is in milliseconds and defaults to 5000.

";

#[cfg(feature = "toml")]
const TOML_HEADER: &str = "\
# cf-realip config
#
# Requests from trusted proxy ranges get X-Trusted-Proxy, and their
# CF-Connecting-IP header is copied into X-Real-IP and X-Forwarded-For.
#
# Extra CIDRs to trust, after the built-in ranges:
#   [trust]
#   trusted_proxies = [\"203.0.113.0/24\", \"2001:db8::/32\"]
#   include_default = true
#
# `upstream.timeout` is in milliseconds and defaults to 5000.

";
