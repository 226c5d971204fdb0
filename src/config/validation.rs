//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for malformed
//! trusted-proxy CIDRs, an unusable upstream URL and a zero timeout.
//! Unlike [`parse_ranges`](crate::ranges::parse_ranges), which stops at
//! the first bad entry, it reports every problem at once, with per-field
//! suggestions.

use std::fmt::Write;
use std::net::IpAddr;

use ipnet::IpNet;
use url::Url;

use super::model::Config;
use crate::error::{Error, ValidationError};
use crate::ranges;

/// Validate a single CIDR entry. Returns `Ok(())` or a human-readable error
/// plus an optional suggestion.
pub fn validate_cidr(cidr: &str) -> Result<(), (String, Option<String>)> {
    let trimmed = cidr.trim();
    if trimmed.is_empty() {
        return Err(("CIDR cannot be empty".into(), None));
    }
    if trimmed.parse::<IpNet>().is_ok() {
        return Ok(());
    }

    // A bare address is the most common mistake
    let suggestion = trimmed.parse::<IpAddr>().ok().map(|ip| {
        let prefix = if ip.is_ipv4() { 32 } else { 128 };
        format!("did you mean '{ip}/{prefix}'?")
    });
    Err((format!("'{trimmed}' is not a valid CIDR"), suggestion))
}

/// Validate the upstream URL. Returns `Ok(())` or a human-readable error.
pub fn validate_upstream_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().is_none() {
                Err(format!("'{url}' has no host"))
            } else if parsed.query().is_some() || parsed.fragment().is_some() {
                Err(format!(
                    "'{url}' must not carry a query string or fragment; request paths are appended to it"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (i, cidr) in config.trust.trusted_proxies.iter().enumerate() {
        if let Err((message, suggestion)) = validate_cidr(cidr) {
            errors.push(ValidationError {
                section: "trust".into(),
                field: format!("trusted_proxies[{i}]"),
                message,
                suggestion,
            });
        }
    }

    if let Err(message) = validate_upstream_url(&config.upstream.url) {
        let suggestion = if config.upstream.url.contains("://") {
            None
        } else {
            Some(format!("did you mean 'http://{}'?", config.upstream.url))
        };
        errors.push(ValidationError {
            section: "upstream".into(),
            field: "url".into(),
            message,
            suggestion,
        });
    }

    if config.upstream.timeout == 0 {
        errors.push(ValidationError {
            section: "upstream".into(),
            field: "timeout".into(),
            message: "timeout must be greater than zero".into(),
            suggestion: Some("omit it to use the 5000 ms default".into()),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Count the ranges a config resolves to, as `(ipv4, ipv6)`.
///
/// Fails with the first malformed trusted proxy, like evaluator
/// construction does.
pub fn range_counts(config: &Config) -> Result<(usize, usize), Error> {
    let defaults = if config.trust.include_default {
        ranges::default_ranges()
    } else {
        ranges::RangeSet::empty()
    };
    let operator = ranges::parse_ranges(config.trust.trusted_proxies.as_slice())?;
    let all = defaults.chain(operator);
    Ok((all.ipv4_count(), all.ipv6_count()))
}

/// Format a human-readable validation summary.
pub fn format_validation_report(path: &str, config: &Config) -> Result<String, Error> {
    let (ipv4, ipv6) = range_counts(config)?;
    let mut out = format!(
        "{path} is valid\n  upstream: {} (timeout {} ms)\n  trusted ranges: {} ({ipv4} IPv4, {ipv6} IPv6)",
        config.upstream.url,
        config.upstream.timeout,
        ipv4 + ipv6,
    );
    if config.trust.include_default {
        out.push_str("\n  built-in ranges: included");
    } else {
        out.push_str("\n  built-in ranges: excluded");
    }
    for cidr in &config.trust.trusted_proxies {
        // write! to String is infallible
        let _ = write!(out, "\n    + {}", cidr.trim());
    }
    if ipv4 + ipv6 == 0 {
        out.push_str("\n  warning: no ranges are trusted, headers will never be rewritten");
    }
    Ok(out)
}
