//! `cf-realip validate`: check a configuration file for errors.
//!
//! Parses and validates the config file, reporting every problem in
//! either human-readable text or machine-readable JSON format.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::sources::{extension, parse_config_str};
use crate::config::validation;
use crate::error::Error;

pub fn execute(args: &ValidateArgs) -> Result<(), Error> {
    let path = &args.config;

    if !path.exists() {
        return Err(Error::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_config_str(extension(path), &content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => {
                let json_errors: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "section": e.section,
                            "field": e.field,
                            "message": e.message,
                            "suggestion": e.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "errors": json_errors,
                    })
                );
            }
        }
        return Err(Error::ConfigValidation { errors });
    }

    match args.format {
        ValidateFormat::Text => {
            let report =
                validation::format_validation_report(&path.display().to_string(), &config)?;
            println!("\u{2713} {report}");
        }
        ValidateFormat::Json => {
            let (ipv4, ipv6) = validation::range_counts(&config)?;
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "upstream": config.upstream.url,
                    "include_default": config.trust.include_default,
                    "ranges": { "ipv4": ipv4, "ipv6": ipv6 },
                })
            );
        }
    }

    Ok(())
}
