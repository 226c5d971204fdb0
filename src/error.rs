//! Unified error types for cf-realip.
//!
//! Defines [`Error`] (the main crate error enum) and [`ValidationError`]
//! for config validation failures. Both use `thiserror` for `Display` and
//! `Error` derives. Error messages include contextual hints to guide the
//! user toward a fix.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub section: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {} - {}", self.section, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid trusted proxy CIDR at index {index}: '{value}' ({source})")]
    InvalidTrustedProxy {
        index: usize,
        value: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    #[error("No config file found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid upstream URL '{url}': {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_includes_suggestion() {
        let err = ValidationError {
            section: "trust".into(),
            field: "trusted_proxies[0]".into(),
            message: "'10.0.0.1' is not a valid CIDR".into(),
            suggestion: Some("did you mean '10.0.0.1/32'?".into()),
        };
        let text = err.to_string();
        assert!(text.contains("trusted_proxies[0]"));
        assert!(text.ends_with("(did you mean '10.0.0.1/32'?)"));
    }

    #[test]
    fn invalid_trusted_proxy_names_the_entry() {
        let source = "nope".parse::<ipnet::IpNet>().unwrap_err();
        let err = Error::InvalidTrustedProxy {
            index: 2,
            value: "nope".into(),
            source,
        };
        let text = err.to_string();
        assert!(text.contains("index 2"));
        assert!(text.contains("'nope'"));
    }
}
