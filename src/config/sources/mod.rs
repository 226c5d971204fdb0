//! File-based config loading.
//!
//! [`parse_config_str`] deserializes by file extension (YAML by default,
//! JSON and TOML behind features). [`load_file`] reads a file through
//! Tokio, validates it, and records a SHA-256 digest of the raw content
//! for `/health` reporting. [`resolve_path`] finds the config file when
//! none is given on the command line.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::model::Config;
use crate::config::validation::validate;
use crate::error::Error;

/// File names probed in the working directory, in order.
pub const CANDIDATES: &[&str] = &[
    "cf-realip.yaml",
    "cf-realip.yml",
    "cf-realip.json",
    "cf-realip.toml",
];

/// A validated config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    pub digest: String,
}

/// Parse a config string based on file extension.
pub fn parse_config_str(ext: &str, content: &str, path_display: &str) -> Result<Config, Error> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| Error::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[must_use]
pub fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Read, parse and validate a config file.
pub async fn load_file(path: &Path) -> Result<LoadedConfig, Error> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    let config = parse_config_str(extension(path), &content, &path.display().to_string())?;

    if let Err(errors) = validate(&config) {
        return Err(Error::ConfigValidation { errors });
    }

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        digest: sha256_hex(content.as_bytes()),
    })
}

/// Use the explicit path if given, otherwise the first candidate present in
/// the working directory.
pub async fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    for name in CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Ok(path);
        }
    }

    Err(Error::NoConfigSource {
        hint: "Provide --config <file>.\n  \
               Run 'cf-realip init' to create a config file."
            .into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let a = sha256_hex(b"upstream: {url: http://app}");
        assert_eq!(a.len(), 64);
        assert_eq!(a, sha256_hex(b"upstream: {url: http://app}"));
        assert_ne!(a, sha256_hex(b"upstream: {url: http://other}"));
    }

    #[test]
    fn extension_of_plain_name_is_empty() {
        assert_eq!(extension(Path::new("config")), "");
        assert_eq!(extension(Path::new("dir/cf-realip.yaml")), "yaml");
    }

    #[tokio::test]
    async fn missing_file_is_reported_by_path() {
        let err = load_file(Path::new("does/not/exist.yaml")).await.unwrap_err();
        assert!(matches!(err, Error::ConfigFileNotFound { .. }));
    }

    #[tokio::test]
    async fn explicit_path_wins() {
        let path = resolve_path(Some(Path::new("custom.yaml"))).await.unwrap();
        assert_eq!(path, PathBuf::from("custom.yaml"));
    }
}
