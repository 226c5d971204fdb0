//! Serde data structures for the cf-realip configuration file.
//!
//! Contains [`Config`] (the root), [`TrustConfig`] (the trusted-proxy
//! settings consumed by the evaluator) and [`Upstream`]. All types derive
//! `Serialize` and `Deserialize` with `deny_unknown_fields` for strict
//! parsing.

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    5000
}

const fn default_true() -> bool {
    true
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_true(v: &bool) -> bool {
    *v
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub trust: TrustConfig,

    pub upstream: Upstream,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrustConfig {
    /// Extra CIDR ranges to trust, appended after the built-in ones.
    #[serde(default, alias = "trustedProxies", skip_serializing_if = "Vec::is_empty")]
    pub trusted_proxies: Vec<String>,

    /// Start from the built-in ranges.
    #[serde(
        default = "default_true",
        alias = "includeDefault",
        skip_serializing_if = "is_true"
    )]
    pub include_default: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trusted_proxies: Vec::new(),
            include_default: default_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Upstream {
    pub url: String,

    /// Per-request timeout in milliseconds.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,
}

impl Upstream {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: default_timeout(),
        }
    }
}
