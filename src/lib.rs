//! cf-realip decides whether a connection comes from a trusted reverse
//! proxy and, if so, promotes the proxy's `CF-Connecting-IP` header into
//! `X-Real-IP` / `X-Forwarded-For`.
//!
//! The core is usable on its own as a tower layer in any axum app:
//!
//! ```no_run
//! use std::sync::Arc;
//! use cf_realip::middleware::TrustedProxyLayer;
//! use cf_realip::trust::TrustEvaluator;
//!
//! # fn main() -> Result<(), cf_realip::error::Error> {
//! let evaluator = Arc::new(TrustEvaluator::new(true, &["203.0.113.0/24"])?);
//! let app: axum::Router = axum::Router::new()
//!     .route("/", axum::routing::get(|| async { "ok" }))
//!     .layer(TrustedProxyLayer::new(evaluator));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`ranges`] -- Built-in trusted range tables and CIDR parsing.
//! - [`trust`] -- [`TrustEvaluator`](trust::TrustEvaluator) and the
//!   per-request [`Verdict`](trust::Verdict).
//! - [`middleware`] -- Header vocabulary, the rewrite policy, and the
//!   tower layer.
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Config model, file loading, and validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Forwarding of checked requests to the single upstream.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod ranges;
pub mod server;
pub mod trust;
