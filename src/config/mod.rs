//! Configuration model, loading, and validation.
//!
//! The config is read once at startup; trusted ranges are never reloaded
//! while the server is running. Submodules provide the data model
//! ([`model`]), file loading ([`sources`]) and validation
//! ([`validation`]).

pub mod model;
pub mod sources;
pub mod validation;

pub use model::{Config, TrustConfig, Upstream};
pub use sources::LoadedConfig;
