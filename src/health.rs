//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the server
//! version, uptime, config source metadata, the size of the trusted range
//! list, and cumulative request statistics.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub build: String,
    pub uptime_seconds: u64,
    pub config: ConfigHealth,
    pub trust: TrustHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigHealth {
    pub source: String,
    pub digest: String,
    pub upstream: String,
}

#[derive(Serialize, Deserialize)]
pub struct TrustHealth {
    pub ranges: usize,
    pub ipv4: usize,
    pub ipv6: usize,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ranges = state.evaluator.ranges();
    let digest = &state.config_info.digest;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: env!("CF_REALIP_GIT_SHORT").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        config: ConfigHealth {
            source: state.config_info.source.clone(),
            digest: digest.get(..8).unwrap_or(digest).to_string(),
            upstream: state.upstream.url.to_string(),
        },
        trust: TrustHealth {
            ranges: ranges.len(),
            ipv4: ranges.ipv4_count(),
            ipv6: ranges.ipv6_count(),
        },
        stats: StatsResponse {
            requests_forwarded: state.stats.forwarded.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
        },
    })
}
