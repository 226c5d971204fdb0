//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the trust
//! evaluator, upstream target, HTTP client, stats, and uptime),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, [`build_http_client`] for the connection-pooled hyper client,
//! and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::model::Upstream;
use crate::error::Error;
use crate::proxy;
use crate::health::health_handler;
use crate::middleware::TrustedProxyLayer;
use crate::trust::TrustEvaluator;

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

/// The single upstream every non-`/health` request is forwarded to.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub url: Url,
    pub timeout: Duration,
}

impl UpstreamTarget {
    pub fn from_config(upstream: &Upstream) -> Result<Self, Error> {
        let url = Url::parse(&upstream.url).map_err(|source| Error::InvalidUpstream {
            url: upstream.url.clone(),
            source,
        })?;
        Ok(Self {
            url,
            timeout: Duration::from_millis(upstream.timeout),
        })
    }
}

/// Where the running config came from, for `/health`.
#[derive(Debug, Clone)]
pub struct ConfigInfo {
    pub source: String,
    pub digest: String,
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub evaluator: Arc<TrustEvaluator>,
    pub upstream: UpstreamTarget,
    pub config_info: ConfigInfo,
    pub http_client: HttpClient,
    pub start_time: Instant,
    pub stats: Stats,
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Pin `ring` explicitly; rustls cannot pick a provider when several are
    // compiled in.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// Layers apply outermost first: tracing, body limit, then the trust
/// policy, so `/health` is classified like any other request.
pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    let trust = TrustedProxyLayer::new(Arc::clone(&state.evaluator));

    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy::forward_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body))
                .layer(trust),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
