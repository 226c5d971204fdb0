//! `cf-realip run`: start the header-rewriting proxy.
//!
//! Loads and validates the config, resolves the trusted range list once,
//! and serves the Axum router with graceful shutdown. A malformed trusted
//! proxy entry stops startup before the listener is bound.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::RunArgs;
use crate::config::sources;
use crate::error::Error;
use crate::logging;
use crate::server::{self, AppState, ConfigInfo, Stats, UpstreamTarget};
use crate::trust::TrustEvaluator;

pub async fn execute(args: RunArgs) -> Result<(), Error> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(args.log_level, log_format);

    let path = sources::resolve_path(args.config.as_deref()).await?;
    let loaded = sources::load_file(&path).await?;

    let evaluator = Arc::new(TrustEvaluator::from_config(&loaded.config.trust)?);
    let upstream = UpstreamTarget::from_config(&loaded.config.upstream)?;

    let state = Arc::new(AppState {
        evaluator: Arc::clone(&evaluator),
        upstream,
        config_info: ConfigInfo {
            source: loaded.path.display().to_string(),
            digest: loaded.digest,
        },
        http_client: server::build_http_client(),
        start_time: Instant::now(),
        stats: Stats::new(),
    });

    let upstream_url = state.upstream.url.to_string();
    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        upstream = %upstream_url,
        ranges = evaluator.ranges().len(),
        include_default = loaded.config.trust.include_default,
        "cf-realip started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("cf-realip stopped");
    Ok(())
}
