//! `cf-realip health`: query `/health` on a running instance.

use std::fmt::Write;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::cli::HealthArgs;
use crate::error::Error;
use crate::health::HealthResponse;
use crate::server;

pub async fn execute(args: HealthArgs) -> Result<(), Error> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let timeout = Duration::from_secs(args.timeout);

    let body = tokio::time::timeout(timeout, fetch(&url))
        .await
        .map_err(|_| Error::HttpRequest {
            source: format!("no answer from {url} within {}s", timeout.as_secs()).into(),
        })??;

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    let health: HealthResponse = serde_json::from_slice(&body).map_err(|e| Error::HttpRequest {
        source: Box::new(e),
    })?;
    println!("{}", summary(&args.url, &health));
    Ok(())
}

async fn fetch(url: &str) -> Result<Bytes, Error> {
    let request = http::Request::get(url)
        .body(Full::new(Bytes::new()))
        .map_err(|e| Error::HttpRequest {
            source: Box::new(e),
        })?;

    let response = server::build_http_client()
        .request(request)
        .await
        .map_err(|e| Error::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HealthCheckFailed(status));
    }

    let collected = response
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::HttpRequest {
            source: Box::new(e),
        })?;
    Ok(collected.to_bytes())
}

fn summary(url: &str, health: &HealthResponse) -> String {
    let mut out = format!(
        "\u{2713} cf-realip {} ({}) at {url} is {}",
        health.version, health.build, health.status
    );
    // write! to String is infallible
    let _ = write!(
        out,
        "\n  up {}\n  config {} (digest {})\n  upstream {}\n  trusting {} ranges ({} IPv4, {} IPv6)\n  {} forwarded, {} failed",
        format_uptime(health.uptime_seconds),
        health.config.source,
        health.config.digest,
        health.config.upstream,
        health.trust.ranges,
        health.trust.ipv4,
        health.trust.ipv6,
        health.stats.requests_forwarded,
        health.stats.requests_failed,
    );
    out
}

fn format_uptime(seconds: u64) -> String {
    let (hours, minutes, secs) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    match (hours, minutes) {
        (0, 0) => format!("{secs}s"),
        (0, _) => format!("{minutes}m {secs:02}s"),
        _ => format!("{hours}h {minutes:02}m {secs:02}s"),
    }
}
