//! Forwarding of policy-checked requests to the upstream.
//!
//! [`forward_handler`] is the Axum fallback: by the time it runs the trust
//! middleware has already classified the peer and rewritten headers. It
//! builds the upstream URL, sends the request through the shared hyper
//! client with the configured timeout, and relays the response.

pub mod headers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, Full};

use crate::error::Error;
use crate::server::{AppState, HttpClient};
use headers::X_CORRELATION_ID;

/// Append the request's path to the upstream base path and take the
/// request's query. Anything in the base after its path is replaced.
#[must_use]
pub fn upstream_url(base: &url::Url, uri: &Uri) -> String {
    let mut target = base.clone();
    let path = format!("{}{}", base.path().trim_end_matches('/'), uri.path());
    target.set_path(&path);
    target.set_query(uri.query());
    target.set_fragment(None);
    target.into()
}

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = req_headers
        .get(X_CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let target = upstream_url(&state.upstream.url, &uri);
    let upstream_headers =
        headers::build_upstream_headers(&req_headers, &state.upstream.url, &correlation_id);

    tracing::info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %uri.path(),
        "forwarding request"
    );

    let start = Instant::now();
    let result = tokio::time::timeout(
        state.upstream.timeout,
        send(&state.http_client, method, &target, &upstream_headers, body),
    )
    .await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (status, mut resp_headers, resp_body) = match result {
        Ok(Ok(parts)) => parts,
        Ok(Err(e)) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                target = %target,
                error = %e,
                latency_ms,
                "upstream request failed"
            );
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            return StatusCode::BAD_GATEWAY.into_response();
        }
        Err(_) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                target = %target,
                latency_ms,
                "upstream request timed out"
            );
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            return StatusCode::GATEWAY_TIMEOUT.into_response();
        }
    };

    tracing::info!(
        correlation_id = %correlation_id,
        status = status.as_u16(),
        latency_ms,
        "upstream responded"
    );
    state.stats.forwarded.fetch_add(1, Ordering::Relaxed);

    headers::strip_response_hop_by_hop(&mut resp_headers);
    let mut builder = Response::builder().status(status);
    for (key, value) in &resp_headers {
        builder = builder.header(key, value);
    }
    builder
        .header(X_CORRELATION_ID, &correlation_id)
        .body(axum::body::Body::from(resp_body))
        .unwrap_or_else(|e| {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "failed to build response"
            );
            StatusCode::BAD_GATEWAY.into_response()
        })
}

async fn send(
    client: &HttpClient,
    method: Method,
    target: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, HeaderMap, Bytes), Error> {
    let mut builder = hyper::Request::builder().method(method).uri(target);
    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    let request = builder.body(Full::new(body)).map_err(|e| Error::HttpRequest {
        source: Box::new(e),
    })?;

    let response = client.request(request).await.map_err(|e| Error::HttpRequest {
        source: Box::new(e),
    })?;

    let status = response.status();
    let headers = response.headers().clone();
    let collected = response
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::HttpRequest {
            source: Box::new(e),
        })?;

    Ok((status, headers, collected.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> url::Url {
        url::Url::parse(s).unwrap()
    }

    #[test]
    fn joins_path_and_query() {
        let uri: Uri = "/orders/42?expand=items".parse().unwrap();
        assert_eq!(
            upstream_url(&base("http://app:8080"), &uri),
            "http://app:8080/orders/42?expand=items"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let uri: Uri = "/v1/ping".parse().unwrap();
        assert_eq!(
            upstream_url(&base("http://app:8080/api/"), &uri),
            "http://app:8080/api/v1/ping"
        );
    }

    #[test]
    fn base_query_does_not_swallow_the_request_path() {
        let uri: Uri = "/orders/42?x=1".parse().unwrap();
        assert_eq!(
            upstream_url(&base("http://app:8080/api?tenant=a#frag"), &uri),
            "http://app:8080/api/orders/42?x=1"
        );

        let uri: Uri = "/orders/42".parse().unwrap();
        let target = upstream_url(&base("http://app:8080/api?tenant=a"), &uri);
        assert_eq!(target, "http://app:8080/api/orders/42");
    }

    #[test]
    fn root_request() {
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(upstream_url(&base("https://app"), &uri), "https://app/");
    }
}
