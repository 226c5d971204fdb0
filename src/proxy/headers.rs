//! Header construction for the upstream request and response.
//!
//! [`build_upstream_headers`] clones the (already policy-rewritten) client
//! headers, strips hop-by-hop headers, rewrites `Host` for the upstream
//! and tags the request with `X-Correlation-Id`. Forwarding headers set by
//! the trust middleware pass through untouched.

use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Strip hop-by-hop headers and `content-length` from an upstream response.
///
/// The body has already been fully collected, so the origin's framing
/// headers no longer apply.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(hyper::header::CONTENT_LENGTH);
}

pub fn build_upstream_headers(
    original: &HeaderMap,
    upstream: &url::Url,
    correlation_id: &str,
) -> HeaderMap {
    let mut headers = original.clone();

    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }

    if let Some(host) = upstream.host_str() {
        let host_value = upstream
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert(hyper::header::HOST, val);
        }
    }

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert(X_CORRELATION_ID, val);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::headers::{X_FORWARDED_FOR, X_REAL_IP, X_TRUSTED_PROXY};

    fn upstream() -> url::Url {
        url::Url::parse("http://backend:9090/base").unwrap()
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let result = build_upstream_headers(&original, &upstream(), "test-id");

        assert!(result.get("connection").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn rewrites_host() {
        let mut original = HeaderMap::new();
        original.insert("host", "public.example.com".parse().unwrap());

        let result = build_upstream_headers(&original, &upstream(), "test-id");

        assert_eq!(result.get("host").unwrap(), "backend:9090");
    }

    #[test]
    fn keeps_trust_headers_verbatim() {
        let mut original = HeaderMap::new();
        original.insert(X_TRUSTED_PROXY, "173.245.48.1".parse().unwrap());
        original.insert(X_REAL_IP, "1.2.3.4".parse().unwrap());
        original.insert(X_FORWARDED_FOR, "1.2.3.4".parse().unwrap());

        let result = build_upstream_headers(&original, &upstream(), "test-id");

        assert_eq!(result.get(X_TRUSTED_PROXY).unwrap(), "173.245.48.1");
        assert_eq!(result.get(X_REAL_IP).unwrap(), "1.2.3.4");
        assert_eq!(result.get(X_FORWARDED_FOR).unwrap(), "1.2.3.4");
    }

    #[test]
    fn sets_correlation_id() {
        let result = build_upstream_headers(&HeaderMap::new(), &upstream(), "my-correlation-id");
        assert_eq!(result.get(X_CORRELATION_ID).unwrap(), "my-correlation-id");
    }

    #[test]
    fn response_loses_framing_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        headers.insert("content-length", "10".parse().unwrap());
        headers.insert("content-type", "text/plain".parse().unwrap());

        strip_response_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
    }
}
