//! Header vocabulary and the verdict-to-headers rewrite policy.
//!
//! [`apply_verdict`] is the whole policy: reject invalid peers, stamp
//! trusted peers with `X-Trusted-Proxy` and promote `CF-Connecting-IP`
//! into `X-Real-IP` / `X-Forwarded-For`, leave everything else alone.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::trust::Verdict;

pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_TRUSTED_PROXY: HeaderName = HeaderName::from_static("x-trusted-proxy");
pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
pub const CF_VISITOR: HeaderName = HeaderName::from_static("cf-visitor");

/// What the caller should do with the request after the policy ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Forward,
    Reject,
}

pub fn apply_verdict(verdict: &Verdict, headers: &mut HeaderMap) -> Decision {
    if !verdict.address_valid() {
        return Decision::Reject;
    }
    if !verdict.is_trusted() {
        return Decision::Forward;
    }

    if let Some(peer) = verdict.peer_address() {
        if let Ok(val) = HeaderValue::from_str(&peer.to_string()) {
            headers.insert(X_TRUSTED_PROXY, val);
        }
    }

    let client_ip = headers
        .get(CF_CONNECTING_IP)
        .filter(|v| !v.is_empty())
        .cloned();
    if let Some(client_ip) = client_ip {
        headers.insert(X_REAL_IP, client_ip.clone());
        headers.insert(X_FORWARDED_FOR, client_ip);
    }

    Decision::Forward
}
