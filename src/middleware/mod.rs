//! Tower middleware that applies the trusted-proxy header policy.
//!
//! [`TrustedProxyLayer`] wraps any axum-compatible service. For each
//! request it reads the peer address from the `ConnectInfo<SocketAddr>`
//! extension, asks the shared [`TrustEvaluator`] for a verdict, rewrites
//! headers through [`headers::apply_verdict`], and either answers
//! `500 Invalid remote address` or calls the inner service once.
//!
//! The router must be served with
//! `into_make_service_with_connect_info::<SocketAddr>()`; without that
//! extension every request is treated as coming from an invalid peer.

pub mod headers;

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::trust::{TrustEvaluator, Verdict};
use headers::Decision;

#[derive(Debug, Clone)]
pub struct TrustedProxyLayer {
    evaluator: Arc<TrustEvaluator>,
}

impl TrustedProxyLayer {
    #[must_use]
    pub const fn new(evaluator: Arc<TrustEvaluator>) -> Self {
        Self { evaluator }
    }
}

impl<S> Layer<S> for TrustedProxyLayer {
    type Service = TrustedProxy<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TrustedProxy {
            inner,
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrustedProxy<S> {
    inner: S,
    evaluator: Arc<TrustEvaluator>,
}

impl<S> TrustedProxy<S> {
    fn verdict_for<B>(&self, req: &Request<B>) -> Verdict {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(Verdict::invalid, |ConnectInfo(addr)| {
                self.evaluator.evaluate_ip(addr.ip())
            })
    }
}

impl<S, B> Service<Request<B>> for TrustedProxy<S>
where
    S: Service<Request<B>, Response = Response>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let verdict = self.verdict_for(&req);

        match headers::apply_verdict(&verdict, req.headers_mut()) {
            Decision::Reject => {
                tracing::warn!(uri = %req.uri(), "rejecting request with invalid remote address");
                Box::pin(async {
                    Ok((StatusCode::INTERNAL_SERVER_ERROR, "Invalid remote address").into_response())
                })
            }
            Decision::Forward => {
                tracing::debug!(
                    peer = ?verdict.peer_address(),
                    trusted = verdict.is_trusted(),
                    "peer classified"
                );
                Box::pin(self.inner.call(req))
            }
        }
    }
}
