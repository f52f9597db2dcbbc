//! Request measurement wrapper.
//!
//! [`Measured`] wraps any [`Handler`] and, around each call, records:
//! - one request count per (route, method)
//! - one latency observation per (route, method, status)
//! - one error count per (route, method, status) when `status / 100 > 3`
//!
//! The wrapped handler's response is never altered. If it panics, the
//! measurement is still recorded before the panic continues unwinding.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use futures::FutureExt;

use super::handler::Handler;
use super::sink::{ResponseSink, StatusCapture};
use crate::observability::metrics::HttpMetrics;

/// Whether `status` counts as an error. 3xx redirects do not.
pub fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() / 100 > 3
}

/// Route label for a request.
///
/// Uses the matched route template when the router recorded one, so path
/// parameters do not leak into label values.
pub fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned())
}

/// Handler decorator that records request metrics.
pub struct Measured<H> {
    inner: H,
    metrics: HttpMetrics,
}

impl<H: Handler> Measured<H> {
    pub fn new(inner: H, metrics: HttpMetrics) -> Self {
        Self { inner, metrics }
    }
}

/// Wrap `handler` so every call is measured against `metrics`.
pub fn measurable<H: Handler>(metrics: &HttpMetrics, handler: H) -> Measured<H> {
    Measured::new(handler, metrics.clone())
}

#[async_trait]
impl<H: Handler> Handler for Measured<H> {
    async fn serve(&self, sink: &mut dyn ResponseSink, request: Request) {
        let start = Instant::now();
        let route = route_label(&request);
        let method = request.method().as_str().to_owned();
        let uri = request.uri().clone();

        self.metrics.record_request(&route, &method);

        let mut capture = StatusCapture::new(sink);
        let outcome = AssertUnwindSafe(self.inner.serve(&mut capture, request))
            .catch_unwind()
            .await;

        // A panic before anything was committed reaches the client as 500.
        let status = if outcome.is_err() && !capture.is_committed() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            capture.captured_status()
        };
        if is_error_status(status) {
            self.metrics.record_error(&route, &method, status.as_str());
        }

        let elapsed_us = start.elapsed().as_micros() as f64;
        self.metrics
            .observe_duration(&route, &method, status.as_str(), elapsed_us);

        tracing::info!(
            path = %uri,
            method = %method,
            status = status.as_u16(),
            elapsed_us,
            "Request handled"
        );

        if let Err(panic) = outcome {
            tracing::error!(path = %uri, method = %method, "Handler panicked");
            std::panic::resume_unwind(panic);
        }
    }
}
