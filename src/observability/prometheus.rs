//! Prometheus HTTP endpoint for metrics scraping.
//!
//! Provides:
//! - `/metrics` - Prometheus metrics endpoint
//! - `/health` - Basic health check
//! - `/ready` - Readiness check
//!
//! These routes are not measured themselves.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};

use super::metrics::HttpMetrics;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Create the observability router.
pub fn create_router(metrics: HttpMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(metrics)
}

/// Handle GET /metrics - Prometheus metrics endpoint.
async fn metrics_handler(State(metrics): State<HttpMetrics>) -> impl IntoResponse {
    match metrics.export() {
        Ok(text) => (
            StatusCode::OK,
            [("content-type", EXPOSITION_CONTENT_TYPE)],
            text,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                e.to_string(),
            )
        }
    }
}

/// Handle GET /health - Basic health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Handle GET /ready - Readiness check.
async fn ready_handler() -> impl IntoResponse {
    (StatusCode::OK, "READY")
}
