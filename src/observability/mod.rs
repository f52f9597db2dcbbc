//! Observability infrastructure.
//!
//! Provides:
//! - Structured logging setup
//! - Prometheus request metrics
//! - HTTP endpoints for Prometheus scraping and health probes

pub mod metrics;
pub mod prometheus;
pub mod tracing;
