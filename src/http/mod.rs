//! Request handling primitives.
//!
//! Provides:
//! - [`ResponseSink`] and its real and status-capturing implementations
//! - The [`Handler`] trait and the bridge into axum
//! - The [`Measured`] wrapper that records per-request metrics

pub mod handler;
pub mod measurable;
pub mod sink;

pub use handler::{endpoint, Handler};
pub use measurable::{is_error_status, measurable, Measured};
pub use sink::{HttpResponseWriter, ResponseSink, SinkError, StatusCapture};
