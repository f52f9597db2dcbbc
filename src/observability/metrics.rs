//! Prometheus request metrics.
//!
//! Key metrics:
//! - metrics_request_total: Counter of requests per (handler, method)
//! - metrics_errors_total: Counter of responses with status >= 400 per
//!   (handler, method, status)
//! - metrics_duration_microseconds: Histogram of request latency per
//!   (handler, method, status)
//!
//! Every series is backed by atomics inside the `prometheus` crate, so
//! updates from concurrent requests never contend on a shared lock and
//! [`HttpMetrics::export`] can run alongside them.

use prometheus::{proto, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Prefix applied to every metric name.
pub const NAMESPACE: &str = "metrics";

pub const LABEL_HANDLER: &str = "handler";
pub const LABEL_METHOD: &str = "method";
pub const LABEL_STATUS: &str = "status";

/// Latency buckets in microseconds: 100us, 500us, 1ms, 5ms, 10ms, 50ms,
/// 100ms, 500ms, 1s.
pub const DURATION_BUCKETS_MICROS: [f64; 9] = [
    100.0, 500.0, 1_000.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 500_000.0, 1_000_000.0,
];

/// Error type for metrics export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

/// Request metrics registered against a single Prometheus registry.
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    errors_total: IntCounterVec,
    duration: HistogramVec,
}

impl HttpMetrics {
    /// Create the metrics and register them on a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Create the metrics and register them on `registry`.
    ///
    /// Fails if any of the metrics is already registered there.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new("request_total", "Total number of requests").namespace(NAMESPACE),
            &[LABEL_HANDLER, LABEL_METHOD],
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new("errors_total", "Total number of errors").namespace(NAMESPACE),
            &[LABEL_HANDLER, LABEL_METHOD, LABEL_STATUS],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "duration_microseconds",
                "Histogram of request duration in microseconds",
            )
            .namespace(NAMESPACE)
            .buckets(DURATION_BUCKETS_MICROS.to_vec()),
            &[LABEL_HANDLER, LABEL_METHOD, LABEL_STATUS],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
            duration,
        })
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count one request for (route, method).
    pub fn record_request(&self, route: &str, method: &str) {
        match self.requests_total.get_metric_with_label_values(&[route, method]) {
            Ok(counter) => counter.inc(),
            Err(e) => tracing::error!(error = %e, route, method, "Failed to record request"),
        }
    }

    /// Count one error response for (route, method, status).
    pub fn record_error(&self, route: &str, method: &str, status: &str) {
        match self
            .errors_total
            .get_metric_with_label_values(&[route, method, status])
        {
            Ok(counter) => counter.inc(),
            Err(e) => tracing::error!(error = %e, route, method, status, "Failed to record error"),
        }
    }

    /// Record the latency of one request in microseconds.
    pub fn observe_duration(&self, route: &str, method: &str, status: &str, micros: f64) {
        match self
            .duration
            .get_metric_with_label_values(&[route, method, status])
        {
            Ok(histogram) => histogram.observe(micros),
            Err(e) => tracing::error!(error = %e, route, method, status, "Failed to record duration"),
        }
    }

    /// Current request count for (route, method).
    ///
    /// Read helpers look series up in a registry snapshot and never create
    /// them, so calling one does not change what [`HttpMetrics::export`]
    /// returns.
    pub fn request_count(&self, route: &str, method: &str) -> u64 {
        self.find_series(
            "request_total",
            &[(LABEL_HANDLER, route), (LABEL_METHOD, method)],
        )
        .map(|m| m.get_counter().get_value() as u64)
        .unwrap_or(0)
    }

    /// Current error count for (route, method, status).
    pub fn error_count(&self, route: &str, method: &str, status: &str) -> u64 {
        self.find_series(
            "errors_total",
            &[
                (LABEL_HANDLER, route),
                (LABEL_METHOD, method),
                (LABEL_STATUS, status),
            ],
        )
        .map(|m| m.get_counter().get_value() as u64)
        .unwrap_or(0)
    }

    /// Number of duration observations for (route, method, status).
    pub fn duration_count(&self, route: &str, method: &str, status: &str) -> u64 {
        self.find_series(
            "duration_microseconds",
            &[
                (LABEL_HANDLER, route),
                (LABEL_METHOD, method),
                (LABEL_STATUS, status),
            ],
        )
        .map(|m| m.get_histogram().get_sample_count())
        .unwrap_or(0)
    }

    /// The gathered series of metric `name` whose labels equal `labels`.
    fn find_series(&self, name: &str, labels: &[(&str, &str)]) -> Option<proto::Metric> {
        let full_name = format!("{NAMESPACE}_{name}");
        self.registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == full_name)?
            .take_metric()
            .into_vec()
            .into_iter()
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == labels.len()
                    && labels.iter().all(|(key, value)| {
                        pairs
                            .iter()
                            .any(|pair| pair.get_name() == *key && pair.get_value() == *value)
                    })
            })
    }

    /// Encode every registered series in the Prometheus text format.
    pub fn export(&self) -> Result<String, ExportError> {
        let families = self.registry.gather();
        Ok(TextEncoder::new().encode_to_string(&families)?)
    }
}
