//! Entity Metrics: a small entity service with per-route request metrics.
//!
//! Two endpoints read and write a SQLite table. Each is wrapped so every
//! request is counted, timed and classified by response status, and the
//! resulting series are served on `/metrics` for Prometheus to scrape.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`http`]: Response sinks, the handler trait and the measuring wrapper
//! - [`observability`]: Logging, metrics registry and scrape endpoint
//! - [`server`]: Route table and server lifecycle
//! - [`service`]: Entity handlers
//! - [`storage`]: SQLite persistence layer

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::sqlite::SqliteStore is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::cast_precision_loss         // Microsecond latencies fit in f64
)]

pub mod config;
pub mod http;
pub mod observability;
pub mod server;
pub mod service;
pub mod storage;
