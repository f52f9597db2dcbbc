//! Configuration parsing for the entity service.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Entity service with per-route Prometheus request metrics.
#[derive(Parser, Debug, Clone)]
#[command(name = "entity-metrics")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "ENTITY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "ENTITY_PORT", default_value_t = 9090)]
    pub port: u16,

    /// Path to the SQLite database file
    #[arg(short, long, env = "ENTITY_DATABASE", default_value = "./data/entities.db")]
    pub database: PathBuf,

    /// Size of the database connection pool
    #[arg(long, env = "ENTITY_POOL_SIZE", default_value_t = 8)]
    pub pool_size: u32,

    /// Seconds to wait for in-flight requests after a shutdown signal
    #[arg(long, env = "ENTITY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "ENTITY_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Bind address as `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Graceful shutdown window.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Create a configuration for tests: loopback, random port, short grace.
    pub fn test_config(database: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            database,
            pool_size: 2,
            shutdown_timeout_secs: 1,
            log_level: "debug".into(),
            log_json: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9090,
            database: PathBuf::from("./data/entities.db"),
            pool_size: 8,
            shutdown_timeout_secs: 5,
            log_level: "info".into(),
            log_json: false,
        }
    }
}
