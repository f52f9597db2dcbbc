//! Entity Metrics server.
//!
//! # Usage
//!
//! ```bash
//! entity-metrics --port 9090 --database ./data/entities.db --log-level info
//! ```
//!
//! Environment variables can also be used:
//! - `ENTITY_PORT`: Port to listen on
//! - `ENTITY_DATABASE`: SQLite database file
//! - `ENTITY_SHUTDOWN_TIMEOUT_SECS`: Grace period for in-flight requests
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use entity_metrics::config::Config;
use entity_metrics::observability::tracing::init_tracing;
use entity_metrics::server::run_server;
use std::fs;
use tokio::sync::watch;

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, using Ctrl+C only");
                let _ = ctrl_c.await;
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Initialize tracing/logging
    init_tracing(&config.log_level, config.log_json);

    // Ensure the database directory exists
    if let Some(parent) = config.database.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.listen_addr(),
        database = %config.database.display(),
        shutdown_timeout_secs = config.shutdown_timeout_secs,
        "Entity Metrics starting"
    );

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // Run the server
    run_server(config, shutdown_rx)
        .await
        .context("server failed")?;

    tracing::info!("Entity Metrics shutdown complete");
    Ok(())
}
