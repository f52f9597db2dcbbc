//! HTTP server setup and lifecycle.
//!
//! Configures the axum server with:
//! - Measured entity handlers
//! - Unmeasured metrics and health endpoints
//! - Graceful shutdown bounded by a grace period

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;

use crate::config::Config;
use crate::http::{endpoint, measurable};
use crate::observability::metrics::HttpMetrics;
use crate::observability::prometheus;
use crate::service::{AddEntity, ListEntities};
use crate::storage::{EntityStore, SqliteStore, StoreError};

/// Error type for server startup and lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Metrics registration failed: {0}")]
    Metrics(#[from] ::prometheus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn EntityStore>,
    pub metrics: HttpMetrics,
}

impl AppContext {
    pub fn new(store: Arc<dyn EntityStore>, metrics: HttpMetrics) -> Self {
        Self { store, metrics }
    }
}

/// Build the route table.
///
/// Every entity handler is wrapped with [`measurable`] before registration.
/// A panicking handler is answered with 500 after its metrics are recorded.
pub fn build_router(ctx: &AppContext) -> Router {
    let list = measurable(&ctx.metrics, ListEntities::new(Arc::clone(&ctx.store)));
    let add = measurable(&ctx.metrics, AddEntity::new(Arc::clone(&ctx.store)));

    Router::new()
        .route("/entities", get(endpoint(list)))
        .route("/entity", post(endpoint(add)))
        .merge(prometheus::create_router(ctx.metrics.clone()))
        .layer(CatchPanicLayer::new())
}

/// Serve `router` on `listener` until a shutdown signal arrives.
///
/// After the signal no new connections are accepted. In-flight requests get
/// `grace` to finish; if they have not by then, this returns anyway and the
/// remaining connections are dropped with the runtime.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: watch::Receiver<bool>,
    grace: Duration,
) -> Result<(), ServerError> {
    let mut deadline_rx = shutdown_rx.clone();

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            // Wait for shutdown signal
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .into_future();

    let deadline = async move {
        let _ = deadline_rx.changed().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result?,
        () = deadline => {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "Grace period elapsed with requests still in flight"
            );
        }
    }

    Ok(())
}

/// Run the entity server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when the server has shut down.
pub async fn run_server(
    config: Config,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    // Open storage and apply DDL
    let store = SqliteStore::open(&config.database, config.pool_size)?;

    // Register metrics once for the process
    let metrics = HttpMetrics::new()?;

    let ctx = AppContext::new(Arc::new(store), metrics);
    let router = build_router(&ctx);

    let listener = TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(address = %listener.local_addr()?, "Starting entity server");

    serve(listener, router, shutdown_rx, config.shutdown_timeout()).await?;

    tracing::info!("Server stopped");
    Ok(())
}
