//! Test utilities and server harness for entity service tests.
//!
//! Provides:
//! - Router fixtures over in-memory or SQLite storage
//! - Request builders and body helpers
//! - A real TCP server with a shutdown handle

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use entity_metrics::observability::metrics::HttpMetrics;
use entity_metrics::observability::tracing::init_test_tracing;
use entity_metrics::server::{build_router, serve, AppContext, ServerError};
use entity_metrics::storage::{EntityStore, InMemoryStore, SqliteStore};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Router over an in-memory store with a fresh metrics registry.
pub struct MemoryApp {
    pub store: Arc<InMemoryStore>,
    pub metrics: HttpMetrics,
    pub router: Router,
}

impl MemoryApp {
    pub fn new(store: InMemoryStore) -> Self {
        init_test_tracing();
        let store = Arc::new(store);
        let metrics = HttpMetrics::new().expect("metrics registration failed");
        let ctx = AppContext::new(store.clone() as Arc<dyn EntityStore>, metrics.clone());
        let router = build_router(&ctx);
        Self {
            store,
            metrics,
            router,
        }
    }

    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Open a SQLite store in the fixture directory.
    pub fn store(&self) -> SqliteStore {
        SqliteStore::open(&self.db_path, 2).expect("failed to open store")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process server listening on a random loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Serve `router` with the given grace period.
    pub async fn start(router: Router, grace: Duration) -> Self {
        init_test_tracing();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("no local addr");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, router, shutdown_rx, grace));
        Self {
            addr,
            shutdown_tx,
            handle,
        }
    }

    /// Signal shutdown without waiting for the server to stop.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Signal shutdown and wait for the server task to return.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        self.signal_shutdown();
        self.join().await
    }

    /// Wait for the server task to return.
    pub async fn join(self) -> Result<(), ServerError> {
        // Keep the sender alive until the server has returned.
        let _shutdown_tx = self.shutdown_tx;
        self.handle.await.expect("server task panicked")
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not utf-8")
}

/// Issue a raw HTTP/1.1 request and return the full response text.
pub async fn raw_request(addr: SocketAddr, method: &str, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("failed to connect");
    let request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("failed to write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("failed to read response");
    response
}

/// Wait for a condition to become true with timeout.
///
/// Returns `true` if the condition was met, `false` if the timeout expired.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
