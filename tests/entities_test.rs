//! End-to-end tests of the measured entity routes.
//!
//! Tests:
//! - Insert reaches storage once and is counted without errors
//! - List returns a JSON array of string fields
//! - A failing list is a 500, counted as an error, and still timed
//! - Every request is counted exactly once whatever its outcome
//! - Scraping twice with no traffic in between is byte-identical

mod common;

use axum::http::{header, StatusCode};
use common::{body_string, get, post_form, MemoryApp, TestFixture};
use entity_metrics::observability::metrics::HttpMetrics;
use entity_metrics::server::{build_router, AppContext};
use entity_metrics::storage::{Entity, EntityStore, InMemoryStore};
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_insert_is_stored_and_counted() {
    let app = MemoryApp::new(InMemoryStore::new());
    let before = app.metrics.request_count("/entity", "POST");

    let response = app.send(post_form("/entity", "id=1&data=alpha")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.insert_calls(), 1);
    assert_eq!(app.store.select_all().unwrap(), vec![Entity::new("1", "alpha")]);

    assert_eq!(app.metrics.request_count("/entity", "POST"), before + 1);
    assert_eq!(app.metrics.duration_count("/entity", "POST", "200"), 1);
    assert_eq!(app.metrics.error_count("/entity", "POST", "200"), 0);
    assert_eq!(app.metrics.error_count("/entity", "POST", "500"), 0);
}

#[tokio::test]
async fn test_list_returns_json_rows() {
    let app = MemoryApp::new(InMemoryStore::with_rows([(1, "a"), (2, "b")]));

    let response = app.send(get("/entities")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = body_string(response).await;
    assert_eq!(body, r#"[{"id":"1","data":"a"},{"id":"2","data":"b"}]"#);

    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["id"].is_string() && row["data"].is_string()));
}

#[tokio::test]
async fn test_failed_list_is_counted_as_error() {
    let store = InMemoryStore::with_rows([(1, "a")]);
    store.set_failing(true);
    let app = MemoryApp::new(store);
    let before = app.metrics.error_count("/entities", "GET", "500");

    let response = app.send(get("/entities")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.metrics.error_count("/entities", "GET", "500"), before + 1);
    assert_eq!(app.metrics.duration_count("/entities", "GET", "500"), 1);
    assert_eq!(app.metrics.request_count("/entities", "GET"), 1);
}

#[tokio::test]
async fn test_failed_insert_is_counted_as_error() {
    let app = MemoryApp::new(InMemoryStore::with_rows([(1, "a")]));

    // Duplicate primary key.
    let response = app.send(post_form("/entity", "id=1&data=again")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.metrics.error_count("/entity", "POST", "500"), 1);
}

#[tokio::test]
async fn test_malformed_form_is_client_error() {
    let app = MemoryApp::new(InMemoryStore::new());

    let response = app.send(post_form("/entity", "data=missing-id")).await;
    let status = response.status();

    assert!(status.is_client_error(), "unexpected status {status}");
    assert_eq!(app.store.insert_calls(), 0);
    assert_eq!(app.metrics.error_count("/entity", "POST", status.as_str()), 1);
}

#[tokio::test]
async fn test_every_request_counted_once() {
    let store = InMemoryStore::new();
    let app = MemoryApp::new(store);

    app.send(get("/entities")).await;
    app.send(post_form("/entity", "id=1&data=a")).await;
    app.store.set_failing(true);
    app.send(get("/entities")).await;
    app.send(post_form("/entity", "id=2&data=b")).await;

    assert_eq!(app.metrics.request_count("/entities", "GET"), 2);
    assert_eq!(app.metrics.request_count("/entity", "POST"), 2);
    assert_eq!(app.metrics.duration_count("/entities", "GET", "200"), 1);
    assert_eq!(app.metrics.duration_count("/entities", "GET", "500"), 1);
    assert_eq!(app.metrics.error_count("/entities", "GET", "500"), 1);
}

#[tokio::test]
async fn test_metrics_route_is_not_measured() {
    let app = MemoryApp::new(InMemoryStore::new());

    let response = app.send(get("/metrics")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.metrics.request_count("/metrics", "GET"), 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_measured() {
    let app = MemoryApp::new(InMemoryStore::new());

    let response = app.send(get("/nope")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.metrics.request_count("/nope", "GET"), 0);
}

#[tokio::test]
async fn test_scrape_is_idempotent() {
    let app = MemoryApp::new(InMemoryStore::with_rows([(1, "a")]));
    app.send(get("/entities")).await;
    app.send(post_form("/entity", "id=1&data=dup")).await;

    let first = body_string(app.send(get("/metrics")).await).await;
    let second = body_string(app.send(get("/metrics")).await).await;

    assert_eq!(first, second);
    assert!(first.contains(r#"metrics_request_total{handler="/entities",method="GET"} 1"#));
    assert!(first.contains(r#"metrics_errors_total{handler="/entity",method="POST",status="500"} 1"#));
}

#[tokio::test]
async fn test_sqlite_round_trip_through_router() {
    let fixture = TestFixture::new();
    let store: Arc<dyn EntityStore> = Arc::new(fixture.store());
    let metrics = HttpMetrics::new().unwrap();
    let router = build_router(&AppContext::new(store, metrics.clone()));

    let response = router
        .clone()
        .oneshot(post_form("/entity", "id=42&data=answer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Non-numeric ids are rejected by the table.
    let response = router
        .clone()
        .oneshot(post_form("/entity", "id=abc&data=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = router.oneshot(get("/entities")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        r#"[{"id":"42","data":"answer"}]"#
    );

    assert_eq!(metrics.request_count("/entity", "POST"), 2);
    assert_eq!(metrics.error_count("/entity", "POST", "500"), 1);
}
