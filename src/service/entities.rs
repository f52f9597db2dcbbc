//! Entity endpoints.
//!
//! - `GET /entities`: list all rows as a JSON array
//! - `POST /entity`: insert one row from a form-encoded body

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Form, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

use super::run_blocking;
use crate::http::{Handler, ResponseSink};
use crate::storage::EntityStore;

/// One element of the list response.
#[derive(Debug, Serialize)]
pub struct ListEntityItem<'a> {
    pub id: &'a str,
    pub data: &'a str,
}

/// Form fields accepted by the insert endpoint.
#[derive(Debug, Deserialize)]
pub struct AddEntityForm {
    pub id: String,
    pub data: String,
}

/// Handler for `GET /entities`.
pub struct ListEntities {
    store: Arc<dyn EntityStore>,
}

impl ListEntities {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for ListEntities {
    async fn serve(&self, sink: &mut dyn ResponseSink, _request: Request) {
        let store = Arc::clone(&self.store);
        let rows = match run_blocking(move || store.select_all()).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list entities");
                sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                return;
            }
        };

        let items: Vec<ListEntityItem<'_>> = rows
            .iter()
            .map(|row| ListEntityItem {
                id: &row.id,
                data: &row.data,
            })
            .collect();

        let body = match serde_json::to_vec(&items) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode entity list");
                sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                return;
            }
        };

        sink.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Err(e) = sink.write_body(&body) {
            tracing::error!(error = %e, "Failed to write entity list");
            sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

/// Handler for `POST /entity`.
pub struct AddEntity {
    store: Arc<dyn EntityStore>,
}

impl AddEntity {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Handler for AddEntity {
    async fn serve(&self, sink: &mut dyn ResponseSink, request: Request) {
        let Form(form) = match Form::<AddEntityForm>::from_request(request, &()).await {
            Ok(form) => form,
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Rejected entity form");
                sink.set_status(rejection.status());
                if let Err(e) = sink.write_body(rejection.body_text().as_bytes()) {
                    tracing::debug!(error = %e, "Failed to write rejection body");
                }
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let AddEntityForm { id, data } = form;
        match run_blocking(move || store.insert(&id, &data)).await {
            Ok(()) => sink.set_status(StatusCode::OK),
            Err(e) => {
                tracing::error!(error = %e, "Failed to insert entity");
                sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
}
