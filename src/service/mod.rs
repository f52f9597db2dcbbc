//! HTTP handlers for the entity endpoints.

pub mod entities;

pub use entities::{AddEntity, ListEntities};

use crate::storage::StoreError;

/// Run a blocking storage call off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(format!("storage task failed: {e}")))?
}
