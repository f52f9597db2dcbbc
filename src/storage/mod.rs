//! Entity storage.
//!
//! Provides:
//! - The [`EntityStore`] trait handlers depend on
//! - A SQLite implementation backed by an r2d2 connection pool
//! - An in-memory implementation with failure injection for tests

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// A stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub data: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend for entities.
///
/// Calls are blocking; async callers should run them on a blocking thread.
pub trait EntityStore: Send + Sync + 'static {
    /// Insert one row.
    fn insert(&self, id: &str, data: &str) -> Result<(), StoreError>;

    /// All rows, ordered by id.
    fn select_all(&self) -> Result<Vec<Entity>, StoreError>;
}
