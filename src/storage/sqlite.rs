//! SQLite-backed entity store.
//!
//! Uses r2d2 with r2d2_sqlite for pooled access. WAL mode lets list queries
//! proceed while an insert is committing.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::{apply_pragmas, initialize_schema, SQL_INSERT_ENTITY, SQL_SELECT_ENTITIES};
use super::{Entity, EntityStore, StoreError};

/// Pooled SQLite entity store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    pub fn open<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(db_path);

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(PragmaCustomizer))
            .build(manager)?;

        let conn = pool.get()?;
        initialize_schema(&conn)?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl EntityStore for SqliteStore {
    fn insert(&self, id: &str, data: &str) -> Result<(), StoreError> {
        let conn = self.get()?;
        conn.execute(SQL_INSERT_ENTITY, (id, data))?;
        Ok(())
    }

    fn select_all(&self) -> Result<Vec<Entity>, StoreError> {
        let conn = self.get()?;
        let mut stmt = conn.prepare_cached(SQL_SELECT_ENTITIES)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Entity {
                    id: row.get::<_, i64>(0)?.to_string(),
                    data: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Connection customizer that applies pragmas to each new connection.
#[derive(Debug)]
struct PragmaCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        apply_pragmas(conn)
    }
}
