//! Schema and connection pragmas.

use rusqlite::Connection;

/// Table definition. `data` is capped at 32 characters.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id   INTEGER PRIMARY KEY,
    data TEXT NOT NULL CHECK (length(data) <= 32)
);
"#;

pub const SQL_INSERT_ENTITY: &str = "INSERT INTO entities (id, data) VALUES (?1, ?2)";

pub const SQL_SELECT_ENTITIES: &str = "SELECT id, data FROM entities ORDER BY id ASC";

/// Apply pragmas to every pooled connection.
pub fn apply_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    // journal_mode reports the resulting mode back as a row.
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Create the entities table if it does not exist.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(DDL)
}
