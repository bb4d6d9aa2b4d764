//! # SQLite Key-Value Storage
//!
//! Durable [`KeyValueStore`] backed by a single SQLite table. The landmark
//! collection is small (tens to hundreds of records), so it is stored as one
//! JSON value and rewritten on every mutation.

use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};

use crate::error::Result;
use crate::kv::KeyValueStore;

/// SQLite-backed key-value store.
pub struct SqliteKv {
    /// Database connection
    db: Connection,

    /// Database path (":memory:" for in-memory databases)
    db_path: String,
}

impl SqliteKv {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) a database at the given path.
    pub fn new(db_path: &str) -> SqlResult<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        log::debug!("[SqliteKv] Opened {}", db_path);

        Ok(Self {
            db,
            db_path: db_path.to_string(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqlResult<Self> {
        Self::new(":memory:")
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            );
        "#,
        )?;
        Ok(())
    }

    /// Path this store was opened with.
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Delete the value under `key`. Returns true if a row was removed.
    pub fn remove(&mut self, key: &str) -> SqlResult<bool> {
        let removed = self
            .db
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.db.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}
