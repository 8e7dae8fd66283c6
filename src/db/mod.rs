//! Database module - runs compiled searches against an SQLite item database.
//!
//! Connections are opened in WAL mode with the same PRAGMAs a long running
//! library process would use, and the item schema is created on open.

mod ops;
pub mod schema;

pub use ops::*;

use rusqlite::Connection;
use std::path::Path;

use crate::{Result, SearchError};

/// Database wrapper providing connection management.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Open an item database with WAL mode and optimized PRAGMAs.
///
/// Creates the parent directory and the item schema if they don't exist.
pub fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)
        .map_err(|e| SearchError::Database(format!("Failed to open {}: {}", path.display(), e)))?;

    // WAL persists in the database file
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| SearchError::Database(format!("Failed to set journal_mode: {}", e)))?;

    // NORMAL synchronous is safe in WAL mode
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| SearchError::Database(format!("Failed to set synchronous: {}", e)))?;

    // Subquery results of large searches stay in memory
    conn.pragma_update(None, "temp_store", "MEMORY")
        .map_err(|e| SearchError::Database(format!("Failed to set temp_store: {}", e)))?;

    // 5 second busy timeout, the library writer may hold the lock
    conn.pragma_update(None, "busy_timeout", 5000i32)
        .map_err(|e| SearchError::Database(format!("Failed to set busy_timeout: {}", e)))?;

    schema::init(&conn)?;

    Ok(Database { conn })
}

/// Open a private in-memory item database.
pub fn open_in_memory() -> Result<Database> {
    let conn = Connection::open_in_memory()
        .map_err(|e| SearchError::Database(format!("Failed to open in-memory database: {}", e)))?;

    schema::init(&conn)?;

    Ok(Database { conn })
}
