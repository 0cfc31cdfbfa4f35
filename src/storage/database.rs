//! `SQLite` database connection.
//!
//! Two database files are used:
//! - `repsync.db` holds the on-device key-value store
//! - `backend.db` holds the tables of the local backend stand-in

use std::path::Path;

use rusqlite::Connection;

use crate::error::RepsyncError;

use super::migrations::{self, Schema};

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at a specific path.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &Path, schema: Schema) -> Result<Self, RepsyncError> {
        let conn = Connection::open(path).map_err(|e| {
            RepsyncError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;
        Self::init(conn, schema)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory(schema: Schema) -> Result<Self, RepsyncError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            RepsyncError::Database(format!("Failed to open in-memory database: {e}"))
        })?;
        Self::init(conn, schema)
    }

    fn init(conn: Connection, schema: Schema) -> Result<Self, RepsyncError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| RepsyncError::Database(format!("Failed to enable foreign keys: {e}")))?;

        migrations::run(&conn, schema)?;
        Ok(Self { conn })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, RepsyncError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference to the underlying connection (for transactions).
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
