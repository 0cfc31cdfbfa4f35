//! Key-value persistence.
//!
//! The workout session layer only needs string blobs under fixed keys, so it
//! talks to this trait rather than to SQL directly.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::database::Database;
use super::migrations::Schema;
use crate::error::RepsyncError;

/// A persistent string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn get(&self, key: &str) -> Result<Option<String>, RepsyncError>;

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn set(&self, key: &str, value: &str) -> Result<(), RepsyncError>;

    /// Remove `key`. Returns whether a value was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn remove(&self, key: &str) -> Result<bool, RepsyncError>;
}

/// `SQLite`-backed key-value store over the `kv_store` table.
pub struct KvStore {
    db: Mutex<Database>,
}

impl KvStore {
    /// Open the store backed by the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &std::path::Path) -> Result<Self, RepsyncError> {
        Ok(Self::with_database(Database::open_at(path, Schema::Local)?))
    }

    /// Open an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory() -> Result<Self, RepsyncError> {
        Ok(Self::with_database(Database::open_in_memory(Schema::Local)?))
    }

    /// Create a store with an existing database connection.
    #[must_use]
    pub fn with_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepsyncError> {
        let db = self.db();
        db.connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| RepsyncError::Database(format!("Failed to read key {key}: {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RepsyncError> {
        let db = self.db();
        db.connection()
            .execute(
                r"INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| RepsyncError::Database(format!("Failed to write key {key}: {e}")))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, RepsyncError> {
        let db = self.db();
        let rows = db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(|e| RepsyncError::Database(format!("Failed to remove key {key}: {e}")))?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = KvStore::in_memory().unwrap();

        assert!(store.get("missing").unwrap().is_none());

        store.set("slot", "one").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("one"));

        store.set("slot", "two").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_remove() {
        let store = KvStore::in_memory().unwrap();
        store.set("slot", "value").unwrap();

        assert!(store.remove("slot").unwrap());
        assert!(!store.remove("slot").unwrap());
        assert!(store.get("slot").unwrap().is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("kv.db");

        {
            let store = KvStore::with_database(Database::open_at(&path, Schema::Local).unwrap());
            store.set("slot", "durable").unwrap();
        }

        let store = KvStore::with_database(Database::open_at(&path, Schema::Local).unwrap());
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("durable"));
    }
}
