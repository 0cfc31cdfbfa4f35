//! Database migrations for repsync.
//!
//! Each schema is an ordered list of migration batches; entry `n` upgrades the
//! schema from version `n` to `n + 1`. Migrations run automatically when a
//! database is opened.

use rusqlite::Connection;

use crate::error::RepsyncError;

/// Which set of tables a database file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// On-device key-value store.
    Local,
    /// Stand-in for the remote data service.
    Backend,
}

impl Schema {
    const fn migrations(self) -> &'static [&'static str] {
        match self {
            Self::Local => LOCAL_MIGRATIONS,
            Self::Backend => BACKEND_MIGRATIONS,
        }
    }

    /// Schema version after all migrations have run.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn current_version(self) -> i32 {
        self.migrations().len() as i32
    }
}

/// v1: key-value table holding the active session and workout history.
const LOCAL_MIGRATIONS: &[&str] = &[r"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"];

/// v1: folders, routines and per-set routine line items.
const BACKEND_MIGRATIONS: &[&str] = &[r"
    CREATE TABLE IF NOT EXISTS folders (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_folders_owner ON folders(owner_id);

    CREATE TABLE IF NOT EXISTS routines (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        folder_id TEXT REFERENCES folders(id),
        name TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_routines_folder ON routines(folder_id);

    CREATE TABLE IF NOT EXISTS routine_exercises (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        routine_id TEXT NOT NULL REFERENCES routines(id),
        exercise_name TEXT NOT NULL,
        exercise_order INTEGER NOT NULL,
        set_index INTEGER NOT NULL,
        weight REAL NOT NULL DEFAULT 0,
        reps INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_routine_exercises_routine
    ON routine_exercises(routine_id);
"];

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, RepsyncError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| RepsyncError::Database(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), RepsyncError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| RepsyncError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations for `schema`.
pub fn run(conn: &Connection, schema: Schema) -> Result<(), RepsyncError> {
    let current = get_version(conn)?;

    for (index, batch) in schema.migrations().iter().enumerate() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let version = index as i32 + 1;
        if version <= current {
            continue;
        }

        conn.execute_batch(batch).map_err(|e| {
            RepsyncError::Database(format!("Migration v{version} ({schema:?}) failed: {e}"))
        })?;
        set_version(conn, version)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_migration() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn, Schema::Local).unwrap();

        assert_eq!(get_version(&conn).unwrap(), Schema::Local.current_version());

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES ('k', 'v', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_backend_migration() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn, Schema::Backend).unwrap();

        conn.execute(
            "INSERT INTO folders (id, owner_id, name, created_at) VALUES ('f1', 'u1', 'Push', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO routine_exercises (routine_id, exercise_name, exercise_order, set_index)
             VALUES ('r1', 'Bench Press', 0, 0)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn, Schema::Local).unwrap();
        run(&conn, Schema::Local).unwrap();

        assert_eq!(get_version(&conn).unwrap(), Schema::Local.current_version());
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
