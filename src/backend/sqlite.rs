//! `SQLite` stand-in for the remote data service.
//!
//! Gives the CLI a real backend to sync against. Schema:
//! - `folders` - one row per folder, owned by a principal
//! - `routines` - one row per routine, optionally filed under a folder
//! - `routine_exercises` - one line item per exercise set
//!
//! Foreign keys are enforced, so deletes must run children-first just like
//! against the hosted service.
//!
//! Queries run synchronously inside the async methods, blocking the calling
//! worker for their duration. The sync engine issues one call at a time and
//! every statement is a short local transaction, so this backend does not
//! move work onto `spawn_blocking`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::store::{RemoteError, RemoteStore};
use crate::error::RepsyncError;
use crate::library::{
    Exercise, ExerciseSet, Folder, FolderDraft, FolderPatch, Routine, RoutineDraft, RoutineLine,
    RoutinePatch,
};
use crate::storage::{Database, Schema};

/// Backend over a local `SQLite` file.
pub struct SqliteBackend {
    db: Mutex<Database>,
    principal: Option<String>,
}

fn unavailable(e: &rusqlite::Error) -> RemoteError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            RemoteError::Rejected(msg.clone().unwrap_or_else(|| err.to_string()))
        }
        _ => RemoteError::Unavailable(e.to_string()),
    }
}

impl SqliteBackend {
    /// Open the backend at `path`, signed in as `principal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &std::path::Path, principal: Option<String>) -> Result<Self, RepsyncError> {
        Ok(Self::with_database(Database::open_at(path, Schema::Backend)?, principal))
    }

    /// In-memory backend (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory(principal: Option<String>) -> Result<Self, RepsyncError> {
        Ok(Self::with_database(Database::open_in_memory(Schema::Backend)?, principal))
    }

    #[must_use]
    pub fn with_database(db: Database, principal: Option<String>) -> Self {
        Self {
            db: Mutex::new(db),
            principal,
        }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All folders owned by `principal`, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_folders(&self, principal: &str) -> Result<Vec<Folder>, RepsyncError> {
        let db = self.db();
        let mut stmt = db
            .connection()
            .prepare(
                r"SELECT id, name, owner_id, is_default FROM folders
                  WHERE owner_id = ?1 ORDER BY name ASC",
            )
            .map_err(|e| unavailable(&e))?;

        let rows = stmt
            .query_map([principal], |row| {
                Ok(Folder {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    owner_id: row.get(2)?,
                    is_default: row.get(3)?,
                })
            })
            .map_err(|e| unavailable(&e))?;

        let mut folders = Vec::new();
        for row in rows {
            folders.push(row.map_err(|e| unavailable(&e))?);
        }
        Ok(folders)
    }

    /// All routines owned by `principal`, with exercises rebuilt from line items.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_routines(&self, principal: &str) -> Result<Vec<Routine>, RepsyncError> {
        let db = self.db();
        let conn = db.connection();

        let mut stmt = conn
            .prepare(
                r"SELECT id, name, folder_id, owner_id, is_default FROM routines
                  WHERE owner_id = ?1 ORDER BY name ASC",
            )
            .map_err(|e| unavailable(&e))?;

        let rows = stmt
            .query_map([principal], |row| {
                Ok(Routine {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    folder_id: row.get(2)?,
                    owner_id: row.get(3)?,
                    is_default: row.get(4)?,
                    exercises: Vec::new(),
                })
            })
            .map_err(|e| unavailable(&e))?;

        let mut routines = Vec::new();
        for row in rows {
            let mut routine = row.map_err(|e| unavailable(&e))?;
            routine.exercises = load_exercises(conn, &routine.id)?;
            routines.push(routine);
        }
        Ok(routines)
    }
}

fn load_exercises(conn: &Connection, routine_id: &str) -> Result<Vec<Exercise>, RepsyncError> {
    let mut stmt = conn
        .prepare(
            r"SELECT exercise_order, exercise_name, weight, reps FROM routine_exercises
              WHERE routine_id = ?1 ORDER BY exercise_order ASC, set_index ASC",
        )
        .map_err(|e| unavailable(&e))?;

    let rows = stmt
        .query_map([routine_id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })
        .map_err(|e| unavailable(&e))?;

    let mut grouped: BTreeMap<u32, Exercise> = BTreeMap::new();
    for row in rows {
        let (order, name, weight, reps) = row.map_err(|e| unavailable(&e))?;
        grouped
            .entry(order)
            .or_insert_with(|| Exercise::new(name))
            .sets
            .push(ExerciseSet::new(weight, reps));
    }
    Ok(grouped.into_values().collect())
}

#[async_trait]
impl RemoteStore for SqliteBackend {
    async fn current_principal(&self) -> Option<String> {
        self.principal.clone()
    }

    async fn insert_folder(&self, principal: &str, folder: &FolderDraft) -> Result<String, RemoteError> {
        let id = Uuid::new_v4().to_string();
        self.db()
            .connection()
            .execute(
                r"INSERT INTO folders (id, owner_id, name, is_default, created_at)
                  VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, principal, folder.name, folder.is_default, Utc::now().to_rfc3339()],
            )
            .map_err(|e| unavailable(&e))?;
        Ok(id)
    }

    async fn update_folder(
        &self,
        principal: &str,
        folder_id: &str,
        patch: &FolderPatch,
    ) -> Result<(), RemoteError> {
        let rows = self
            .db()
            .connection()
            .execute(
                r"UPDATE folders SET
                  name = COALESCE(?1, name),
                  is_default = COALESCE(?2, is_default)
                  WHERE id = ?3 AND owner_id = ?4",
                params![patch.name, patch.is_default, folder_id, principal],
            )
            .map_err(|e| unavailable(&e))?;

        if rows == 0 {
            return Err(RemoteError::NotFound(format!("folder {folder_id}")));
        }
        Ok(())
    }

    async fn delete_folder(&self, principal: &str, folder_id: &str) -> Result<(), RemoteError> {
        self.db()
            .connection()
            .execute(
                "DELETE FROM folders WHERE id = ?1 AND owner_id = ?2",
                params![folder_id, principal],
            )
            .map_err(|e| unavailable(&e))?;
        Ok(())
    }

    async fn routine_ids_in_folder(
        &self,
        principal: &str,
        folder_id: &str,
    ) -> Result<Vec<String>, RemoteError> {
        let db = self.db();
        let mut stmt = db
            .connection()
            .prepare("SELECT id FROM routines WHERE folder_id = ?1 AND owner_id = ?2")
            .map_err(|e| unavailable(&e))?;
        let rows = stmt
            .query_map(params![folder_id, principal], |row| row.get::<_, String>(0))
            .map_err(|e| unavailable(&e))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| unavailable(&e))?);
        }
        Ok(ids)
    }

    async fn insert_routine(&self, principal: &str, routine: &RoutineDraft) -> Result<String, RemoteError> {
        let id = Uuid::new_v4().to_string();
        self.db()
            .connection()
            .execute(
                r"INSERT INTO routines (id, owner_id, folder_id, name, is_default, created_at)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    principal,
                    routine.folder_id,
                    routine.name,
                    routine.is_default,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(|e| unavailable(&e))?;
        Ok(id)
    }

    async fn update_routine(
        &self,
        principal: &str,
        routine_id: &str,
        patch: &RoutinePatch,
    ) -> Result<(), RemoteError> {
        let rows = self
            .db()
            .connection()
            .execute(
                r"UPDATE routines SET
                  name = COALESCE(?1, name),
                  folder_id = COALESCE(?2, folder_id)
                  WHERE id = ?3 AND owner_id = ?4",
                params![patch.name, patch.folder_id, routine_id, principal],
            )
            .map_err(|e| unavailable(&e))?;

        if rows == 0 {
            return Err(RemoteError::NotFound(format!("routine {routine_id}")));
        }
        Ok(())
    }

    async fn delete_routine(&self, principal: &str, routine_id: &str) -> Result<(), RemoteError> {
        self.db()
            .connection()
            .execute(
                "DELETE FROM routines WHERE id = ?1 AND owner_id = ?2",
                params![routine_id, principal],
            )
            .map_err(|e| unavailable(&e))?;
        Ok(())
    }

    async fn delete_routines_in_folder(&self, principal: &str, folder_id: &str) -> Result<(), RemoteError> {
        self.db()
            .connection()
            .execute(
                "DELETE FROM routines WHERE folder_id = ?1 AND owner_id = ?2",
                params![folder_id, principal],
            )
            .map_err(|e| unavailable(&e))?;
        Ok(())
    }

    async fn insert_routine_lines(
        &self,
        principal: &str,
        routine_id: &str,
        lines: &[RoutineLine],
    ) -> Result<(), RemoteError> {
        let mut db = self.db();
        let tx = db.connection_mut().transaction().map_err(|e| unavailable(&e))?;

        let owned: bool = tx
            .query_row(
                "SELECT COUNT(*) > 0 FROM routines WHERE id = ?1 AND owner_id = ?2",
                params![routine_id, principal],
                |row| row.get(0),
            )
            .map_err(|e| unavailable(&e))?;
        if !owned {
            return Err(RemoteError::NotFound(format!("routine {routine_id}")));
        }

        for line in lines {
            tx.execute(
                r"INSERT INTO routine_exercises
                  (routine_id, exercise_name, exercise_order, set_index, weight, reps)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    routine_id,
                    line.exercise_name,
                    line.exercise_order,
                    line.set_index,
                    line.weight,
                    line.reps
                ],
            )
            .map_err(|e| unavailable(&e))?;
        }

        tx.commit().map_err(|e| unavailable(&e))
    }

    async fn delete_routine_lines(&self, principal: &str, routine_ids: &[String]) -> Result<(), RemoteError> {
        let db = self.db();
        for routine_id in routine_ids {
            db.connection()
                .execute(
                    r"DELETE FROM routine_exercises WHERE routine_id IN
                      (SELECT id FROM routines WHERE id = ?1 AND owner_id = ?2)",
                    params![routine_id, principal],
                )
                .map_err(|e| unavailable(&e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "athlete";

    fn backend() -> SqliteBackend {
        SqliteBackend::in_memory(Some(USER.to_string())).unwrap()
    }

    fn routine_in(folder_id: Option<String>) -> RoutineDraft {
        RoutineDraft {
            name: "Push A".to_string(),
            folder_id,
            is_default: false,
            exercises: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_folder_roundtrip_scoped_to_principal() {
        let backend = backend();
        let id = backend
            .insert_folder(USER, &FolderDraft::named("Push"))
            .await
            .unwrap();

        backend
            .update_folder(USER, &id, &FolderPatch::rename("Push Day"))
            .await
            .unwrap();

        let folders = backend.list_folders(USER).unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Push Day");
        assert!(backend.list_folders("someone-else").unwrap().is_empty());

        let err = backend
            .update_folder("someone-else", &id, &FolderPatch::rename("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_routine_lines_rebuild_exercises() {
        let backend = backend();
        let routine_id = backend.insert_routine(USER, &routine_in(None)).await.unwrap();

        let exercises = vec![
            Exercise::with_sets("Bench", 2, 80.0, 5),
            Exercise::with_sets("Dips", 1, 0.0, 12),
        ];
        backend
            .insert_routine_lines(USER, &routine_id, &crate::library::routine_lines(&exercises))
            .await
            .unwrap();

        let routines = backend.list_routines(USER).unwrap();
        assert_eq!(routines[0].exercises, exercises);
    }

    #[tokio::test]
    async fn test_foreign_keys_require_children_first() {
        let backend = backend();
        let folder_id = backend
            .insert_folder(USER, &FolderDraft::named("Legs"))
            .await
            .unwrap();
        let routine_id = backend
            .insert_routine(USER, &routine_in(Some(folder_id.clone())))
            .await
            .unwrap();

        let err = backend.delete_folder(USER, &folder_id).await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));

        assert_eq!(
            backend.routine_ids_in_folder(USER, &folder_id).await.unwrap(),
            vec![routine_id.clone()]
        );
        backend
            .delete_routine_lines(USER, &[routine_id])
            .await
            .unwrap();
        backend.delete_routines_in_folder(USER, &folder_id).await.unwrap();
        backend.delete_folder(USER, &folder_id).await.unwrap();

        assert!(backend.list_folders(USER).unwrap().is_empty());
        assert!(backend.list_routines(USER).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_routine_with_unknown_folder_is_rejected() {
        let backend = backend();
        let err = backend
            .insert_routine(USER, &routine_in(Some("temp_missing".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
    }
}
