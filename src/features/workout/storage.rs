//! Workout snapshot storage.
//!
//! Persists the active workout and the completed history as JSON values in
//! the local key-value store.

use std::sync::Arc;

use tracing::warn;

use super::session::WorkoutSession;
use crate::error::RepsyncError;
use crate::storage::KeyValueStore;

/// Key holding the active workout snapshot.
pub const ACTIVE_SESSION_KEY: &str = "active_workout_session";
/// Key holding the array of completed workouts.
pub const COMPLETED_WORKOUTS_KEY: &str = "completed_workouts";
/// Prefix for keys holding history blobs that failed to parse.
pub const CORRUPT_HISTORY_PREFIX: &str = "completed_workouts.corrupt.";

/// Storage for workout sessions.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Overwrite the active snapshot.
    pub fn save(&self, session: &WorkoutSession) -> Result<(), RepsyncError> {
        let json = serde_json::to_string(session)?;
        self.kv.set(ACTIVE_SESSION_KEY, &json)
    }

    /// The persisted active snapshot.
    ///
    /// A missing, unreadable or corrupt snapshot all mean "no active session".
    #[must_use]
    pub fn load(&self) -> Option<WorkoutSession> {
        let json = match self.kv.get(ACTIVE_SESSION_KEY) {
            Ok(json) => json?,
            Err(e) => {
                warn!(error = %e, "failed to read active workout snapshot");
                return None;
            },
        };

        serde_json::from_str(&json)
            .map_err(|e| warn!(error = %e, "discarding unparseable workout snapshot"))
            .ok()
    }

    /// Remove the active snapshot. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, RepsyncError> {
        self.kv.remove(ACTIVE_SESSION_KEY)
    }

    /// Completed workouts, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<WorkoutSession> {
        let json = match self.kv.get(COMPLETED_WORKOUTS_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read workout history");
                return Vec::new();
            },
        };

        serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(error = %e, "workout history is unparseable; treating as empty");
            Vec::new()
        })
    }

    /// Append to the history, rewriting the whole array.
    ///
    /// Unlike [`history`](Self::history) a failed read is never treated as
    /// empty: a read error aborts the append. An unparseable array is kept
    /// under [`CORRUPT_HISTORY_PREFIX`] plus the session id before a fresh
    /// one is started.
    pub fn append_history(&self, session: &WorkoutSession) -> Result<(), RepsyncError> {
        let mut history: Vec<WorkoutSession> = match self.kv.get(COMPLETED_WORKOUTS_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(history) => history,
                Err(e) => {
                    let aside = format!("{CORRUPT_HISTORY_PREFIX}{}", session.id);
                    self.kv.set(&aside, &json)?;
                    warn!(error = %e, key = %aside, "moved unparseable workout history aside");
                    Vec::new()
                },
            },
            None => Vec::new(),
        };

        history.push(session.clone());
        let json = serde_json::to_string(&history)?;
        self.kv.set(COMPLETED_WORKOUTS_KEY, &json)
    }
}
