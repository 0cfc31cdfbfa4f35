//! Active workout tracking.
//!
//! [`WorkoutTracker`] owns the in-memory workout and decides how urgently
//! each change must reach disk: structural edits are saved immediately,
//! set value edits are debounced.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::saver::DebouncedSaver;
use super::session::{WorkoutSession, WorkoutStatus};
use super::storage::SessionStore;
use crate::config::SessionConfig;
use crate::error::RepsyncError;
use crate::library::{Exercise, ExerciseSet};
use crate::storage::KeyValueStore;

/// How the active workout is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    Expanded,
    /// Collapsed to a resume bar.
    Minimized,
}

pub struct WorkoutTracker {
    store: SessionStore,
    saver: DebouncedSaver,
    active: Option<WorkoutSession>,
    presentation: Presentation,
}

impl WorkoutTracker {
    /// Create a tracker over `kv`. Nothing is restored until
    /// [`restore_on_launch`](Self::restore_on_launch).
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &SessionConfig) -> Result<Self, RepsyncError> {
        let store = SessionStore::new(kv);
        let saver = DebouncedSaver::new(store.clone(), config.debounce_window())?;

        Ok(Self {
            store,
            saver,
            active: None,
            presentation: Presentation::Expanded,
        })
    }

    #[must_use]
    pub const fn active(&self) -> Option<&WorkoutSession> {
        self.active.as_ref()
    }

    #[must_use]
    pub const fn presentation(&self) -> Presentation {
        self.presentation
    }

    #[must_use]
    pub const fn saver(&self) -> &DebouncedSaver {
        &self.saver
    }

    /// Reload the persisted active workout, if any.
    ///
    /// Only an `active` snapshot is restored; the tracker then starts
    /// minimized so the user can choose to resume.
    pub fn restore_on_launch(&mut self) -> Option<Presentation> {
        let session = self.store.load()?;
        if session.status != WorkoutStatus::Active {
            debug!(status = %session.status, "ignoring non-active workout snapshot");
            return None;
        }

        info!(id = %session.id, "restored active workout");
        self.active = Some(session);
        self.presentation = Presentation::Minimized;
        Some(self.presentation)
    }

    pub fn expand(&mut self) {
        self.presentation = Presentation::Expanded;
    }

    pub fn start_workout(&mut self, notes: Option<String>) -> Result<&WorkoutSession, RepsyncError> {
        if let Some(active) = &self.active {
            return Err(RepsyncError::SessionActive(active.id.clone()));
        }

        let session = WorkoutSession::new(notes);
        self.saver.immediate_save(&session)?;
        info!(id = %session.id, "workout started");

        self.presentation = Presentation::Expanded;
        Ok(self.active.insert(session))
    }

    /// Apply a structural change and persist it immediately.
    fn edit_now<T>(
        &mut self,
        edit: impl FnOnce(&mut WorkoutSession) -> Result<T, RepsyncError>,
    ) -> Result<T, RepsyncError> {
        let session = self.active.as_mut().ok_or(RepsyncError::NoActiveSession)?;
        let value = edit(session)?;
        self.saver.immediate_save(session)?;
        Ok(value)
    }

    pub fn add_exercise(&mut self, name: impl Into<String>) -> Result<usize, RepsyncError> {
        self.edit_now(|s| s.add_exercise(name))
    }

    pub fn remove_exercise(&mut self, index: usize) -> Result<Exercise, RepsyncError> {
        self.edit_now(|s| s.remove_exercise(index))
    }

    pub fn add_set(&mut self, exercise: usize, weight: f64, reps: u32) -> Result<usize, RepsyncError> {
        self.edit_now(|s| s.add_set(exercise, weight, reps))
    }

    pub fn remove_set(&mut self, exercise: usize, set: usize) -> Result<ExerciseSet, RepsyncError> {
        self.edit_now(|s| s.remove_set(exercise, set))
    }

    pub fn toggle_set_completed(&mut self, exercise: usize, set: usize) -> Result<bool, RepsyncError> {
        self.edit_now(|s| s.toggle_set_completed(exercise, set))
    }

    /// Edit a set's values. Persisted after the quiet window.
    pub fn update_set(
        &mut self,
        exercise: usize,
        set: usize,
        weight: Option<f64>,
        reps: Option<u32>,
    ) -> Result<(), RepsyncError> {
        let session = self.active.as_mut().ok_or(RepsyncError::NoActiveSession)?;
        session.update_set(exercise, set, weight, reps)?;
        self.saver.debounced_save(session);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RepsyncError> {
        self.edit_now(WorkoutSession::pause)
    }

    pub fn resume(&mut self) -> Result<(), RepsyncError> {
        self.edit_now(WorkoutSession::resume)
    }

    /// Complete the workout, record it in history and clear the active slot.
    ///
    /// If the history write fails the workout stays active, with any
    /// debounced edit still pending, so the call can be retried.
    pub fn finish_workout(&mut self) -> Result<WorkoutSession, RepsyncError> {
        let mut session = self.active.clone().ok_or(RepsyncError::NoActiveSession)?;
        session.complete()?;

        self.store.append_history(&session)?;
        self.active = None;
        self.saver.clear()?;
        info!(id = %session.id, sets = session.completed_sets(), "workout finished");
        Ok(session)
    }

    /// Throw the workout away. Nothing is recorded.
    pub fn discard_workout(&mut self) -> Result<WorkoutSession, RepsyncError> {
        let mut session = self.active.clone().ok_or(RepsyncError::NoActiveSession)?;
        session.discard()?;

        self.active = None;
        self.saver.clear()?;
        info!(id = %session.id, "workout discarded");
        Ok(session)
    }

    /// Completed workouts, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<WorkoutSession> {
        self.store.history()
    }

    /// Write any debounced edit now. Call before the process exits.
    pub fn flush(&self) -> Result<bool, RepsyncError> {
        self.saver.flush_pending_saves()
    }
}
