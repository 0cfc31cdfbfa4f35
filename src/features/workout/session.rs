//! Workout session model.
//!
//! Handles the active workout's exercises and sets, pause accounting, and
//! the `active -> completed | discarded` lifecycle.

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RepsyncError;
use crate::library::{Exercise, ExerciseSet};

/// Lifecycle status of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutStatus {
    /// In progress (possibly paused)
    Active,
    /// Finished and recorded in history
    Completed,
    /// Thrown away
    Discarded,
}

impl std::fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Completed => write!(f, "Completed"),
            Self::Discarded => write!(f, "Discarded"),
        }
    }
}

/// A workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// Seconds spent paused, excluding a pause still in progress.
    #[serde(default)]
    pub total_paused_duration: i64,
    pub status: WorkoutStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub paused_at: Option<DateTime<Utc>>,
}

impl WorkoutSession {
    /// Start a new active session now.
    #[must_use]
    pub fn new(notes: Option<String>) -> Self {
        Self::started_at(Utc::now(), notes)
    }

    #[must_use]
    pub fn started_at(start_time: DateTime<Utc>, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time,
            end_time: None,
            exercises: Vec::new(),
            total_paused_duration: 0,
            status: WorkoutStatus::Active,
            notes,
            paused_at: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == WorkoutStatus::Active
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    fn ensure_active(&self, action: &str) -> Result<(), RepsyncError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(RepsyncError::InvalidTransition(format!(
                "cannot {action} a {} workout",
                self.status.to_string().to_lowercase()
            )))
        }
    }

    fn exercise_mut(&mut self, index: usize) -> Result<&mut Exercise, RepsyncError> {
        self.exercises
            .get_mut(index)
            .ok_or_else(|| RepsyncError::NotFound(format!("exercise #{}", index + 1)))
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut ExerciseSet, RepsyncError> {
        self.exercise_mut(exercise)?
            .sets
            .get_mut(set)
            .ok_or_else(|| RepsyncError::NotFound(format!("set #{} of exercise #{}", set + 1, exercise + 1)))
    }

    /// Append an exercise and return its index.
    pub fn add_exercise(&mut self, name: impl Into<String>) -> Result<usize, RepsyncError> {
        self.ensure_active("edit")?;
        self.exercises.push(Exercise::new(name));
        Ok(self.exercises.len() - 1)
    }

    pub fn remove_exercise(&mut self, index: usize) -> Result<Exercise, RepsyncError> {
        self.ensure_active("edit")?;
        self.exercise_mut(index)?;
        Ok(self.exercises.remove(index))
    }

    /// Append a set to an exercise and return the set's index.
    pub fn add_set(&mut self, exercise: usize, weight: f64, reps: u32) -> Result<usize, RepsyncError> {
        self.ensure_active("edit")?;
        let sets = &mut self.exercise_mut(exercise)?.sets;
        sets.push(ExerciseSet::new(weight, reps));
        Ok(sets.len() - 1)
    }

    pub fn remove_set(&mut self, exercise: usize, set: usize) -> Result<ExerciseSet, RepsyncError> {
        self.ensure_active("edit")?;
        self.set_mut(exercise, set)?;
        Ok(self.exercise_mut(exercise)?.sets.remove(set))
    }

    /// Flip a set's completed flag. Returns the new value.
    pub fn toggle_set_completed(&mut self, exercise: usize, set: usize) -> Result<bool, RepsyncError> {
        self.ensure_active("edit")?;
        let entry = self.set_mut(exercise, set)?;
        entry.completed = !entry.completed;
        entry.completed_at = entry.completed.then(Utc::now);
        Ok(entry.completed)
    }

    pub fn update_set(
        &mut self,
        exercise: usize,
        set: usize,
        weight: Option<f64>,
        reps: Option<u32>,
    ) -> Result<(), RepsyncError> {
        self.ensure_active("edit")?;
        let entry = self.set_mut(exercise, set)?;
        if let Some(weight) = weight {
            entry.weight = weight;
        }
        if let Some(reps) = reps {
            entry.reps = reps;
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RepsyncError> {
        self.pause_at(Utc::now())
    }

    pub fn pause_at(&mut self, now: DateTime<Utc>) -> Result<(), RepsyncError> {
        self.ensure_active("pause")?;
        if self.is_paused() {
            return Err(RepsyncError::InvalidTransition("workout is already paused".to_string()));
        }
        self.paused_at = Some(now);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), RepsyncError> {
        self.resume_at(Utc::now())
    }

    pub fn resume_at(&mut self, now: DateTime<Utc>) -> Result<(), RepsyncError> {
        self.ensure_active("resume")?;
        let Some(paused_at) = self.paused_at.take() else {
            return Err(RepsyncError::InvalidTransition("workout is not paused".to_string()));
        };
        self.total_paused_duration += now.signed_duration_since(paused_at).num_seconds().max(0);
        Ok(())
    }

    /// Mark the session completed. A pause in progress is closed first.
    pub fn complete(&mut self) -> Result<(), RepsyncError> {
        self.complete_at(Utc::now())
    }

    pub fn complete_at(&mut self, now: DateTime<Utc>) -> Result<(), RepsyncError> {
        self.ensure_active("finish")?;
        if self.is_paused() {
            self.resume_at(now)?;
        }
        self.status = WorkoutStatus::Completed;
        self.end_time = Some(now);
        Ok(())
    }

    pub fn discard(&mut self) -> Result<(), RepsyncError> {
        self.ensure_active("discard")?;
        self.status = WorkoutStatus::Discarded;
        self.end_time = Some(Utc::now());
        self.paused_at = None;
        Ok(())
    }

    /// Training time at `now`, excluding pauses.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end_time.unwrap_or(now);
        let total = end.signed_duration_since(self.start_time);

        // Account for current pause
        let current_pause = self
            .paused_at
            .map_or_else(Duration::zero, |paused_at| end.signed_duration_since(paused_at));

        (total - Duration::seconds(self.total_paused_duration) - current_pause).max(Duration::zero())
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Utc::now())
    }

    #[must_use]
    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .count()
    }

    #[must_use]
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Sum of weight x reps over completed sets.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .map(|s| s.weight * f64::from(s.reps))
            .sum()
    }

    /// Get start time in local timezone.
    #[must_use]
    pub fn start_time_local(&self) -> DateTime<Local> {
        self.start_time.with_timezone(&Local)
    }
}

/// Format a duration as a short string (e.g., "25m", "1h 30m").
#[must_use]
pub fn format_duration_short(d: Duration) -> String {
    let total_minutes = d.num_minutes();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
