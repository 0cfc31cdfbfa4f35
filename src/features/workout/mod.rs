//! Active workout tracking and persistence.
//!
//! - Session model with pause accounting
//! - Snapshot storage that survives restarts
//! - Debounced writes for rapid set edits

pub mod saver;
pub mod session;
pub mod storage;
pub mod tracker;

pub use saver::DebouncedSaver;
pub use session::{format_duration_short, WorkoutSession, WorkoutStatus};
pub use storage::{
    SessionStore, ACTIVE_SESSION_KEY, COMPLETED_WORKOUTS_KEY, CORRUPT_HISTORY_PREFIX,
};
pub use tracker::{Presentation, WorkoutTracker};
