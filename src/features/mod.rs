//! Feature implementations for repsync.
//!
//! - Offline-first sync of folder and routine edits
//! - Active workout tracking

pub mod sync;
pub mod workout;
