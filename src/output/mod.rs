//! Output formatting for repsync.
//!
//! This module provides formatters for displaying folders, routines and
//! workouts in various formats.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::RepsyncError;
use crate::features::workout::WorkoutSession;
use crate::library::{Folder, Routine};

pub use json::*;
pub use pretty::*;

/// Format folders based on output format
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_folders(
    folders: &[Folder],
    routines: &[Routine],
    format: OutputFormat,
) -> Result<String, RepsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_folders_pretty(folders, routines)),
        OutputFormat::Json => format_folders_json(folders, routines),
    }
}

/// Format routines based on output format
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_routines(routines: &[Routine], format: OutputFormat) -> Result<String, RepsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_routines_pretty(routines)),
        OutputFormat::Json => format_routines_json(routines),
    }
}

/// Format a workout based on output format
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_workout(session: &WorkoutSession, format: OutputFormat) -> Result<String, RepsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_workout_pretty(session)),
        OutputFormat::Json => format_workout_json(session),
    }
}

/// Format workout history based on output format
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_history(sessions: &[WorkoutSession], format: OutputFormat) -> Result<String, RepsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_history_pretty(sessions)),
        OutputFormat::Json => format_history_json(sessions),
    }
}
