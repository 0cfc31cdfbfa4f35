//! JSON output formatting for repsync.
//!
//! This module provides functions for formatting folders, routines and
//! workouts as JSON.

use serde::Serialize;
use serde_json::json;

use crate::error::RepsyncError;
use crate::features::workout::WorkoutSession;
use crate::library::{Folder, Routine};

/// Format folders as JSON, with the number of routines filed under each
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_folders_json(folders: &[Folder], routines: &[Routine]) -> Result<String, RepsyncError> {
    let items: Vec<_> = folders
        .iter()
        .map(|folder| {
            let count = routines
                .iter()
                .filter(|r| r.folder_id.as_deref() == Some(folder.id.as_str()))
                .count();
            json!({
                "id": folder.id,
                "name": folder.name,
                "isDefault": folder.is_default,
                "routineCount": count,
            })
        })
        .collect();

    let output = json!({
        "count": folders.len(),
        "items": items
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format routines as JSON
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_routines_json(routines: &[Routine]) -> Result<String, RepsyncError> {
    let output = json!({
        "count": routines.len(),
        "items": routines
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format a workout as JSON, including derived totals
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_workout_json(session: &WorkoutSession) -> Result<String, RepsyncError> {
    let output = json!({
        "session": session,
        "elapsedSeconds": session.elapsed().num_seconds(),
        "completedSets": session.completed_sets(),
        "totalSets": session.total_sets(),
        "volume": session.volume(),
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format workout history as JSON
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn format_history_json(sessions: &[WorkoutSession]) -> Result<String, RepsyncError> {
    let output = json!({
        "count": sessions.len(),
        "items": sessions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Serialize any value as pretty JSON
///
/// # Errors
///
/// Returns `RepsyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, RepsyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Exercise;

    fn make_folder(id: &str, name: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: name.to_string(),
            owner_id: Some("user-1".to_string()),
            is_default: false,
        }
    }

    fn make_routine(id: &str, folder_id: Option<&str>) -> Routine {
        Routine {
            id: id.to_string(),
            name: format!("Routine {id}"),
            folder_id: folder_id.map(String::from),
            owner_id: Some("user-1".to_string()),
            is_default: false,
            exercises: vec![Exercise::with_sets("Squat", 3, 100.0, 5)],
        }
    }

    #[test]
    fn test_format_folders_json_counts_routines() {
        let folders = vec![make_folder("f1", "Push"), make_folder("f2", "Pull")];
        let routines = vec![make_routine("r1", Some("f1")), make_routine("r2", Some("f1"))];

        let result = format_folders_json(&folders, &routines).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][0]["routineCount"], 2);
        assert_eq!(value["items"][1]["routineCount"], 0);
    }

    #[test]
    fn test_format_routines_json_empty_list() {
        let result = format_routines_json(&[]).unwrap();

        assert!(result.contains("\"count\": 0"));
        assert!(result.contains("\"items\": []"));
    }

    #[test]
    fn test_format_routines_json_uses_camel_case() {
        let result = format_routines_json(&[make_routine("r1", Some("f1"))]).unwrap();

        assert!(result.contains("\"folderId\": \"f1\""));
        assert!(result.contains("\"exercises\""));
    }

    #[test]
    fn test_format_workout_json_totals() {
        let mut session = WorkoutSession::new(None);
        session.add_exercise("Bench").unwrap();
        session.add_set(0, 80.0, 5).unwrap();
        session.toggle_set_completed(0, 0).unwrap();

        let result = format_workout_json(&session).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(value["completedSets"], 1);
        assert_eq!(value["volume"], 400.0);
        assert_eq!(value["session"]["status"], "active");
    }

    #[test]
    fn test_to_json() {
        let result = to_json(&vec!["a", "b"]).unwrap();
        assert!(result.contains("\"a\""));
    }
}
