use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One set of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExerciseSet {
    #[must_use]
    pub const fn new(weight: f64, reps: u32) -> Self {
        Self {
            weight,
            reps,
            completed: false,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

impl Exercise {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets: Vec::new(),
        }
    }

    /// Exercise with `count` identical sets.
    #[must_use]
    pub fn with_sets(name: impl Into<String>, count: usize, weight: f64, reps: u32) -> Self {
        Self {
            name: name.into(),
            sets: vec![ExerciseSet::new(weight, reps); count],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// Fields of a folder that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDraft {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

impl FolderDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
        }
    }
}

/// Field-level changes to an existing folder. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl FolderPatch {
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_default: None,
        }
    }
}

/// Fields of a routine that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineDraft {
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// Field-level changes to an existing routine.
///
/// When `exercises` is set the routine's line items are replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
}

impl RoutinePatch {
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A routine line item as stored remotely: one row per exercise set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineLine {
    pub exercise_name: String,
    pub exercise_order: u32,
    pub set_index: u32,
    pub weight: f64,
    pub reps: u32,
}

/// Flatten exercises into line items, preserving exercise order and set index.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn routine_lines(exercises: &[Exercise]) -> Vec<RoutineLine> {
    exercises
        .iter()
        .enumerate()
        .flat_map(|(order, exercise)| {
            exercise
                .sets
                .iter()
                .enumerate()
                .map(move |(index, set)| RoutineLine {
                    exercise_name: exercise.name.clone(),
                    exercise_order: order as u32,
                    set_index: index as u32,
                    weight: set.weight,
                    reps: set.reps,
                })
        })
        .collect()
}
