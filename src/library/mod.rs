//! Folders, routines and their exercises.

mod state;
pub mod types;

pub use state::LocalLibrary;
pub use types::{
    routine_lines, Exercise, ExerciseSet, Folder, FolderDraft, FolderPatch, Routine,
    RoutineDraft, RoutineLine, RoutinePatch,
};
