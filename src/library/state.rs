//! Optimistic local view of folders and routines.
//!
//! Mutations land here immediately, before the remote write happens. Entities
//! created offline carry a temporary id until reconciliation swaps in the
//! real one.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{Folder, FolderDraft, FolderPatch, Routine, RoutineDraft, RoutinePatch};

#[derive(Debug, Default)]
struct Entries {
    folders: Vec<Folder>,
    routines: Vec<Routine>,
}

/// The UI-visible folder and routine list.
#[derive(Debug, Default)]
pub struct LocalLibrary {
    entries: RwLock<Entries>,
}

impl LocalLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the library with entities fetched from the remote.
    pub fn load(&self, folders: Vec<Folder>, routines: Vec<Routine>) {
        let mut entries = self.write();
        entries.folders = folders;
        entries.routines = routines;
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn folders(&self) -> Vec<Folder> {
        self.read().folders.clone()
    }

    #[must_use]
    pub fn routines(&self) -> Vec<Routine> {
        self.read().routines.clone()
    }

    #[must_use]
    pub fn folder(&self, id: &str) -> Option<Folder> {
        self.read().folders.iter().find(|f| f.id == id).cloned()
    }

    #[must_use]
    pub fn routine(&self, id: &str) -> Option<Routine> {
        self.read().routines.iter().find(|r| r.id == id).cloned()
    }

    /// Routines currently filed under `folder_id`.
    #[must_use]
    pub fn routines_in_folder(&self, folder_id: &str) -> Vec<Routine> {
        self.read()
            .routines
            .iter()
            .filter(|r| r.folder_id.as_deref() == Some(folder_id))
            .cloned()
            .collect()
    }

    pub fn insert_folder(&self, id: &str, draft: &FolderDraft) {
        self.write().folders.push(Folder {
            id: id.to_string(),
            name: draft.name.clone(),
            owner_id: None,
            is_default: draft.is_default,
        });
    }

    /// Apply a patch. Returns false if the folder is unknown locally.
    pub fn patch_folder(&self, id: &str, patch: &FolderPatch) -> bool {
        let mut entries = self.write();
        let Some(folder) = entries.folders.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        if let Some(name) = &patch.name {
            folder.name.clone_from(name);
        }
        if let Some(is_default) = patch.is_default {
            folder.is_default = is_default;
        }
        true
    }

    /// Remove a folder and every routine filed under it.
    pub fn remove_folder(&self, id: &str) -> bool {
        let mut entries = self.write();
        let before = entries.folders.len();
        entries.folders.retain(|f| f.id != id);
        entries.routines.retain(|r| r.folder_id.as_deref() != Some(id));
        entries.folders.len() != before
    }

    pub fn insert_routine(&self, id: &str, draft: &RoutineDraft) {
        self.write().routines.push(Routine {
            id: id.to_string(),
            name: draft.name.clone(),
            folder_id: draft.folder_id.clone(),
            owner_id: None,
            is_default: draft.is_default,
            exercises: draft.exercises.clone(),
        });
    }

    pub fn patch_routine(&self, id: &str, patch: &RoutinePatch) -> bool {
        let mut entries = self.write();
        let Some(routine) = entries.routines.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if let Some(name) = &patch.name {
            routine.name.clone_from(name);
        }
        if let Some(folder_id) = &patch.folder_id {
            routine.folder_id = Some(folder_id.clone());
        }
        if let Some(exercises) = &patch.exercises {
            routine.exercises.clone_from(exercises);
        }
        true
    }

    pub fn remove_routine(&self, id: &str) -> bool {
        let mut entries = self.write();
        let before = entries.routines.len();
        entries.routines.retain(|r| r.id != id);
        entries.routines.len() != before
    }

    /// Replace every occurrence of `from` (entity ids and folder references)
    /// with `to`. Returns the number of fields rewritten.
    pub fn replace_id(&self, from: &str, to: &str) -> usize {
        let mut entries = self.write();
        let mut rewritten = 0;

        for folder in entries.folders.iter_mut().filter(|f| f.id == from) {
            folder.id = to.to_string();
            rewritten += 1;
        }
        for routine in &mut entries.routines {
            if routine.id == from {
                routine.id = to.to_string();
                rewritten += 1;
            }
            if routine.folder_id.as_deref() == Some(from) {
                routine.folder_id = Some(to.to_string());
                rewritten += 1;
            }
        }

        rewritten
    }
}
