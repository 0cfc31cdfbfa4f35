//! Optimistic mutations.
//!
//! Each call updates the local library first and then enqueues the remote
//! write. None of them wait on the network.

use tracing::debug;

use super::operation::OperationPayload;
use super::processor::SyncEngine;
use super::temp_id::TempId;
use crate::library::{FolderDraft, FolderPatch, RoutineDraft, RoutinePatch};

impl SyncEngine {
    /// Show the folder under a fresh temporary id and queue its creation.
    pub fn create_folder_optimistic(&self, draft: FolderDraft) -> TempId {
        let temp = TempId::mint();
        self.library().insert_folder(temp.as_str(), &draft);
        self.enqueue(OperationPayload::CreateFolder(draft), Some(temp.clone()));
        temp
    }

    /// Returns the queued operation's sequence number.
    pub fn update_folder_optimistic(&self, id: &str, patch: FolderPatch) -> u64 {
        if !self.library().patch_folder(id, &patch) {
            debug!(folder = id, "update for folder not in local library");
        }
        self.enqueue(
            OperationPayload::UpdateFolder {
                id: id.to_string(),
                patch,
            },
            None,
        )
    }

    /// Removes the folder and its routines locally; the remote cascade runs later.
    pub fn delete_folder_optimistic(&self, id: &str) -> u64 {
        if !self.library().remove_folder(id) {
            debug!(folder = id, "delete for folder not in local library");
        }
        self.enqueue(OperationPayload::DeleteFolder { id: id.to_string() }, None)
    }

    pub fn create_routine_optimistic(&self, draft: RoutineDraft) -> TempId {
        let temp = TempId::mint();
        self.library().insert_routine(temp.as_str(), &draft);
        self.enqueue(OperationPayload::CreateRoutine(draft), Some(temp.clone()));
        temp
    }

    pub fn update_routine_optimistic(&self, id: &str, patch: RoutinePatch) -> u64 {
        if !self.library().patch_routine(id, &patch) {
            debug!(routine = id, "update for routine not in local library");
        }
        self.enqueue(
            OperationPayload::UpdateRoutine {
                id: id.to_string(),
                patch,
            },
            None,
        )
    }

    pub fn delete_routine_optimistic(&self, id: &str) -> u64 {
        if !self.library().remove_routine(id) {
            debug!(routine = id, "delete for routine not in local library");
        }
        self.enqueue(OperationPayload::DeleteRoutine { id: id.to_string() }, None)
    }
}
