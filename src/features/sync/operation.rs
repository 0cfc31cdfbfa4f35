//! Operation types for the sync queue.
//!
//! Each queued write intent carries a typed payload; the payload variant is
//! the operation kind, so dispatch is checked for exhaustiveness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::temp_id::TempId;
use crate::library::{FolderDraft, FolderPatch, RoutineDraft, RoutinePatch};

/// Operation kinds that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateFolder,
    UpdateFolder,
    DeleteFolder,
    CreateRoutine,
    UpdateRoutine,
    DeleteRoutine,
}

impl OperationKind {
    /// Get the display name for this operation kind.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::CreateFolder => "Create Folder",
            Self::UpdateFolder => "Update Folder",
            Self::DeleteFolder => "Delete Folder",
            Self::CreateRoutine => "Create Routine",
            Self::UpdateRoutine => "Update Routine",
            Self::DeleteRoutine => "Delete Routine",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Payload of a queued operation, one variant per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum OperationPayload {
    CreateFolder(FolderDraft),
    UpdateFolder { id: String, patch: FolderPatch },
    DeleteFolder { id: String },
    CreateRoutine(RoutineDraft),
    UpdateRoutine { id: String, patch: RoutinePatch },
    DeleteRoutine { id: String },
}

impl OperationPayload {
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::CreateFolder(_) => OperationKind::CreateFolder,
            Self::UpdateFolder { .. } => OperationKind::UpdateFolder,
            Self::DeleteFolder { .. } => OperationKind::DeleteFolder,
            Self::CreateRoutine(_) => OperationKind::CreateRoutine,
            Self::UpdateRoutine { .. } => OperationKind::UpdateRoutine,
            Self::DeleteRoutine { .. } => OperationKind::DeleteRoutine,
        }
    }

    /// The id of the existing entity this operation targets, if any.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::CreateFolder(_) | Self::CreateRoutine(_) => None,
            Self::UpdateFolder { id, .. }
            | Self::DeleteFolder { id }
            | Self::UpdateRoutine { id, .. }
            | Self::DeleteRoutine { id } => Some(id),
        }
    }

    /// Rewrite every id field equal to `from` into `to`.
    ///
    /// Covers targets and folder references. Returns the number of fields
    /// rewritten.
    pub fn rewrite_id(&mut self, from: &str, to: &str) -> usize {
        let mut rewritten = 0;
        let mut swap = |field: &mut String| {
            if field == from {
                *field = to.to_string();
                rewritten += 1;
            }
        };

        match self {
            Self::CreateFolder(_) => {},
            Self::CreateRoutine(draft) => {
                if let Some(folder_id) = draft.folder_id.as_mut() {
                    swap(folder_id);
                }
            },
            Self::UpdateFolder { id, .. } | Self::DeleteFolder { id } | Self::DeleteRoutine { id } => {
                swap(id);
            },
            Self::UpdateRoutine { id, patch } => {
                swap(id);
                if let Some(folder_id) = patch.folder_id.as_mut() {
                    swap(folder_id);
                }
            },
        }

        rewritten
    }
}

/// A queued operation with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    /// Sequence number assigned at enqueue; strictly increasing.
    pub id: u64,
    pub payload: OperationPayload,
    /// Failed attempts so far. Never decreases.
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Temporary id of the entity a create operation will produce.
    pub correlation_id: Option<TempId>,
    pub last_error: Option<String>,
}

impl SyncOperation {
    /// Create a fresh operation. The queue assigns the sequence number.
    #[must_use]
    pub fn new(payload: OperationPayload, correlation_id: Option<TempId>) -> Self {
        Self {
            id: 0,
            payload,
            retry_count: 0,
            enqueued_at: Utc::now(),
            correlation_id,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine_draft(folder_id: Option<&str>) -> RoutineDraft {
        RoutineDraft {
            name: "Upper".to_string(),
            folder_id: folder_id.map(String::from),
            is_default: false,
            exercises: Vec::new(),
        }
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OperationKind::CreateFolder.display_name(), "Create Folder");
        assert_eq!(OperationKind::DeleteRoutine.to_string(), "Delete Routine");
    }

    #[test]
    fn test_target_id() {
        let create = OperationPayload::CreateFolder(FolderDraft::named("Push"));
        assert!(create.target_id().is_none());

        let delete = OperationPayload::DeleteRoutine { id: "r9".to_string() };
        assert_eq!(delete.target_id(), Some("r9"));
        assert_eq!(delete.kind(), OperationKind::DeleteRoutine);
    }

    #[test]
    fn test_rewrite_id_in_create_routine() {
        let mut payload = OperationPayload::CreateRoutine(routine_draft(Some("temp_f")));

        assert_eq!(payload.rewrite_id("temp_f", "real-f"), 1);
        let OperationPayload::CreateRoutine(draft) = &payload else {
            panic!("kind changed");
        };
        assert_eq!(draft.folder_id.as_deref(), Some("real-f"));

        // Already rewritten
        assert_eq!(payload.rewrite_id("temp_f", "real-f"), 0);
    }

    #[test]
    fn test_rewrite_id_in_update_routine_covers_target_and_folder() {
        let mut payload = OperationPayload::UpdateRoutine {
            id: "temp_x".to_string(),
            patch: RoutinePatch {
                folder_id: Some("temp_x".to_string()),
                ..RoutinePatch::default()
            },
        };
        assert_eq!(payload.rewrite_id("temp_x", "9"), 2);
        assert_eq!(payload.target_id(), Some("9"));
    }

    #[test]
    fn test_rewrite_id_ignores_unrelated() {
        let mut payload = OperationPayload::DeleteFolder { id: "temp_a".to_string() };
        assert_eq!(payload.rewrite_id("temp_b", "1"), 0);
        assert_eq!(payload.target_id(), Some("temp_a"));
    }

    #[test]
    fn test_payload_serialization_is_tagged() {
        let payload = OperationPayload::DeleteFolder { id: "f1".to_string() };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"kind":"delete_folder","data":{"id":"f1"}}"#);
    }

    #[test]
    fn test_new_operation_defaults() {
        let op = SyncOperation::new(
            OperationPayload::CreateFolder(FolderDraft::named("Legs")),
            Some(TempId::mint()),
        );
        assert_eq!(op.retry_count, 0);
        assert_eq!(op.kind(), OperationKind::CreateFolder);
        assert!(op.correlation_id.is_some());
        assert!(op.last_error.is_none());
    }
}
