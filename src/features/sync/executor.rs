//! Operation executors.
//!
//! Each operation kind knows the exact remote calls it needs and the order
//! they must run in. The processor only sees the uniform [`ExecutionResult`].

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::operation::{OperationPayload, SyncOperation};
use super::temp_id::is_temp_id;
use crate::backend::{RemoteError, RemoteStore};
use crate::library::{routine_lines, FolderDraft, FolderPatch, RoutineDraft, RoutinePatch};

/// Result of executing a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Remote write applied; creates report the real id they produced.
    Succeeded { produced_id: Option<String> },
    /// Nothing was sent; the operation is finished anyway.
    Skipped { reason: String },
    /// Attempt failed and may be retried.
    Failed { reason: String },
}

impl ExecutionResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Skipped { .. })
    }
}

#[derive(Debug, Error)]
enum ExecuteError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{field} still references unsynced entity {id}")]
    UnresolvedReference { field: &'static str, id: String },

    #[error("{what} failed at phase {phase} ({step}), possibly partially applied: {source}")]
    Partial {
        what: &'static str,
        phase: u8,
        step: &'static str,
        source: RemoteError,
    },
}

fn phase<T>(
    what: &'static str,
    phase: u8,
    step: &'static str,
    result: Result<T, RemoteError>,
) -> Result<T, ExecuteError> {
    result.map_err(|source| ExecuteError::Partial {
        what,
        phase,
        step,
        source,
    })
}

fn ensure_resolved(field: &'static str, id: Option<&str>) -> Result<(), ExecuteError> {
    match id {
        Some(id) if is_temp_id(id) => Err(ExecuteError::UnresolvedReference {
            field,
            id: id.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Runs queued operations against the remote store.
#[derive(Clone)]
pub struct OperationExecutor {
    remote: Arc<dyn RemoteStore>,
}

impl OperationExecutor {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Execute one operation.
    pub async fn execute(&self, operation: &SyncOperation) -> ExecutionResult {
        if let Some(target) = operation.payload.target_id() {
            if is_temp_id(target) {
                return ExecutionResult::Skipped {
                    reason: format!("target {target} has not been created remotely"),
                };
            }
        }

        match self.dispatch(&operation.payload).await {
            Ok(produced_id) => ExecutionResult::Succeeded { produced_id },
            Err(e) => ExecutionResult::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn dispatch(&self, payload: &OperationPayload) -> Result<Option<String>, ExecuteError> {
        let principal = self
            .remote
            .current_principal()
            .await
            .ok_or(ExecuteError::Unauthenticated)?;

        match payload {
            OperationPayload::CreateFolder(draft) => {
                self.create_folder(&principal, draft).await.map(Some)
            },
            OperationPayload::UpdateFolder { id, patch } => {
                self.update_folder(&principal, id, patch).await.map(|()| None)
            },
            OperationPayload::DeleteFolder { id } => {
                self.delete_folder(&principal, id).await.map(|()| None)
            },
            OperationPayload::CreateRoutine(draft) => {
                self.create_routine(&principal, draft).await.map(Some)
            },
            OperationPayload::UpdateRoutine { id, patch } => {
                self.update_routine(&principal, id, patch).await.map(|()| None)
            },
            OperationPayload::DeleteRoutine { id } => {
                self.delete_routine(&principal, id).await.map(|()| None)
            },
        }
    }

    async fn create_folder(&self, principal: &str, draft: &FolderDraft) -> Result<String, ExecuteError> {
        Ok(self.remote.insert_folder(principal, draft).await?)
    }

    async fn update_folder(
        &self,
        principal: &str,
        id: &str,
        patch: &FolderPatch,
    ) -> Result<(), ExecuteError> {
        Ok(self.remote.update_folder(principal, id, patch).await?)
    }

    /// Line items of every routine in the folder, then the routines, then the folder.
    async fn delete_folder(&self, principal: &str, id: &str) -> Result<(), ExecuteError> {
        const WHAT: &str = "folder delete";

        let routine_ids = phase(
            WHAT,
            1,
            "list routines",
            self.remote.routine_ids_in_folder(principal, id).await,
        )?;
        debug!(folder = id, routines = routine_ids.len(), "cascading folder delete");

        if !routine_ids.is_empty() {
            phase(
                WHAT,
                1,
                "delete routine line items",
                self.remote.delete_routine_lines(principal, &routine_ids).await,
            )?;
        }
        phase(
            WHAT,
            2,
            "delete routines",
            self.remote.delete_routines_in_folder(principal, id).await,
        )?;
        phase(WHAT, 3, "delete folder", self.remote.delete_folder(principal, id).await)
    }

    async fn create_routine(&self, principal: &str, draft: &RoutineDraft) -> Result<String, ExecuteError> {
        ensure_resolved("folder_id", draft.folder_id.as_deref())?;

        let routine_id = self.remote.insert_routine(principal, draft).await?;

        let lines = routine_lines(&draft.exercises);
        if !lines.is_empty() {
            phase(
                "routine create",
                2,
                "insert line items",
                self.remote
                    .insert_routine_lines(principal, &routine_id, &lines)
                    .await,
            )?;
        }

        Ok(routine_id)
    }

    /// Scalar fields first; supplied exercises replace all line items.
    async fn update_routine(
        &self,
        principal: &str,
        id: &str,
        patch: &RoutinePatch,
    ) -> Result<(), ExecuteError> {
        ensure_resolved("folder_id", patch.folder_id.as_deref())?;

        if patch.name.is_some() || patch.folder_id.is_some() {
            self.remote.update_routine(principal, id, patch).await?;
        }

        if let Some(exercises) = &patch.exercises {
            const WHAT: &str = "routine update";
            let ids = [id.to_string()];
            phase(
                WHAT,
                2,
                "delete line items",
                self.remote.delete_routine_lines(principal, &ids).await,
            )?;

            let lines = routine_lines(exercises);
            if !lines.is_empty() {
                phase(
                    WHAT,
                    3,
                    "insert line items",
                    self.remote.insert_routine_lines(principal, id, &lines).await,
                )?;
            }
        }

        Ok(())
    }

    /// Line items, then the routine row.
    async fn delete_routine(&self, principal: &str, id: &str) -> Result<(), ExecuteError> {
        const WHAT: &str = "routine delete";
        let ids = [id.to_string()];

        phase(
            WHAT,
            1,
            "delete line items",
            self.remote.delete_routine_lines(principal, &ids).await,
        )?;
        phase(WHAT, 2, "delete routine", self.remote.delete_routine(principal, id).await)
    }
}
