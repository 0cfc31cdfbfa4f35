//! The remote data service seam.
//!
//! The sync engine only ever talks to the backend through [`RemoteStore`].
//! Every call is scoped to the principal returned by
//! [`RemoteStore::current_principal`]; callers must never pass a temporary
//! identifier to any method here.

use async_trait::async_trait;
use thiserror::Error;

use crate::library::{FolderDraft, FolderPatch, RoutineDraft, RoutineLine, RoutinePatch};

/// Failure reported by the remote data service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport or service failure.
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request.
    #[error("Remote rejected request: {0}")]
    Rejected(String),

    /// The addressed row does not exist for this principal.
    #[error("Remote row not found: {0}")]
    NotFound(String),
}

/// Parameterized writes against the `folders` and `routines` relations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The currently authenticated principal, if any.
    async fn current_principal(&self) -> Option<String>;

    /// Insert a folder and return its real id.
    async fn insert_folder(&self, principal: &str, folder: &FolderDraft) -> Result<String, RemoteError>;

    async fn update_folder(
        &self,
        principal: &str,
        folder_id: &str,
        patch: &FolderPatch,
    ) -> Result<(), RemoteError>;

    async fn delete_folder(&self, principal: &str, folder_id: &str) -> Result<(), RemoteError>;

    /// Ids of every routine filed under `folder_id`.
    async fn routine_ids_in_folder(
        &self,
        principal: &str,
        folder_id: &str,
    ) -> Result<Vec<String>, RemoteError>;

    /// Insert a routine row (without line items) and return its real id.
    async fn insert_routine(&self, principal: &str, routine: &RoutineDraft) -> Result<String, RemoteError>;

    /// Update the routine row's scalar fields. Line items are not touched.
    async fn update_routine(
        &self,
        principal: &str,
        routine_id: &str,
        patch: &RoutinePatch,
    ) -> Result<(), RemoteError>;

    async fn delete_routine(&self, principal: &str, routine_id: &str) -> Result<(), RemoteError>;

    /// Delete every routine filed under `folder_id`.
    async fn delete_routines_in_folder(&self, principal: &str, folder_id: &str) -> Result<(), RemoteError>;

    async fn insert_routine_lines(
        &self,
        principal: &str,
        routine_id: &str,
        lines: &[RoutineLine],
    ) -> Result<(), RemoteError>;

    /// Delete all line items belonging to the given routines.
    async fn delete_routine_lines(&self, principal: &str, routine_ids: &[String]) -> Result<(), RemoteError>;
}
