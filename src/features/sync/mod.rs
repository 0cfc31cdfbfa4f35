//! Offline-first sync of folder and routine writes.
//!
//! Mutations are applied to the [`LocalLibrary`](crate::library::LocalLibrary)
//! immediately and queued as [`SyncOperation`]s. A single drain task replays
//! them against the [`RemoteStore`](crate::backend::RemoteStore) in order:
//! - Temporary ids for entities created offline, rewritten once the real id is known
//! - Bounded retry with a fixed pause between attempts
//! - Ordered multi-step deletes

pub mod executor;
pub mod operation;
mod optimistic;
pub mod processor;
pub mod queue;
pub mod reconcile;
pub mod temp_id;

pub use executor::{ExecutionResult, OperationExecutor};
pub use operation::{OperationKind, OperationPayload, SyncOperation};
pub use processor::{SyncEngine, SyncEvent, SyncStatus};
pub use queue::{FailureOutcome, PendingOperation, SyncQueue};
pub use reconcile::{reconcile, Reconciliation};
pub use temp_id::{is_temp_id, TempId, TEMP_ID_PREFIX};
