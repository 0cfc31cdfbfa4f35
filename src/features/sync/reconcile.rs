//! Temporary-to-real id reconciliation.
//!
//! When a create succeeds, every later reference to its temporary id must
//! point at the real one before those operations execute.

use serde::Serialize;
use tracing::info;

use super::queue::SyncQueue;
use super::temp_id::TempId;
use crate::library::LocalLibrary;

/// Counts of fields rewritten by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub queued_fields: usize,
    pub library_fields: usize,
}

/// Rewrite `temp` to `real` in every queued payload and in the local library.
///
/// Idempotent: a second call with the same pair rewrites nothing.
pub fn reconcile(
    queue: &mut SyncQueue,
    library: &LocalLibrary,
    temp: &TempId,
    real: &str,
) -> Reconciliation {
    let result = Reconciliation {
        queued_fields: queue.rewrite_id(temp.as_str(), real),
        library_fields: library.replace_id(temp.as_str(), real),
    };

    info!(
        temp = %temp,
        real,
        queued = result.queued_fields,
        library = result.library_fields,
        "reconciled temporary id"
    );

    result
}
