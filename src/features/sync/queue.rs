//! In-memory FIFO of pending write intents.
//!
//! The queue itself is plain data; the processor owns it behind a mutex and
//! is the only thing that removes entries.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::operation::{OperationKind, SyncOperation};
use super::temp_id::TempId;

/// Ordered queue of pending operations.
#[derive(Debug, Default)]
pub struct SyncQueue {
    operations: VecDeque<SyncOperation>,
    next_id: u64,
}

/// What happened to the head after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    /// Still at the head, to be retried.
    Retry { retry_count: u32 },
    /// Removed after exceeding the retry cap.
    Dropped(Box<SyncOperation>),
    /// The operation was no longer at the head (queue was cleared).
    Gone,
}

impl SyncQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail, assigning the next sequence number.
    pub fn push(&mut self, mut operation: SyncOperation) -> u64 {
        self.next_id += 1;
        operation.id = self.next_id;
        let id = operation.id;
        self.operations.push_back(operation);
        id
    }

    /// The head operation, without removing it.
    #[must_use]
    pub fn head(&self) -> Option<&SyncOperation> {
        self.operations.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Remove the head if it is still operation `id`.
    pub fn complete_head(&mut self, id: u64) -> Option<SyncOperation> {
        if self.head().is_some_and(|op| op.id == id) {
            self.operations.pop_front()
        } else {
            None
        }
    }

    /// Record a failed attempt of head operation `id`.
    ///
    /// The operation stays at the head while `retry_count <= max_retries`,
    /// giving `max_retries + 1` attempts in total.
    pub fn record_failure(&mut self, id: u64, reason: &str, max_retries: u32) -> FailureOutcome {
        let Some(head) = self.operations.front_mut().filter(|op| op.id == id) else {
            return FailureOutcome::Gone;
        };

        head.retry_count += 1;
        head.last_error = Some(reason.to_string());

        if head.retry_count > max_retries {
            self.operations
                .pop_front()
                .map_or(FailureOutcome::Gone, |op| FailureOutcome::Dropped(Box::new(op)))
        } else {
            FailureOutcome::Retry {
                retry_count: head.retry_count,
            }
        }
    }

    /// Rewrite `from` to `to` in every queued payload. Returns fields rewritten.
    pub fn rewrite_id(&mut self, from: &str, to: &str) -> usize {
        self.operations
            .iter_mut()
            .map(|op| op.payload.rewrite_id(from, to))
            .sum()
    }

    /// Drop every queued operation. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.operations.len();
        self.operations.clear();
        count
    }

    /// Summaries of every queued operation, head first.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingOperation> {
        self.operations.iter().map(PendingOperation::from).collect()
    }
}

/// Status view of a queued operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOperation {
    pub id: u64,
    pub kind: OperationKind,
    pub target_id: Option<String>,
    pub correlation_id: Option<TempId>,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl From<&SyncOperation> for PendingOperation {
    fn from(op: &SyncOperation) -> Self {
        Self {
            id: op.id,
            kind: op.kind(),
            target_id: op.payload.target_id().map(String::from),
            correlation_id: op.correlation_id.clone(),
            retry_count: op.retry_count,
            enqueued_at: op.enqueued_at,
            last_error: op.last_error.clone(),
        }
    }
}
