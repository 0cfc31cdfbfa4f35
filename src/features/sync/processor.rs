//! Single-worker queue drain.
//!
//! Enqueueing never waits on the network. The first enqueue on an idle
//! engine spawns one drain task; that task executes the head, retires or
//! retries it, and exits when the queue is empty. At most one operation is
//! ever in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, error, info, warn};

use super::executor::{ExecutionResult, OperationExecutor};
use super::operation::{OperationKind, OperationPayload, SyncOperation};
use super::queue::{FailureOutcome, PendingOperation, SyncQueue};
use super::reconcile::reconcile;
use super::temp_id::TempId;
use crate::backend::RemoteStore;
use crate::config::SyncConfig;
use crate::error::RepsyncError;
use crate::library::LocalLibrary;

const EVENT_CAPACITY: usize = 256;

/// Progress notifications from the drain task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    Completed {
        id: u64,
        kind: OperationKind,
        produced_id: Option<String>,
    },
    Skipped {
        id: u64,
        kind: OperationKind,
        reason: String,
    },
    Retrying {
        id: u64,
        kind: OperationKind,
        retry_count: u32,
        reason: String,
    },
    /// Removed after exceeding the retry cap. The write is lost.
    Dropped {
        id: u64,
        kind: OperationKind,
        retry_count: u32,
        reason: String,
    },
    Reconciled {
        temp_id: TempId,
        real_id: String,
    },
}

/// Snapshot of the queue for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub queue_length: usize,
    pub is_processing: bool,
    pub pending_operations: Vec<PendingOperation>,
}

#[derive(Debug, Default)]
struct State {
    queue: SyncQueue,
    processing: bool,
}

struct Inner {
    state: Mutex<State>,
    executor: OperationExecutor,
    library: LocalLibrary,
    events: broadcast::Sender<SyncEvent>,
    idle: Notify,
    max_retries: u32,
    retry_pause: Duration,
    runtime: Handle,
}

/// Handle to the sync engine. Clones share the same queue.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl SyncEngine {
    /// Create an engine bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn new(remote: Arc<dyn RemoteStore>, config: &SyncConfig) -> Result<Self, RepsyncError> {
        let runtime = Handle::try_current()
            .map_err(|e| RepsyncError::Runtime(format!("sync engine needs a tokio runtime: {e}")))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                executor: OperationExecutor::new(remote),
                library: LocalLibrary::new(),
                events,
                idle: Notify::new(),
                max_retries: config.max_retries,
                retry_pause: config.retry_pause(),
                runtime,
            }),
        })
    }

    /// The optimistic local view.
    #[must_use]
    pub fn library(&self) -> &LocalLibrary {
        &self.inner.library
    }

    /// Receive progress events. Only events sent after subscribing arrive.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Append an operation and start the drain if idle. Returns its sequence number.
    pub(crate) fn enqueue(&self, payload: OperationPayload, correlation_id: Option<TempId>) -> u64 {
        let kind = payload.kind();
        let (id, start) = {
            let mut state = self.inner.lock();
            let id = state.queue.push(SyncOperation::new(payload, correlation_id));
            let start = !state.processing;
            state.processing = true;
            (id, start)
        };

        debug!(id, %kind, "enqueued operation");
        if start {
            self.spawn_drain();
        }
        id
    }

    /// Start draining if operations are queued and no drain is running.
    ///
    /// Returns whether a drain was started.
    pub fn force_sync_now(&self) -> bool {
        let start = {
            let mut state = self.inner.lock();
            let start = !state.processing && !state.queue.is_empty();
            if start {
                state.processing = true;
            }
            start
        };

        if start {
            self.spawn_drain();
        }
        start
    }

    /// Drop every queued operation without executing it.
    ///
    /// An operation already in flight finishes, but is not retried.
    pub fn clear_sync_queue(&self) -> usize {
        let cleared = self.inner.lock().queue.clear();
        if cleared > 0 {
            warn!(cleared, "sync queue cleared; queued writes discarded");
        }
        cleared
    }

    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        let state = self.inner.lock();
        SyncStatus {
            queue_length: state.queue.len(),
            is_processing: state.processing,
            pending_operations: state.queue.pending(),
        }
    }

    /// Wait until no drain is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.inner.lock().processing {
                return;
            }
            notified.await;
        }
    }

    /// Drain whatever is queued and wait for it to finish.
    pub async fn flush(&self) -> SyncStatus {
        self.force_sync_now();
        self.wait_idle().await;
        self.sync_status()
    }

    fn spawn_drain(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move { inner.drain().await });
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SyncEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    async fn drain(&self) {
        loop {
            let next = {
                let mut state = self.lock();
                let next = state.queue.head().cloned();
                if next.is_none() {
                    state.processing = false;
                }
                next
            };

            let Some(operation) = next else {
                debug!("sync queue drained");
                self.idle.notify_waiters();
                return;
            };

            let result = self.executor.execute(&operation).await;
            self.settle(&operation, result).await;
        }
    }

    async fn settle(&self, operation: &SyncOperation, result: ExecutionResult) {
        let id = operation.id;
        let kind = operation.kind();

        match result {
            ExecutionResult::Succeeded { produced_id } => {
                let reconciled = {
                    let mut state = self.lock();
                    state.queue.complete_head(id);
                    match (&operation.correlation_id, &produced_id) {
                        (Some(temp), Some(real)) => {
                            reconcile(&mut state.queue, &self.library, temp, real);
                            Some((temp.clone(), real.clone()))
                        },
                        _ => None,
                    }
                };

                info!(id, %kind, produced_id = produced_id.as_deref(), "operation synced");
                self.emit(SyncEvent::Completed {
                    id,
                    kind,
                    produced_id,
                });
                if let Some((temp_id, real_id)) = reconciled {
                    self.emit(SyncEvent::Reconciled { temp_id, real_id });
                }
            },
            ExecutionResult::Skipped { reason } => {
                self.lock().queue.complete_head(id);
                warn!(id, %kind, %reason, "operation skipped");
                self.emit(SyncEvent::Skipped { id, kind, reason });
            },
            ExecutionResult::Failed { reason } => {
                let outcome = self.lock().queue.record_failure(id, &reason, self.max_retries);
                match outcome {
                    FailureOutcome::Retry { retry_count } => {
                        warn!(id, %kind, retry_count, %reason, "operation failed, will retry");
                        self.emit(SyncEvent::Retrying {
                            id,
                            kind,
                            retry_count,
                            reason,
                        });
                        tokio::time::sleep(self.retry_pause).await;
                    },
                    FailureOutcome::Dropped(dropped) => {
                        error!(
                            id,
                            %kind,
                            retry_count = dropped.retry_count,
                            %reason,
                            "operation dropped after exhausting retries"
                        );
                        self.emit(SyncEvent::Dropped {
                            id,
                            kind,
                            retry_count: dropped.retry_count,
                            reason,
                        });
                    },
                    FailureOutcome::Gone => {
                        debug!(id, %kind, "failed operation was cleared from the queue");
                    },
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::backend::RemoteError;
    use crate::library::{FolderDraft, FolderPatch, RoutineDraft, RoutineLine, RoutinePatch};

    /// Remote that records every call and can be told to fail.
    #[derive(Default)]
    struct RecordingRemote {
        calls: Mutex<Vec<String>>,
        failures_remaining: AtomicU32,
        next_id: AtomicU32,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        latency: Duration,
        signed_out: bool,
    }

    impl RecordingRemote {
        fn failing(times: u32) -> Self {
            Self {
                failures_remaining: AtomicU32::new(times),
                ..Self::default()
            }
        }

        fn slow(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn call(&self, entry: String) -> Result<(), RemoteError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(entry);
            let failing = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                Err(RemoteError::Unavailable("offline".to_string()))
            } else {
                Ok(())
            }
        }

        fn mint(&self, prefix: &str) -> String {
            format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[async_trait]
    impl RemoteStore for RecordingRemote {
        async fn current_principal(&self) -> Option<String> {
            (!self.signed_out).then(|| "user-1".to_string())
        }

        async fn insert_folder(&self, _: &str, folder: &FolderDraft) -> Result<String, RemoteError> {
            self.call(format!("insert_folder {}", folder.name)).await?;
            Ok(self.mint("f"))
        }

        async fn update_folder(&self, _: &str, id: &str, _: &FolderPatch) -> Result<(), RemoteError> {
            self.call(format!("update_folder {id}")).await
        }

        async fn delete_folder(&self, _: &str, id: &str) -> Result<(), RemoteError> {
            self.call(format!("delete_folder {id}")).await
        }

        async fn routine_ids_in_folder(&self, _: &str, id: &str) -> Result<Vec<String>, RemoteError> {
            self.call(format!("routine_ids_in_folder {id}")).await?;
            Ok(Vec::new())
        }

        async fn insert_routine(&self, _: &str, routine: &RoutineDraft) -> Result<String, RemoteError> {
            self.call(format!(
                "insert_routine {} folder={}",
                routine.name,
                routine.folder_id.as_deref().unwrap_or("-")
            ))
            .await?;
            Ok(self.mint("r"))
        }

        async fn update_routine(&self, _: &str, id: &str, _: &RoutinePatch) -> Result<(), RemoteError> {
            self.call(format!("update_routine {id}")).await
        }

        async fn delete_routine(&self, _: &str, id: &str) -> Result<(), RemoteError> {
            self.call(format!("delete_routine {id}")).await
        }

        async fn delete_routines_in_folder(&self, _: &str, id: &str) -> Result<(), RemoteError> {
            self.call(format!("delete_routines_in_folder {id}")).await
        }

        async fn insert_routine_lines(
            &self,
            _: &str,
            id: &str,
            lines: &[RoutineLine],
        ) -> Result<(), RemoteError> {
            self.call(format!("insert_routine_lines {id} x{}", lines.len())).await
        }

        async fn delete_routine_lines(&self, _: &str, ids: &[String]) -> Result<(), RemoteError> {
            self.call(format!("delete_routine_lines {}", ids.join(","))).await
        }
    }

    fn engine(remote: &Arc<RecordingRemote>) -> SyncEngine {
        SyncEngine::new(Arc::clone(remote) as Arc<dyn RemoteStore>, &SyncConfig::default()).unwrap()
    }

    fn create_folder(name: &str) -> OperationPayload {
        OperationPayload::CreateFolder(FolderDraft::named(name))
    }

    #[test]
    fn test_new_outside_runtime_is_error() {
        let remote: Arc<dyn RemoteStore> = Arc::new(RecordingRemote::default());
        let result = SyncEngine::new(remote, &SyncConfig::default());
        assert!(matches!(result, Err(RepsyncError::Runtime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drains_in_enqueue_order() {
        let remote = Arc::new(RecordingRemote::default());
        let engine = engine(&remote);

        for name in ["a", "b", "c", "d"] {
            engine.enqueue(create_folder(name), None);
        }
        engine.wait_idle().await;

        assert_eq!(
            remote.calls(),
            vec![
                "insert_folder a",
                "insert_folder b",
                "insert_folder c",
                "insert_folder d"
            ]
        );
        let status = engine.sync_status();
        assert_eq!(status.queue_length, 0);
        assert!(!status.is_processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_enqueues_keep_one_in_flight() {
        let remote = Arc::new(RecordingRemote::slow(Duration::from_millis(250)));
        let engine = engine(&remote);

        let mut tasks = Vec::new();
        for i in 0..6 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                // Uneven yields so submission order differs from spawn order.
                for _ in 0..(6 - i) % 3 {
                    tokio::task::yield_now().await;
                }
                let name = format!("f{i}");
                (engine.enqueue(create_folder(&name), None), name)
            }));
        }
        let mut submitted = Vec::new();
        for task in tasks {
            submitted.push(task.await.unwrap());
        }
        engine.wait_idle().await;

        assert_eq!(remote.max_in_flight.load(Ordering::SeqCst), 1);

        submitted.sort_unstable_by_key(|(id, _)| *id);
        let expected: Vec<String> = submitted
            .iter()
            .map(|(_, name)| format!("insert_folder {name}"))
            .collect();
        assert_eq!(remote.calls(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_pending_while_processing() {
        let remote = Arc::new(RecordingRemote::slow(Duration::from_secs(1)));
        let engine = engine(&remote);

        engine.enqueue(create_folder("a"), None);
        engine.enqueue(create_folder("b"), None);

        let status = engine.sync_status();
        assert!(status.is_processing);
        assert_eq!(status.queue_length, 2);
        assert_eq!(status.pending_operations[0].kind, OperationKind::CreateFolder);

        let status = engine.flush().await;
        assert_eq!(status.queue_length, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_routine_in_temp_folder_reaches_remote_with_real_id() {
        let remote = Arc::new(RecordingRemote::default());
        let engine = engine(&remote);

        let folder = engine.create_folder_optimistic(FolderDraft::named("Push"));
        engine.create_routine_optimistic(RoutineDraft {
            name: "Bench day".to_string(),
            folder_id: Some(folder.to_string()),
            is_default: false,
            exercises: Vec::new(),
        });
        engine.wait_idle().await;

        assert_eq!(
            remote.calls(),
            vec!["insert_folder Push", "insert_routine Bench day folder=f-1"]
        );
        assert!(engine.library().folder("f-1").is_some());
        assert_eq!(engine.library().routines()[0].id, "r-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_three_failures() {
        let remote = Arc::new(RecordingRemote::failing(3));
        let engine = engine(&remote);
        let mut events = engine.subscribe();

        engine.enqueue(create_folder("a"), None);
        engine.wait_idle().await;

        assert_eq!(remote.calls().len(), 4);
        for expected in 1..=3 {
            let event = events.recv().await.unwrap();
            assert!(
                matches!(event, SyncEvent::Retrying { retry_count, .. } if retry_count == expected)
            );
        }
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::Completed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drops_after_fourth_failure_and_continues() {
        let remote = Arc::new(RecordingRemote::failing(4));
        let engine = engine(&remote);
        let mut events = engine.subscribe();

        engine.enqueue(create_folder("doomed"), None);
        engine.enqueue(create_folder("next"), None);
        engine.wait_idle().await;

        let calls = remote.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[4], "insert_folder next");

        let mut dropped = None;
        while let Ok(event) = events.try_recv() {
            if let SyncEvent::Dropped { retry_count, .. } = event {
                dropped = Some(retry_count);
            }
        }
        assert_eq!(dropped, Some(4));
        assert_eq!(engine.sync_status().queue_length, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_pause_between_attempts() {
        let remote = Arc::new(RecordingRemote::failing(2));
        let engine = engine(&remote);

        let started = tokio::time::Instant::now();
        engine.enqueue(create_folder("a"), None);
        engine.wait_idle().await;

        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_temp_targets_are_skipped_without_remote_calls() {
        let remote = Arc::new(RecordingRemote::default());
        let engine = engine(&remote);
        let mut events = engine.subscribe();

        let temp = TempId::mint();
        engine.enqueue(
            OperationPayload::UpdateRoutine {
                id: temp.to_string(),
                patch: RoutinePatch::rename("x"),
            },
            None,
        );
        engine.enqueue(OperationPayload::DeleteRoutine { id: temp.to_string() }, None);
        engine.wait_idle().await;

        assert!(remote.calls().is_empty());
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::Skipped { .. }));
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::Skipped { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_operations_retry_then_drop() {
        let remote = Arc::new(RecordingRemote {
            signed_out: true,
            ..RecordingRemote::default()
        });
        let engine = engine(&remote);
        let mut events = engine.subscribe();

        engine.enqueue(create_folder("a"), None);
        engine.wait_idle().await;

        assert!(remote.calls().is_empty());
        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(SyncEvent::Dropped { reason, .. }) if reason == "not authenticated"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_sync_queue_discards_pending() {
        let remote = Arc::new(RecordingRemote::slow(Duration::from_secs(5)));
        let engine = engine(&remote);

        engine.enqueue(create_folder("a"), None);
        engine.enqueue(create_folder("b"), None);
        engine.enqueue(create_folder("c"), None);
        tokio::task::yield_now().await;

        assert_eq!(engine.clear_sync_queue(), 3);
        engine.wait_idle().await;

        // Only the operation already in flight reached the remote.
        assert_eq!(remote.calls(), vec!["insert_folder a"]);
        assert_eq!(engine.sync_status().queue_length, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_sync_now_when_idle_and_empty() {
        let remote = Arc::new(RecordingRemote::default());
        let engine = engine(&remote);

        assert!(!engine.force_sync_now());
        engine.wait_idle().await;
        assert!(!engine.sync_status().is_processing);
    }
}
