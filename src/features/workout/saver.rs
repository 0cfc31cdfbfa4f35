//! Debounced snapshot writes.
//!
//! Rapid edits (typing a weight) go through [`DebouncedSaver::debounced_save`]
//! and collapse into one write after a quiet window. Structural edits use
//! [`DebouncedSaver::immediate_save`], which also retires any pending timer
//! so an older payload can never land on top of a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::session::WorkoutSession;
use super::storage::SessionStore;
use crate::error::RepsyncError;

struct PendingSave {
    generation: u64,
    session: WorkoutSession,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    pending: Option<PendingSave>,
    generation: u64,
}

impl Slot {
    fn take_pending(&mut self) -> Option<PendingSave> {
        let pending = self.pending.take()?;
        pending.timer.abort();
        Some(pending)
    }
}

struct Shared {
    slot: Mutex<Slot>,
    store: SessionStore,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer expiry: write the pending payload if it is still the latest.
    fn fire(&self, generation: u64) {
        let mut slot = self.lock();
        if slot.pending.as_ref().map(|p| p.generation) != Some(generation) {
            return;
        }
        let Some(pending) = slot.pending.take() else {
            return;
        };

        // Written under the lock so an immediate save cannot interleave.
        match self.store.save(&pending.session) {
            Ok(()) => debug!(generation, "debounced workout save written"),
            Err(e) => error!(error = %e, "debounced workout save failed"),
        }
    }
}

/// Coalesces workout snapshot writes.
#[derive(Clone)]
pub struct DebouncedSaver {
    shared: Arc<Shared>,
    window: Duration,
    runtime: Handle,
}

impl DebouncedSaver {
    /// Create a saver bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn new(store: SessionStore, window: Duration) -> Result<Self, RepsyncError> {
        let runtime = Handle::try_current()
            .map_err(|e| RepsyncError::Runtime(format!("debounced saver needs a tokio runtime: {e}")))?;

        Ok(Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::default()),
                store,
            }),
            window,
            runtime,
        })
    }

    /// Schedule a write of `session` after the quiet window.
    ///
    /// Replaces any pending payload and restarts the window.
    pub fn debounced_save(&self, session: &WorkoutSession) {
        let mut slot = self.shared.lock();
        slot.take_pending();
        slot.generation += 1;
        let generation = slot.generation;

        let shared = Arc::clone(&self.shared);
        let window = self.window;
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            shared.fire(generation);
        });

        slot.pending = Some(PendingSave {
            generation,
            session: session.clone(),
            timer,
        });
    }

    /// Cancel any pending write and persist `session` now.
    pub fn immediate_save(&self, session: &WorkoutSession) -> Result<(), RepsyncError> {
        let mut slot = self.shared.lock();
        slot.take_pending();
        slot.generation += 1;
        self.shared.store.save(session)
    }

    /// Drop the pending write, if any. Returns whether one was pending.
    pub fn cancel_pending_saves(&self) -> bool {
        self.shared.lock().take_pending().is_some()
    }

    #[must_use]
    pub fn has_pending_saves(&self) -> bool {
        self.shared.lock().pending.is_some()
    }

    /// Write the pending payload now instead of waiting for the window.
    ///
    /// Returns whether anything was written.
    pub fn flush_pending_saves(&self) -> Result<bool, RepsyncError> {
        let mut slot = self.shared.lock();
        let Some(pending) = slot.take_pending() else {
            return Ok(false);
        };
        self.shared.store.save(&pending.session)?;
        Ok(true)
    }

    /// Cancel any pending write and remove the active snapshot.
    pub fn clear(&self) -> Result<bool, RepsyncError> {
        let mut slot = self.shared.lock();
        slot.take_pending();
        slot.generation += 1;
        self.shared.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::storage::KeyValueStore;

    /// Key-value store that counts writes.
    #[derive(Default)]
    struct CountingStore {
        values: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, RepsyncError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), RepsyncError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.values.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<bool, RepsyncError> {
            Ok(self.values.lock().unwrap().remove(key).is_some())
        }
    }

    const WINDOW: Duration = Duration::from_millis(500);

    fn saver() -> (DebouncedSaver, SessionStore, Arc<CountingStore>) {
        let kv = Arc::new(CountingStore::default());
        let store = SessionStore::new(kv.clone());
        (DebouncedSaver::new(store.clone(), WINDOW).unwrap(), store, kv)
    }

    fn session_with_notes(notes: &str) -> WorkoutSession {
        WorkoutSession::new(Some(notes.to_string()))
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[test]
    fn test_new_outside_runtime_is_error() {
        let store = SessionStore::new(Arc::new(CountingStore::default()));
        assert!(DebouncedSaver::new(store, WINDOW).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_payload() {
        let (saver, store, kv) = saver();

        for i in 0..10 {
            saver.debounced_save(&session_with_notes(&format!("v{i}")));
            advance(Duration::from_millis(50)).await;
        }
        assert!(saver.has_pending_saves());
        assert_eq!(kv.writes.load(Ordering::SeqCst), 0);

        advance(WINDOW).await;

        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().unwrap().notes.as_deref(), Some("v9"));
        assert!(!saver.has_pending_saves());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_restarts_on_each_call() {
        let (saver, _, kv) = saver();

        saver.debounced_save(&session_with_notes("a"));
        advance(Duration::from_millis(400)).await;
        saver.debounced_save(&session_with_notes("b"));
        advance(Duration::from_millis(400)).await;

        assert_eq!(kv.writes.load(Ordering::SeqCst), 0);
        advance(Duration::from_millis(200)).await;
        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_save_supersedes_pending() {
        let (saver, store, kv) = saver();

        saver.debounced_save(&session_with_notes("stale"));
        saver.immediate_save(&session_with_notes("fresh")).unwrap();
        assert!(!saver.has_pending_saves());

        advance(WINDOW * 2).await;

        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().unwrap().notes.as_deref(), Some("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_save_restarts_window_for_next_burst() {
        let (saver, store, kv) = saver();

        saver.debounced_save(&session_with_notes("typing"));
        advance(Duration::from_millis(300)).await;
        saver.immediate_save(&session_with_notes("structural")).unwrap();
        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().unwrap().notes.as_deref(), Some("structural"));

        for i in 0..5 {
            saver.debounced_save(&session_with_notes(&format!("burst{i}")));
            advance(Duration::from_millis(100)).await;
        }
        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);

        advance(WINDOW).await;

        assert_eq!(kv.writes.load(Ordering::SeqCst), 2);
        assert_eq!(store.load().unwrap().notes.as_deref(), Some("burst4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_saves() {
        let (saver, store, kv) = saver();

        assert!(!saver.cancel_pending_saves());
        saver.debounced_save(&session_with_notes("x"));
        assert!(saver.cancel_pending_saves());

        advance(WINDOW * 2).await;
        assert_eq!(kv.writes.load(Ordering::SeqCst), 0);
        assert!(store.load().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_leaves_key_absent_despite_pending() {
        let (saver, store, _) = saver();
        saver.immediate_save(&session_with_notes("saved")).unwrap();
        saver.debounced_save(&session_with_notes("pending"));

        assert!(saver.clear().unwrap());
        advance(WINDOW * 2).await;

        assert!(store.load().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_pending_saves_writes_now() {
        let (saver, store, kv) = saver();

        assert!(!saver.flush_pending_saves().unwrap());
        saver.debounced_save(&session_with_notes("late"));
        assert!(saver.flush_pending_saves().unwrap());
        assert_eq!(store.load().unwrap().notes.as_deref(), Some("late"));

        advance(WINDOW * 2).await;
        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
    }
}
