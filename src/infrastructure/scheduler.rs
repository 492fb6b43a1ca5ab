//! Deferred callbacks.
//!
//! Delayed work (reconnect attempts, watchdogs, UI refreshes) is scheduled
//! through [`DeferredCallbacks`] and addressed by a numeric handle. Pending
//! callbacks can hold clones of device objects. Recovery clears a bounded
//! range of handles to release them. That cleanup is a heuristic: handles
//! outside the range survive, and an empty range is not an error.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle(pub u64);

pub struct DeferredCallbacks {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl DeferredCallbacks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Run `callback` after `delay` on the current tokio runtime.
    pub fn schedule<F>(self: &Arc<Self>, delay: Duration, callback: F) -> CallbackHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry: Weak<Self> = Arc::downgrade(self);

        // Hold the lock across spawn so the task cannot deregister itself
        // before it is inserted.
        let mut pending = self.lock();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Deregister before running so a panicking callback leaves no
            // stale handle behind.
            if let Some(registry) = registry.upgrade() {
                registry.lock().remove(&id);
            }
            callback();
        });
        pending.insert(id, task);
        trace!("Scheduled deferred callback #{} in {:?}", id, delay);

        CallbackHandle(id)
    }

    /// Cancel a pending callback. Returns `false` if it already ran or was
    /// cancelled.
    pub fn cancel(&self, handle: CallbackHandle) -> bool {
        match self.lock().remove(&handle.0) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending callback whose handle falls in `range`.
    pub fn clear_range(&self, range: RangeInclusive<u64>) -> usize {
        let mut pending = self.lock();
        let ids: Vec<u64> = pending
            .keys()
            .copied()
            .filter(|id| range.contains(id))
            .collect();
        for id in &ids {
            if let Some(task) = pending.remove(id) {
                task.abort();
            }
        }
        debug!(
            "Cleared {} deferred callback(s) in #{}..=#{}",
            ids.len(),
            range.start(),
            range.end()
        );
        ids.len()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, JoinHandle<()>>> {
        // Callbacks never run under this lock, and the map stays consistent
        // across every critical section, so a poisoned guard is still usable.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_callback_runs_and_deregisters() {
        let callbacks = DeferredCallbacks::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        callbacks.schedule(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(callbacks.pending(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(callbacks.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_range_only_touches_range() {
        let callbacks = DeferredCallbacks::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let counter = fired.clone();
                callbacks.schedule(Duration::from_secs(10), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        assert_eq!(handles[0], CallbackHandle(1));

        assert_eq!(callbacks.clear_range(1..=3), 3);
        assert_eq!(callbacks.pending(), 2);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_callback_is_deregistered() {
        let callbacks = DeferredCallbacks::new();
        callbacks.schedule(Duration::from_millis(10), || panic!("callback bug"));
        callbacks.schedule(Duration::from_secs(60), || {});
        assert_eq!(callbacks.pending(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(callbacks.pending(), 1);
        assert_eq!(callbacks.clear_range(1..=1000), 1);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let callbacks = DeferredCallbacks::new();
        let handle = callbacks.schedule(Duration::from_secs(60), || {});
        assert!(callbacks.cancel(handle));
        assert!(!callbacks.cancel(handle));
        assert_eq!(callbacks.clear_range(1..=1000), 0);
    }
}
