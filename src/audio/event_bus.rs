//! Typed subscription mechanism for step and state-change callbacks.
//!
//! The subscriber list is copy-on-write: a `subscribe`/`unsubscribe` clones
//! the current `Vec`, mutates the clone, and swaps it in under a write
//! lock, so dispatch (which only ever takes a read lock) never blocks on a
//! subscription change and vice versa.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

pub type SubscriptionId = u64;

#[derive(Clone)]
struct Subscription<T> {
    id: SubscriptionId,
    callback: Arc<dyn Fn(T) + Send + Sync>,
}

/// A typed, copy-on-write broadcast list. `T` is the payload passed to every
/// subscriber on `dispatch` (e.g. `(u32, f64)` for step events, or
/// `SequencerState` for state-change events).
pub struct EventBus<T> {
    subscribers: RwLock<Vec<Subscription<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.subscribers.write().unwrap();
        let mut next = guard.clone();
        next.push(Subscription {
            id,
            callback: Arc::new(callback),
        });
        *guard = next;
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut guard = self.subscribers.write().unwrap();
        let mut next = guard.clone();
        next.retain(|s| s.id != id);
        *guard = next;
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }

    /// Invokes every subscriber with a clone of `payload`. A panicking
    /// subscriber is caught and logged; it does not stop dispatch to the
    /// rest, and it does not unwind into the caller.
    pub fn dispatch(&self, payload: T) {
        let guard = self.subscribers.read().unwrap();
        for sub in guard.iter() {
            let payload = payload.clone();
            let cb = sub.callback.clone();
            let result = catch_unwind(AssertUnwindSafe(|| cb(payload)));
            if result.is_err() {
                log::warn!("event bus subscriber {} panicked during dispatch", sub.id);
            }
        }
    }
}
