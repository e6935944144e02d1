//! Listener registry for snapshot fan-out
//!
//! Keeps the set of snapshot callbacks and delivers snapshots to them with
//! each invocation isolated: a panicking listener is logged and counted,
//! and the rest still receive the snapshot.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use pulse_core::Snapshot;
use tracing::{debug, warn};

/// Callback invoked with every snapshot
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Unique identifier for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

struct ListenerEntry {
    callback: Listener,
    active: AtomicBool,
    /// Held for the duration of each invocation. Removal takes it once so
    /// it returns only after a call running on another thread has finished.
    /// Reentrant so a listener can unsubscribe itself.
    gate: ReentrantMutex<()>,
}

type ListenerMap = DashMap<ListenerId, Arc<ListenerEntry>>;

/// Set of snapshot listeners
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Arc<ListenerMap>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Arc::new(DashMap::new()),
        }
    }

    /// Register a listener, returning its id
    pub fn register(&self, callback: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.insert(
            id,
            Arc::new(ListenerEntry {
                callback,
                active: AtomicBool::new(true),
                gate: ReentrantMutex::new(()),
            }),
        );
        debug!("Registered {}", id);
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn remove(&self, id: ListenerId) -> bool {
        remove_from(&self.listeners, id)
    }

    /// Handle that removes `id` when asked, without keeping the registry alive
    pub fn subscription(&self, id: ListenerId) -> Subscription {
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver a snapshot to every active listener
    pub fn notify(&self, snapshot: &Snapshot) -> NotifyReport {
        // Clone the entries out so no map shard lock is held while callbacks
        // run; callbacks may register or remove listeners.
        let entries: Vec<(ListenerId, Arc<ListenerEntry>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut report = NotifyReport::default();
        for (id, entry) in entries {
            match invoke(id, &entry, snapshot) {
                Some(true) => report.delivered += 1,
                Some(false) => report.failed += 1,
                None => {}
            }
        }
        report
    }

    /// Deliver a snapshot to a single listener
    pub fn notify_one(&self, id: ListenerId, snapshot: &Snapshot) -> NotifyReport {
        let entry = self.listeners.get(&id).map(|entry| Arc::clone(entry.value()));
        let mut report = NotifyReport::default();
        if let Some(entry) = entry {
            match invoke(id, &entry, snapshot) {
                Some(true) => report.delivered += 1,
                Some(false) => report.failed += 1,
                None => {}
            }
        }
        report
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Run one callback behind its gate
///
/// Returns `None` if the listener was removed before it could run,
/// `Some(false)` if it panicked.
fn invoke(id: ListenerId, entry: &ListenerEntry, snapshot: &Snapshot) -> Option<bool> {
    let _gate = entry.gate.lock();
    if !entry.active.load(Ordering::Acquire) {
        return None;
    }

    match panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(snapshot))) {
        Ok(()) => Some(true),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(
                "{} panicked handling snapshot #{}: {}",
                id, snapshot.sequence, reason
            );
            Some(false)
        }
    }
}

fn remove_from(listeners: &ListenerMap, id: ListenerId) -> bool {
    match listeners.remove(&id) {
        Some((_, entry)) => {
            entry.active.store(false, Ordering::Release);
            // Wait out an invocation in flight on another thread
            drop(entry.gate.lock());
            debug!("Removed {}", id);
            true
        }
        None => false,
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "the subscription stays active until `unsubscribe` is called"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: ListenerId,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Stop receiving snapshots
    ///
    /// Idempotent. Once this returns the callback will not be invoked again.
    pub fn unsubscribe(&self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => remove_from(&listeners, self.id),
            None => false,
        }
    }
}

/// Unsubscribes when dropped
///
/// For subscriptions whose lifetime is tied to a scope, such as a client
/// connection, so the listener is removed on every exit path.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    pub fn new(subscription: Subscription) -> Self {
        Self(subscription)
    }

    pub fn id(&self) -> ListenerId {
        self.0.id()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
