use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::error;

use super::SessionState;

/// Callback invoked with the new state on every transition.
pub type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

/// Ordered list of state observers.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    inner: Mutex<Registry>,
}

impl ObserverRegistry {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(self: &Arc<Self>, observer: Observer) -> Subscription {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, observer));
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn deregister(&self, id: u64) {
        self.lock().observers.retain(|(oid, _)| *oid != id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().observers.len()
    }

    /// Call every observer in registration order.
    ///
    /// Runs on a snapshot taken without holding the lock, so observers may
    /// subscribe, unsubscribe or read manager state. A panicking observer is
    /// logged and skipped.
    pub(crate) fn notify(&self, state: &SessionState) {
        let snapshot: Vec<(u64, Observer)> = self.lock().observers.clone();
        for (id, observer) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| observer(state))).is_err() {
                error!(observer = id, state = state.label(), "Session observer panicked");
            }
        }
    }
}

/// Handle returned by `SessionManager::subscribe`.
///
/// Dropping it leaves the observer registered; call `unsubscribe` to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<ObserverRegistry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.id);
        }
    }
}
