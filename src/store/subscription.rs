use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

pub(crate) type Listener = Arc<dyn Fn() + Send + Sync>;

/// Insertion-ordered listener registrations.
///
/// Every registration gets its own id, so the same callback subscribed
/// twice is two independent entries.
#[derive(Default)]
pub(crate) struct Registry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl Registry {
    pub(crate) fn insert(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Detach the registration, handing the listener back to the caller.
    ///
    /// The listener must be dropped after the registry lock is released: it
    /// may own a [`SubscriptionGuard`] that locks the registry again.
    pub(crate) fn remove(&mut self, id: u64) -> Option<Listener> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    /// Listeners in notification order, detached from the registry.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.entries.iter().map(|(_, listener)| Arc::clone(listener)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Handle to one listener registration, returned by
/// [`Store::subscribe`](crate::Store::subscribe).
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) or convert it into a
/// [`SubscriptionGuard`] to tie the registration to a scope. The handle does
/// not keep the store alive.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
    store_name: Arc<str>,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: Weak<Mutex<Registry>>, store_name: Arc<str>) -> Self {
        Self {
            id,
            registry,
            store_name,
        }
    }

    /// Remove this registration from the store.
    ///
    /// Returns `true` if the registration was still present. Calling it
    /// again, or after the store is gone, does nothing and returns `false`.
    /// Safe to call from inside a listener; a listener removed mid-dispatch
    /// still runs for that dispatch and never afterwards.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.lock().remove(self.id);
        let was_present = removed.is_some();
        drop(removed);

        if was_present {
            log::debug!("[{}] listener {} unsubscribed", self.store_name, self.id);
        }
        was_present
    }

    /// Whether the registration is still present in a live store.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.lock().contains(self.id))
    }

    /// Unsubscribe automatically when the returned guard is dropped.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("store", &self.store_name)
            .finish()
    }
}

/// RAII guard for a listener registration.
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    /// The registration this guard removes on drop.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
