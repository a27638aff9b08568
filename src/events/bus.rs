use log::{debug, error};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::StatusEvent;

type Listener = Arc<dyn Fn(&StatusEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    // Listeners never run under this lock
    listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local publish/subscribe for status events.
///
/// Delivery is synchronous. A listener that fails or panics is logged and
/// skipped; the remaining listeners still receive the event.
#[derive(Clone, Default)]
pub struct StatusBus {
    listeners: Arc<Mutex<Listeners>>,
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` until the returned [`Subscription`] is dropped
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StatusEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut guard = lock(&self.listeners);
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push((id, Arc::new(listener)));
        debug!("Status listener {} subscribed", id);

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every current listener, returning how many
    /// accepted it.
    pub fn publish(&self, event: &StatusEvent) -> usize {
        // Snapshot so listeners may subscribe or unsubscribe while being called
        let snapshot: Vec<(u64, Listener)> = lock(&self.listeners).entries.clone();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => error!("Status listener {} failed: {:#}", id, e),
                Err(_) => error!("Status listener {} panicked", id),
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}

impl std::fmt::Debug for StatusBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Keeps a listener registered. Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).entries.retain(|(id, _)| *id != self.id);
            debug!("Status listener {} unsubscribed", self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
