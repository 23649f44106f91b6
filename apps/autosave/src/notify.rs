//! Cross-view change notification.
//!
//! A signal carries no payload: every consumer re-reads the full document and
//! registry when it fires. Two ways to listen:
//! - [`Notifier::subscribe`] registers a synchronous handler. Dropping the
//!   returned [`Subscription`] unsubscribes it.
//! - [`Notifier::receiver`] hands out a broadcast receiver for async consumers
//!   such as the SSE stream. A lagged receiver only means "changed at least
//!   once", so lag is harmless.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::broadcast;
use tracing::trace;

/// "Something changed" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Handlers {
    next_id: u64,
    by_id: BTreeMap<u64, Handler>,
}

#[derive(Clone)]
pub struct Notifier {
    handlers: Arc<Mutex<Handlers>>,
    tx: broadcast::Sender<ChangeSignal>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            handlers: Arc::new(Mutex::new(Handlers::default())),
            tx,
        }
    }

    /// Fires the change signal to every handler and receiver.
    pub fn publish(&self) {
        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<Handler> = self.lock().by_id.values().cloned().collect();
        for handler in &handlers {
            handler();
        }
        let receivers = self.tx.send(ChangeSignal).unwrap_or(0);
        trace!(
            "Published change signal to {} handlers and {receivers} receivers",
            handlers.len()
        );
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut handlers = self.lock();
        let id = handlers.next_id;
        handlers.next_id = handlers.next_id.saturating_add(1);
        handlers.by_id.insert(id, Arc::new(handler));
        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    pub fn receiver(&self) -> broadcast::Receiver<ChangeSignal> {
        self.tx.subscribe()
    }

    #[cfg(test)]
    pub fn handler_count(&self) -> usize {
        self.lock().by_id.len()
    }

    fn lock(&self) -> MutexGuard<'_, Handlers> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to a registered handler. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    handlers: Weak<Mutex<Handlers>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handlers) = self.handlers.upgrade() {
            let mut handlers = handlers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            handlers.by_id.remove(&self.id);
        }
    }
}
