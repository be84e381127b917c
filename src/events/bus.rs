//! Typed publish/subscribe bus
//!
//! Decouples stream connections from their observers. Publishing is
//! synchronous and in subscription order; a panicking handler is isolated
//! so it never blocks delivery to the handlers after it.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::types::{EventKind, StreamEvent};

type Handler = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(u64, Handler)>>,
}

/// Event bus for stream status and frame events
///
/// Cheap to clone; all clones share the same subscriber table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    /// Create a new, empty bus
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
        // Handlers run outside the lock, so a poisoned lock only means a
        // publisher thread panicked elsewhere; the table itself is intact.
        inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a handler for one event kind
    ///
    /// Handlers for a kind are invoked in subscription order. The returned
    /// [`Subscription`] removes the handler when `unsubscribe` is called;
    /// dropping it without unsubscribing leaves the handler registered.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&StreamEvent) + Send + Sync + 'static,
    {
        let mut inner = Self::lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            bus: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Deliver an event to every handler subscribed to its kind
    ///
    /// Delivery is synchronous. A handler that panics is caught and logged,
    /// and delivery continues with the next handler.
    pub fn publish(&self, event: &StreamEvent) {
        let handlers: Vec<Handler> = {
            let inner = Self::lock(&self.inner);
            match inner.handlers.get(&event.kind()) {
                Some(entries) => entries.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::error!(
                    stream_id = %event.stream_id(),
                    kind = ?event.kind(),
                    "event handler panicked"
                );
            }
        }
    }

    /// Number of handlers registered for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        Self::lock(&self.inner)
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// Handle for removing a registered handler
///
/// `unsubscribe` is idempotent; calling it twice is a no-op.
pub struct Subscription {
    bus: Weak<Mutex<Inner>>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Remove the handler from the bus
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.bus.upgrade() {
            let mut inner = EventBus::lock(&inner);
            if let Some(entries) = inner.handlers.get_mut(&self.kind) {
                entries.retain(|(id, _)| *id != self.id);
            }
        }
    }
}
