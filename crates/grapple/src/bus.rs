//! Typed publish/subscribe event bus.
//!
//! Handlers run synchronously, in subscription order, on the emitting thread.
//! A handler that fails or panics is logged and skipped; the remaining
//! handlers still run and the emitter never sees the failure.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use grapple_core::alloc::HashMap;
use parking_lot::RwLock;

use crate::error::{HandlerResult, panic_message};
use crate::event::{DragEvent, EventKind};

/// Event handler signature.
pub type EventHandler = dyn Fn(&DragEvent) -> HandlerResult + Send + Sync;

/// Identifies one handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

struct HandlerEntry {
    id: HandlerId,
    handler: Arc<EventHandler>,
}

#[derive(Default)]
struct BusInner {
    handlers: RwLock<HashMap<EventKind, Vec<HandlerEntry>>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn remove(&self, kind: EventKind, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|entry| entry.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(&kind);
        }
        removed
    }
}

/// Event bus shared by the kernel and its plugins.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    ///
    /// Handlers are invoked in the order they were registered.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&DragEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .write()
            .entry(kind)
            .or_default()
            .push(HandlerEntry {
                id,
                handler: Arc::new(handler),
            });

        tracing::trace!(kind = %kind, handler = id.0, "Subscribed handler");

        Subscription {
            kind,
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn off(&self, kind: EventKind, id: HandlerId) -> bool {
        self.inner.remove(kind, id)
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe,
    /// unsubscribe or emit re-entrantly.
    pub fn emit(&self, event: &DragEvent) {
        let kind = event.kind();
        let handlers: Vec<Arc<EventHandler>> = {
            let map = self.inner.handlers.read();
            match map.get(&kind) {
                Some(list) => list.iter().map(|entry| Arc::clone(&entry.handler)).collect(),
                None => return,
            }
        };

        for (index, handler) in handlers.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(kind = %kind, handler = index, "Event handler failed: {}", err);
                }
                Err(payload) => {
                    tracing::error!(
                        kind = %kind,
                        handler = index,
                        "Event handler panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }

    /// Remove every handler for every kind.
    pub fn clear(&self) {
        self.inner.handlers.write().clear();
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner
            .handlers
            .read()
            .get(&kind)
            .map_or(0, |list| list.len())
    }

    pub fn has_handlers(&self, kind: EventKind) -> bool {
        self.handler_count(kind) > 0
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.inner.handlers.read();
        let total: usize = handlers.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("kinds", &handlers.len())
            .field("handlers", &total)
            .finish()
    }
}

/// Handle returned by [`EventBus::on`].
///
/// Dropping a subscription leaves the handler registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    kind: EventKind,
    id: HandlerId,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Remove the handler. Returns `false` if it was already removed or the
    /// bus no longer exists.
    pub fn unsubscribe(self) -> bool {
        match self.bus.upgrade() {
            Some(bus) => bus.remove(self.kind, self.id),
            None => false,
        }
    }
}
