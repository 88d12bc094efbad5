//! Typed in-process publish/subscribe for Scrawl.
//!
//! Bridges store change notifications to local consumers. Delivery is
//! synchronous and in registration order over the subscriber list as it
//! existed when [`EventBus::emit`] was called; there is no buffering, so a
//! late subscriber misses earlier events.
//!
//! Subscribing returns a [`Subscription`] handle. An uncancelled
//! subscription lives for the bus's lifetime; call
//! [`Subscription::cancel`] to stop delivery.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscriber<E> {
    id: u64,
    callback: Callback<E>,
}

struct BusInner<E> {
    subscribers: Vec<Subscriber<E>>,
    next_id: u64,
}

/// A synchronous fan-out bus for events of type `E`.
///
/// Cheap to clone — clones share the subscriber list.
pub struct EventBus<E> {
    inner: Arc<Mutex<BusInner<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusInner<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a callback. All registered callbacks are invoked, in
    /// registration order, on every emission.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription<E> {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `event` to every current subscriber, synchronously.
    ///
    /// The subscriber list is snapshotted before invoking anything, so a
    /// callback may subscribe or cancel without deadlocking; subscribers
    /// added during an emission see only later events.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .lock()
            .subscribers
            .iter()
            .map(|s| Arc::clone(&s.callback))
            .collect();
        trace!(subscribers = callbacks.len(), "emitting event");
        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// Handle to a registered callback. Cancelling removes the callback;
/// dropping the handle leaves it registered.
pub struct Subscription<E> {
    id: u64,
    bus: Weak<Mutex<BusInner<E>>>,
}

impl<E> Subscription<E> {
    /// Unregisters the callback. A no-op if the bus is already gone.
    pub fn cancel(self) {
        if let Some(inner) = self.bus.upgrade() {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .subscribers
                .retain(|s| s.id != self.id);
        }
    }
}
