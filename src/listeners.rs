//! Multi-listener event fan-out.
//!
//! An [`EventHub`] delivers every emitted event to each registered listener
//! through its own unbounded queue. Listeners are identified by a
//! [`ListenerId`] and can be removed by id, or simply by dropping their
//! [`Subscription`].
//!
//! Queues are unbounded: a subscription that is never polled keeps every
//! event it was sent. Drop subscriptions you no longer read.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

type Filter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

struct Listener<E> {
    id: ListenerId,
    tx: mpsc::UnboundedSender<E>,
    filter: Option<Filter<E>>,
}

type Listeners<E> = Mutex<Vec<Listener<E>>>;

/// Registry of listeners for one event type.
pub struct EventHub<E> {
    listeners: Arc<Listeners<E>>,
}

impl<E> Clone for EventHub<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E> std::fmt::Debug for EventHub<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl<E: Clone + Send + 'static> EventHub<E> {
    /// Create a hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<E> {
        self.register(None)
    }

    /// Register a listener that only receives events matching `filter`.
    #[must_use]
    pub fn subscribe_filtered<F>(&self, filter: F) -> Subscription<E>
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.register(Some(Box::new(filter)))
    }

    fn register(&self, filter: Option<Filter<E>>) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ListenerId::next();
        self.listeners.lock().push(Listener { id, tx, filter });
        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.listeners),
        }
    }

    /// Remove a listener. Its subscription ends once drained.
    ///
    /// Returns `false` if no listener had that id.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Deliver `event` to every matching listener, in registration order.
    ///
    /// Listeners whose subscription was dropped are pruned. Returns how many
    /// listeners received the event.
    pub fn emit(&self, event: &E) -> usize {
        let mut delivered = 0;
        self.listeners.lock().retain(|listener| {
            if listener.filter.as_ref().is_some_and(|f| !f(event)) {
                return !listener.tx.is_closed();
            }
            match listener.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

/// Receiving end of one listener.
///
/// Implements [`Stream`]. Dropping it unregisters the listener.
pub struct Subscription<E> {
    id: ListenerId,
    rx: mpsc::UnboundedReceiver<E>,
    hub: Weak<Listeners<E>>,
}

impl<E> Subscription<E> {
    /// This listener's id.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next event. `None` once the listener was removed or the
    /// hub is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take an already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}

impl<E> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<E> Stream for Subscription<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        self.rx.poll_recv(cx)
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(listeners) = self.hub.upgrade() {
            listeners.lock().retain(|l| l.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_every_listener_receives() {
        let hub = EventHub::<u32>::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        assert_eq!(hub.emit(&7), 2);
        assert_eq!(a.recv().await, Some(7));
        assert_eq!(b.next().await, Some(7));
    }

    #[tokio::test]
    async fn test_filtered_listener() {
        let hub = EventHub::<u32>::new();
        let mut even = hub.subscribe_filtered(|n| n % 2 == 0);

        hub.emit(&1);
        hub.emit(&2);
        assert_eq!(even.recv().await, Some(2));
        assert_eq!(even.try_recv(), None);
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let hub = EventHub::<u32>::new();
        let mut sub = hub.subscribe();
        let keep = hub.subscribe();
        assert_ne!(sub.id(), keep.id());

        assert!(hub.remove(sub.id()));
        assert!(!hub.remove(sub.id()));
        assert_eq!(hub.emit(&1), 1);
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn test_drop_unregisters() {
        let hub = EventHub::<u32>::new();
        let sub = hub.subscribe();
        assert_eq!(hub.listener_count(), 1);
        drop(sub);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_hub_drop_ends_stream() {
        let hub = EventHub::<u32>::new();
        let mut sub = hub.subscribe();
        hub.emit(&3);
        drop(hub);
        assert_eq!(sub.recv().await, Some(3));
        assert_eq!(sub.recv().await, None);
    }
}
