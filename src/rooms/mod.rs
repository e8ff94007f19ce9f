//! Channel membership and room settings.
//!
//! [`RoomTracker`] follows a client's own joins and parts plus `ROOMSTATE`
//! updates, and keeps a queryable snapshot of the rooms it is in.

mod state;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::client::ClientHandle;
use crate::event::Event;
use crate::listeners::{EventHub, ListenerId, Subscription};

pub use self::state::{Room, RoomEvent, RoomState, Rooms};

/// Room tracker attached to one client.
///
/// Queries read a snapshot that the tracking task updates after every
/// change. Dropping the tracker, or calling [`dispose`](Self::dispose),
/// detaches it without affecting the connection.
#[derive(Debug)]
pub struct RoomTracker {
    snapshot: watch::Receiver<Rooms>,
    events: EventHub<RoomEvent>,
    task: JoinHandle<()>,
}

impl RoomTracker {
    /// Start tracking `client`.
    #[must_use]
    pub fn attach(client: &ClientHandle) -> Self {
        let events = client.subscribe_filtered(|event| {
            matches!(
                event,
                Event::Join { .. } | Event::Part { .. } | Event::RoomState { .. }
            )
        });
        Self::from_subscription(events)
    }

    /// Track events from any subscription.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn from_subscription(events: Subscription<Event>) -> Self {
        let (snapshot_tx, snapshot) = watch::channel(Rooms::new());
        let hub = EventHub::new();
        let task = tokio::spawn(run(events, snapshot_tx, hub.clone()));
        Self {
            snapshot,
            events: hub,
            task,
        }
    }

    /// Whether the client is in `channel` (`#` optional).
    #[must_use]
    pub fn is_in_channel(&self, channel: &str) -> bool {
        self.snapshot.borrow().is_in_channel(channel)
    }

    /// Settings of `channel`, if joined and known.
    #[must_use]
    pub fn channel_state(&self, channel: &str) -> Option<RoomState> {
        self.snapshot.borrow().channel_state(channel).cloned()
    }

    /// Every joined room, in join order.
    #[must_use]
    pub fn channels(&self) -> Vec<Room> {
        self.snapshot.borrow().channels().to_vec()
    }

    /// Receive change events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<RoomEvent> {
        self.events.subscribe()
    }

    /// Remove a listener by id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove(id)
    }

    /// Stop tracking and detach from the client.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for RoomTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut events: Subscription<Event>,
    snapshot: watch::Sender<Rooms>,
    hub: EventHub<RoomEvent>,
) {
    let mut rooms = Rooms::new();
    while let Some(event) = events.recv().await {
        let changes = rooms.on_event(&event);
        if changes.is_empty() {
            continue;
        }
        snapshot.send_replace(rooms.clone());
        for change in &changes {
            trace!(?change, "room change");
            hub.emit(change);
        }
    }
}
