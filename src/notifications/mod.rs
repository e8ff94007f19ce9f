//! Subscription, gift and bits notifications.
//!
//! [`Notifications`] watches a client's events and turns them into typed
//! [`NotificationEvent`]s. Gifted subscriptions are correlated so a mass
//! gift produces one [`Notification::MassGiftSub`] listing its recipients
//! instead of one notification per recipient.
//!
//! Every notification is delivered to "any" listeners first, then to the
//! listeners of its kind.
//!
//! ```no_run
//! use tmi_notify::{Client, ClientConfig};
//! use tmi_notify::notifications::{NotificationKind, Notifications};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new()).spawn()?;
//! let notifications = Notifications::attach(&client);
//! let mut gifts = notifications.subscribe(NotificationKind::MassGiftSub);
//! client.join("dallas")?;
//!
//! while let Some(event) = gifts.recv().await {
//!     println!("{:?}", event.notification);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod dummy;
pub mod timer;
mod types;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::client::ClientHandle;
use crate::config::NotificationTiming;
use crate::event::Event;
use crate::listeners::{EventHub, ListenerId, Subscription};
use crate::util::sleep_until_opt;

pub use self::aggregator::Aggregator;
pub use self::dummy::{dummy_notification, DUMMY_CHANNEL};
pub use self::types::{
    BitsNotice, GiftSubNotice, MassGiftSubNotice, NoticeMeta, Notification, NotificationEvent,
    NotificationKind, Recipient, ResubNotice, SubNotice, SubPlan,
};

/// Both listener sets, shared with the correlation task.
#[derive(Clone, Debug, Default)]
struct Outlets {
    any: EventHub<NotificationEvent>,
    by_kind: EventHub<NotificationEvent>,
}

impl Outlets {
    fn publish(&self, event: &NotificationEvent) {
        debug!(kind = %event.kind(), channel = %event.channel, "notification");
        self.any.emit(event);
        self.by_kind.emit(event);
    }
}

/// Notification emitter attached to one client.
///
/// Dropping it, or calling [`dispose`](Self::dispose), stops the
/// correlation task and detaches it from the client. The connection is not
/// affected.
#[derive(Debug)]
pub struct Notifications {
    outlets: Outlets,
    task: JoinHandle<()>,
}

impl Notifications {
    /// Attach to `client` with the default correlation windows.
    #[must_use]
    pub fn attach(client: &ClientHandle) -> Self {
        Self::attach_with_timing(client, NotificationTiming::default())
    }

    /// Attach to `client` with custom correlation windows.
    #[must_use]
    pub fn attach_with_timing(client: &ClientHandle, timing: NotificationTiming) -> Self {
        let events = client.subscribe_filtered(|event| {
            matches!(event, Event::UserNotice { .. } | Event::Message { .. })
        });
        Self::from_subscription(events, timing)
    }

    /// Consume events from any subscription, e.g. one fed by hand in tests.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn from_subscription(events: Subscription<Event>, timing: NotificationTiming) -> Self {
        let outlets = Outlets::default();
        let task = tokio::spawn(run(events, Aggregator::new(timing), outlets.clone()));
        Self { outlets, task }
    }

    /// Receive every notification.
    #[must_use]
    pub fn subscribe_any(&self) -> Subscription<NotificationEvent> {
        self.outlets.any.subscribe()
    }

    /// Receive notifications of one kind.
    #[must_use]
    pub fn subscribe(&self, kind: NotificationKind) -> Subscription<NotificationEvent> {
        self.outlets
            .by_kind
            .subscribe_filtered(move |event| event.kind() == kind)
    }

    /// Remove a listener by id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.outlets.any.remove(id) || self.outlets.by_kind.remove(id)
    }

    /// Build a random notification of `kind` (random kind when `None`).
    #[must_use]
    pub fn dummy(kind: Option<NotificationKind>, channel: Option<&str>) -> Notification {
        dummy_notification(kind, channel.unwrap_or(DUMMY_CHANNEL))
    }

    /// Emit a random notification through the normal delivery path.
    ///
    /// Dummy events carry no tags.
    pub fn send_dummy(&self, kind: Option<NotificationKind>, channel: &str) {
        let event = NotificationEvent {
            channel: channel.to_string(),
            notification: dummy_notification(kind, channel),
            tags: None,
        };
        self.outlets.publish(&event);
    }

    /// Stop correlating and detach from the client. Pending gifts are dropped.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Notifications {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(mut events: Subscription<Event>, mut aggregator: Aggregator, outlets: Outlets) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    for out in aggregator.on_event(&event, Instant::now()) {
                        outlets.publish(&out);
                    }
                }
                None => {
                    debug!(pending = aggregator.pending(), "event source closed, flushing");
                    for out in aggregator.flush() {
                        outlets.publish(&out);
                    }
                    break;
                }
            },
            () = sleep_until_opt(aggregator.next_deadline()) => {
                for out in aggregator.poll_expired(Instant::now()) {
                    outlets.publish(&out);
                }
            }
        }
    }
}
