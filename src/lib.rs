//! # tmi-notify
//!
//! An async client for Twitch chat (TMI) with typed events, room tracking
//! and correlated subscription notifications.
//!
//! ## Features
//!
//! - Tag-aware chat line parsing that never drops a line silently
//! - A tokio connection task with login, greeting detection, outbound
//!   queueing and automatic reconnect
//! - Typed events delivered through per-subscriber channels
//! - Room membership and merged `ROOMSTATE` settings
//! - Sub, resub, bits and gift notifications, with mass gifts grouped
//!   into one notification

#![deny(clippy::all)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Watching a channel
//!
//! ```no_run
//! use tmi_notify::{Client, ClientConfig, Event};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new()).spawn()?;
//! let mut events = client.subscribe();
//! client.join("dallas")?;
//!
//! while let Some(event) = events.recv().await {
//!     if let Event::Message { login, text, .. } = event {
//!         println!("{}: {}", login, text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Parsing chat lines
//!
//! ```rust
//! use tmi_notify::Message;
//!
//! let raw = "@badges=;color=#FF0000 :ronni!ronni@ronni.tmi.twitch.tv PRIVMSG #dallas :Kappa";
//! let message: Message = raw.parse().expect("valid chat line");
//!
//! assert_eq!(message.command, "PRIVMSG");
//! assert_eq!(message.channel.as_deref(), Some("dallas"));
//! assert_eq!(message.login(), Some("ronni"));
//! assert_eq!(message.tags.get("color"), Some("#FF0000"));
//! ```

pub mod auth;
pub mod caps;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod line;
pub mod listeners;
pub mod message;
pub mod notifications;
pub mod origin;
pub mod rooms;
pub mod state;
pub mod transport;
mod util;

pub use self::auth::{AccountLookup, StaticToken, TokenProvider};
pub use self::caps::Capability;
pub use self::client::{Client, ClientHandle};
pub use self::command::Command;
pub use self::config::{ClientConfig, Credentials, NotificationTiming};
pub use self::error::{ClientError, ConfigError, MessageParseError, ProtocolError, Result};
pub use self::event::{Event, EventKind};
pub use self::line::LineCodec;
pub use self::listeners::{EventHub, ListenerId, Subscription};
pub use self::message::{Message, Tags};
pub use self::notifications::{Notification, NotificationEvent, NotificationKind, Notifications};
pub use self::origin::Origin;
pub use self::rooms::{RoomEvent, RoomState, RoomTracker};
pub use self::state::{Action, ConnectionState, Session};
