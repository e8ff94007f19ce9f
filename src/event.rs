//! Typed connection events.
//!
//! Every line received after login becomes an [`Event::Raw`] followed by at
//! most one typed event chosen by command verb. Lifecycle and error events
//! are emitted by the connection task itself.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ClientError, MessageParseError};
use crate::message::{Message, Tags};

/// An event emitted by a connection.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Event {
    /// A transport failure, login rejection, server error reply or usage error.
    Error(Arc<ClientError>),
    /// A line could not be parsed at all.
    ParseError {
        /// The offending line.
        line: String,
        /// Why it failed.
        error: MessageParseError,
    },
    /// A line parsed, but part of it could not be placed.
    ParseAnomaly {
        /// The full line.
        line: String,
        /// The text left over.
        unparsed: String,
    },
    /// The socket is open and the handshake was sent.
    Connected,
    /// The greeting completed; queued sends have been flushed.
    Ready,
    /// The socket closed. `reconnect_in` is set when a reconnect is scheduled.
    Disconnected {
        /// Delay until the next attempt.
        reconnect_in: Option<Duration>,
    },
    /// Any line received while ready.
    Raw {
        /// The line, terminator stripped.
        line: String,
        /// Its parsed form.
        message: Arc<Message>,
    },
    /// A line written to the socket while ready.
    RawSend(String),
    /// This client joined a channel.
    Join {
        /// Channel name without `#`.
        channel: String,
    },
    /// This client left a channel.
    Part {
        /// Channel name without `#`.
        channel: String,
    },
    /// Another user joined a channel.
    OtherJoin {
        /// Channel name without `#`.
        channel: String,
        /// The user's login.
        login: String,
    },
    /// Another user left a channel.
    OtherPart {
        /// Channel name without `#`.
        channel: String,
        /// The user's login.
        login: String,
    },
    /// A chat message.
    Message {
        /// Channel name without `#`.
        channel: String,
        /// Sender login.
        login: String,
        /// Message body.
        text: String,
        /// Message tags.
        tags: Tags,
    },
    /// Full or partial room settings update.
    RoomState {
        /// Channel name without `#`.
        channel: String,
        /// Only the settings present in this update.
        tags: Tags,
    },
    /// Subscription, raid and similar announcements.
    UserNotice {
        /// Channel name without `#`.
        channel: String,
        /// The `login` tag, when present.
        login: Option<String>,
        /// Attached user message, possibly empty.
        text: String,
        /// Notice tags; `msg-id` names the kind.
        tags: Tags,
    },
    /// Server notice, scoped to a channel or global.
    Notice {
        /// Channel name without `#`, if scoped.
        channel: Option<String>,
        /// Notice text.
        text: String,
        /// Notice tags.
        tags: Tags,
    },
    /// All messages in a channel were cleared.
    ClearChat {
        /// Channel name without `#`.
        channel: String,
    },
    /// A user was banned or timed out; `ban-duration` is set for timeouts.
    UserBan {
        /// Channel name without `#`.
        channel: String,
        /// Banned user's login.
        login: String,
        /// Ban tags.
        tags: Tags,
    },
    /// A single message was deleted.
    ClearMsg {
        /// Channel name without `#`.
        channel: String,
        /// Tags naming the deleted message.
        tags: Tags,
    },
    /// This account's global state, sent after login.
    GlobalUserState {
        /// User tags.
        tags: Tags,
    },
    /// This account's state in a channel.
    UserState {
        /// Channel name without `#`.
        channel: String,
        /// User tags.
        tags: Tags,
    },
    /// A channel started hosting another channel.
    HostStarted {
        /// Hosting channel without `#`.
        channel: String,
        /// Hosted channel.
        target: String,
        /// Viewer count, absent when already hosting.
        viewers: Option<u32>,
    },
    /// A channel stopped hosting.
    HostStopped {
        /// Channel name without `#`.
        channel: String,
        /// Viewer count, when given.
        viewers: Option<u32>,
    },
}

/// Discriminant of [`Event`], used to subscribe to one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EventKind {
    /// [`Event::Error`].
    Error,
    /// [`Event::ParseError`].
    ParseError,
    /// [`Event::ParseAnomaly`].
    ParseAnomaly,
    /// [`Event::Connected`].
    Connected,
    /// [`Event::Ready`].
    Ready,
    /// [`Event::Disconnected`].
    Disconnected,
    /// [`Event::Raw`].
    Raw,
    /// [`Event::RawSend`].
    RawSend,
    /// [`Event::Join`].
    Join,
    /// [`Event::Part`].
    Part,
    /// [`Event::OtherJoin`].
    OtherJoin,
    /// [`Event::OtherPart`].
    OtherPart,
    /// [`Event::Message`].
    Message,
    /// [`Event::RoomState`].
    RoomState,
    /// [`Event::UserNotice`].
    UserNotice,
    /// [`Event::Notice`].
    Notice,
    /// [`Event::ClearChat`].
    ClearChat,
    /// [`Event::UserBan`].
    UserBan,
    /// [`Event::ClearMsg`].
    ClearMsg,
    /// [`Event::GlobalUserState`].
    GlobalUserState,
    /// [`Event::UserState`].
    UserState,
    /// [`Event::HostStarted`].
    HostStarted,
    /// [`Event::HostStopped`].
    HostStopped,
}

impl Event {
    /// Which kind of event this is.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Error(_) => EventKind::Error,
            Event::ParseError { .. } => EventKind::ParseError,
            Event::ParseAnomaly { .. } => EventKind::ParseAnomaly,
            Event::Connected => EventKind::Connected,
            Event::Ready => EventKind::Ready,
            Event::Disconnected { .. } => EventKind::Disconnected,
            Event::Raw { .. } => EventKind::Raw,
            Event::RawSend(_) => EventKind::RawSend,
            Event::Join { .. } => EventKind::Join,
            Event::Part { .. } => EventKind::Part,
            Event::OtherJoin { .. } => EventKind::OtherJoin,
            Event::OtherPart { .. } => EventKind::OtherPart,
            Event::Message { .. } => EventKind::Message,
            Event::RoomState { .. } => EventKind::RoomState,
            Event::UserNotice { .. } => EventKind::UserNotice,
            Event::Notice { .. } => EventKind::Notice,
            Event::ClearChat { .. } => EventKind::ClearChat,
            Event::UserBan { .. } => EventKind::UserBan,
            Event::ClearMsg { .. } => EventKind::ClearMsg,
            Event::GlobalUserState { .. } => EventKind::GlobalUserState,
            Event::UserState { .. } => EventKind::UserState,
            Event::HostStarted { .. } => EventKind::HostStarted,
            Event::HostStopped { .. } => EventKind::HostStopped,
        }
    }

    pub(crate) fn error(err: ClientError) -> Self {
        Event::Error(Arc::new(err))
    }
}
