//! Sans-IO connection state machine.
//!
//! [`Session`] owns everything about a connection except the socket and the
//! clock: login state, the greeting checklist, the pre-ready send queue, the
//! reconnect policy and the mapping from parsed lines to typed events. It
//! consumes lines and lifecycle notifications and produces [`Action`]s for
//! the driver to carry out, in order.
//!
//! # Example
//!
//! ```
//! use tmi_notify::state::{Action, ConnectionState, Session};
//! use tmi_notify::ClientConfig;
//!
//! let config = ClientConfig::new().with_login("justinfan1");
//! let mut session = Session::new(&config, "justinfan1");
//!
//! session.begin_connect();
//! let handshake = session.on_connected(None);
//! assert!(matches!(&handshake[0], Action::Send(line) if line == "CAP REQ twitch.tv/membership"));
//!
//! for line in [
//!     ":tmi.twitch.tv 001 justinfan1 :Welcome, GLHF!",
//!     ":tmi.twitch.tv 003 justinfan1 :You are in a maze of twisty passages",
//!     ":tmi.twitch.tv 376 justinfan1 :>",
//! ] {
//!     session.on_line(line);
//! }
//! assert_eq!(session.state(), ConnectionState::Ready);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::caps::Capability;
use crate::command::{check_line, Command, DEFAULT_PONG_SERVER};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::event::Event;
use crate::message::Message;

/// Numeric reply ignored when the server does not support `WHOIS`.
const WHOIS_UNKNOWN_COMMAND: u16 = 421;

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// Socket connect in progress.
    Connecting,
    /// Handshake sent, waiting for the greeting to complete.
    AwaitingLogin,
    /// Logged in; sends go straight to the socket.
    Ready,
    /// The socket is being shut down.
    Closing,
}

/// Something the driver must do, in the order returned.
#[derive(Clone, Debug)]
pub enum Action {
    /// Write this line to the socket. If the write fails, drop the rest of the batch.
    Send(String),
    /// Deliver this event to listeners.
    Emit(Event),
    /// Shut the socket down and cancel any pending reconnect.
    Close,
    /// Drop the socket and open a new connection immediately.
    Reconnect,
    /// Open a new connection after this delay.
    ScheduleReconnect(Duration),
}

/// Connection state machine for one client.
#[derive(Debug)]
pub struct Session {
    login: String,
    request_caps: bool,
    auto_reconnect: bool,
    reconnect_delay: Duration,
    greeting: Vec<String>,
    pending_greeting: VecDeque<String>,
    state: ConnectionState,
    queue: VecDeque<String>,
    user_closed: bool,
}

impl Session {
    /// Create a session for `login` using the policy in `config`.
    #[must_use]
    pub fn new(config: &ClientConfig, login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            request_caps: config.request_caps,
            auto_reconnect: config.auto_reconnect,
            reconnect_delay: config.reconnect_delay,
            greeting: config.greeting.clone(),
            pending_greeting: VecDeque::new(),
            state: ConnectionState::Disconnected,
            queue: VecDeque::new(),
            user_closed: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The login used for `NICK` and self/other detection.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Whether the connection is logged in.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Whether [`close`](Self::close) was called since the last connect.
    #[must_use]
    pub fn is_user_closed(&self) -> bool {
        self.user_closed
    }

    /// Number of lines waiting for readiness.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// A connect was requested. Clears any earlier close.
    pub fn begin_connect(&mut self) {
        debug!(login = %self.login, "connecting");
        self.user_closed = false;
        self.state = ConnectionState::Connecting;
    }

    /// The socket is open: produce the handshake.
    ///
    /// `token` is sent with `PASS`; `None` logs in anonymously.
    pub fn on_connected(&mut self, token: Option<&str>) -> Vec<Action> {
        self.state = ConnectionState::AwaitingLogin;
        self.pending_greeting = self.greeting.iter().cloned().collect();

        let mut actions = Vec::with_capacity(6);
        if self.request_caps {
            for cap in Capability::ALL {
                actions.push(Action::Send(Command::CapReq(cap).to_string()));
            }
        }
        if let Some(token) = token {
            actions.push(Action::Send(Command::Pass(token.to_string()).to_string()));
        }
        actions.push(Action::Send(Command::Nick(self.login.clone()).to_string()));
        actions.push(Action::Emit(Event::Connected));
        actions
    }

    /// Queue or send one raw line.
    ///
    /// Lines over the length limit or containing line breaks are rejected
    /// without side effects.
    pub fn send(&mut self, line: String) -> Result<Vec<Action>, ClientError> {
        check_line(&line)?;
        if self.is_ready() {
            Ok(vec![Action::Send(line.clone()), Action::Emit(Event::RawSend(line))])
        } else {
            trace!(%line, "queued until ready");
            self.queue.push_back(line);
            Ok(Vec::new())
        }
    }

    /// Stop the connection and suppress reconnects. Safe to call repeatedly.
    pub fn close(&mut self) -> Vec<Action> {
        if self.user_closed && self.state == ConnectionState::Disconnected {
            return Vec::new();
        }
        info!(login = %self.login, "closing connection");
        self.user_closed = true;
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Closing;
        }
        vec![Action::Close]
    }

    /// The socket closed, failed to open, or was shut down.
    pub fn on_disconnected(&mut self) -> Vec<Action> {
        self.state = ConnectionState::Disconnected;
        self.pending_greeting.clear();

        if !self.user_closed && self.auto_reconnect {
            info!(delay = ?self.reconnect_delay, "connection lost, reconnecting");
            vec![
                Action::Emit(Event::Disconnected {
                    reconnect_in: Some(self.reconnect_delay),
                }),
                Action::ScheduleReconnect(self.reconnect_delay),
            ]
        } else {
            info!("connection closed");
            vec![Action::Emit(Event::Disconnected { reconnect_in: None })]
        }
    }

    /// Process one terminator-stripped inbound line.
    pub fn on_line(&mut self, line: &str) -> Vec<Action> {
        trace!(line, "received");
        let mut actions = Vec::new();
        if line.trim().is_empty() {
            return actions;
        }

        let message = match Message::parse(line) {
            Ok(message) => message,
            Err(error) => {
                warn!(line, %error, "unparseable line");
                actions.push(Action::Emit(Event::ParseError {
                    line: line.to_string(),
                    error,
                }));
                return actions;
            }
        };

        if let Some(unparsed) = &message.unparsed {
            actions.push(Action::Emit(Event::ParseAnomaly {
                line: line.to_string(),
                unparsed: unparsed.clone(),
            }));
        }

        if message.command == "PING" {
            let server = message
                .trailing
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_PONG_SERVER.to_string());
            actions.push(Action::Send(Command::Pong(server).to_string()));
            return actions;
        }

        match self.state {
            ConnectionState::AwaitingLogin => self.on_login_line(&message, &mut actions),
            ConnectionState::Ready => {
                let message = Arc::new(message);
                actions.push(Action::Emit(Event::Raw {
                    line: line.to_string(),
                    message: Arc::clone(&message),
                }));
                self.dispatch(&message, &mut actions);
            }
            state => trace!(?state, line, "ignoring line"),
        }
        actions
    }

    fn on_login_line(&mut self, message: &Message, actions: &mut Vec<Action>) {
        if let (Some(expected), Some(text)) = (self.pending_greeting.front(), &message.trailing) {
            if text.contains(expected.as_str()) {
                self.pending_greeting.pop_front();
                if self.pending_greeting.is_empty() {
                    self.become_ready(actions);
                }
            }
        }

        if message.command == "NOTICE" {
            let reason = message.text().to_string();
            warn!(%reason, "login rejected");
            actions.push(Action::Emit(Event::error(ClientError::LoginRejected(reason))));
            self.state = ConnectionState::Closing;
            actions.push(Action::Close);
        } else if message.command == "RECONNECT" {
            self.server_reconnect(actions);
        }
    }

    fn become_ready(&mut self, actions: &mut Vec<Action>) {
        info!(login = %self.login, flushed = self.queue.len(), "ready");
        self.state = ConnectionState::Ready;
        for line in self.queue.drain(..) {
            actions.push(Action::Send(line.clone()));
            actions.push(Action::Emit(Event::RawSend(line)));
        }
        actions.push(Action::Emit(Event::Ready));
    }

    fn server_reconnect(&mut self, actions: &mut Vec<Action>) {
        info!("server requested reconnect");
        self.state = ConnectionState::Disconnected;
        self.pending_greeting.clear();
        actions.push(Action::Emit(Event::Disconnected {
            reconnect_in: Some(Duration::ZERO),
        }));
        actions.push(Action::Reconnect);
    }

    fn is_self(&self, login: &str) -> bool {
        login.eq_ignore_ascii_case(&self.login)
    }

    fn dispatch(&mut self, message: &Message, actions: &mut Vec<Action>) {
        let channel = message.channel.clone();
        let text = || message.text().to_string();
        let tags = || message.tags.clone();

        let event = match (message.command.as_str(), channel) {
            ("JOIN", Some(channel)) => {
                let login = message.login().unwrap_or_default();
                if self.is_self(login) {
                    Event::Join { channel }
                } else {
                    Event::OtherJoin {
                        channel,
                        login: login.to_string(),
                    }
                }
            }
            ("PART", Some(channel)) => {
                let login = message.login().unwrap_or_default();
                if self.is_self(login) {
                    Event::Part { channel }
                } else {
                    Event::OtherPart {
                        channel,
                        login: login.to_string(),
                    }
                }
            }
            ("PRIVMSG", Some(channel)) => Event::Message {
                channel,
                login: message.login().unwrap_or_default().to_string(),
                text: text(),
                tags: tags(),
            },
            ("ROOMSTATE", Some(channel)) => Event::RoomState {
                channel,
                tags: tags(),
            },
            ("USERNOTICE", Some(channel)) => Event::UserNotice {
                channel,
                login: message.tags.get("login").map(str::to_string),
                text: text(),
                tags: tags(),
            },
            ("NOTICE", channel) => Event::Notice {
                channel,
                text: text(),
                tags: tags(),
            },
            ("CLEARCHAT", Some(channel)) => match message.trailing.as_deref() {
                Some(login) if !login.is_empty() => Event::UserBan {
                    channel,
                    login: login.to_string(),
                    tags: tags(),
                },
                _ => Event::ClearChat { channel },
            },
            ("CLEARMSG", Some(channel)) => Event::ClearMsg {
                channel,
                tags: tags(),
            },
            ("GLOBALUSERSTATE", _) => Event::GlobalUserState { tags: tags() },
            ("USERSTATE", Some(channel)) => Event::UserState {
                channel,
                tags: tags(),
            },
            ("HOSTTARGET", Some(channel)) => host_target(channel, message.text()),
            ("RECONNECT", _) => {
                self.server_reconnect(actions);
                return;
            }
            (_, _) => {
                if let Some(err) = server_error(message) {
                    actions.push(Action::Emit(Event::error(err)));
                } else if message.channel.is_none() && is_channel_command(&message.command) {
                    debug!(command = %message.command, "channel missing, no typed event");
                }
                return;
            }
        };
        actions.push(Action::Emit(event));
    }
}

fn is_channel_command(command: &str) -> bool {
    matches!(
        command,
        "JOIN"
            | "PART"
            | "PRIVMSG"
            | "ROOMSTATE"
            | "USERNOTICE"
            | "CLEARCHAT"
            | "CLEARMSG"
            | "USERSTATE"
            | "HOSTTARGET"
    )
}

/// `HOSTTARGET #channel :<target|-> [viewers]`
fn host_target(channel: String, text: &str) -> Event {
    let mut parts = text.split(' ');
    let target = parts.next().unwrap_or_default();
    let viewers = parts.next().and_then(|v| v.parse().ok());
    if target == "-" || target.is_empty() {
        Event::HostStopped { channel, viewers }
    } else {
        Event::HostStarted {
            channel,
            target: target.to_string(),
            viewers,
        }
    }
}

/// Map 4xx/5xx numeric replies to an error, except the unsupported-WHOIS reply.
fn server_error(message: &Message) -> Option<ClientError> {
    let code = message.numeric()?;
    if !(400..600).contains(&code) {
        return None;
    }
    if code == WHOIS_UNKNOWN_COMMAND && message.param(1) == Some("WHOIS") {
        return None;
    }
    Some(ClientError::ServerReply {
        code,
        params: message.params.clone().unwrap_or_default(),
        text: message.text().to_string(),
    })
}
