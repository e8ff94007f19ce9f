//! Async chat client.
//!
//! [`Client`] configures and spawns a connection task; the returned
//! [`ClientHandle`] is a cheap, cloneable handle for sending commands and
//! subscribing to events.
//!
//! The task serializes socket reads, user commands, the in-flight connect
//! attempt and the reconnect timer onto one `select!` loop, so the
//! [`Session`] it drives needs no locking. A connect attempt is polled as
//! one branch of that loop, so [`ClientHandle::close`] can drop it midway.
//!
//! # Example
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

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::auth::{StaticToken, TokenProvider};
use crate::command::{check_line, Command};
use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError, ProtocolError};
use crate::event::{Event, EventKind};
use crate::listeners::{EventHub, ListenerId, Subscription};
use crate::state::{Action, ConnectionState, Session};
use crate::transport::{self, Connection};
use crate::util::sleep_until_opt;

/// Usual limit for [`ClientHandle::join_and_wait`] and [`ClientHandle::part_and_wait`].
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for a connection task.
pub struct Client {
    config: ClientConfig,
    provider: Option<Arc<dyn TokenProvider>>,
}

impl Client {
    /// Start building a client from `config`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            provider: None,
        }
    }

    /// Ask `provider` for a token on every connection attempt instead of
    /// using the configured static token.
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate the configuration and spawn the connection task.
    ///
    /// Must be called from within a tokio runtime. Connects immediately
    /// when `auto_connect` is set.
    pub fn spawn(self) -> Result<ClientHandle, ConfigError> {
        let Client { config, provider } = self;
        let creds = config.resolve(provider.is_some())?;

        // Anonymous logins never send PASS.
        let provider = if config.login.is_none() {
            None
        } else {
            provider.or_else(|| {
                creds
                    .token
                    .clone()
                    .map(|token| Arc::new(StaticToken::new(token)) as Arc<dyn TokenProvider>)
            })
        };

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let events = EventHub::new();
        let login: Arc<str> = Arc::from(creds.login.as_str());

        let driver = Driver {
            session: Session::new(&config, creds.login),
            config,
            provider,
            events: events.clone(),
            state_tx,
            socket: None,
            connecting: None,
            reconnect_at: None,
        };
        tokio::spawn(driver.run(commands_rx));

        Ok(ClientHandle {
            commands: commands_tx,
            events,
            state: state_rx,
            login,
        })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

#[derive(Debug)]
enum ClientCommand {
    Connect,
    Send(String),
    Close,
}

/// Handle to a running connection task.
///
/// Dropping every handle closes the connection and ends the task.
#[derive(Clone, Debug)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<ClientCommand>,
    events: EventHub<Event>,
    state: watch::Receiver<ConnectionState>,
    login: Arc<str>,
}

impl ClientHandle {
    /// The login this client uses.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Whether the connection is logged in.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Wait until the connection reaches `state`.
    pub async fn wait_for(&self, state: ConnectionState) -> Result<(), ClientError> {
        let mut rx = self.state.clone();
        loop {
            if *rx.borrow_and_update() == state {
                return Ok(());
            }
            rx.changed().await.map_err(|_| ClientError::Closed)?;
        }
    }

    /// Open a connection, replacing any existing one.
    pub fn connect(&self) -> Result<(), ClientError> {
        self.command(ClientCommand::Connect)
    }

    /// Send a raw line. Queued until the connection is ready.
    ///
    /// Lines longer than 500 characters or containing CR, LF or NUL are
    /// rejected here and never sent.
    pub fn send(&self, line: impl Into<String>) -> Result<(), ClientError> {
        let line = line.into();
        check_line(&line)?;
        self.command(ClientCommand::Send(line))
    }

    /// Join a channel (`#` optional).
    pub fn join(&self, channel: &str) -> Result<(), ClientError> {
        self.send_command(Command::Join(channel.to_string()))
    }

    /// Leave a channel (`#` optional).
    pub fn part(&self, channel: &str) -> Result<(), ClientError> {
        self.send_command(Command::Part(channel.to_string()))
    }

    /// Join a channel and wait until the server echoes our own `JOIN`.
    ///
    /// Fails with [`ClientError::Unconfirmed`] when no echo arrives within
    /// `limit`. The line is still sent in that case.
    pub async fn join_and_wait(&self, channel: &str, limit: Duration) -> Result<(), ClientError> {
        let name = channel.trim_start_matches('#').to_string();
        let confirmed = self.events.subscribe_filtered(move |event| {
            matches!(event, Event::Join { channel } if channel.eq_ignore_ascii_case(&name))
        });
        self.send_confirmed(Command::Join(channel.to_string()), confirmed, limit)
            .await
    }

    /// Leave a channel and wait until the server echoes our own `PART`.
    pub async fn part_and_wait(&self, channel: &str, limit: Duration) -> Result<(), ClientError> {
        let name = channel.trim_start_matches('#').to_string();
        let confirmed = self.events.subscribe_filtered(move |event| {
            matches!(event, Event::Part { channel } if channel.eq_ignore_ascii_case(&name))
        });
        self.send_confirmed(Command::Part(channel.to_string()), confirmed, limit)
            .await
    }

    /// Send a chat message to a channel (`#` optional).
    pub fn say(&self, channel: &str, text: &str) -> Result<(), ClientError> {
        self.send_command(Command::Privmsg(channel.to_string(), text.to_string()))
    }

    /// Close the connection and stop reconnecting. Safe to call repeatedly.
    ///
    /// Also abandons a connect attempt that is still in progress.
    pub fn close(&self) {
        // A task that has already exited is closed.
        let _ = self.command(ClientCommand::Close);
    }

    /// Receive every event.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<Event> {
        self.events.subscribe()
    }

    /// Receive only events of one kind.
    #[must_use]
    pub fn subscribe_to(&self, kind: EventKind) -> Subscription<Event> {
        self.events.subscribe_filtered(move |event| event.kind() == kind)
    }

    /// Receive events matching `filter`.
    #[must_use]
    pub fn subscribe_filtered<F>(&self, filter: F) -> Subscription<Event>
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.events.subscribe_filtered(filter)
    }

    /// Remove a listener by id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove(id)
    }

    fn send_command(&self, command: Command) -> Result<(), ClientError> {
        let line = command.to_line()?;
        self.command(ClientCommand::Send(line))
    }

    /// `confirmed` is subscribed before sending so a fast echo is not missed.
    async fn send_confirmed(
        &self,
        command: Command,
        mut confirmed: Subscription<Event>,
        limit: Duration,
    ) -> Result<(), ClientError> {
        let line = command.to_line()?;
        self.command(ClientCommand::Send(line.clone()))?;
        match tokio::time::timeout(limit, confirmed.recv()).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ClientError::Closed),
            Err(_) => Err(ClientError::Unconfirmed {
                line,
                timeout: limit,
            }),
        }
    }

    fn command(&self, command: ClientCommand) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Closed)
    }
}

/// Socket plus the token it was opened with.
type ConnectResult = Result<(Connection, Option<String>), ClientError>;

type ConnectFuture = Pin<Box<dyn Future<Output = ConnectResult> + Send>>;

/// The connection task.
struct Driver {
    config: ClientConfig,
    session: Session,
    provider: Option<Arc<dyn TokenProvider>>,
    events: EventHub<Event>,
    state_tx: watch::Sender<ConnectionState>,
    socket: Option<Connection>,
    connecting: Option<ConnectFuture>,
    reconnect_at: Option<Instant>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ClientCommand>) {
        if self.config.auto_connect {
            self.start_connect();
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ClientCommand::Connect) => self.start_connect(),
                    Some(ClientCommand::Send(line)) => match self.session.send(line) {
                        Ok(actions) => self.apply(actions).await,
                        Err(err) => {
                            self.events.emit(&Event::error(err));
                        }
                    },
                    Some(ClientCommand::Close) => {
                        let actions = self.session.close();
                        self.apply(actions).await;
                    }
                    None => {
                        debug!("all handles dropped, shutting down");
                        let actions = self.session.close();
                        self.apply(actions).await;
                        break;
                    }
                },
                result = next_connect(&mut self.connecting) => {
                    self.connecting = None;
                    self.finish_connect(result).await;
                }
                frame = next_frame(&mut self.socket) => match frame {
                    Some(Ok(line)) => {
                        let actions = self.session.on_line(&line);
                        self.apply(actions).await;
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "read failed");
                        self.lose_socket(err).await;
                    }
                    None => {
                        info!("server closed the connection");
                        self.socket = None;
                        let actions = self.session.on_disconnected();
                        self.apply(actions).await;
                    }
                },
                () = sleep_until_opt(self.reconnect_at) => {
                    self.reconnect_at = None;
                    self.start_connect();
                }
            }
        }
    }

    /// Drop any socket or earlier attempt and start a new attempt.
    fn start_connect(&mut self) {
        self.reconnect_at = None;
        if self.socket.take().is_some() {
            debug!("replacing existing connection");
        }
        if self.connecting.take().is_some() {
            debug!("restarting connect attempt");
        }
        self.session.begin_connect();
        self.publish_state();

        let provider = self.provider.clone();
        let addr = self.config.addr();
        let max_line_len = self.config.max_line_len;
        let limit = self.config.connect_timeout;
        self.connecting = Some(Box::pin(attempt(provider, addr, max_line_len, limit)));
    }

    async fn finish_connect(&mut self, result: ConnectResult) {
        match result {
            Ok((conn, token)) => {
                info!(login = %self.session.login(), "connected");
                self.socket = Some(conn);
                let actions = self.session.on_connected(token.as_deref());
                self.apply(actions).await;
            }
            Err(err) => {
                warn!(error = %err, "connect failed");
                self.fail_connect(err).await;
            }
        }
    }

    async fn fail_connect(&mut self, err: ClientError) {
        let mut actions = vec![Action::Emit(Event::error(err))];
        actions.extend(self.session.on_disconnected());
        self.apply(actions).await;
    }

    async fn lose_socket(&mut self, err: ProtocolError) {
        self.socket = None;
        self.fail_connect(ClientError::Transport(err)).await;
    }

    /// Carry out session actions in order.
    async fn apply(&mut self, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                Action::Send(line) => {
                    let Some(conn) = self.socket.as_mut() else {
                        debug!(%line, "no socket, dropping line");
                        continue;
                    };
                    if let Err(err) = conn.send(line).await {
                        warn!(error = %err, "write failed");
                        self.socket = None;
                        queue.clear();
                        queue.push_back(Action::Emit(Event::error(err.into())));
                        queue.extend(self.session.on_disconnected());
                    }
                }
                Action::Emit(event) => {
                    self.events.emit(&event);
                }
                Action::Close => {
                    self.reconnect_at = None;
                    let abandoned = self.connecting.take().is_some();
                    if abandoned {
                        debug!("connect attempt abandoned");
                    }
                    if let Some(mut conn) = self.socket.take() {
                        if let Err(err) = conn.close().await {
                            debug!(error = %err, "error while closing socket");
                        }
                        queue.extend(self.session.on_disconnected());
                    } else if abandoned {
                        queue.extend(self.session.on_disconnected());
                    }
                }
                Action::Reconnect => {
                    self.socket = None;
                    self.connecting = None;
                    self.reconnect_at = Some(Instant::now());
                }
                Action::ScheduleReconnect(delay) => {
                    self.reconnect_at = Some(Instant::now() + delay);
                }
            }
        }
        self.publish_state();
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.session.state());
    }
}

/// Fetch a token, then open the socket, within `limit`.
async fn attempt(
    provider: Option<Arc<dyn TokenProvider>>,
    addr: String,
    max_line_len: Option<usize>,
    limit: Duration,
) -> ConnectResult {
    let open = async {
        let token = match provider {
            Some(provider) => Some(provider.token().await.map_err(ClientError::Token)?),
            None => None,
        };
        let conn = transport::connect(&addr, max_line_len).await?;
        Ok::<_, ClientError>((conn, token))
    };
    tokio::time::timeout(limit, open)
        .await
        .map_err(|_| ClientError::ConnectTimeout(limit))?
}

async fn next_connect(attempt: &mut Option<ConnectFuture>) -> ConnectResult {
    match attempt {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(socket: &mut Option<Connection>) -> Option<Result<String, ProtocolError>> {
    match socket {
        Some(conn) => conn.next().await,
        None => std::future::pending().await,
    }
}
