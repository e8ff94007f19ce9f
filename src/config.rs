//! Client configuration.
//!
//! [`ClientConfig`] holds everything needed to open and log in a chat
//! connection. Defaults match the public chat endpoint; only the login and
//! token usually need to be set.
//!
//! # Example
//!
//! ```
//! use tmi_notify::ClientConfig;
//!
//! let config = ClientConfig::new()
//!     .with_login("somebot")
//!     .with_token("cfabdegwdoklmawdzdo98xt2fo512y")
//!     .with_auto_connect(false);
//!
//! let creds = config.credentials().unwrap();
//! assert_eq!(creds.login, "somebot");
//! ```

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::util::random_digits;

/// Default chat host.
pub const DEFAULT_HOST: &str = "irc.chat.twitch.tv";

/// Default plaintext chat port.
pub const DEFAULT_PORT: u16 = 6667;

/// Delay before an automatic reconnect.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on one connection attempt, token fetch included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix of server-accepted anonymous logins.
pub const ANONYMOUS_PREFIX: &str = "justinfan";

/// Greeting fragments that must be seen, in order, before the connection is ready.
pub const DEFAULT_GREETING: [&str; 3] = [
    "Welcome, GLHF!",
    "You are in a maze of twisty passages",
    ">",
];

/// Connection settings.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Chat server hostname.
    pub host: String,
    /// Chat server port.
    pub port: u16,
    /// Account login. `None` logs in anonymously.
    pub login: Option<String>,
    /// Access token, with or without the `oauth:` prefix.
    pub token: Option<String>,
    /// Reconnect after a connection loss that was not caused by [`close`](crate::ClientHandle::close).
    pub auto_reconnect: bool,
    /// Request the membership, tags and commands capabilities on connect.
    pub request_caps: bool,
    /// Connect as soon as the client is spawned.
    pub auto_connect: bool,
    /// Fixed delay before an automatic reconnect.
    pub reconnect_delay: Duration,
    /// Give up on a connection attempt after this long.
    pub connect_timeout: Duration,
    /// Ordered greeting fragments that gate readiness.
    pub greeting: Vec<String>,
    /// Optional bound on inbound line length, in bytes.
    pub max_line_len: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            login: None,
            token: None,
            auto_reconnect: true,
            request_caps: true,
            auto_connect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            greeting: DEFAULT_GREETING.iter().map(|s| s.to_string()).collect(),
            max_line_len: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("login", &self.login)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("auto_reconnect", &self.auto_reconnect)
            .field("request_caps", &self.request_caps)
            .field("auto_connect", &self.auto_connect)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("connect_timeout", &self.connect_timeout)
            .field("greeting", &self.greeting)
            .field("max_line_len", &self.max_line_len)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with all defaults (anonymous login).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the account login.
    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// Set the access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the server address.
    #[must_use]
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Enable or disable automatic reconnects.
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Enable or disable capability requests.
    #[must_use]
    pub fn with_request_caps(mut self, enabled: bool) -> Self {
        self.request_caps = enabled;
        self
    }

    /// Enable or disable connecting on spawn.
    #[must_use]
    pub fn with_auto_connect(mut self, enabled: bool) -> Self {
        self.auto_connect = enabled;
        self
    }

    /// Set the delay before an automatic reconnect.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the connection attempt timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the greeting checklist.
    #[must_use]
    pub fn with_greeting<I, S>(mut self, greeting: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.greeting = greeting.into_iter().map(Into::into).collect();
        self
    }

    /// Bound inbound line length.
    #[must_use]
    pub fn with_max_line_len(mut self, max_len: usize) -> Self {
        self.max_line_len = Some(max_len);
        self
    }

    /// `host:port` for the socket connect.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration and resolve the login and static token.
    ///
    /// An unset login becomes a random anonymous login. A named login
    /// without a token is rejected unless it is itself anonymous.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.resolve(false)
    }

    /// Like [`credentials`](Self::credentials), but a token provider stands in
    /// for a missing static token.
    pub(crate) fn resolve(&self, has_provider: bool) -> Result<Credentials, ConfigError> {
        if self.greeting.is_empty() {
            return Err(ConfigError::EmptyGreeting);
        }
        let login = match &self.login {
            None => return Ok(Credentials::anonymous()),
            Some(login) => login.clone(),
        };
        if self.token.is_none() && !has_provider && !is_anonymous_login(&login) {
            return Err(ConfigError::MissingToken { login });
        }
        Ok(Credentials {
            login,
            token: self.token.clone(),
        })
    }
}

/// A resolved login and optional static token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login sent with `NICK`.
    pub login: String,
    /// Token sent with `PASS`; `None` skips `PASS`.
    pub token: Option<String>,
}

impl Credentials {
    /// Random `justinfan#####` login without a token.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            login: format!("{}{}", ANONYMOUS_PREFIX, random_digits(5)),
            token: None,
        }
    }

    /// Whether no `PASS` line will be sent.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Whether `login` contains `justinfan` followed by at least one digit.
#[must_use]
pub fn is_anonymous_login(login: &str) -> bool {
    login.match_indices(ANONYMOUS_PREFIX).any(|(idx, prefix)| {
        login[idx + prefix.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Correlation windows for gift notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NotificationTiming {
    /// How long a single gift waits for a matching mass-gift announcement,
    /// and how long an accumulating mass gift waits after each absorbed gift.
    pub gift_delay: Duration,
    /// How long a fresh mass-gift announcement waits for its gifts.
    pub mass_gift_delay: Duration,
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self {
            gift_delay: Duration::from_secs(1),
            mass_gift_delay: Duration::from_secs(5),
        }
    }
}
