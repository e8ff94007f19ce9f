//! Error types for the chat client.
//!
//! This module defines error types for transport failures, line parsing,
//! client usage mistakes, and configuration validation.

use thiserror::Error;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors raised below the message layer, while framing the byte stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbound line exceeded the bound configured on the codec.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Observed length in bytes, terminator included.
        actual: usize,
        /// The configured limit.
        limit: usize,
    },
}

/// Errors encountered when parsing a single protocol line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty after the terminator was stripped.
    #[error("empty message")]
    EmptyMessage,

    /// Tags and origin were read but no command verb followed.
    #[error("missing command in line: {line}")]
    MissingCommand {
        /// The offending line.
        line: String,
    },
}

/// Errors surfaced by the client, either synchronously from a call or
/// asynchronously through [`Event::Error`](crate::event::Event::Error).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// An outbound line exceeded the protocol's character limit.
    #[error("cannot send more than {limit} characters (got {len})")]
    LineTooLong {
        /// Length of the rejected line in characters.
        len: usize,
        /// The protocol limit.
        limit: usize,
    },

    /// An outbound line contained CR, LF or NUL.
    #[error("illegal control character {0:?} in outbound line")]
    IllegalControlChar(char),

    /// The connection task has shut down; no further commands are accepted.
    #[error("connection task is closed")]
    Closed,

    /// The server sent a NOTICE before the greeting completed.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// The server answered with a numeric error reply.
    #[error("server replied {code}: {text}")]
    ServerReply {
        /// Numeric reply code (400..=599).
        code: u16,
        /// Middle parameters of the reply.
        params: String,
        /// Trailing text of the reply.
        text: String,
    },

    /// Transport failure (connect, read or write).
    #[error("transport error: {0}")]
    Transport(#[from] ProtocolError),

    /// The server did not echo a `JOIN` or `PART` in time.
    #[error("no confirmation for {line:?} within {timeout:?}")]
    Unconfirmed {
        /// The line that was sent.
        line: String,
        /// How long the client waited.
        timeout: std::time::Duration,
    },

    /// A connection attempt did not finish in time.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// The token provider could not produce a credential.
    #[error("token provider failed: {0}")]
    Token(#[source] TokenError),
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(ProtocolError::Io(err))
    }
}

/// Error returned by a [`TokenProvider`](crate::auth::TokenProvider).
pub type TokenError = Box<dyn std::error::Error + Send + Sync>;

/// Errors detected while validating a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A named login was configured without any way to obtain a token.
    #[error("missing token for login {login}")]
    MissingToken {
        /// The configured login.
        login: String,
    },

    /// The readiness greeting checklist is empty, so login could never complete.
    #[error("greeting checklist must not be empty")]
    EmptyGreeting,
}
