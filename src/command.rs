//! Outbound commands.
//!
//! Only the verbs this client ever sends are modelled. Anything else can be
//! sent verbatim through [`Command::Raw`].

use std::fmt::{self, Write};

use crate::caps::Capability;
use crate::error::ClientError;

/// Maximum length, in characters, of an outbound line (terminator excluded).
pub const MAX_OUTBOUND_LEN: usize = 500;

/// Default server name echoed in `PONG` replies.
pub const DEFAULT_PONG_SERVER: &str = "tmi.twitch.tv";

/// A command the client can send.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// `CAP REQ <capability>`
    CapReq(Capability),
    /// `PASS oauth:<token>`
    Pass(String),
    /// `NICK <login>`
    Nick(String),
    /// `JOIN #<channel>`
    Join(String),
    /// `PART #<channel>`
    Part(String),
    /// `PRIVMSG #<channel> :<text>`
    Privmsg(String, String),
    /// `PONG :<server>`
    Pong(String),
    /// A preformatted line.
    Raw(String),
}

impl Command {
    /// Render the line and validate it with [`check_line`].
    pub fn to_line(&self) -> Result<String, ClientError> {
        let line = self.to_string();
        check_line(&line)?;
        Ok(line)
    }
}

/// Characters that would end or corrupt the line on the wire.
fn is_line_breaking(ch: char) -> bool {
    matches!(ch, '\r' | '\n' | '\0')
}

/// Reject lines that would not go out as exactly one protocol line.
///
/// A line must be at most [`MAX_OUTBOUND_LEN`] characters and must not
/// contain CR, LF or NUL. Other control characters (CTCP `\x01`, color
/// codes) pass through.
pub fn check_line(line: &str) -> Result<(), ClientError> {
    if let Some(ch) = line.chars().find(|ch| is_line_breaking(*ch)) {
        return Err(ClientError::IllegalControlChar(ch));
    }
    let len = line.chars().count();
    if len > MAX_OUTBOUND_LEN {
        return Err(ClientError::LineTooLong {
            len,
            limit: MAX_OUTBOUND_LEN,
        });
    }
    Ok(())
}

/// Prefix a channel name with `#` unless it already has one.
#[must_use]
pub fn channel_target(channel: &str) -> String {
    if channel.starts_with('#') {
        channel.to_string()
    } else {
        format!("#{}", channel)
    }
}

/// Normalize a token to the `oauth:` convention used by `PASS`.
#[must_use]
pub fn oauth_password(token: &str) -> String {
    if token.starts_with("oauth:") {
        token.to_string()
    } else {
        format!("oauth:{}", token)
    }
}

/// Write a command with a freeform (always colon-prefixed) trailing argument.
fn write_cmd_freeform(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    match args.split_last() {
        Some((suffix, middle)) => {
            f.write_str(cmd)?;
            for arg in middle {
                f.write_char(' ')?;
                f.write_str(arg)?;
            }
            f.write_str(" :")?;
            f.write_str(suffix)
        }
        None => f.write_str(cmd),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CapReq(cap) => write!(f, "CAP REQ {}", cap),
            Command::Pass(token) => write!(f, "PASS {}", oauth_password(token)),
            Command::Nick(login) => write!(f, "NICK {}", login),
            Command::Join(channel) => write!(f, "JOIN {}", channel_target(channel)),
            Command::Part(channel) => write!(f, "PART {}", channel_target(channel)),
            Command::Privmsg(channel, text) => {
                write_cmd_freeform(f, "PRIVMSG", &[channel_target(channel).as_str(), text.as_str()])
            }
            Command::Pong(server) => write_cmd_freeform(f, "PONG", &[server.as_str()]),
            Command::Raw(line) => f.write_str(line),
        }
    }
}
