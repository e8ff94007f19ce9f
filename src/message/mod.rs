//! Parsed protocol lines.
//!
//! [`Message`] is the structured form of one terminator-stripped line:
//! tag block, origin, command verb, raw middle parameters (with the channel
//! picked out), and the trailing free-text payload.

mod parse;
pub mod tags;

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::MessageParseError;
use crate::origin::Origin;

pub use self::tags::Tags;

/// One parsed protocol line.
///
/// Parsing is lenient: any text left over after the trailing stage is kept
/// in [`Message::unparsed`] instead of failing the parse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Tag block; empty when the line carried none.
    pub tags: Tags,
    /// Origin without the leading `:`, e.g. `nick!nick@nick.tmi.twitch.tv`.
    pub origin: Option<String>,
    /// Command verb or numeric reply code.
    pub command: String,
    /// First `#`-prefixed middle parameter, sigil stripped.
    pub channel: Option<String>,
    /// Raw middle parameters, verbatim.
    pub params: Option<String>,
    /// Trailing free text, trimmed.
    pub trailing: Option<String>,
    /// Text the parser could not place. Diagnostic only.
    pub unparsed: Option<String>,
}

impl Message {
    /// Parse a terminator-stripped line.
    ///
    /// Fails only when the line is empty or no command verb can be found.
    pub fn parse(line: &str) -> Result<Self, MessageParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let missing = || MessageParseError::MissingCommand {
            line: line.to_string(),
        };
        let (remaining, stages) = parse::parse_stages(line).map_err(|_| missing())?;
        if stages.command.is_empty() {
            return Err(missing());
        }

        let unparsed = if remaining.is_empty() {
            None
        } else {
            warn!(line, ?remaining, "could not parse part of message");
            Some(remaining.to_string())
        };

        Ok(Self {
            tags: stages.tags.map(Tags::parse).unwrap_or_default(),
            origin: stages.origin.map(str::to_string),
            command: stages.command.to_string(),
            channel: stages
                .params
                .and_then(parse::channel_param)
                .map(str::to_string),
            params: stages.params.map(str::to_string),
            trailing: stages.trailing.map(str::to_string),
            unparsed,
        })
    }

    /// The login portion of the origin, if there is one.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.origin.as_deref().map(|o| Origin::parse(o).login())
    }

    /// The `n`-th space-separated middle parameter.
    #[must_use]
    pub fn param(&self, n: usize) -> Option<&str> {
        self.params.as_deref()?.split_whitespace().nth(n)
    }

    /// Numeric reply code, when the command is a three-digit number.
    #[must_use]
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Trailing text, or the empty string when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.trailing.as_deref().unwrap_or("")
    }
}

impl FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

impl fmt::Display for Message {
    /// Serializes back to wire form, without the line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tags.is_empty() {
            write!(f, "@{} ", self.tags)?;
        }
        if let Some(origin) = &self.origin {
            write!(f, ":{} ", origin)?;
        }
        f.write_str(&self.command)?;
        if let Some(params) = &self.params {
            write!(f, " {}", params)?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{}", trailing)?;
        }
        Ok(())
    }
}
