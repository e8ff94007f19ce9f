//! Capability negotiation.
//!
//! The chat server offers three opt-in protocol extensions. They are
//! requested with `CAP REQ` before credentials are sent.

use std::fmt;

/// Optional protocol extensions offered by the chat server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Capability {
    /// JOIN/PART for other users in joined channels.
    Membership,
    /// Tag blocks on PRIVMSG, USERNOTICE, ROOMSTATE and friends.
    Tags,
    /// Platform-specific commands (CLEARCHAT, HOSTTARGET, USERNOTICE, RECONNECT...).
    Commands,
}

impl Capability {
    /// Every capability, in the order they are requested.
    pub const ALL: [Capability; 3] = [Self::Membership, Self::Tags, Self::Commands];
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        match self {
            Self::Membership => "twitch.tv/membership",
            Self::Tags => "twitch.tv/tags",
            Self::Commands => "twitch.tv/commands",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_names() {
        let names: Vec<String> = Capability::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec!["twitch.tv/membership", "twitch.tv/tags", "twitch.tv/commands"]
        );
    }
}
