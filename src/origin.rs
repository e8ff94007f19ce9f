//! Message origin (the `:prefix` of a line).
//!
//! An origin identifies where a line came from: either a server hostname
//! or a user's `nick!user@host` mask. On this network the nick portion is
//! the account login.

/// Borrowed view of a line origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin<'a> {
    /// Server hostname, e.g. `tmi.twitch.tv`.
    Server(&'a str),
    /// User mask `nick!user@host`; user and host may be empty.
    User {
        /// Nickname (the login).
        nick: &'a str,
        /// Username part, between `!` and `@`.
        user: &'a str,
        /// Hostname part, after `@`.
        host: &'a str,
    },
}

impl<'a> Origin<'a> {
    /// Parse an origin string. This is lenient and never fails.
    ///
    /// A string containing `!` or `@` is a user mask; anything else is
    /// treated as a server name.
    #[must_use]
    pub fn parse(s: &'a str) -> Self {
        match s.find(['!', '@']) {
            None => Origin::Server(s),
            Some(idx) => {
                let nick = &s[..idx];
                let rest = &s[idx..];
                let (user, host) = match rest.strip_prefix('!') {
                    Some(after) => after.split_once('@').unwrap_or((after, "")),
                    None => ("", &rest[1..]),
                };
                Origin::User { nick, user, host }
            }
        }
    }

    /// The login portion: the nick of a user mask, or the whole server name.
    #[must_use]
    pub fn login(&self) -> &'a str {
        match *self {
            Origin::Server(name) => name,
            Origin::User { nick, .. } => nick,
        }
    }
}
