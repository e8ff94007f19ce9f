//! Collaborators backed by the platform's HTTP API.
//!
//! The client asks a [`TokenProvider`] for a token on every connection
//! attempt, so a provider backed by an HTTP API can refresh expired tokens
//! between reconnects. [`AccountLookup`] resolves logins to the numeric
//! account ids found in `user-id` and `room-id` tags.

use async_trait::async_trait;

use crate::error::TokenError;

/// Source of access tokens for `PASS`.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid token, with or without the `oauth:` prefix.
    async fn token(&self) -> Result<String, TokenError>;
}

/// A fixed token that never changes.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, TokenError> {
        Ok(self.0.clone())
    }
}

/// Resolves a login name to its opaque numeric account id.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// `Ok(None)` when no account has that login.
    async fn account_id(&self, login: &str) -> Result<Option<String>, TokenError>;
}
