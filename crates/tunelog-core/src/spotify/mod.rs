//! Play history collaborators and their Spotify Web API clients.

mod auth;
mod history;

use std::fmt;

use async_trait::async_trait;

use crate::models::RawPlayEvent;
use crate::Result;

pub use auth::{
    SpotifyAuthClient, SpotifyTokenProvider, TokenGrant, AUTHORIZE_URL, DEFAULT_TOKEN_URL,
    HISTORY_SCOPE,
};
pub use history::{SpotifyHistoryClient, DEFAULT_API_URL, MAX_HISTORY_LIMIT};

/// Short-lived bearer credential for the history API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AccessToken([REDACTED])")
    }
}

/// Exchanges a long-lived credential for an access token.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fails with [`crate::Error::Auth`] when the credential is rejected.
    async fn access_token(&self) -> Result<AccessToken>;
}

/// Source of recent play events.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `limit` most recent plays, in source order.
    async fn recently_played(&self, token: &AccessToken, limit: u32) -> Result<Vec<RawPlayEvent>>;
}
