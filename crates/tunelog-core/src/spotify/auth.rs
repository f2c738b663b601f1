//! Spotify accounts service token client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{AccessToken, AuthProvider};
use crate::config::SpotifyAppConfig;
use crate::util::{compact_text, sanitize_error};
use crate::{Error, Result};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
/// Only scope the history endpoint needs.
pub const HISTORY_SCOPE: &str = "user-read-recently-played";

/// Tokens returned by the authorization-code grant.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenGrant")
            .field("access_token", &self.access_token)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Client for the accounts token endpoint, authenticated with the app credentials.
#[derive(Clone)]
pub struct SpotifyAuthClient {
    token_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

impl SpotifyAuthClient {
    pub fn new(app: &SpotifyAppConfig, timeout: Duration) -> Result<Self> {
        Self::with_token_url(app, DEFAULT_TOKEN_URL, timeout)
    }

    pub fn with_token_url(
        app: &SpotifyAppConfig,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build Spotify client: {error}")))?;
        Ok(Self {
            token_url: token_url.into(),
            client_id: app.client_id.clone(),
            client_secret: app.client_secret.clone(),
            client,
        })
    }

    /// Consent page URL that redirects back to `redirect_uri` with a `code`.
    #[must_use]
    pub fn authorize_url(&self, redirect_uri: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&response_type=code&redirect_uri={}&scope={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(HISTORY_SCOPE)
        )
    }

    /// Refresh-token grant.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(Error::Auth("refresh token must not be empty".to_string()));
        }

        let payload = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        Ok(payload.access_token)
    }

    /// Authorization-code grant, used once to obtain a refresh token.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::InvalidInput(
                "authorization code must not be empty".to_string(),
            ));
        }

        let payload = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .await?;
        Ok(TokenGrant {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_in: payload.expires_in,
            scope: payload.scope,
        })
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenPayload> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await
            .map_err(|error| {
                Error::Fetch(format!(
                    "Spotify token request failed: {}",
                    sanitize_error(&error)
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(token_error(status, &body));
        }

        let payload = response.json::<TokenResponse>().await.map_err(|error| {
            Error::Auth(format!(
                "Spotify token response could not be parsed: {}",
                sanitize_error(&error)
            ))
        })?;
        payload.try_into()
    }
}

/// [`AuthProvider`] backed by a stored refresh token.
#[derive(Clone)]
pub struct SpotifyTokenProvider {
    client: SpotifyAuthClient,
    refresh_token: String,
}

impl SpotifyTokenProvider {
    #[must_use]
    pub fn new(client: SpotifyAuthClient, refresh_token: impl Into<String>) -> Self {
        Self {
            client,
            refresh_token: refresh_token.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for SpotifyTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let token = self.client.refresh_access_token(&self.refresh_token).await?;
        tracing::debug!("Refreshed Spotify access token");
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
}

struct TokenPayload {
    access_token: AccessToken,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
}

impl TryFrom<TokenResponse> for TokenPayload {
    type Error = Error;

    fn try_from(value: TokenResponse) -> Result<Self> {
        let access_token = value
            .access_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::Auth("Spotify token response did not include access_token".to_string())
            })?;

        Ok(Self {
            access_token: AccessToken::new(access_token),
            refresh_token: value
                .refresh_token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            expires_in: value.expires_in,
            scope: value.scope,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

fn token_error(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<TokenErrorBody>(body)
        .ok()
        .and_then(|payload| payload.error_description.or(payload.error))
        .unwrap_or_else(|| compact_text(body));
    let message = format!("Spotify token endpoint returned HTTP {}: {detail}", status.as_u16());

    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        Error::Auth(message)
    } else {
        Error::Fetch(message)
    }
}
