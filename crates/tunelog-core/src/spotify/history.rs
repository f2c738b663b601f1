//! Spotify recently-played history client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{AccessToken, HistorySource};
use crate::models::RawPlayEvent;
use crate::util::{compact_text, sanitize_error};
use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
/// Largest page the recently-played endpoint serves.
pub const MAX_HISTORY_LIMIT: u32 = 50;

#[derive(Clone, Debug)]
pub struct SpotifyHistoryClient {
    api_url: String,
    client: Client,
}

impl SpotifyHistoryClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, timeout)
    }

    pub fn with_api_url(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build Spotify client: {error}")))?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl HistorySource for SpotifyHistoryClient {
    async fn recently_played(&self, token: &AccessToken, limit: u32) -> Result<Vec<RawPlayEvent>> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let response = self
            .client
            .get(format!("{}/v1/me/player/recently-played", self.api_url))
            .query(&[("limit", limit)])
            .bearer_auth(token.secret())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| {
                Error::Fetch(format!(
                    "Spotify history request failed: {}",
                    sanitize_error(&error)
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(history_error(status, &body, retry_after.as_deref()));
        }

        let page = response.json::<RecentlyPlayedPage>().await.map_err(|error| {
            Error::Fetch(format!(
                "Spotify history response could not be parsed: {}",
                sanitize_error(&error)
            ))
        })?;
        let events = page.into_events();
        tracing::debug!(count = events.len(), "Fetched recently played tracks");
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
struct RecentlyPlayedPage {
    #[serde(default)]
    items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Deserialize)]
struct PlayHistoryItem {
    track: Option<TrackObject>,
    played_at: String,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

impl RecentlyPlayedPage {
    fn into_events(self) -> Vec<RawPlayEvent> {
        self.items
            .into_iter()
            .filter_map(|item| {
                let Some(track) = item.track else {
                    tracing::warn!("Skipping history item without track at {}", item.played_at);
                    return None;
                };
                Some(RawPlayEvent {
                    track_name: track.name,
                    artist_names: track.artists.into_iter().map(|artist| artist.name).collect(),
                    played_at: item.played_at,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn history_error(status: StatusCode, body: &str, retry_after: Option<&str>) -> Error {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.error)
        .and_then(|error| error.message)
        .unwrap_or_else(|| compact_text(body));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(format!(
            "Spotify history request rejected with HTTP {}: {detail}",
            status.as_u16()
        )),
        StatusCode::TOO_MANY_REQUESTS => Error::Fetch(format!(
            "Spotify history request rate limited (retry after {}s)",
            retry_after.unwrap_or("?")
        )),
        _ => Error::Fetch(format!(
            "Spotify history request failed with HTTP {}: {detail}",
            status.as_u16()
        )),
    }
}
