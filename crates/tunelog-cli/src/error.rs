use std::io;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tunelog_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No listening history stored for {0}")]
    DocumentNotFound(NaiveDate),
    #[error(
        "No redirect URI given. Pass --redirect-uri or set SPOTIFY_REDIRECT_URI to the URI registered for the app."
    )]
    MissingRedirectUri,
    #[error("Spotify did not return a refresh token. Authorize again and use a fresh code.")]
    MissingRefreshToken,
}
