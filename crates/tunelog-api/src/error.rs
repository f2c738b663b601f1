use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Upstream service error: {0}")]
    External(String),
    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::External(_) => StatusCode::BAD_GATEWAY,
            Self::SyncFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tunelog_core::Error> for AppError {
    fn from(error: tunelog_core::Error) -> Self {
        use tunelog_core::Error as Core;

        match error {
            Core::Auth(_) | Core::Fetch(_) => Self::External(error.to_string()),
            Core::InvalidInput(_) => Self::BadRequest(error.to_string()),
            other => Self::SyncFailed(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_http_statuses() {
        let cases = [
            (
                tunelog_core::Error::Auth("invalid_grant".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                tunelog_core::Error::Fetch("timeout".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                tunelog_core::Error::InvalidInput("bad path".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                tunelog_core::Error::Conflict {
                    path: "spotify-history/2024-05-01.md".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).into_response().status(), expected);
        }
    }
}
