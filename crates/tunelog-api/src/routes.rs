use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tunelog_core::{SyncOptions, SyncReport, SyncService};

use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    service: Arc<SyncService>,
    /// Serializes sync runs within this process
    sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(service: SyncService) -> Self {
        Self {
            service: Arc::new(service),
            sync_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/sync", get(run_sync))
        .route("/callback", get(oauth_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "tunelog is running"
}

async fn ping() -> &'static str {
    "OK"
}

async fn run_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, AppError> {
    let _guard = state.sync_lock.lock().await;
    let report = state.service.run(SyncOptions::default()).await?;
    tracing::info!(
        endpoint = "sync",
        date = %report.date,
        appended = report.appended,
        "Sync request completed"
    );
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

async fn oauth_callback(Query(query): Query<CallbackQuery>) -> Result<String, AppError> {
    if let Some(error) = query.error {
        return Err(AppError::bad_request(format!(
            "Spotify authorization failed: {error}"
        )));
    }
    let code = query
        .code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("missing authorization code"))?;

    tracing::info!(endpoint = "callback", code_len = code.len(), "Authorization code received");
    Ok(format!(
        "Authorization code received: {code}\n\
         Run `tunelog auth exchange --code <code>` to obtain a refresh token.\n"
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;
    use tunelog_core::models::RawPlayEvent;
    use tunelog_core::spotify::{AccessToken, AuthProvider, HistorySource};
    use tunelog_core::store::{
        ConflictRetryPolicy, DocumentStore, StoredDocument, VersionToken,
    };
    use tunelog_core::SyncSettings;

    use super::*;

    struct StaticAuth {
        reject: bool,
    }

    #[async_trait]
    impl AuthProvider for StaticAuth {
        async fn access_token(&self) -> tunelog_core::Result<AccessToken> {
            if self.reject {
                Err(tunelog_core::Error::Auth("invalid_grant".to_string()))
            } else {
                Ok(AccessToken::new("token"))
            }
        }
    }

    struct EmptyHistory;

    #[async_trait]
    impl HistorySource for EmptyHistory {
        async fn recently_played(
            &self,
            _token: &AccessToken,
            _limit: u32,
        ) -> tunelog_core::Result<Vec<RawPlayEvent>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct CountingStore {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        fn backend_name(&self) -> &'static str {
            "counting"
        }

        async fn read(&self, _path: &str) -> tunelog_core::Result<Option<StoredDocument>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn write(
            &self,
            _path: &str,
            _content: &str,
            _expected: Option<&VersionToken>,
            _message: &str,
        ) -> tunelog_core::Result<VersionToken> {
            Ok(VersionToken::new("v1"))
        }
    }

    fn app(reject_auth: bool) -> Router {
        let service = SyncService::new(
            Arc::new(StaticAuth {
                reject: reject_auth,
            }),
            Arc::new(EmptyHistory),
            Arc::new(CountingStore::default()),
            SyncSettings {
                timezone: tunelog_core::config::DEFAULT_TIMEZONE,
                history_dir: "spotify-history".to_string(),
                history_limit: 50,
                retry: ConflictRetryPolicy::default(),
            },
        );
        app_router(AppState::new(service))
    }

    async fn get_text(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn liveness_routes_answer() {
        assert_eq!(
            get_text(app(false), "/ping").await,
            (StatusCode::OK, "OK".to_string())
        );
        assert_eq!(get_text(app(false), "/").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn sync_route_returns_report() {
        let (status, body) = get_text(app(false), "/sync").await;
        assert_eq!(status, StatusCode::OK);

        let report: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["status"], "up_to_date");
        assert_eq!(report["fetched"], 0);
    }

    #[tokio::test]
    async fn sync_route_maps_rejected_credentials_to_bad_gateway() {
        let (status, body) = get_text(app(true), "/sync").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("invalid_grant"));
    }

    #[tokio::test]
    async fn callback_echoes_code_and_rejects_errors() {
        let (status, body) = get_text(app(false), "/callback?code=AQ-code").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Authorization code received: AQ-code"));

        let (status, _) = get_text(app(false), "/callback?error=access_denied").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_text(app(false), "/callback").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
