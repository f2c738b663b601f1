//! One incremental sync run: fetch recent plays and fold them into the day document.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::{StoreTarget, SyncConfig};
use crate::models::{NormalizedPlay, Watermark};
use crate::reconcile::{
    merge_entries, normalize_events, plays_on_date, render_entries, select_new_plays, LogDocument,
};
use crate::spotify::{
    AuthProvider, HistorySource, SpotifyAuthClient, SpotifyHistoryClient, SpotifyTokenProvider,
};
use crate::store::{
    ConflictRetryPolicy, ConflictSafePersister, DocumentStore, GithubContentsStore,
    LocalFileStore, StoredDocument, VersionToken,
};
use crate::Result;

/// Pipeline parameters that do not belong to any collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub timezone: Tz,
    pub history_dir: String,
    pub history_limit: u32,
    pub retry: ConflictRetryPolicy,
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            timezone: config.timezone,
            history_dir: config.history_dir.clone(),
            history_limit: config.history_limit,
            retry: config.retry,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compute the merged document without persisting it
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing new for the day; no write was attempted
    UpToDate,
    Written {
        version: VersionToken,
        attempts: u32,
    },
    DryRun {
        content: String,
    },
}

/// What a run saw and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub date: NaiveDate,
    pub path: String,
    /// Events returned by the history source
    pub fetched: usize,
    /// Plays on `date` newer than the stored watermark
    pub considered: usize,
    pub appended: usize,
    pub duplicates: usize,
    /// Watermark after the run, if the document has one
    pub watermark: Option<Watermark>,
    #[serde(flatten)]
    pub status: SyncStatus,
}

impl SyncReport {
    fn up_to_date(
        date: NaiveDate,
        path: String,
        fetched: usize,
        watermark: Option<Watermark>,
    ) -> Self {
        Self {
            date,
            path,
            fetched,
            considered: 0,
            appended: 0,
            duplicates: 0,
            watermark,
            status: SyncStatus::UpToDate,
        }
    }
}

pub struct SyncService {
    auth: Arc<dyn AuthProvider>,
    history: Arc<dyn HistorySource>,
    store: Arc<dyn DocumentStore>,
    settings: SyncSettings,
}

impl SyncService {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        history: Arc<dyn HistorySource>,
        store: Arc<dyn DocumentStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            auth,
            history,
            store,
            settings,
        }
    }

    /// Wire the Spotify clients and the configured document store.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let auth_client = SpotifyAuthClient::new(&config.spotify, config.http_timeout)?;
        let auth = SpotifyTokenProvider::new(auth_client, config.refresh_token.clone());
        let history = SpotifyHistoryClient::new(config.http_timeout)?;
        let store = open_store(&config.target, config.http_timeout)?;

        Ok(Self::new(
            Arc::new(auth),
            Arc::new(history),
            store,
            SyncSettings::from(config),
        ))
    }

    /// Current calendar day in the reference timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.settings.timezone).date_naive()
    }

    #[must_use]
    pub fn document_path(&self, date: NaiveDate) -> String {
        format!("{}/{date}.md", self.settings.history_dir)
    }

    pub async fn run(&self, options: SyncOptions) -> Result<SyncReport> {
        self.run_for_date(self.today(), options).await
    }

    pub async fn run_for_date(&self, date: NaiveDate, options: SyncOptions) -> Result<SyncReport> {
        let path = self.document_path(date);
        tracing::info!(%date, backend = self.store.backend_name(), "Starting sync");

        let token = self.auth.access_token().await?;
        let raw = self
            .history
            .recently_played(&token, self.settings.history_limit)
            .await?;
        let fetched = raw.len();

        let plays = normalize_events(&raw, self.settings.timezone);
        let on_date = plays_on_date(&plays, date);
        if on_date.is_empty() {
            tracing::info!(fetched, %date, "No plays on this day; document left untouched");
            return Ok(SyncReport::up_to_date(date, path, fetched, None));
        }

        let stored = self.store.read(&path).await?;
        let document = stored
            .as_ref()
            .map(|stored| LogDocument::parse(&stored.content, self.settings.timezone));
        let previous = document.as_ref().and_then(|document| document.last_synced);

        let fresh: Vec<&NormalizedPlay> = select_new_plays(&on_date, date, previous).collect();
        let Some(newest) = fresh.iter().map(|play| play.played_at_utc()).max() else {
            tracing::info!(
                fetched,
                watermark = ?previous,
                "No plays newer than the stored watermark"
            );
            return Ok(SyncReport::up_to_date(date, path, fetched, previous));
        };

        let entries = render_entries(fresh.iter().copied());
        let merged = merge_entries(document.as_ref(), date, &entries, newest);
        tracing::info!(
            considered = fresh.len(),
            appended = merged.appended,
            duplicates = merged.duplicates,
            "Merged plays into {}",
            path
        );

        let status = if options.dry_run {
            SyncStatus::DryRun {
                content: merged.content,
            }
        } else {
            let persister = ConflictSafePersister::new(self.store.as_ref(), self.settings.retry);
            let outcome = persister
                .persist(
                    &path,
                    &merged.content,
                    stored.map(|stored| stored.version),
                    &commit_message(date),
                )
                .await?;
            SyncStatus::Written {
                version: outcome.version,
                attempts: outcome.attempts,
            }
        };

        Ok(SyncReport {
            date,
            path,
            fetched,
            considered: fresh.len(),
            appended: merged.appended,
            duplicates: merged.duplicates,
            watermark: Some(merged.watermark),
            status,
        })
    }

    /// Stored document for `date`, if any.
    pub async fn read_day(&self, date: NaiveDate) -> Result<Option<StoredDocument>> {
        self.store.read(&self.document_path(date)).await
    }
}

fn commit_message(date: NaiveDate) -> String {
    format!("Update listening history for {date}")
}

fn open_store(
    target: &StoreTarget,
    timeout: std::time::Duration,
) -> Result<Arc<dyn DocumentStore>> {
    Ok(match target {
        StoreTarget::Github(config) => Arc::new(GithubContentsStore::new(config.clone(), timeout)?),
        StoreTarget::Local(root) => Arc::new(LocalFileStore::new(root.clone())),
    })
}
