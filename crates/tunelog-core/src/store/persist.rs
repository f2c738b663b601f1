//! Conditional document writes with a bounded conflict retry.

use std::time::Duration;

use super::{DocumentStore, VersionToken};
use crate::Result;

/// How many times a stale-version rejection is retried, and how long to wait first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for ConflictRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Outcome of a successful persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub version: VersionToken,
    /// Total write attempts, including the first
    pub attempts: u32,
}

/// Writes a computed document under optimistic concurrency control.
///
/// On a conflict the current version is re-read and the same content is
/// written again with it, up to `policy.max_retries` times. Every other error
/// is returned immediately.
pub struct ConflictSafePersister<'a> {
    store: &'a dyn DocumentStore,
    policy: ConflictRetryPolicy,
}

impl<'a> ConflictSafePersister<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, policy: ConflictRetryPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn persist(
        &self,
        path: &str,
        content: &str,
        observed: Option<VersionToken>,
        message: &str,
    ) -> Result<PersistOutcome> {
        let mut expected = observed;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self
                .store
                .write(path, content, expected.as_ref(), message)
                .await
            {
                Ok(version) => {
                    tracing::info!(
                        backend = self.store.backend_name(),
                        path,
                        attempts,
                        "Persisted document"
                    );
                    return Ok(PersistOutcome { version, attempts });
                }
                Err(error) if error.is_conflict() && attempts <= self.policy.max_retries => {
                    tracing::warn!(
                        backend = self.store.backend_name(),
                        path,
                        attempt = attempts,
                        "Version conflict; retrying with the latest version"
                    );
                    if !self.policy.backoff.is_zero() {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                    expected = self
                        .store
                        .read(path)
                        .await?
                        .map(|document| document.version);
                }
                Err(error) => return Err(error),
            }
        }
    }
}
