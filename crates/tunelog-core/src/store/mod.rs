//! Document store abstractions and backends.

mod github;
mod local;
mod persist;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::{Error, Result};

pub use github::{GithubConfig, GithubContentsStore, DEFAULT_GITHUB_API_URL};
pub use local::LocalFileStore;
pub use persist::{ConflictRetryPolicy, ConflictSafePersister, PersistOutcome};

/// Opaque version of a stored document, required for conditional writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document content together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub content: String,
    pub version: VersionToken,
}

/// Versioned document storage shared by local and remote targets.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend_name(&self) -> &'static str;

    /// Read a document. `Ok(None)` means it does not exist yet.
    async fn read(&self, path: &str) -> Result<Option<StoredDocument>>;

    /// Conditionally write a document.
    ///
    /// With `expected == None` the document must not exist yet; otherwise the
    /// stored version must equal `expected`. A mismatch is reported as
    /// [`Error::Conflict`]. `message` is commit metadata for versioned
    /// backends and may be ignored.
    async fn write(
        &self,
        path: &str,
        content: &str,
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken>;
}

/// Normalize a store-relative document path, rejecting traversal.
pub(crate) fn normalize_document_path(path: &str) -> Result<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Document path cannot be empty".to_string(),
        ));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(Error::InvalidInput(format!(
                    "Document path must not contain '..': {path}"
                )))
            }
            segment => segments.push(segment),
        }
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_document_path_collapses_separators() {
        assert_eq!(
            normalize_document_path("/spotify-history//./2024-05-01.md/").unwrap(),
            "spotify-history/2024-05-01.md"
        );
    }

    #[test]
    fn normalize_document_path_rejects_traversal_and_empty() {
        assert!(matches!(
            normalize_document_path("../secrets.md"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            normalize_document_path("  / "),
            Err(Error::InvalidInput(_))
        ));
    }
}
