//! Local filesystem document store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{normalize_document_path, DocumentStore, StoredDocument, VersionToken};
use crate::{Error, Result};

/// Stores documents as files below a root directory.
///
/// The version token is the SHA-256 of the file content. The compare step and
/// the rename are not atomic with respect to other processes; concurrent runs
/// must still be serialized externally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = normalize_document_path(path)?;
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for LocalFileStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn read(&self, path: &str) -> Result<Option<StoredDocument>> {
        let file_path = self.resolve(path)?;
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Ok(Some(StoredDocument {
                version: content_version(&content),
                content,
            })),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(Error::storage("read", file_path.display().to_string(), error)),
        }
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        expected: Option<&VersionToken>,
        _message: &str,
    ) -> Result<VersionToken> {
        let file_path = self.resolve(path)?;
        let current = self.read(path).await?.map(|document| document.version);
        if current.as_ref() != expected {
            return Err(Error::Conflict {
                path: path.to_string(),
            });
        }

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| {
                    Error::storage("create_dir", parent.display().to_string(), error)
                })?;
        }

        replace_file(&file_path, content).await?;
        Ok(content_version(content))
    }
}

/// Write `content` next to `file_path` and rename it into place. The temp file
/// is removed again when the rename fails.
async fn replace_file(file_path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_sibling(file_path);
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|error| Error::storage("write", temp_path.display().to_string(), error))?;
    if let Err(error) = tokio::fs::rename(&temp_path, file_path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
            tracing::warn!(
                "Failed to remove temp file {}: {}",
                temp_path.display(),
                cleanup
            );
        }
        return Err(Error::storage(
            "rename",
            file_path.display().to_string(),
            error,
        ));
    }
    Ok(())
}

fn content_version(content: &str) -> VersionToken {
    VersionToken::new(format!("{:x}", Sha256::digest(content.as_bytes())))
}

fn temp_sibling(file_path: &Path) -> PathBuf {
    let file_name = file_path
        .file_name()
        .map_or_else(|| "document".into(), |name| name.to_string_lossy());
    file_path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()))
}
