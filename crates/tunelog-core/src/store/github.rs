//! GitHub repository contents API document store.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::{normalize_document_path, DocumentStore, StoredDocument, VersionToken};
use crate::util::{compact_text, sanitize_error};
use crate::{Error, Result};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("tunelog/", env!("CARGO_PKG_VERSION"));

/// Repository coordinates and credentials for the contents API.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_url: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GithubConfig")
            .field("token", &"[REDACTED]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Documents stored as files in a GitHub repository; the blob `sha` is the version.
#[derive(Clone, Debug)]
pub struct GithubContentsStore {
    config: GithubConfig,
    client: Client,
}

impl GithubContentsStore {
    pub fn new(config: GithubConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| Error::Config(format!("failed to build GitHub client: {error}")))?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub const fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn contents_url(&self, path: &str) -> Result<String> {
        let path = normalize_document_path(path)?;
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(format!(
            "{}/repos/{}/{}/contents/{encoded}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
        ))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[async_trait]
impl DocumentStore for GithubContentsStore {
    fn backend_name(&self) -> &'static str {
        "github"
    }

    async fn read(&self, path: &str) -> Result<Option<StoredDocument>> {
        let url = self.contents_url(path)?;
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|error| Error::storage("read", path, sanitize_error(&error)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure("read", path, status, &body));
        }

        let payload = response
            .json::<ContentsResponse>()
            .await
            .map_err(|error| Error::storage("read", path, sanitize_error(&error)))?;
        payload.into_document(path).map(Some)
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken> {
        let url = self.contents_url(path)?;
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.config.branch,
            sha: expected.map(VersionToken::as_str),
        };

        let response = self
            .authorized(self.client.put(&url))
            .json(&body)
            .send()
            .await
            .map_err(|error| Error::storage("write", path, sanitize_error(&error)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure("write", path, status, &body));
        }

        let payload = response
            .json::<PutContentsResponse>()
            .await
            .map_err(|error| Error::storage("write", path, sanitize_error(&error)))?;
        Ok(VersionToken::new(payload.content.sha))
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentsResponse {
    fn into_document(self, path: &str) -> Result<StoredDocument> {
        if self.kind != "file" {
            return Err(Error::storage(
                "read",
                path,
                format!("expected a file but found '{}'", self.kind),
            ));
        }
        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != "base64" {
                return Err(Error::storage(
                    "read",
                    path,
                    format!("unsupported content encoding '{encoding}'"),
                ));
            }
        }

        let content = decode_content(self.content.as_deref().unwrap_or_default())
            .map_err(|message| Error::Parse(format!("{path}: {message}")))?;
        Ok(StoredDocument {
            content,
            version: VersionToken::new(self.sha),
        })
    }
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GithubErrorBody {
    message: Option<String>,
}

/// The API wraps base64 payloads at 60 columns.
fn decode_content(encoded: &str) -> std::result::Result<String, String> {
    let compact: String = encoded.chars().filter(|ch| !ch.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|error| format!("invalid base64 content: {error}"))?;
    String::from_utf8(bytes).map_err(|error| format!("content is not UTF-8: {error}"))
}

fn classify_failure(operation: &'static str, path: &str, status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<GithubErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message)
        .unwrap_or_else(|| compact_text(body));

    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Error::Conflict {
            path: path.to_string(),
        },
        // Creating over a file that appeared meanwhile is reported as 422 "sha wasn't supplied".
        StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => Error::Conflict {
            path: path.to_string(),
        },
        StatusCode::UNAUTHORIZED => Error::Auth(format!(
            "GitHub rejected the token during {operation} of {path}: {message}"
        )),
        _ => Error::storage(
            operation,
            path,
            format!("HTTP {}: {message}", status.as_u16()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GithubContentsStore {
        GithubContentsStore::new(
            GithubConfig {
                token: "ghp_secret".to_string(),
                owner: "someone".to_string(),
                repo: "listening-log".to_string(),
                branch: "main".to_string(),
                api_url: "https://api.github.com/".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn contents_url_encodes_segments() {
        let url = store().contents_url("spotify history/2024-05-01.md").unwrap();
        assert_eq!(
            url,
            "https://api.github.com/repos/someone/listening-log/contents/spotify%20history/2024-05-01.md"
        );
    }

    #[test]
    fn decode_content_handles_wrapped_base64() {
        let encoded = STANDARD.encode("---\ndate: 2024-05-01\n---\n");
        let (head, tail) = encoded.split_at(10);
        assert_eq!(
            decode_content(&format!("{head}\n{tail}\n")).unwrap(),
            "---\ndate: 2024-05-01\n---\n"
        );
        assert!(decode_content("***").is_err());
    }

    #[test]
    fn directory_listing_is_rejected() {
        let payload = ContentsResponse {
            kind: "dir".to_string(),
            sha: "abc".to_string(),
            content: None,
            encoding: None,
        };
        assert!(matches!(
            payload.into_document("spotify-history"),
            Err(Error::Storage { .. })
        ));
    }

    #[test]
    fn classify_failure_maps_conflicts() {
        assert!(classify_failure("write", "a.md", StatusCode::CONFLICT, "").is_conflict());
        assert!(classify_failure(
            "write",
            "a.md",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#
        )
        .is_conflict());
        assert!(!classify_failure(
            "write",
            "a.md",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"path is invalid"}"#
        )
        .is_conflict());
    }

    #[test]
    fn classify_failure_maps_auth_and_other_errors() {
        assert!(matches!(
            classify_failure(
                "read",
                "a.md",
                StatusCode::UNAUTHORIZED,
                r#"{"message":"Bad credentials"}"#
            ),
            Error::Auth(message) if message.contains("Bad credentials")
        ));
        assert!(matches!(
            classify_failure("read", "a.md", StatusCode::FORBIDDEN, "rate limited"),
            Error::Storage { operation: "read", .. }
        ));
    }

    #[test]
    fn put_request_omits_sha_when_creating() {
        let body = PutContentsRequest {
            message: "Update listening history for 2024-05-01",
            content: STANDARD.encode("x"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["branch"], "main");
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", store().config());
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires GH_TOKEN and GH_REPO in process environment or .env plus network access"]
    async fn github_store_reads_configured_repository() {
        let _ = dotenvy::dotenv();

        let config = crate::config::SyncConfig::from_env().expect("config should load");
        let crate::config::StoreTarget::Github(github) = config.target else {
            panic!("GitHub target should be configured");
        };
        let store = GithubContentsStore::new(github, config.http_timeout).unwrap();
        store
            .read("tunelog-integration-probe.md")
            .await
            .unwrap_or_else(|error| panic!("GitHub read failed: {error}"));
    }
}
