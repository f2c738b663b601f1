//! Runtime configuration assembled from environment variables.
//!
//! Every value is passed explicitly into the sync pipeline; nothing here is
//! read again after construction.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::spotify::MAX_HISTORY_LIMIT;
use crate::store::{ConflictRetryPolicy, GithubConfig};
use crate::util::is_http_url;
use crate::{Error, Result};

pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_REDIRECT_URI";
pub const ENV_TIMEZONE: &str = "TUNELOG_TIMEZONE";
pub const ENV_HISTORY_DIR: &str = "TUNELOG_HISTORY_DIR";
pub const ENV_HISTORY_LIMIT: &str = "TUNELOG_HISTORY_LIMIT";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TUNELOG_HTTP_TIMEOUT_SECS";
pub const ENV_CONFLICT_RETRIES: &str = "TUNELOG_CONFLICT_RETRIES";
pub const ENV_CONFLICT_BACKOFF_MS: &str = "TUNELOG_CONFLICT_BACKOFF_MS";
pub const ENV_LOCAL_ROOT: &str = "TUNELOG_LOCAL_ROOT";
pub const ENV_GH_TOKEN: &str = "GH_TOKEN";
pub const ENV_GH_REPO: &str = "GH_REPO";
pub const ENV_GH_BRANCH: &str = "GH_BRANCH";
pub const ENV_GH_API_URL: &str = "GH_API_URL";

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Budapest;
pub const DEFAULT_HISTORY_DIR: &str = "spotify-history";

/// Spotify application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SpotifyAppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
}

impl fmt::Debug for SpotifyAppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SpotifyAppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl SpotifyAppConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_id = required_trimmed(&lookup, ENV_CLIENT_ID)?;
        let client_secret = required_trimmed(&lookup, ENV_CLIENT_SECRET)?;
        let redirect_uri = optional_trimmed(&lookup, ENV_REDIRECT_URI);
        if let Some(uri) = redirect_uri.as_deref() {
            if !is_http_url(uri) {
                return Err(Error::Config(format!(
                    "{ENV_REDIRECT_URI} must start with http:// or https://"
                )));
            }
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

/// Where day documents are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreTarget {
    Github(GithubConfig),
    Local(PathBuf),
}

/// Everything a sync run needs.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub spotify: SpotifyAppConfig,
    pub refresh_token: String,
    pub timezone: Tz,
    pub history_dir: String,
    pub history_limit: u32,
    pub http_timeout: Duration,
    pub retry: ConflictRetryPolicy,
    pub target: StoreTarget,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncConfig")
            .field("spotify", &self.spotify)
            .field("refresh_token", &"[REDACTED]")
            .field("timezone", &self.timezone)
            .field("history_dir", &self.history_dir)
            .field("history_limit", &self.history_limit)
            .field("http_timeout", &self.http_timeout)
            .field("retry", &self.retry)
            .field("target", &self.target)
            .finish()
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let spotify = SpotifyAppConfig::from_lookup(&lookup)?;
        let refresh_token = required_trimmed(&lookup, ENV_REFRESH_TOKEN)?;

        let timezone = match optional_trimmed(&lookup, ENV_TIMEZONE) {
            Some(name) => name.parse::<Tz>().map_err(|_| {
                Error::Config(format!("{ENV_TIMEZONE} is not a known IANA timezone: {name}"))
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let history_dir = value_or_default(&lookup, ENV_HISTORY_DIR, DEFAULT_HISTORY_DIR)
            .trim_matches('/')
            .to_string();
        if history_dir.is_empty() || history_dir.split('/').any(|segment| segment == "..") {
            return Err(Error::Config(format!(
                "{ENV_HISTORY_DIR} must be a relative directory without '..'"
            )));
        }

        let history_limit = parse_bounded(
            &lookup,
            ENV_HISTORY_LIMIT,
            50,
            1,
            u64::from(MAX_HISTORY_LIMIT),
        )?;
        let http_timeout_secs = parse_bounded(&lookup, ENV_HTTP_TIMEOUT_SECS, 10, 1, 120)?;
        let max_retries = parse_bounded(&lookup, ENV_CONFLICT_RETRIES, 1, 0, 5)?;
        let backoff_ms = parse_bounded(&lookup, ENV_CONFLICT_BACKOFF_MS, 250, 0, 10_000)?;

        Ok(Self {
            spotify,
            refresh_token,
            timezone,
            history_dir,
            history_limit: u32::try_from(history_limit).unwrap_or(MAX_HISTORY_LIMIT),
            http_timeout: Duration::from_secs(http_timeout_secs),
            retry: ConflictRetryPolicy {
                max_retries: u32::try_from(max_retries).unwrap_or(1),
                backoff: Duration::from_millis(backoff_ms),
            },
            target: parse_store_target(&lookup)?,
        })
    }
}

fn parse_store_target(lookup: impl Fn(&str) -> Option<String>) -> Result<StoreTarget> {
    let token = optional_trimmed(&lookup, ENV_GH_TOKEN);
    let repo = optional_trimmed(&lookup, ENV_GH_REPO);

    if token.is_some() || repo.is_some() {
        let mut missing = Vec::new();
        if token.is_none() {
            missing.push(ENV_GH_TOKEN);
        }
        if repo.is_none() {
            missing.push(ENV_GH_REPO);
        }
        let (Some(token), Some(repo)) = (token, repo) else {
            return Err(Error::Config(format!(
                "GitHub target is incomplete. Missing: {}",
                missing.join(", ")
            )));
        };

        let (owner, name) = repo
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| Error::Config(format!("{ENV_GH_REPO} must look like owner/name")))?;

        let api_url = value_or_default(
            &lookup,
            ENV_GH_API_URL,
            crate::store::DEFAULT_GITHUB_API_URL,
        );
        if !is_http_url(&api_url) {
            return Err(Error::Config(format!(
                "{ENV_GH_API_URL} must start with http:// or https://"
            )));
        }

        return Ok(StoreTarget::Github(GithubConfig {
            token,
            owner: owner.to_string(),
            repo: name.to_string(),
            branch: value_or_default(&lookup, ENV_GH_BRANCH, "main"),
            api_url,
        }));
    }

    optional_trimmed(&lookup, ENV_LOCAL_ROOT)
        .map(|root| StoreTarget::Local(PathBuf::from(root)))
        .ok_or_else(|| {
            Error::Config(format!(
                "No document store configured. Set {ENV_GH_TOKEN} and {ENV_GH_REPO}, or {ENV_LOCAL_ROOT}."
            ))
        })
}

fn parse_bounded(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64> {
    let Some(raw) = optional_trimmed(lookup, name) else {
        return Ok(default);
    };
    raw.parse::<u64>()
        .ok()
        .filter(|value| (min..=max).contains(value))
        .ok_or_else(|| Error::Config(format!("{name} must be an integer in [{min}, {max}]")))
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    optional_trimmed(lookup, name)
        .ok_or_else(|| Error::Config(format!("Missing required environment variable: {name}")))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    crate::util::normalize_text_option(lookup(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_map() -> HashMap<&'static str, &'static str> {
        let mut map = HashMap::new();
        map.insert(ENV_CLIENT_ID, "client-id");
        map.insert(ENV_CLIENT_SECRET, "sensitive-client-secret");
        map.insert(ENV_REFRESH_TOKEN, "sensitive-refresh-token");
        map.insert(ENV_LOCAL_ROOT, "/tmp/tunelog");
        map
    }

    fn parse(map: &HashMap<&str, &str>) -> Result<SyncConfig> {
        SyncConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = parse(&base_map()).unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Budapest);
        assert_eq!(config.history_dir, "spotify-history");
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.retry, ConflictRetryPolicy::default());
        assert_eq!(config.target, StoreTarget::Local(PathBuf::from("/tmp/tunelog")));
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let mut map = base_map();
        map.remove(ENV_REFRESH_TOKEN);
        let error = parse(&map).unwrap_err();
        assert!(error.to_string().contains(ENV_REFRESH_TOKEN));
    }

    #[test]
    fn github_target_takes_precedence_and_requires_both_values() {
        let mut map = base_map();
        map.insert(ENV_GH_TOKEN, "ghp_token");
        let error = parse(&map).unwrap_err();
        assert!(error.to_string().contains(ENV_GH_REPO));

        map.insert(ENV_GH_REPO, "someone/listening-log");
        let config = parse(&map).unwrap();
        match config.target {
            StoreTarget::Github(github) => {
                assert_eq!(github.owner, "someone");
                assert_eq!(github.repo, "listening-log");
                assert_eq!(github.branch, "main");
                assert_eq!(github.api_url, "https://api.github.com");
            }
            other @ StoreTarget::Local(_) => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn malformed_repo_is_rejected() {
        let mut map = base_map();
        map.insert(ENV_GH_TOKEN, "ghp_token");
        map.insert(ENV_GH_REPO, "just-a-name");
        assert!(parse(&map).unwrap_err().to_string().contains("owner/name"));
    }

    #[test]
    fn no_target_is_an_error() {
        let mut map = base_map();
        map.remove(ENV_LOCAL_ROOT);
        assert!(parse(&map)
            .unwrap_err()
            .to_string()
            .contains("No document store configured"));
    }

    #[test]
    fn bounded_values_are_validated() {
        let mut map = base_map();
        map.insert(ENV_HISTORY_LIMIT, "51");
        assert!(parse(&map).unwrap_err().to_string().contains(ENV_HISTORY_LIMIT));

        map.insert(ENV_HISTORY_LIMIT, "20");
        map.insert(ENV_CONFLICT_RETRIES, "0");
        map.insert(ENV_CONFLICT_BACKOFF_MS, "0");
        let config = parse(&map).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.retry.backoff.is_zero());
    }

    #[test]
    fn timezone_must_be_known() {
        let mut map = base_map();
        map.insert(ENV_TIMEZONE, "Mars/Olympus_Mons");
        assert!(parse(&map).unwrap_err().to_string().contains(ENV_TIMEZONE));

        map.insert(ENV_TIMEZONE, "America/New_York");
        assert_eq!(parse(&map).unwrap().timezone, chrono_tz::America::New_York);
    }

    #[test]
    fn history_dir_rejects_traversal() {
        let mut map = base_map();
        map.insert(ENV_HISTORY_DIR, "../elsewhere");
        assert!(parse(&map).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut map = base_map();
        map.insert(ENV_GH_TOKEN, "sensitive-gh-token");
        map.insert(ENV_GH_REPO, "someone/log");
        let rendered = format!("{:?}", parse(&map).unwrap());
        assert!(!rendered.contains("sensitive-client-secret"));
        assert!(!rendered.contains("sensitive-refresh-token"));
        assert!(!rendered.contains("sensitive-gh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
