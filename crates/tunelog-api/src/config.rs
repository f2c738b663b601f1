use std::collections::HashMap;
use std::env;

use thiserror::Error;
use tunelog_core::config::SyncConfig;
use tunelog_core::util::normalize_text_option;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Sync(#[from] tunelog_core::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server settings plus the sync configuration it runs with.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: resolve_bind_addr(&lookup)?,
            sync: SyncConfig::from_lookup(&lookup)?,
        })
    }
}

/// `PORT` (set by most hosting platforms) wins over `TUNELOG_API_BIND_ADDR`.
fn resolve_bind_addr(lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    if let Some(port) = normalize_text_option(lookup("PORT")) {
        let port = port
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::Invalid(format!("PORT must be a valid port number: {port}"))
            })?;
        return Ok(format!("0.0.0.0:{port}"));
    }

    Ok(normalize_text_option(lookup("TUNELOG_API_BIND_ADDR"))
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()))
}
