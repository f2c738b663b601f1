pub mod auth_cmd;
pub mod completions;
pub mod show;
pub mod sync;

use tunelog_core::config::SyncConfig;
use tunelog_core::SyncService;

use crate::error::CliError;

/// Build the sync service from the process environment.
pub fn load_service() -> Result<SyncService, CliError> {
    let config = SyncConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(SyncService::from_config(&config)?)
}
