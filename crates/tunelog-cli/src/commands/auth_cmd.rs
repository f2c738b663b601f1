use tunelog_core::config::SpotifyAppConfig;
use tunelog_core::spotify::SpotifyAuthClient;

use crate::cli::AuthCommands;
use crate::error::CliError;

const AUTH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub async fn run_auth(command: AuthCommands) -> Result<(), CliError> {
    let app = SpotifyAppConfig::from_env()?;
    let client = SpotifyAuthClient::new(&app, AUTH_TIMEOUT)?;

    match command {
        AuthCommands::Url { redirect_uri } => {
            let redirect_uri = resolve_redirect_uri(redirect_uri, &app)?;
            println!("{}", client.authorize_url(&redirect_uri));
        }
        AuthCommands::Exchange { code, redirect_uri } => {
            let redirect_uri = resolve_redirect_uri(redirect_uri, &app)?;
            let grant = client.exchange_code(&code, &redirect_uri).await?;
            let refresh_token = grant.refresh_token.ok_or(CliError::MissingRefreshToken)?;
            if let Some(scope) = grant.scope.as_deref() {
                tracing::info!("Granted scope: {}", scope);
            }
            println!("SPOTIFY_REFRESH_TOKEN={refresh_token}");
        }
    }
    Ok(())
}

pub fn resolve_redirect_uri(
    explicit: Option<String>,
    app: &SpotifyAppConfig,
) -> Result<String, CliError> {
    explicit
        .map(|uri| uri.trim().to_string())
        .filter(|uri| !uri.is_empty())
        .or_else(|| app.redirect_uri.clone())
        .ok_or(CliError::MissingRedirectUri)
}
