mod config;
mod error;
mod routes;

use config::AppConfig;
use routes::{app_router, AppState};
use tunelog_core::SyncService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tunelog=info".parse().expect("valid directive")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting tunelog-api with config: {:?}", config);

    let service = SyncService::from_config(&config.sync)?;
    let router = app_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("tunelog-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
