use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use upnafesta::api::{create_router, AppState};
use upnafesta::config::AppConfig;
use upnafesta::credentials::GrantStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upnafesta=info".into()),
        )
        .init();

    info!("UpnaFesta starting...");

    let config = AppConfig::load()?;

    let encryption_key = std::env::var("UPNAFESTA_ENCRYPTION_KEY")
        .context("UPNAFESTA_ENCRYPTION_KEY must be set (base64, 32 bytes)")?;
    let store = Arc::new(GrantStore::new(&config.server.database_path, &encryption_key)?);
    info!(path = %config.server.database_path, "Grant store opened");

    if config.server.admin_token.is_none() {
        warn!("UPNAFESTA_ADMIN_TOKEN not set, admin endpoints are unrestricted");
    }

    let state = AppState::from_config(&config, store)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(
        addr = %config.server.bind_addr,
        callback = %config.server.callback_url(),
        "HTTP server listening"
    );

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
