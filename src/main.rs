//! Smoke binary: restore a stored session and report who is logged in.
//!
//! Configuration comes from the environment (`NEURULA_BASE_URL`,
//! `NEURULA_TIMEOUT_SECS`, `NEURULA_TOKEN_STORE`), optionally via `.env`.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use neurula_client::{
    ApiConfig, AuthClient, AuthState, FileTokenStore, ReqwestHttpClient, SessionManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let store_path = std::env::var("NEURULA_TOKEN_STORE")
        .unwrap_or_else(|_| "neurula.tokens.json".to_string());
    info!(base_url = %config.base_url, store = %store_path, "Starting session check");

    let http = Arc::new(ReqwestHttpClient::new(config.timeout()));
    let store = Arc::new(FileTokenStore::open(store_path).await);
    let client = Arc::new(AuthClient::new(config, http, store));
    let session = SessionManager::new(client);

    session.initialize().await?;
    match session.state().await {
        AuthState::Authenticated { session } => {
            let who = session
                .user
                .as_ref()
                .and_then(|u| u.get("email").or_else(|| u.get("id")))
                .map(|v| v.to_string())
                .unwrap_or_else(|| "<unknown user>".to_string());
            println!("authenticated as {}", who);
        }
        _ => println!("not authenticated"),
    }
    Ok(())
}
