//! Inkpot API Server
//!
//! Accepts image uploads over HTTP and stores them in Cloudflare R2.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpot_api::{AppState, create_router};
use inkpot_core::storage::{StoreConfig, UploadGateway, UploadPolicy};
use inkpot_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpot=debug,inkpot_core=debug,inkpot_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    // The R2 client is built on first use.
    let store_config = StoreConfig::from(&config.storage);
    info!(
        bucket = %store_config.bucket_name,
        endpoint = %store_config.endpoint(),
        public_url = %store_config.public_url,
        "Object store configured"
    );

    let policy = UploadPolicy::from(&config.upload);
    info!(
        max_size_mb = policy.max_size_mb,
        timeout_secs = policy.timeout.as_secs(),
        extensions = policy.allowed_extensions.len(),
        "Upload policy loaded"
    );

    let state = AppState {
        gateway: Arc::new(UploadGateway::r2(store_config, policy)),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
