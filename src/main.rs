mod api;
mod config;
mod error;
mod models;
mod query;
mod store;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::Config;
use crate::store::{sample_listings, seed_listings, SqlListingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stay_scout=info,tower_http=info")),
        )
        .init();

    info!("🏠 Stay Scout - student accommodation listings");

    let config = Arc::new(Config::from_env()?);
    info!(
        table = %config.table,
        layout = ?config.amenity_layout,
        sort = ?config.sort,
        "Configuration loaded"
    );

    let pool = store::connect(&config.database_url).await?;
    let compiler = config.query_compiler();

    if config.seed_sample_data {
        seed_listings(&pool, &compiler, &sample_listings())
            .await
            .context("Failed to seed sample listings")?;
    }

    let state = AppState {
        config: config.clone(),
        listings: Arc::new(SqlListingStore::new(pool, compiler)),
    };
    let app = api::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
