use anyhow::{Context, Result};
use charmd::config::{BlobStoreType, Config};
use charmd::http::{self, AppState};
use charmd::storage::{CharmStore, ObjectStoreBackend, StorageConfig};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHARMD_CONFIG").ok())
        .context("usage: charmd <config-path> (or set CHARMD_CONFIG)")?;
    let config = Config::read(&config_path)
        .with_context(|| format!("cannot read configuration from {config_path}"))?;

    // Initialize tracing
    let filter = match config.log_directives() {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::from_default_env().add_directive(Level::INFO.into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting charm store server");

    let storage_path = std::env::var("STORAGE_PATH").unwrap_or_else(|_| "./data".to_string());
    if config.blobstore == BlobStoreType::File {
        info!("Using storage path: {}", storage_path);
        std::fs::create_dir_all(&storage_path)?;
    }

    let storage_config = StorageConfig::from_config(&config, storage_path);
    let store: Arc<dyn CharmStore> = Arc::new(ObjectStoreBackend::from_config(storage_config)?);

    let state = AppState::new(store).with_stats_cache_max_age(config.stats_cache_max_age.non_zero());

    http::start_server(
        Arc::new(state),
        &config.api_addr,
        config.request_timeout.non_zero(),
    )
    .await?;

    Ok(())
}
