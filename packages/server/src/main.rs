use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::SystemClock;
use common::storage::LocalFileStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(mode = ?config.mode, "Configuration loaded");

    let db_url = config.database_url();
    let db = init_db(&db_url)
        .await
        .with_context(|| format!("Failed to open database {db_url}"))?;
    info!(url = %db_url, "Database ready");

    let file_store = LocalFileStore::new(
        config.storage.upload_dir.clone(),
        config.storage.base_url.clone(),
        config.storage.max_file_size,
    )
    .await
    .context("Failed to prepare upload directory")?;
    info!(dir = %config.storage.upload_dir.display(), "File store ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        file_store: Arc::new(file_store),
        clock: Arc::new(SystemClock),
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
