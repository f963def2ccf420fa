use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use eduadmin_permissions::{config, server, store::memory::load_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up GRANTSTORE_SEED, PORT, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();
    tracing::info!("Starting development grant store in {:?} mode", config.environment);

    let store = Arc::new(load_store(config.server.seed_file.as_deref())?);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Grant store listening on http://{}", bind_addr);

    server::serve(listener, store).await?;
    Ok(())
}
