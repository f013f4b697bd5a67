//! Binary entry point: parse configuration, bring up logging and the
//! database, then serve the HTTP API until Ctrl-C.
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use library_circulation::{router, AppState, Config, Store, SystemClock};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn initialize_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    initialize_tracing(&config);

    let db_path = config.database_path()?;
    let store = Store::open(&db_path, config.pool_size())?;
    let clock = Arc::new(SystemClock::new(config.utc_offset_minutes)?);
    let app = router(AppState::new(store, clock));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, "library service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}
