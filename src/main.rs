mod api;
mod config;
mod error;
mod models;
mod monitor;
mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::FinnhubClient;
use crate::config::Config;
use crate::monitor::QuoteMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_monitor=info,tower_http=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stock-monitor");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    if config.finnhub_api_key.is_none() {
        warn!("FINNHUB_API_KEY is not set, quote fetches will fail");
    }

    // Initialize quote source
    let finnhub = FinnhubClient::new(
        &config.finnhub_api_url,
        config.finnhub_api_key.clone(),
        config.finnhub_timeout_secs,
    )?;
    info!("Finnhub client initialized");

    let monitor = Arc::new(QuoteMonitor::new(Arc::new(finnhub)));
    let app = server::create_router(Arc::clone(&monitor));

    let listener = tokio::net::TcpListener::bind(config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    info!("Server is running on http://{}", config.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    monitor.shutdown().await;
    info!("Shutting down stock-monitor");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return std::future::pending().await;
    }
    info!("Shutdown signal received");
}
