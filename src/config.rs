use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Finnhub API token; fetches fail until it is set
    pub finnhub_api_key: Option<String>,

    /// Finnhub REST API base URL
    pub finnhub_api_url: String,

    /// Timeout in seconds for a single quote request
    pub finnhub_timeout_secs: u64,

    /// Address the HTTP server listens on
    pub server_addr: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            finnhub_api_key: env::var("FINNHUB_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),

            finnhub_api_url: env::var("FINNHUB_API_URL")
                .unwrap_or_else(|_| "https://finnhub.io/api/v1".to_string()),

            finnhub_timeout_secs: env::var("FINNHUB_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("FINNHUB_TIMEOUT_SECS must be a valid number")?,

            server_addr: env::var("SERVER_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
                .parse()
                .context("SERVER_ADDR must be a valid socket address")?,
        })
    }
}
