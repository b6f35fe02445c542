use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::QuoteSource;
use crate::error::FetchError;
use crate::models::{QuoteRecord, Symbol};

/// Client for the Finnhub quote endpoint
pub struct FinnhubClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Quote response from Finnhub
///
/// c = current, h = high, l = low, o = open, pc = previous close
#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    c: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    o: Option<f64>,
    pc: Option<f64>,
}

impl FinnhubClient {
    /// Create a new Finnhub client
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build Finnhub HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Fetch the current quote for a symbol
    pub async fn fetch(&self, symbol: &Symbol) -> Result<QuoteRecord, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let url = format!(
            "{}/quote?symbol={}&token={}",
            self.base_url,
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(api_key)
        );

        debug!("Fetching Finnhub quote for {}", symbol);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let data: FinnhubQuote = response.json().await?;

        Ok(self.convert_quote(symbol, data))
    }

    /// Convert Finnhub response to our model
    fn convert_quote(&self, symbol: &Symbol, data: FinnhubQuote) -> QuoteRecord {
        QuoteRecord {
            symbol: symbol.clone(),
            open: data.o,
            high: data.h,
            low: data.l,
            current: data.c,
            previous_close: data.pc,
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<QuoteRecord, FetchError> {
        self.fetch(symbol).await
    }
}
