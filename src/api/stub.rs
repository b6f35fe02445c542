//! In-memory quote source for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::QuoteSource;
use crate::error::FetchError;
use crate::models::{QuoteRecord, Symbol};

/// Returns a fixed quote, optionally failing on chosen calls or sleeping first
#[derive(Debug, Default)]
pub struct StubQuoteSource {
    failing_calls: Vec<usize>,
    delay: Duration,
    symbol_delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the given zero-based call numbers
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.failing_calls = calls.to_vec();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay only fetches for one symbol, overriding `with_delay`
    pub fn with_symbol_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.symbol_delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for StubQuoteSource {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<QuoteRecord, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self
            .symbol_delays
            .get(symbol.as_str())
            .copied()
            .unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_calls.contains(&call) {
            return Err(FetchError::Status {
                status: 503,
                body: "quote service unavailable".to_string(),
            });
        }

        Ok(QuoteRecord {
            symbol: symbol.clone(),
            open: Some(1.0),
            high: Some(2.0),
            low: Some(0.5),
            current: Some(1.5),
            previous_close: Some(1.0),
            fetched_at: Utc::now(),
        })
    }
}
