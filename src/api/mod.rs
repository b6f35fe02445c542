pub mod finnhub;
#[cfg(test)]
pub mod stub;

pub use finnhub::FinnhubClient;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{QuoteRecord, Symbol};

/// Source of quote snapshots used by the monitor
///
/// Retry, transport and authentication are the implementation's concern; a
/// failure must come back as a single error, never a partial record.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<QuoteRecord, FetchError>;
}
