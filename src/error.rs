use thiserror::Error;

use crate::models::Symbol;

/// Failure reported by a quote source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Missing FINNHUB_API_KEY")]
    MissingApiKey,

    #[error("Finnhub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Finnhub API error: {status} - {body}")]
    Status { status: u16, body: String },
}

/// Errors surfaced by monitoring operations
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Caller supplied an invalid symbol or period
    #[error("{0}")]
    Validation(String),

    /// Quote fetch failed on a synchronous path (start or refresh)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Stop requested for a symbol with no active job
    #[error("No monitoring job found for {0}")]
    NotFound(Symbol),

    /// Start requested after the registry was shut down
    #[error("Monitoring is shutting down")]
    ShuttingDown,
}
