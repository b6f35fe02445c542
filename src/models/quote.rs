use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Symbol;

/// A normalized quote snapshot for one symbol
///
/// Built by a quote source and never mutated afterwards. Prices the upstream
/// did not report are `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Symbol the quote was fetched for
    pub symbol: Symbol,

    /// Opening price of the day
    pub open: Option<f64>,

    /// High price of the day
    pub high: Option<f64>,

    /// Low price of the day
    pub low: Option<f64>,

    /// Current price
    pub current: Option<f64>,

    /// Previous session's closing price
    pub previous_close: Option<f64>,

    /// When the quote was fetched
    pub fetched_at: DateTime<Utc>,
}
