use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{QuoteRecord, Symbol};

/// Maximum number of records retained per symbol
pub const MAX_HISTORY: usize = 200;

/// Bounded per-symbol quote history with FIFO eviction
pub struct HistoryStore {
    capacity: usize,
    histories: RwLock<HashMap<Symbol, VecDeque<QuoteRecord>>>,
}

impl HistoryStore {
    /// Create a store holding up to [`MAX_HISTORY`] records per symbol
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Append a record, evicting the oldest one if the history overflows
    pub async fn append(&self, symbol: &Symbol, record: QuoteRecord) {
        let mut histories = self.histories.write().await;
        let history = histories
            .entry(symbol.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity + 1));

        history.push_back(record);

        if history.len() > self.capacity {
            history.pop_front();
        }

        debug!("History for {} now holds {} records", symbol, history.len());
    }

    /// Snapshot of a symbol's history, oldest first
    ///
    /// Unknown symbols yield an empty vector.
    pub async fn get(&self, symbol: &Symbol) -> Vec<QuoteRecord> {
        let histories = self.histories.read().await;
        histories
            .get(symbol)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    fn record(symbol: &Symbol, price: f64) -> QuoteRecord {
        QuoteRecord {
            symbol: symbol.clone(),
            open: None,
            high: None,
            low: None,
            current: Some(price),
            previous_close: None,
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_empty() {
        let store = HistoryStore::new();
        assert!(store.get(&symbol("NOPE")).await.is_empty());
    }

    #[tokio::test]
    async fn test_length_is_min_of_appends_and_capacity() {
        let store = HistoryStore::new();
        let aapl = symbol("AAPL");

        for i in 0..150 {
            store.append(&aapl, record(&aapl, i as f64)).await;
        }
        assert_eq!(store.get(&aapl).await.len(), 150);

        for i in 150..450 {
            store.append(&aapl, record(&aapl, i as f64)).await;
        }
        assert_eq!(store.get(&aapl).await.len(), MAX_HISTORY);
    }

    #[tokio::test]
    async fn test_keeps_last_records_in_append_order() {
        let store = HistoryStore::with_capacity(3);
        let aapl = symbol("AAPL");

        for i in 0..5 {
            store.append(&aapl, record(&aapl, i as f64)).await;
        }

        let prices: Vec<_> = store
            .get(&aapl)
            .await
            .into_iter()
            .filter_map(|r| r.current)
            .collect();
        assert_eq!(prices, vec![2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_snapshot_is_not_mutated_by_later_appends() {
        let store = HistoryStore::new();
        let aapl = symbol("AAPL");

        store.append(&aapl, record(&aapl, 1.0)).await;
        let snapshot = store.get(&aapl).await;
        store.append(&aapl, record(&aapl, 2.0)).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get(&aapl).await.len(), 2);
    }

    #[tokio::test]
    async fn test_symbols_are_independent() {
        let store = HistoryStore::with_capacity(2);
        let aapl = symbol("AAPL");
        let msft = symbol("MSFT");

        for i in 0..3 {
            store.append(&aapl, record(&aapl, i as f64)).await;
        }
        store.append(&msft, record(&msft, 9.0)).await;

        assert_eq!(store.get(&aapl).await.len(), 2);
        assert_eq!(store.get(&msft).await.len(), 1);
    }
}
