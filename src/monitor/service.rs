use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use super::registry::period_millis;
use super::{ActiveMonitor, HistoryStore, MonitorRegistry};
use crate::api::QuoteSource;
use crate::error::MonitorError;
use crate::models::{QuoteRecord, Symbol};

/// Result of a successful start
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStarted {
    pub symbol: Symbol,
    pub interval_ms: u64,
    pub first_record: QuoteRecord,
}

/// Entry point used by the request handlers
///
/// Composes the history store, the monitor registry and the quote source.
/// Created once at startup and shared behind an `Arc`.
pub struct QuoteMonitor {
    history: Arc<HistoryStore>,
    registry: MonitorRegistry,
    source: Arc<dyn QuoteSource>,
}

impl QuoteMonitor {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        let history = Arc::new(HistoryStore::new());
        let registry = MonitorRegistry::new(Arc::clone(&history), Arc::clone(&source));

        Self {
            history,
            registry,
            source,
        }
    }

    pub async fn start_monitoring(
        &self,
        symbol: &Symbol,
        interval: Duration,
    ) -> Result<MonitoringStarted, MonitorError> {
        let first_record = self.registry.start(symbol, interval).await?;

        Ok(MonitoringStarted {
            symbol: symbol.clone(),
            interval_ms: period_millis(interval),
            first_record,
        })
    }

    pub async fn stop_monitoring(&self, symbol: &Symbol) -> Result<(), MonitorError> {
        if self.registry.stop(symbol).await {
            Ok(())
        } else {
            Err(MonitorError::NotFound(symbol.clone()))
        }
    }

    /// Fetch once outside any schedule and append to history
    pub async fn refresh(&self, symbol: &Symbol) -> Result<QuoteRecord, MonitorError> {
        let record = self.source.fetch_quote(symbol).await?;
        self.history.append(symbol, record.clone()).await;

        info!("Refreshed {} (current: {:?})", symbol, record.current);
        Ok(record)
    }

    pub async fn get_history(&self, symbol: &Symbol) -> Vec<QuoteRecord> {
        self.history.get(symbol).await
    }

    pub async fn is_monitoring(&self, symbol: &Symbol) -> bool {
        self.registry.is_active(symbol).await
    }

    pub async fn active_monitors(&self) -> Vec<ActiveMonitor> {
        self.registry.active().await
    }

    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubQuoteSource;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reports_first_record_and_interval() {
        let monitor = QuoteMonitor::new(Arc::new(StubQuoteSource::new()));
        let aapl = symbol("AAPL");

        let started = monitor
            .start_monitoring(&aapl, Duration::from_millis(1000))
            .await
            .unwrap();

        assert_eq!(started.interval_ms, 1000);
        assert_eq!(started.first_record.open, Some(1.0));
        assert_eq!(started.first_record.high, Some(2.0));
        assert_eq!(started.first_record.low, Some(0.5));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(monitor.get_history(&aapl).await.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_symbol_variants_address_same_job() {
        let monitor = QuoteMonitor::new(Arc::new(StubQuoteSource::new()));

        monitor
            .start_monitoring(&symbol(" aapl "), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(monitor.is_monitoring(&symbol("Aapl")).await);
        assert!(monitor.stop_monitoring(&symbol("AAPL")).await.is_ok());
        assert!(!monitor.is_monitoring(&symbol("aapl")).await);
    }

    #[tokio::test]
    async fn test_stop_without_job_is_not_found() {
        let monitor = QuoteMonitor::new(Arc::new(StubQuoteSource::new()));

        let err = monitor.stop_monitoring(&symbol("TSLA")).await.unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(ref s) if s.as_str() == "TSLA"));
    }

    #[tokio::test]
    async fn test_refresh_appends_without_monitoring() {
        let monitor = QuoteMonitor::new(Arc::new(StubQuoteSource::new()));
        let msft = symbol("MSFT");

        monitor.refresh(&msft).await.unwrap();
        monitor.refresh(&msft).await.unwrap();

        assert_eq!(monitor.get_history(&msft).await.len(), 2);
        assert!(!monitor.is_monitoring(&msft).await);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_surfaced() {
        let monitor = QuoteMonitor::new(Arc::new(StubQuoteSource::new().failing_on(&[0])));
        let msft = symbol("MSFT");

        assert!(matches!(
            monitor.refresh(&msft).await,
            Err(MonitorError::Fetch(_))
        ));
        assert!(monitor.get_history(&msft).await.is_empty());
    }
}
