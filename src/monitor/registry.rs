use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::HistoryStore;
use crate::api::QuoteSource;
use crate::error::MonitorError;
use crate::models::{QuoteRecord, Symbol};

/// Longest accepted period (2^31 - 1 ms, about 24.8 days)
pub const MAX_PERIOD: Duration = Duration::from_millis(i32::MAX as u64);

/// One active recurring schedule
struct MonitorJob {
    symbol: Symbol,
    period: Duration,
    token: CancellationToken,
}

impl MonitorJob {
    fn cancel(&self) {
        self.token.cancel();
        debug!("Cancelled monitoring timer for {}", self.symbol);
    }
}

/// Public view of a running job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMonitor {
    pub symbol: Symbol,
    pub interval_ms: u64,
}

/// Owns at most one recurring fetch-and-append job per symbol
///
/// `start` and `stop` for the same symbol are serialized by a per-symbol gate
/// held across the immediate fetch, so two racing starts can never both leave
/// a timer armed. Different symbols use different gates. The job map itself is
/// only locked briefly and never across a fetch.
///
/// A gate only lives in `gates` while some start or stop holds it.
pub struct MonitorRegistry {
    history: Arc<HistoryStore>,
    source: Arc<dyn QuoteSource>,
    jobs: Mutex<HashMap<Symbol, MonitorJob>>,
    gates: Mutex<HashMap<Symbol, Arc<Mutex<()>>>>,
    shutdown: CancellationToken,
}

impl MonitorRegistry {
    pub fn new(history: Arc<HistoryStore>, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            history,
            source,
            jobs: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start (or restart) monitoring a symbol
    ///
    /// Any existing job for the symbol is cancelled first. The first quote is
    /// fetched before the timer is armed; if that fetch fails no job is left
    /// behind and the error is returned.
    pub async fn start(
        &self,
        symbol: &Symbol,
        period: Duration,
    ) -> Result<QuoteRecord, MonitorError> {
        validate_period(period)?;
        if self.shutdown.is_cancelled() {
            return Err(MonitorError::ShuttingDown);
        }

        let gate = self.gate(symbol).await;
        let result = {
            let _guard = gate.lock().await;
            self.restart_locked(symbol, period).await
        };
        self.release_gate(symbol, gate).await;

        result
    }

    async fn restart_locked(
        &self,
        symbol: &Symbol,
        period: Duration,
    ) -> Result<QuoteRecord, MonitorError> {
        if let Some(previous) = self.jobs.lock().await.remove(symbol) {
            info!(
                "Restarting monitoring for {} (previous interval: {:?})",
                symbol, previous.period
            );
            previous.cancel();
        }

        let first_record = self.source.fetch_quote(symbol).await?;
        self.history.append(symbol, first_record.clone()).await;

        {
            // checked under the jobs lock so a concurrent shutdown cannot miss this job
            let mut jobs = self.jobs.lock().await;
            if self.shutdown.is_cancelled() {
                return Err(MonitorError::ShuttingDown);
            }
            jobs.insert(symbol.clone(), self.arm(symbol.clone(), period));
        }

        info!("Started monitoring {} (interval: {:?})", symbol, period);
        Ok(first_record)
    }

    /// Stop monitoring a symbol, returning whether a job existed
    pub async fn stop(&self, symbol: &Symbol) -> bool {
        let gate = self.gate(symbol).await;
        let removed = {
            let _guard = gate.lock().await;
            self.jobs.lock().await.remove(symbol)
        };
        self.release_gate(symbol, gate).await;

        match removed {
            Some(job) => {
                job.cancel();
                info!("Stopped monitoring {}", symbol);
                true
            }
            None => {
                debug!("No monitoring job to stop for {}", symbol);
                false
            }
        }
    }

    pub async fn is_active(&self, symbol: &Symbol) -> bool {
        self.jobs.lock().await.contains_key(symbol)
    }

    /// All running jobs, ordered by symbol
    pub async fn active(&self) -> Vec<ActiveMonitor> {
        let jobs = self.jobs.lock().await;
        let mut active: Vec<ActiveMonitor> = jobs
            .values()
            .map(|job| ActiveMonitor {
                symbol: job.symbol.clone(),
                interval_ms: period_millis(job.period),
            })
            .collect();
        active.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        active
    }

    /// Cancel every running job and refuse further starts
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let mut jobs = self.jobs.lock().await;
        let count = jobs.len();
        jobs.clear();

        info!("Monitor registry shut down ({} jobs cancelled)", count);
    }

    async fn gate(&self, symbol: &Symbol) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(symbol.clone()).or_default())
    }

    /// Drop the gate entry once no other start or stop holds a clone of it
    async fn release_gate(&self, symbol: &Symbol, gate: Arc<Mutex<()>>) {
        let mut gates = self.gates.lock().await;
        // one reference in the map, one here
        if Arc::strong_count(&gate) == 2 {
            gates.remove(symbol);
        }
    }

    /// Spawn the periodic task for a symbol
    ///
    /// Ticks run inline in the task, so a slow tick delays the next one instead
    /// of overlapping it; ticks missed meanwhile are skipped.
    fn arm(&self, symbol: Symbol, period: Duration) -> MonitorJob {
        let token = self.shutdown.child_token();

        let cancel = token.clone();
        let history = Arc::clone(&self.history);
        let source = Arc::clone(&self.source);
        let task_symbol = symbol.clone();

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                run_tick(&task_symbol, source.as_ref(), &history, &cancel).await;
            }

            debug!("Monitoring task for {} exited", task_symbol);
        });

        MonitorJob {
            symbol,
            period,
            token,
        }
    }
}

fn validate_period(period: Duration) -> Result<(), MonitorError> {
    if period.is_zero() {
        return Err(MonitorError::Validation(
            "refresh interval must be greater than 0".to_string(),
        ));
    }
    if period > MAX_PERIOD {
        return Err(MonitorError::Validation(format!(
            "refresh interval must be at most {} ms",
            MAX_PERIOD.as_millis()
        )));
    }
    Ok(())
}

/// Milliseconds in a period, saturating at `u64::MAX`
pub fn period_millis(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}

/// One periodic fetch-and-append; failures are logged and swallowed
async fn run_tick(
    symbol: &Symbol,
    source: &dyn QuoteSource,
    history: &HistoryStore,
    cancel: &CancellationToken,
) {
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        result = source.fetch_quote(symbol) => result,
    };

    match result {
        Ok(record) => history.append(symbol, record).await,
        Err(e) => error!("Monitoring error for {}: {}", symbol, e),
    }
}
