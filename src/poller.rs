//! Market poller service
//!
//! Runs the fetch, analyze, publish, export, sleep cycle forever.

use crate::{
    analysis,
    constants::{INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRY_ATTEMPTS},
    error::{ConfigError, ProviderError},
    export::SnapshotExporter,
    interval::RefreshInterval,
    metrics::{FetchMetrics, MetricsCollector},
    provider::{MarketDataProvider, MarketsQuery},
    store::{DashboardStore, DashboardView},
    types::{ComponentHealth, CoinSnapshot, DashboardEvent, HealthStatus, MarketSnapshot},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

/// Market poller
///
/// Owns the provider and the optional exporter, and publishes every
/// successful cycle into a shared [`DashboardStore`]. The refresh interval
/// and manual refreshes can be driven from other tasks while the loop sleeps.
///
/// # Example
/// ```no_run
/// use crypto_dashboard::{CoinGeckoProvider, DashboardStore, MarketPoller, RefreshInterval};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(DashboardStore::new());
/// let poller = Arc::new(MarketPoller::new(
///     Arc::new(CoinGeckoProvider::new()?),
///     store.clone(),
///     None,
///     RefreshInterval::default(),
/// ));
/// poller.spawn();
/// # Ok(())
/// # }
/// ```
pub struct MarketPoller {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<DashboardStore>,
    exporter: Option<Arc<dyn SnapshotExporter>>,
    metrics: Arc<MetricsCollector>,
    query: MarketsQuery,
    interval_tx: watch::Sender<RefreshInterval>,
    refresh: Notify,
}

impl MarketPoller {
    /// Creates a poller using the default markets query (top 50 by market cap, USD)
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<DashboardStore>,
        exporter: Option<Arc<dyn SnapshotExporter>>,
        interval: RefreshInterval,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new(provider.provider_name()));
        let (interval_tx, _) = watch::channel(interval);

        Self {
            provider,
            store,
            exporter,
            metrics,
            query: MarketsQuery::default(),
            interval_tx,
            refresh: Notify::new(),
        }
    }

    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.store
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Destination of the spreadsheet export, if exporting is enabled
    pub fn export_path(&self) -> Option<&std::path::Path> {
        self.exporter.as_ref().map(|e| e.path())
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        *self.interval_tx.borrow()
    }

    /// Changes the refresh interval
    ///
    /// A sleeping loop wakes up and starts the next cycle right away.
    pub fn set_refresh_interval(&self, secs: u64) -> Result<RefreshInterval, ConfigError> {
        let new = RefreshInterval::from_secs(secs)?;
        let old = self.interval_tx.send_replace(new);

        if old != new {
            tracing::info!(old = %old, new = %new, "Refresh interval changed");
            self.store
                .emit(DashboardEvent::refresh_interval_changed(old.as_secs(), new.as_secs()));
        }

        Ok(new)
    }

    /// Cuts the current sleep short and starts the next cycle
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Starts the poll loop on the tokio runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        tokio::spawn(async move { poller.run().await })
    }

    /// Polls forever
    ///
    /// Cycle failures are logged and never end the loop.
    pub async fn run(&self) {
        let mut interval_rx = self.interval_tx.subscribe();

        tracing::info!(
            refresh_interval_secs = self.refresh_interval().as_secs(),
            provider = self.provider_name(),
            "Starting market poller"
        );

        loop {
            if let Err(e) = self.run_cycle().await {
                tracing::warn!(error = %e, "Poll cycle failed");
            }

            let interval = *interval_rx.borrow_and_update();
            tracing::debug!(secs = interval.as_secs(), "Sleeping until next cycle");

            tokio::select! {
                _ = sleep(interval.as_duration()) => {}
                changed = interval_rx.changed() => {
                    if changed.is_ok() {
                        tracing::debug!("Interval changed, refreshing now");
                    }
                }
                _ = self.refresh.notified() => {
                    tracing::info!("Manual refresh requested");
                }
            }
        }
    }

    /// Runs one fetch, analyze, publish, export cycle
    ///
    /// On fetch failure the previous view stays published and the error is
    /// returned. Export failures are reported but do not fail the cycle.
    pub async fn run_cycle(&self) -> Result<Arc<DashboardView>, ProviderError> {
        let rows = match self.fetch_with_retry().await {
            Ok(rows) => rows,
            Err(e) => {
                self.store.record_failure(e.to_string()).await;
                self.store.emit(DashboardEvent::fetch_failed(e.to_string()));
                return Err(e);
            }
        };

        let summary = analysis::summarize(&rows);
        let snapshot = MarketSnapshot::new(rows, self.provider.provider_name());
        let view = self.store.publish(snapshot, summary).await;

        self.export(&view).await;

        self.store
            .emit(DashboardEvent::snapshot_updated(&view.snapshot, &view.summary));

        tracing::info!(
            rows = view.snapshot.len(),
            average_price = ?view.summary.average_price,
            "Market snapshot updated"
        );

        Ok(view)
    }

    /// Writes the view to the exporter on the blocking pool
    async fn export(&self, view: &Arc<DashboardView>) {
        let Some(exporter) = &self.exporter else {
            return;
        };

        let task = {
            let exporter = Arc::clone(exporter);
            let view = Arc::clone(view);
            tokio::task::spawn_blocking(move || exporter.export(&view.snapshot))
        };

        let message = match task.await {
            Ok(Ok(written)) => {
                debug_assert_eq!(written, view.snapshot.len());
                self.metrics.record_export().await;
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("export task failed: {}", e),
        };

        tracing::warn!(path = %exporter.path().display(), error = %message, "Export failed");
        self.store.emit(DashboardEvent::export_failed(
            exporter.path().display().to_string(),
            message,
        ));
    }

    /// Fetches markets from the provider with exponential backoff
    async fn fetch_with_retry(&self) -> Result<Vec<CoinSnapshot>, ProviderError> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            match self.provider.fetch_markets(&self.query).await {
                Ok(rows) => {
                    tracing::debug!(
                        count = rows.len(),
                        provider = self.provider.provider_name(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Successfully fetched markets"
                    );
                    self.metrics.record_fetch(start.elapsed(), true).await;
                    return Ok(rows);
                }
                Err(e) => {
                    self.metrics.record_fetch(start.elapsed(), false).await;

                    if attempt >= MAX_RETRY_ATTEMPTS {
                        return Err(e);
                    }

                    tracing::warn!(
                        attempt = attempt,
                        max_attempts = MAX_RETRY_ATTEMPTS,
                        error = %e,
                        "Failed to fetch markets, retrying"
                    );

                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                    attempt += 1;
                }
            }
        }
    }

    /// Gets fetch metrics including latency percentiles and success rates
    pub async fn metrics(&self) -> FetchMetrics {
        self.metrics.snapshot().await
    }

    /// Perform a health check on the poller
    ///
    /// Data older than two refresh intervals counts as stale.
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = HashMap::new();
        let stale_after = self.refresh_interval().as_secs() * 2;

        let latest = self.store.latest().await;
        let failure = self.store.last_failure().await;

        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );
        details.insert(
            "refresh_interval_secs".to_string(),
            serde_json::json!(self.refresh_interval().as_secs()),
        );
        details.insert(
            "completed_cycles".to_string(),
            serde_json::json!(self.store.completed_cycles()),
        );
        details.insert(
            "rows".to_string(),
            serde_json::json!(latest.as_ref().map(|v| v.snapshot.len()).unwrap_or(0)),
        );
        if let Some(view) = &latest {
            details.insert(
                "snapshot_age_secs".to_string(),
                serde_json::json!(view.snapshot.age().as_secs()),
            );
        }
        if let Some(failure) = &failure {
            details.insert("last_error".to_string(), serde_json::json!(failure.message));
        }

        let (status, message) = match &latest {
            None => (
                HealthStatus::Unhealthy,
                "No market data has been fetched yet".to_string(),
            ),
            Some(view) if view.snapshot.is_stale(stale_after) => (
                HealthStatus::Degraded,
                format!("Market data is stale (age: {}s)", view.snapshot.age().as_secs()),
            ),
            Some(_) if failure.is_some() => (
                HealthStatus::Degraded,
                "Last poll cycle failed; showing previous data".to_string(),
            ),
            Some(_) => (
                HealthStatus::Healthy,
                "Market poller is operational with fresh data".to_string(),
            ),
        };

        ComponentHealth {
            name: "market_poller".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}
