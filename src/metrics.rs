//! Poll cycle metrics
//!
//! Tracks fetch latency percentiles and success rates over a rolling window.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for percentile calculation
const MAX_SAMPLES: usize = 100;

/// Fetch metrics reported by the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct FetchMetrics {
    /// Name of the provider
    pub provider_name: String,
    /// 50th percentile fetch latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile fetch latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of fetches (lifetime)
    pub total_fetches: u64,
    /// Number of failed fetches (lifetime)
    pub failed_fetches: u64,
    /// Number of successful exports (lifetime)
    pub exports: u64,
}

#[derive(Debug, Default)]
struct MetricsState {
    latencies_ms: VecDeque<f64>,
    total_fetches: u64,
    failed_fetches: u64,
    exports: u64,
}

/// Collects fetch and export counters for one provider
pub struct MetricsCollector {
    provider_name: String,
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            state: RwLock::new(MetricsState::default()),
        }
    }

    /// Records a fetch with its duration and success status
    ///
    /// Only successful fetches contribute latency samples.
    pub async fn record_fetch(&self, duration: Duration, success: bool) {
        let mut state = self.state.write().await;
        state.total_fetches += 1;

        if !success {
            state.failed_fetches += 1;
            return;
        }

        if state.latencies_ms.len() >= MAX_SAMPLES {
            state.latencies_ms.pop_front();
        }
        state.latencies_ms.push_back(duration.as_secs_f64() * 1000.0);
    }

    pub async fn record_export(&self) {
        self.state.write().await.exports += 1;
    }

    /// Computes current metrics from collected samples
    pub async fn snapshot(&self) -> FetchMetrics {
        let state = self.state.read().await;

        let mut latencies: Vec<f64> = state.latencies_ms.iter().copied().collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        let success_rate = if state.total_fetches > 0 {
            (state.total_fetches - state.failed_fetches) as f64 / state.total_fetches as f64
        } else {
            1.0
        };

        FetchMetrics {
            provider_name: self.provider_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_fetches: state.total_fetches,
            failed_fetches: state.failed_fetches,
            exports: state.exports,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record_fetch(Duration::from_millis(100), true).await;
        collector.record_fetch(Duration::from_millis(200), true).await;
        collector.record_fetch(Duration::from_millis(150), false).await;
        collector.record_export().await;

        let metrics = collector.snapshot().await;

        assert_eq!(metrics.provider_name, "test");
        assert_eq!(metrics.total_fetches, 3);
        assert_eq!(metrics.failed_fetches, 1);
        assert_eq!(metrics.exports, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
        assert_eq!(metrics.latency_p99_ms, 200.0);
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let metrics = MetricsCollector::new("test").snapshot().await;
        assert_eq!(metrics.success_rate, 1.0);
        assert_eq!(metrics.latency_p50_ms, 0.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];
        assert_eq!(percentile(&values, 50.0), 6.0);
        assert_eq!(percentile(&values, 99.0), 11.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
