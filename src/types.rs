//! Types for the live crypto dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cryptocurrency's market data at fetch time
///
/// The upstream API sends `null` for numbers it does not know (freshly listed
/// coins often lack a 24h change), so every numeric column is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    /// Display name, e.g. "Bitcoin"
    pub name: String,

    /// Ticker symbol as returned upstream (lowercase), e.g. "btc"
    pub symbol: String,

    /// Price in the quote currency
    pub current_price: Option<f64>,

    /// Market capitalisation in the quote currency
    pub market_cap: Option<f64>,

    /// 24h traded volume in the quote currency
    pub total_volume: Option<f64>,

    /// 24h price change percentage
    pub price_change_percentage_24h: Option<f64>,
}

/// The full table fetched in one poll cycle
///
/// Replaced wholesale on every successful cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: Uuid,

    /// Rows in upstream order (market cap descending)
    pub rows: Vec<CoinSnapshot>,

    pub fetched_at: DateTime<Utc>,

    /// Data source
    pub source: String,
}

impl MarketSnapshot {
    /// Create a new snapshot stamped with the current time
    pub fn new(rows: Vec<CoinSnapshot>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            rows,
            fetched_at: Utc::now(),
            source: source.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the age of the snapshot
    pub fn age(&self) -> std::time::Duration {
        let duration = Utc::now().signed_duration_since(self.fetched_at);
        std::time::Duration::from_secs(duration.num_seconds().max(0) as u64)
    }

    /// Check if the snapshot is older than `threshold_seconds`
    pub fn is_stale(&self, threshold_seconds: u64) -> bool {
        self.age().as_secs() > threshold_seconds
    }
}

/// Entry in the "top by market cap" panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCapEntry {
    pub name: String,
    pub symbol: String,
    pub market_cap: f64,
}

/// Entry in the "price changes (24h)" panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub name: String,
    pub symbol: String,
    pub price_change_percentage_24h: f64,
}

/// Statistics derived from a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub top_by_market_cap: Vec<MarketCapEntry>,

    /// Mean of `current_price`; `None` when no row carries a price
    pub average_price: Option<f64>,

    pub highest_change: Option<ChangeEntry>,

    pub lowest_change: Option<ChangeEntry>,
}

/// Dashboard events pushed to live clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardEvent {
    /// A poll cycle produced a new snapshot
    SnapshotUpdated {
        id: Uuid,
        snapshot_id: Uuid,
        rows: usize,
        average_price: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// Market data fetch failed
    FetchFailed {
        id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// Spreadsheet export failed
    ExportFailed {
        id: Uuid,
        path: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The refresh interval was changed
    RefreshIntervalChanged {
        id: Uuid,
        old_secs: u64,
        new_secs: u64,
        timestamp: DateTime<Utc>,
    },
}

impl DashboardEvent {
    pub fn snapshot_updated(snapshot: &MarketSnapshot, summary: &MarketSummary) -> Self {
        Self::SnapshotUpdated {
            id: Uuid::new_v4(),
            snapshot_id: snapshot.id,
            rows: snapshot.len(),
            average_price: summary.average_price,
            timestamp: Utc::now(),
        }
    }

    pub fn fetch_failed(error_message: impl Into<String>) -> Self {
        Self::FetchFailed {
            id: Uuid::new_v4(),
            error_message: error_message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn export_failed(path: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self::ExportFailed {
            id: Uuid::new_v4(),
            path: path.into(),
            error_message: error_message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn refresh_interval_changed(old_secs: u64, new_secs: u64) -> Self {
        Self::RefreshIntervalChanged {
            id: Uuid::new_v4(),
            old_secs,
            new_secs,
            timestamp: Utc::now(),
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            DashboardEvent::SnapshotUpdated { id, .. } => *id,
            DashboardEvent::FetchFailed { id, .. } => *id,
            DashboardEvent::ExportFailed { id, .. } => *id,
            DashboardEvent::RefreshIntervalChanged { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::SnapshotUpdated { .. } => "SNAPSHOT_UPDATED",
            DashboardEvent::FetchFailed { .. } => "FETCH_FAILED",
            DashboardEvent::ExportFailed { .. } => "EXPORT_FAILED",
            DashboardEvent::RefreshIntervalChanged { .. } => "REFRESH_INTERVAL_CHANGED",
        }
    }
}

impl std::fmt::Display for DashboardEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardEvent::SnapshotUpdated { rows, .. } => {
                write!(f, "Snapshot updated: {} coins", rows)
            }
            DashboardEvent::FetchFailed { error_message, .. } => {
                write!(f, "Market data fetch failed: {}", error_message)
            }
            DashboardEvent::ExportFailed {
                path,
                error_message,
                ..
            } => write!(f, "Export to {} failed: {}", path, error_message),
            DashboardEvent::RefreshIntervalChanged {
                old_secs, new_secs, ..
            } => write!(f, "Refresh interval changed: {}s -> {}s", old_secs, new_secs),
        }
    }
}

/// Overall system health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh data and the last cycle succeeded
    Healthy,
    /// Data is available but stale, or the last cycle failed
    Degraded,
    /// No data has ever been fetched
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = DashboardEvent::refresh_interval_changed(300, 60);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "REFRESH_INTERVAL_CHANGED");
        assert_eq!(json["old_secs"], 300);
        assert_eq!(json["new_secs"], 60);
        assert_eq!(event.event_type(), "REFRESH_INTERVAL_CHANGED");
    }

    #[test]
    fn test_snapshot_staleness() {
        let mut snapshot = MarketSnapshot::new(Vec::new(), "test");
        assert!(!snapshot.is_stale(60));

        snapshot.fetched_at = Utc::now() - chrono::Duration::seconds(120);
        assert!(snapshot.is_stale(60));
        assert!(!snapshot.is_stale(600));
    }
}
