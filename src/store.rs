//! In-memory dashboard store with broadcast capabilities

use crate::{
    constants::EVENT_CHANNEL_CAPACITY,
    error::DashboardError,
    types::{DashboardEvent, MarketSnapshot, MarketSummary},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// A snapshot together with the statistics derived from it
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub snapshot: MarketSnapshot,
    pub summary: MarketSummary,
}

/// Most recent cycle failure
#[derive(Debug, Clone, Serialize)]
pub struct CycleFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// In-memory store for the latest dashboard data
///
/// The view is replaced wholesale on every successful cycle; readers hold an
/// `Arc` to whichever view was current when they looked.
pub struct DashboardStore {
    latest: RwLock<Option<Arc<DashboardView>>>,
    last_failure: RwLock<Option<CycleFailure>>,
    completed_cycles: AtomicU64,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardStore {
    /// Creates an empty dashboard store
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            latest: RwLock::new(None),
            last_failure: RwLock::new(None),
            completed_cycles: AtomicU64::new(0),
            events,
        }
    }

    /// Replaces the current view and clears any recorded failure
    pub async fn publish(&self, snapshot: MarketSnapshot, summary: MarketSummary) -> Arc<DashboardView> {
        let view = Arc::new(DashboardView { snapshot, summary });

        *self.latest.write().await = Some(view.clone());
        *self.last_failure.write().await = None;
        self.completed_cycles.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            snapshot_id = %view.snapshot.id,
            rows = view.snapshot.len(),
            "Published snapshot"
        );

        view
    }

    /// Gets the current view
    pub async fn latest(&self) -> Option<Arc<DashboardView>> {
        self.latest.read().await.clone()
    }

    /// Gets the current view, or `NotReady` if no cycle has succeeded yet
    pub async fn require_latest(&self) -> Result<Arc<DashboardView>, DashboardError> {
        self.latest().await.ok_or(DashboardError::NotReady)
    }

    /// Records a failed cycle; the previous view stays in place
    pub async fn record_failure(&self, message: impl Into<String>) {
        *self.last_failure.write().await = Some(CycleFailure {
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub async fn last_failure(&self) -> Option<CycleFailure> {
        self.last_failure.read().await.clone()
    }

    /// Number of cycles that produced a snapshot
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles.load(Ordering::Relaxed)
    }

    /// Sends an event to every live subscriber
    pub fn emit(&self, event: DashboardEvent) {
        tracing::trace!(event_type = event.event_type(), "{}", event);
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}
