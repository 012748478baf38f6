//! # Live Crypto Dashboard
//!
//! Polls the CoinGecko markets API for the top 50 cryptocurrencies by market
//! cap, derives a few statistics, serves them on a live-refreshing web page,
//! and exports the raw table to a CSV spreadsheet on every refresh.
//!
//! ## Usage
//!
//! ```no_run
//! use crypto_dashboard::{
//!     CoinGeckoProvider, CsvExporter, DashboardStore, MarketPoller, RefreshInterval,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(DashboardStore::new());
//! let poller = MarketPoller::new(
//!     Arc::new(CoinGeckoProvider::new()?),
//!     store.clone(),
//!     Some(Arc::new(CsvExporter::new("Crypto_Live_Data.csv"))),
//!     RefreshInterval::default(),
//! );
//!
//! // One fetch, analyze, publish, export cycle
//! let view = poller.run_cycle().await?;
//! if let Some(avg) = view.summary.average_price {
//!     println!("Average price: ${:.2}", avg);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketPoller (loop: fetch → analyze → publish → export → sleep)
//!     ↓
//! MarketDataProvider (CoinGecko /coins/markets)
//!     ↓
//! DashboardStore (latest view + event broadcast)
//!     ↓
//! server (HTML page, JSON API, SSE)
//! ```

pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod interval;
pub mod metrics;
pub mod poller;
pub mod provider;
pub mod providers;
pub mod render;
pub mod server;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use error::{ConfigError, DashboardError, ExportError, ProviderError};
pub use export::{CsvExporter, SnapshotExporter};
pub use interval::RefreshInterval;
pub use metrics::FetchMetrics;
pub use poller::MarketPoller;
pub use provider::{MarketDataProvider, MarketsQuery};
pub use providers::CoinGeckoProvider;
pub use store::{DashboardStore, DashboardView};
pub use types::{
    ChangeEntry, CoinSnapshot, ComponentHealth, DashboardEvent, HealthStatus, MarketCapEntry,
    MarketSnapshot, MarketSummary,
};
