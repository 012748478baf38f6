//! Constants for the live crypto dashboard
//!
//! Compile-time defaults. Most of them can be overridden at runtime through
//! the environment or the command line (see `config`).

/// Default refresh interval between poll cycles (in seconds)
pub const DEFAULT_REFRESH_SECS: u64 = 300;

/// Smallest refresh interval the dashboard accepts (in seconds)
pub const MIN_REFRESH_SECS: u64 = 30;

/// Largest refresh interval the dashboard accepts (in seconds)
pub const MAX_REFRESH_SECS: u64 = 600;

/// Refresh intervals must be a multiple of this step (in seconds)
pub const REFRESH_STEP_SECS: u64 = 30;

/// HTTP request timeout when fetching market data (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of fetch attempts per poll cycle
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Initial backoff delay for retries (in milliseconds)
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay for retries (in milliseconds)
pub const MAX_BACKOFF_MS: u64 = 30000;

/// Number of coins shown in the "top by market cap" panel
pub const TOP_N: usize = 5;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for market listings
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Quote currency requested from the markets endpoint
pub const VS_CURRENCY: &str = "usd";

/// Ordering requested from the markets endpoint
pub const MARKET_ORDER: &str = "market_cap_desc";

/// Page size requested from the markets endpoint
pub const PER_PAGE: u32 = 50;

/// Default spreadsheet export path
pub const DEFAULT_EXPORT_PATH: &str = "Crypto_Live_Data.csv";

/// Default address the dashboard binds to
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default port the dashboard listens on
pub const DEFAULT_PORT: u16 = 8501;

/// Capacity of the dashboard event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// User agent for HTTP requests
pub const USER_AGENT: &str = concat!("crypto-dashboard/", env!("CARGO_PKG_VERSION"));
