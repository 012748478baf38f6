//! Provider abstraction for fetching market listings from external APIs

use crate::{
    constants::{MARKET_ORDER, PER_PAGE, VS_CURRENCY},
    error::ProviderError,
    types::CoinSnapshot,
};
use async_trait::async_trait;

/// Query parameters for a market listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketsQuery {
    pub vs_currency: String,
    pub order: String,
    pub per_page: u32,
    pub page: u32,
    pub sparkline: bool,
}

impl Default for MarketsQuery {
    fn default() -> Self {
        Self {
            vs_currency: VS_CURRENCY.to_string(),
            order: MARKET_ORDER.to_string(),
            per_page: PER_PAGE,
            page: 1,
            sparkline: false,
        }
    }
}

impl MarketsQuery {
    /// Query string pairs in the order they are sent
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", self.vs_currency.clone()),
            ("order", self.order.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("sparkline", self.sparkline.to_string()),
        ]
    }
}

/// Trait for market data providers
///
/// Implementations fetch one page of coin listings from a source
/// (CoinGecko today) and project it into [`CoinSnapshot`] rows.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches one page of market listings
    ///
    /// # Returns
    /// Rows in the order the source returned them, or an error if the fetch
    /// fails or the source returned nothing
    async fn fetch_markets(&self, query: &MarketsQuery) -> Result<Vec<CoinSnapshot>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock provider for testing
    ///
    /// Replays queued responses in order; once the queue is drained the last
    /// successful row set is returned again.
    pub struct MockProvider {
        responses: Arc<Mutex<VecDeque<Result<Vec<CoinSnapshot>, ProviderError>>>>,
        fallback: Arc<Mutex<Option<Vec<CoinSnapshot>>>>,
        calls: Arc<Mutex<Vec<tokio::time::Instant>>>,
    }

    impl Default for MockProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self {
                responses: Arc::new(Mutex::new(VecDeque::new())),
                fallback: Arc::new(Mutex::new(None)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_rows(rows: Vec<CoinSnapshot>) -> Self {
            let provider = Self::new();
            provider.push_rows(rows);
            provider
        }

        pub fn push_rows(&self, rows: Vec<CoinSnapshot>) {
            self.responses.lock().unwrap().push_back(Ok(rows));
        }

        pub fn push_error(&self, error: ProviderError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Instants (on the tokio clock) at which each fetch happened
        pub fn call_times(&self) -> Vec<tokio::time::Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_markets(
            &self,
            _query: &MarketsQuery,
        ) -> Result<Vec<CoinSnapshot>, ProviderError> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());

            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(rows)) => {
                    *self.fallback.lock().unwrap() = Some(rows.clone());
                    Ok(rows)
                }
                Some(Err(err)) => Err(err),
                None => self.fallback.lock().unwrap().clone().ok_or_else(|| {
                    ProviderError::InvalidResponse("No markets returned".to_string())
                }),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
