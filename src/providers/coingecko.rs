//! CoinGecko markets provider implementation

use crate::{
    constants::{COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
    provider::{MarketDataProvider, MarketsQuery},
    types::CoinSnapshot,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// One element of the `/coins/markets` response
///
/// Only the projected columns are declared; serde drops the rest.
#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    name: String,
    symbol: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
}

impl From<CoinGeckoMarket> for CoinSnapshot {
    fn from(m: CoinGeckoMarket) -> Self {
        Self {
            name: m.name,
            symbol: m.symbol,
            current_price: m.current_price,
            market_cap: m.market_cap,
            total_volume: m.total_volume,
            price_change_percentage_24h: m.price_change_percentage_24h,
        }
    }
}

/// CoinGecko markets provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider against the public API
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_options(COINGECKO_API_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a provider with a custom base URL and request timeout
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the CoinGecko markets URL (without query string)
    fn build_url(&self) -> String {
        format!("{}{}", self.base_url, COINGECKO_MARKETS_ENDPOINT)
    }

    /// Parses the CoinGecko response body into snapshot rows
    fn parse_response(body: &str) -> Result<Vec<CoinSnapshot>, ProviderError> {
        let markets: Vec<CoinGeckoMarket> = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse CoinGecko response: {}. Response: {}",
                e,
                truncate(body, 256)
            ))
        })?;

        if markets.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No markets returned".to_string(),
            ));
        }

        Ok(markets.into_iter().map(CoinSnapshot::from).collect())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_markets(&self, query: &MarketsQuery) -> Result<Vec<CoinSnapshot>, ProviderError> {
        let url = self.build_url();
        tracing::debug!(url = %url, page = query.page, per_page = query.per_page, "Fetching markets from CoinGecko");

        let response = self
            .client
            .get(&url)
            .query(&query.to_query_pairs())
            .send()
            .await?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        // Check for other errors
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response.text().await?;
        let rows = Self::parse_response(&body)?;

        tracing::debug!(count = rows.len(), "Successfully fetched markets from CoinGecko");

        Ok(rows)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{RawQuery, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::sync::{Arc, Mutex};

    const SAMPLE: &str = r#"[
        {
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://example.invalid/btc.png",
            "current_price": 67012.5,
            "market_cap": 1321000000000,
            "market_cap_rank": 1,
            "total_volume": 28500000000,
            "high_24h": 67500,
            "price_change_percentage_24h": 1.234,
            "roi": null
        },
        {
            "id": "newcoin",
            "symbol": "new",
            "name": "New Coin",
            "current_price": 0.01,
            "market_cap": null,
            "total_volume": 1200,
            "price_change_percentage_24h": null
        }
    ]"#;

    #[test]
    fn test_parse_projects_columns() {
        let rows = CoinGeckoProvider::parse_response(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].name, "Bitcoin");
        assert_eq!(rows[0].symbol, "btc");
        assert_eq!(rows[0].current_price, Some(67012.5));
        assert_eq!(rows[0].market_cap, Some(1321000000000.0));
        assert_eq!(rows[0].total_volume, Some(28500000000.0));
        assert_eq!(rows[0].price_change_percentage_24h, Some(1.234));

        assert_eq!(rows[1].market_cap, None);
        assert_eq!(rows[1].price_change_percentage_24h, None);
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(matches!(
            CoinGeckoProvider::parse_response("[]"),
            Err(ProviderError::InvalidResponse(msg)) if msg == "No markets returned"
        ));
        assert!(matches!(
            CoinGeckoProvider::parse_response("<html>busy</html>"),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            CoinGeckoProvider::parse_response(r#"{"status":{"error_code":429}}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_build_url_trims_trailing_slash() {
        let provider =
            CoinGeckoProvider::with_options("http://localhost:9999/api/v3/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.build_url(), "http://localhost:9999/api/v3/coins/markets");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    type SeenQuery = Arc<Mutex<Option<String>>>;

    /// Serves canned `/coins/markets` responses under three base paths
    async fn spawn_upstream() -> (String, SeenQuery) {
        let seen: SeenQuery = Arc::new(Mutex::new(None));

        let app = Router::new()
            .route(
                "/limited/coins/markets",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route(
                "/broken/coins/markets",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
            )
            .route(
                "/ok/coins/markets",
                get(|State(seen): State<SeenQuery>, RawQuery(query): RawQuery| async move {
                    *seen.lock().unwrap() = query;
                    ([("content-type", "application/json")], SAMPLE)
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_fetch_markets_over_http() {
        let (base, seen) = spawn_upstream().await;
        let query = MarketsQuery::default();
        let provider_at = |path: &str| {
            CoinGeckoProvider::with_options(&format!("{}/{}", base, path), Duration::from_secs(5))
                .unwrap()
        };

        let limited = provider_at("limited").fetch_markets(&query).await;
        assert!(matches!(limited, Err(ProviderError::RateLimitExceeded)));

        let broken = provider_at("broken").fetch_markets(&query).await;
        match broken {
            Err(ProviderError::ApiError(msg)) => {
                assert!(msg.starts_with("HTTP 500"), "{}", msg);
                assert!(msg.contains("upstream exploded"));
            }
            other => panic!("expected ApiError, got {:?}", other.map(|r| r.len())),
        }

        let rows = provider_at("ok").fetch_markets(&query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Bitcoin");
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("vs_currency=usd&order=market_cap_desc&per_page=50&page=1&sparkline=false")
        );
    }
}
