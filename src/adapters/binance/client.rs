//! Binance Futures API Client
//!
//! HTTP client for the public USD-M futures ticker endpoints.
//! No authentication. Rate limiting is surfaced as `MarketDataError::RateLimited`
//! and handled by the caller; this client never retries on its own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use super::types::{parse_decimal, Ticker24hrResponse, TickerPriceResponse};
use crate::ports::market_data::{MarketDataError, PriceSource};

/// Binance USD-M futures REST base URL
pub const DEFAULT_API_URL: &str = "https://fapi.binance.com";

const TICKER_PRICE_PATH: &str = "/fapi/v1/ticker/price";
const TICKER_24HR_PATH: &str = "/fapi/v1/ticker/24hr";

/// Binance client configuration
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// Base URL for the futures API
    pub api_base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Binance futures ticker client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    config: BinanceConfig,
    http: Client,
}

impl BinanceClient {
    /// Create a new Binance client with default configuration
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(BinanceConfig::default())
    }

    /// Create a new Binance client with custom configuration
    pub fn with_config(config: BinanceConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    /// GET `path?symbol=SYM` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
    ) -> Result<T, MarketDataError> {
        let response = self.http
            .get(self.endpoint(path))
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| MarketDataError::ParseError(format!("{}: {}", path, e)))
    }
}

/// Map a non-success status to an error, keeping 429 distinct
fn status_error(status: StatusCode, message: String) -> MarketDataError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        MarketDataError::RateLimited
    } else {
        MarketDataError::HttpStatus {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    async fn ticker_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        let ticker: TickerPriceResponse = self.get_json(TICKER_PRICE_PATH, symbol).await?;
        parse_decimal("price", &ticker.price)
    }

    async fn change_24h_pct(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        let stats: Ticker24hrResponse = self.get_json(TICKER_24HR_PATH, symbol).await?;
        stats.change_pct()
    }
}
