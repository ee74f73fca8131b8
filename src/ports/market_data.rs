use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Rate limited by price API (HTTP 429)")]
    RateLimited,

    #[error("HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Data parsing error: {0}")]
    ParseError(String),
}

impl MarketDataError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, MarketDataError::RateLimited)
    }
}

/// Source of spot prices and 24h statistics for a symbol
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current price for the symbol
    async fn ticker_price(&self, symbol: &str) -> Result<Decimal, MarketDataError>;

    /// 24-hour price change in percent
    async fn change_24h_pct(&self, symbol: &str) -> Result<Decimal, MarketDataError>;
}

#[async_trait]
impl<T: PriceSource + ?Sized> PriceSource for Box<T> {
    async fn ticker_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        (**self).ticker_price(symbol).await
    }

    async fn change_24h_pct(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        (**self).change_24h_pct(symbol).await
    }
}
