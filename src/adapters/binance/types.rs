//! Binance Futures Response Types

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ports::market_data::MarketDataError;

/// `GET /fapi/v1/ticker/price` response
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    /// Decimal encoded as a string, e.g. `"50000.10"`
    pub price: String,
}

/// `GET /fapi/v1/ticker/24hr` response (only the fields we read)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hrResponse {
    pub symbol: String,
    #[serde(default)]
    pub price_change_percent: Option<String>,
}

impl Ticker24hrResponse {
    /// 24h change in percent; a missing field counts as no change
    pub fn change_pct(&self) -> Result<Decimal, MarketDataError> {
        match &self.price_change_percent {
            Some(raw) => parse_decimal("priceChangePercent", raw),
            None => Ok(Decimal::ZERO),
        }
    }
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| MarketDataError::ParseError(format!("invalid {} '{}': {}", field, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_ticker_price() {
        let json = r#"{"symbol":"BTCUSDT","price":"50123.40","time":1704067200000}"#;
        let ticker: TickerPriceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(parse_decimal("price", &ticker.price).unwrap(), dec!(50123.40));
    }

    #[test]
    fn test_parse_24hr_change() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "priceChange": "-94.99999800",
            "priceChangePercent": "-0.190",
            "lastPrice": "49905.00",
            "volume": "8913.30000000"
        }"#;
        let stats: Ticker24hrResponse = serde_json::from_str(json).unwrap();
        assert_eq!(stats.change_pct().unwrap(), dec!(-0.19));
        assert_eq!(stats.symbol, "BTCUSDT");
    }

    #[test]
    fn test_missing_change_defaults_to_zero() {
        let stats: Ticker24hrResponse = serde_json::from_str(r#"{"symbol":"BTCUSDT"}"#).unwrap();
        assert_eq!(stats.change_pct().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_invalid_decimal() {
        let err = parse_decimal("price", "not-a-number").unwrap_err();
        assert!(matches!(err, MarketDataError::ParseError(_)));
    }
}
