//! Binance Futures Adapter
//!
//! Public ticker endpoints for USD-M perpetual futures:
//! - `/fapi/v1/ticker/price` for the current price
//! - `/fapi/v1/ticker/24hr` for the 24-hour change

mod client;
mod types;

pub use client::{BinanceClient, BinanceConfig, DEFAULT_API_URL};
pub use types::{TickerPriceResponse, Ticker24hrResponse};
