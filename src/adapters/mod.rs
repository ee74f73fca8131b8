//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Binance: futures ticker API client
//! - Alert: sound player, terminal bell, no-op
//! - CLI: Command-line interface handlers

pub mod binance;
pub mod alert;
pub mod cli;

pub use binance::BinanceClient;
pub use alert::{build_alert, AlertMode};
pub use cli::CliApp;
