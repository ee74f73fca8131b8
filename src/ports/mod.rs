//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Price data (ticker price, 24h statistics)
//! - Signal alerts (sound, terminal bell)

pub mod market_data;
pub mod alert;
pub mod mocks;

pub use market_data::{PriceSource, MarketDataError};
pub use alert::{AlertPort, AlertError};
