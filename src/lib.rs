//! frame-watch - 5-minute frame price alerts
//!
//! Polls a futures ticker, cuts time into clock-aligned frames and alerts the
//! first time price moves past a threshold from a frame's opening price.
//!
//! # Modules
//!
//! - `domain`: Core logic (PriceSample, FrameTracker, SignalAlert)
//! - `ports`: Trait abstractions (PriceSource, AlertPort)
//! - `adapters`: External implementations (Binance, sound alerts, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Price fetcher with cache/backoff and the polling loop

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
