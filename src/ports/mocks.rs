use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::alert::{AlertError, AlertPort};
use super::market_data::{MarketDataError, PriceSource};
use crate::domain::SignalAlert;

/// Price source that replays scripted responses and records calls.
///
/// An exhausted script answers with a 503 so tests notice unplanned requests.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPriceSource {
    prices: Arc<Mutex<VecDeque<Result<Decimal, MarketDataError>>>>,
    changes: Arc<Mutex<VecDeque<Result<Decimal, MarketDataError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a ticker price response
    pub fn with_price(self, response: Result<Decimal, MarketDataError>) -> Self {
        self.prices.lock().unwrap().push_back(response);
        self
    }

    /// Queue a 24h change response
    pub fn with_change(self, response: Result<Decimal, MarketDataError>) -> Self {
        self.changes.lock().unwrap().push_back(response);
        self
    }

    /// Queue a successful price together with its 24h change
    pub fn with_sample(self, price: Decimal, change: Decimal) -> Self {
        self.with_price(Ok(price)).with_change(Ok(change))
    }

    /// Get all recorded calls, as `"price:SYM"` / `"change:SYM"`
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of ticker price requests made
    pub fn price_calls(&self) -> usize {
        self.get_calls().iter().filter(|c| c.starts_with("price:")).count()
    }

    fn exhausted() -> MarketDataError {
        MarketDataError::HttpStatus {
            status: 503,
            message: "No response configured".to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    async fn ticker_price(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        self.calls.lock().unwrap().push(format!("price:{}", symbol));
        self.prices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn change_24h_pct(&self, symbol: &str) -> Result<Decimal, MarketDataError> {
        self.calls.lock().unwrap().push(format!("change:{}", symbol));
        self.changes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }
}

/// Alert port that records every alert it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingAlert {
    alerts: Arc<Mutex<Vec<SignalAlert>>>,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded alerts
    pub fn get_alerts(&self) -> Vec<SignalAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertPort for RecordingAlert {
    fn trigger(&self, alert: &SignalAlert) -> Result<(), AlertError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
