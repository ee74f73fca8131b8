use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a threshold crossing relative to the frame open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increase,
    Decrease,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => write!(f, "INCREASE"),
            Direction::Decrease => write!(f, "DECREASE"),
        }
    }
}

impl Direction {
    /// Marker used in the operator log line
    pub fn marker(&self) -> &'static str {
        match self {
            Direction::Increase => "🟢",
            Direction::Decrease => "🔴",
        }
    }
}

/// Everything known about a fired signal.
///
/// The same value goes to the alert port and to the log line, so both see
/// identical direction and magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAlert {
    pub symbol: String,
    pub direction: Direction,
    /// `price - open_price`; negative for decreases
    pub delta: Decimal,
    pub price: Decimal,
    pub open_price: Decimal,
    pub frame_start: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}
