//! Frame Tracker - 5-minute frame state machine
//!
//! Time is cut into fixed, clock-aligned frames. The first sample seen in a
//! frame fixes its open price; any later sample that moves at least
//! `threshold` away from that open fires a signal, at most once per frame.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use super::sample::PriceSample;
use super::signal::{Direction, SignalAlert};

/// Default signal threshold in quote currency units
pub const DEFAULT_THRESHOLD: Decimal = dec!(180);

/// Default frame length (5 minutes)
pub const DEFAULT_FRAME_LENGTH: Duration = Duration::from_secs(300);

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("Sample at {sample} falls before the live frame starting {frame_start}")]
    OutOfOrder {
        sample: DateTime<Utc>,
        frame_start: DateTime<Utc>,
    },
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),
    #[error("Timestamp cannot be aligned to a frame: {0}")]
    InvalidTimestamp(i64),
    #[error("Invalid tracker configuration: {0}")]
    InvalidConfig(String),
}

/// Frame tracker settings
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Absolute move from the frame open that fires a signal
    pub threshold: Decimal,
    /// Frame length; must be a whole, non-zero number of seconds
    pub frame_length: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            frame_length: DEFAULT_FRAME_LENGTH,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.threshold <= Decimal::ZERO {
            return Err(FrameError::InvalidConfig(format!(
                "threshold must be > 0, got {}",
                self.threshold
            )));
        }
        if self.frame_length.as_secs() == 0 || self.frame_length.subsec_nanos() != 0 {
            return Err(FrameError::InvalidConfig(format!(
                "frame length must be a whole number of seconds > 0, got {:?}",
                self.frame_length
            )));
        }
        Ok(())
    }
}

/// The live frame.
///
/// Fields are private so the open price cannot change after creation and the
/// signal flag can only go from false to true.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    start: DateTime<Utc>,
    open_price: Decimal,
    signal_triggered: bool,
}

impl Frame {
    fn open(start: DateTime<Utc>, open_price: Decimal) -> Self {
        Self {
            start,
            open_price,
            signal_triggered: false,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn open_price(&self) -> Decimal {
        self.open_price
    }

    pub fn signal_triggered(&self) -> bool {
        self.signal_triggered
    }

    fn mark_triggered(&mut self) {
        self.signal_triggered = true;
    }
}

/// What a sample did to the frame state
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// A new frame opened at this sample's price
    FrameStarted {
        frame_start: DateTime<Utc>,
        open_price: Decimal,
    },
    /// The threshold was crossed for the first time in this frame
    SignalFired(SignalAlert),
    /// No crossing. `post_signal` is set once the frame has already fired.
    Update {
        frame_start: DateTime<Utc>,
        open_price: Decimal,
        delta: Decimal,
        post_signal: bool,
    },
}

/// Floor a timestamp to the start of its frame
pub fn align_to_frame(
    timestamp: DateTime<Utc>,
    frame_length: Duration,
) -> Result<DateTime<Utc>, FrameError> {
    let secs = timestamp.timestamp();
    let length = frame_length.as_secs() as i64;
    if length <= 0 {
        return Err(FrameError::InvalidConfig(
            "frame length must be > 0".to_string(),
        ));
    }
    let aligned = secs - secs.rem_euclid(length);
    DateTime::from_timestamp(aligned, 0).ok_or(FrameError::InvalidTimestamp(aligned))
}

/// Tracks the live frame and decides when to fire
#[derive(Debug)]
pub struct FrameTracker {
    config: TrackerConfig,
    frame: Option<Frame>,
}

impl FrameTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, FrameError> {
        config.validate()?;
        Ok(Self {
            config,
            frame: None,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn threshold(&self) -> Decimal {
        self.config.threshold
    }

    /// The live frame, if any sample has been seen
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Feed one sample through the state machine
    pub fn update(&mut self, sample: &PriceSample) -> Result<FrameEvent, FrameError> {
        if sample.price <= Decimal::ZERO {
            return Err(FrameError::InvalidPrice(sample.price));
        }

        let aligned = align_to_frame(sample.timestamp, self.config.frame_length)?;

        if let Some(frame) = self.frame.as_mut() {
            if aligned < frame.start {
                return Err(FrameError::OutOfOrder {
                    sample: sample.timestamp,
                    frame_start: frame.start,
                });
            }
            if aligned == frame.start {
                return Ok(evaluate(frame, sample, self.config.threshold));
            }
        }

        self.frame = Some(Frame::open(aligned, sample.price));
        Ok(FrameEvent::FrameStarted {
            frame_start: aligned,
            open_price: sample.price,
        })
    }
}

/// Compare a sample against the live frame's open and flip the signal flag
/// on the first crossing.
fn evaluate(frame: &mut Frame, sample: &PriceSample, threshold: Decimal) -> FrameEvent {
    let delta = sample.price - frame.open_price;

    let direction = if frame.signal_triggered {
        None
    } else if delta >= threshold {
        Some(Direction::Increase)
    } else if delta <= -threshold {
        Some(Direction::Decrease)
    } else {
        None
    };

    match direction {
        Some(direction) => {
            frame.mark_triggered();
            FrameEvent::SignalFired(SignalAlert {
                symbol: sample.symbol.clone(),
                direction,
                delta,
                price: sample.price,
                open_price: frame.open_price,
                frame_start: frame.start,
                timestamp: sample.timestamp,
            })
        }
        None => FrameEvent::Update {
            frame_start: frame.start,
            open_price: frame.open_price,
            delta,
            post_signal: frame.signal_triggered,
        },
    }
}
