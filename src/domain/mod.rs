//! Domain Layer - Core frame tracking logic for frame-watch
//!
//! Pure types and state machines with no I/O. All external interactions
//! happen through the ports layer.
//!
//! - `sample`: price observations and USD formatting
//! - `signal`: threshold crossing direction and the alert payload
//! - `frame`: the 5-minute frame tracker

pub mod sample;
pub mod signal;
pub mod frame;

pub use sample::{PriceSample, format_usd, format_signed_usd};
pub use signal::{Direction, SignalAlert};
pub use frame::{
    Frame, FrameTracker, FrameEvent, FrameError, TrackerConfig, align_to_frame,
    DEFAULT_THRESHOLD, DEFAULT_FRAME_LENGTH,
};
