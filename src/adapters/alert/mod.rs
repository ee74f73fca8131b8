//! Alert Adapters
//!
//! Implementations of `AlertPort`: external sound player, terminal bell, no-op.

mod sound;

pub use sound::{
    build_alert, default_player, AlertMode, NoopAlert, SoundAlert, TerminalBell,
    DEFAULT_SOUND_FILE,
};
