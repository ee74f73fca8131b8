use std::path::PathBuf;

use thiserror::Error;

use crate::domain::SignalAlert;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Sound file not found: {0}")]
    SoundFileMissing(PathBuf),

    #[error("Audio player not found: {0}")]
    PlayerNotFound(String),

    #[error("Failed to launch audio player '{player}': {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Terminal write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fire-and-forget notification for a fired signal
#[cfg_attr(test, mockall::automock)]
pub trait AlertPort: Send + Sync {
    fn trigger(&self, alert: &SignalAlert) -> Result<(), AlertError>;
}

impl<T: AlertPort + ?Sized> AlertPort for Box<T> {
    fn trigger(&self, alert: &SignalAlert) -> Result<(), AlertError> {
        (**self).trigger(alert)
    }
}
