//! Audible alert adapters
//!
//! `SoundAlert` plays a sound file through an external player without waiting
//! for it to finish. It is probed once at startup; when the file or the player
//! is missing the caller falls back to `NoopAlert`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::domain::SignalAlert;
use crate::ports::alert::{AlertError, AlertPort};

/// Default sound file, relative to the working directory
pub const DEFAULT_SOUND_FILE: &str = "signal.mp3";

/// How signals are announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// Play the sound file through an external player
    #[default]
    Sound,
    /// Ring the terminal bell
    Bell,
    /// Log only
    Off,
}

/// Player command line used when none is configured
pub fn default_player() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["afplay".to_string()]
    } else {
        ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Plays a sound file through an external audio player
#[derive(Debug, Clone)]
pub struct SoundAlert {
    player: PathBuf,
    args: Vec<String>,
    sound_file: PathBuf,
}

impl SoundAlert {
    /// Check that the sound file exists and the player can be found
    pub fn probe(sound_file: impl Into<PathBuf>, player: &[String]) -> Result<Self, AlertError> {
        let sound_file = sound_file.into();
        if !sound_file.is_file() {
            return Err(AlertError::SoundFileMissing(sound_file));
        }

        let (program, args) = player
            .split_first()
            .ok_or_else(|| AlertError::PlayerNotFound("<empty player command>".to_string()))?;

        let player = find_on_path(program)
            .ok_or_else(|| AlertError::PlayerNotFound(program.clone()))?;

        Ok(Self {
            player,
            args: args.to_vec(),
            sound_file,
        })
    }

    pub fn sound_file(&self) -> &Path {
        &self.sound_file
    }
}

impl AlertPort for SoundAlert {
    fn trigger(&self, _alert: &SignalAlert) -> Result<(), AlertError> {
        // Dropped child keeps running; tokio reaps it in the background
        Command::new(&self.player)
            .args(&self.args)
            .arg(&self.sound_file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AlertError::Spawn {
                player: self.player.display().to_string(),
                source,
            })?;
        Ok(())
    }
}

/// Rings the terminal bell
#[derive(Debug, Clone, Default)]
pub struct TerminalBell;

impl AlertPort for TerminalBell {
    fn trigger(&self, _alert: &SignalAlert) -> Result<(), AlertError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Does nothing; used when audio is unavailable or disabled
#[derive(Debug, Clone, Default)]
pub struct NoopAlert;

impl AlertPort for NoopAlert {
    fn trigger(&self, _alert: &SignalAlert) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Build the alert adapter for `mode`, degrading to `NoopAlert` when the
/// sound cannot be played.
pub fn build_alert(mode: AlertMode, sound_file: &Path, player: &[String]) -> Box<dyn AlertPort> {
    match mode {
        AlertMode::Sound => match SoundAlert::probe(sound_file, player) {
            Ok(sound) => {
                tracing::info!("Sound alerts enabled ({})", sound.sound_file().display());
                Box::new(sound)
            }
            Err(e) => {
                tracing::warn!("⚠️ Audio unavailable ({}), sound disabled", e);
                Box::new(NoopAlert)
            }
        },
        AlertMode::Bell => Box::new(TerminalBell),
        AlertMode::Off => {
            tracing::info!("Alerts disabled, signals are logged only");
            Box::new(NoopAlert)
        }
    }
}

/// Resolve a program name against `PATH`; paths are checked directly
fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let plain = dir.join(program);
        if plain.is_file() {
            return Some(plain);
        }
        let with_suffix = dir.join(format!("{}{}", program, std::env::consts::EXE_SUFFIX));
        with_suffix.is_file().then_some(with_suffix)
    })
}
