//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every key has a default,
//! so a missing section (or an empty file) falls back to the built-in values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::alert::{default_player, AlertMode, DEFAULT_SOUND_FILE};
use crate::adapters::binance::{BinanceConfig, DEFAULT_API_URL};
use crate::application::{FetcherConfig, LoopDelays};
use crate::domain::TrackerConfig;

/// Environment variable overriding `market.api_url`
pub const ENV_API_URL: &str = "FRAME_WATCH_API_URL";
/// Environment variable overriding `market.symbol`
pub const ENV_SYMBOL: &str = "FRAME_WATCH_SYMBOL";

/// Upper bound for polling intervals, in seconds
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub market: MarketSection,
    pub signal: SignalSection,
    pub polling: PollingSection,
    pub logging: LoggingSection,
    pub alert: AlertSection,
}

/// Price source configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSection {
    /// Trading symbol, e.g. "BTCUSDT"
    pub symbol: String,
    /// Binance futures REST base URL
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Signal detection configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSection {
    /// Move from the frame open (quote currency) that fires a signal
    pub threshold: f64,
    /// Frame length in seconds (300 = 5-minute frames)
    pub frame_secs: u64,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            threshold: 180.0,
            frame_secs: 300,
        }
    }
}

/// Polling cadence configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSection {
    /// Minimum spacing between real fetches after a success
    pub base_interval_secs: u64,
    /// Cap for the rate-limit backoff
    pub max_backoff_secs: u64,
    /// Pause after a tick that produced a sample
    pub tick_delay_secs: u64,
    /// Pause after a tick with no sample at all
    pub no_data_delay_secs: u64,
    /// Pause after a tick error
    pub error_delay_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            base_interval_secs: 1,
            max_backoff_secs: 60,
            tick_delay_secs: 1,
            no_data_delay_secs: 5,
            error_delay_secs: 5,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log file path; every console line is appended here too
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: "frame_watch.log".to_string(),
        }
    }
}

impl LoggingSection {
    /// Log file path with `~` expanded
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).to_string())
    }
}

/// Alert configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSection {
    /// "sound", "bell" or "off"
    pub mode: AlertMode,
    /// Sound file played on a signal
    pub sound_file: String,
    /// Player command line; the sound file is appended as the last argument
    pub player: Vec<String>,
}

impl Default for AlertSection {
    fn default() -> Self {
        Self {
            mode: AlertMode::Sound,
            sound_file: DEFAULT_SOUND_FILE.to_string(),
            player: default_player(),
        }
    }
}

impl AlertSection {
    /// Sound file path with `~` expanded
    pub fn sound_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.sound_file).to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Market
        if self.market.symbol.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "symbol cannot be empty".to_string(),
            ));
        }

        if self.market.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if self.market.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        // Signal
        if !self.signal.threshold.is_finite() || self.signal.threshold <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "threshold must be > 0, got {}",
                self.signal.threshold
            )));
        }

        if self.signal.frame_secs == 0 || 86_400 % self.signal.frame_secs != 0 {
            return Err(ConfigError::ValidationError(format!(
                "frame_secs must be > 0 and divide a day evenly, got {}",
                self.signal.frame_secs
            )));
        }

        // Polling
        if self.polling.base_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "base_interval_secs must be > 0".to_string(),
            ));
        }

        if self.polling.max_backoff_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "max_backoff_secs must be <= {}, got {}",
                MAX_INTERVAL_SECS, self.polling.max_backoff_secs
            )));
        }

        if self.polling.max_backoff_secs < self.polling.base_interval_secs {
            return Err(ConfigError::ValidationError(format!(
                "max_backoff_secs ({}) must be >= base_interval_secs ({})",
                self.polling.max_backoff_secs, self.polling.base_interval_secs
            )));
        }

        // Logging
        if self.logging.log_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "log_file cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply `FRAME_WATCH_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.is_empty() {
                self.market.api_url = url;
            }
        }
        if let Ok(symbol) = std::env::var(ENV_SYMBOL) {
            if !symbol.is_empty() {
                self.market.symbol = symbol;
            }
        }
    }

    /// Threshold as an exact decimal
    pub fn threshold(&self) -> Result<Decimal, ConfigError> {
        Decimal::try_from(self.signal.threshold)
            .map(|d| d.normalize())
            .map_err(|e| ConfigError::ValidationError(format!(
                "threshold {} is not representable: {}",
                self.signal.threshold, e
            )))
    }

    /// Frame tracker settings
    pub fn tracker_config(&self) -> Result<TrackerConfig, ConfigError> {
        Ok(TrackerConfig {
            threshold: self.threshold()?,
            frame_length: Duration::from_secs(self.signal.frame_secs),
        })
    }
}

impl From<&Config> for BinanceConfig {
    fn from(config: &Config) -> Self {
        BinanceConfig {
            api_base_url: config.market.api_url.clone(),
            timeout: Duration::from_secs(config.market.request_timeout_secs),
        }
    }
}

impl From<&Config> for FetcherConfig {
    fn from(config: &Config) -> Self {
        FetcherConfig {
            base_interval: Duration::from_secs(config.polling.base_interval_secs),
            max_interval: Duration::from_secs(config.polling.max_backoff_secs),
        }
    }
}

impl From<&Config> for LoopDelays {
    fn from(config: &Config) -> Self {
        LoopDelays {
            after_tick: Duration::from_secs(config.polling.tick_delay_secs),
            no_data: Duration::from_secs(config.polling.no_data_delay_secs),
            after_error: Duration::from_secs(config.polling.error_delay_secs),
        }
    }
}
