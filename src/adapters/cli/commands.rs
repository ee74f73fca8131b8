//! CLI Command Handlers
//!
//! Implementation of all CLI commands for frame-watch.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::alert::{build_alert, AlertMode};
use crate::adapters::binance::{BinanceClient, BinanceConfig};
use crate::application::{FetchOutcome, FetcherConfig, FrameWatchOrchestrator, LoopDelays, PriceFetcher};
use crate::config::{load_config, Config};
use crate::domain::{format_usd, FrameTracker};

/// frame-watch - 5-minute frame price alerts for Binance perpetuals
#[derive(Parser, Debug)]
#[command(
    name = "frame-watch",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "5-minute frame price alerts for Binance perpetuals",
    long_about = "frame-watch polls the Binance futures ticker, splits time into clock-aligned \
                  5-minute frames and raises an alert the first time price moves past the \
                  threshold from the frame's opening price."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Log every scan update, not only frame starts and signals
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging (includes HTTP client internals)
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the frame tracking loop
    Run(RunCmd),

    /// Fetch and print the current price once
    Price(PriceCmd),

    /// Validate a config file and print the effective settings
    CheckConfig(CheckConfigCmd),
}

/// Start the frame tracking loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override trading symbol
    #[arg(short, long, value_name = "SYMBOL")]
    pub symbol: Option<String>,

    /// Override signal threshold (quote currency units)
    #[arg(short, long, value_name = "AMOUNT")]
    pub threshold: Option<f64>,

    /// Override log file path
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<String>,

    /// Log signals without sound
    #[arg(long)]
    pub silent: bool,
}

/// Fetch the current price once
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override trading symbol
    #[arg(short, long, value_name = "SYMBOL")]
    pub symbol: Option<String>,
}

/// Validate a config file
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Price(cmd) => price_command(cmd, app.verbose, app.debug).await,
        Command::CheckConfig(cmd) => check_config_command(cmd),
    }
}

/// Load the config file if given, apply env then CLI overrides, validate
fn resolve_config(path: Option<&Path>, symbol: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    config.apply_env_overrides();
    if let Some(symbol) = symbol {
        config.market.symbol = symbol.to_uppercase();
    }

    Ok(config)
}

/// Pick the log filter: RUST_LOG wins, then flags, then the configured level
fn log_filter(config: &Config, verbose: bool, debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else if verbose {
            EnvFilter::new(format!("{},frame_watch=debug", config.logging.level))
        } else {
            EnvFilter::new(&config.logging.level)
        }
    })
}

/// Initialize logging to the console and, when given, a log file
fn init_logging(filter: EnvFilter, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Handle run command
async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let mut config = resolve_config(cmd.config.as_deref(), cmd.symbol.as_deref())?;
    if let Some(threshold) = cmd.threshold {
        config.signal.threshold = threshold;
    }
    if let Some(log_file) = cmd.log_file {
        config.logging.log_file = log_file;
    }
    if cmd.silent {
        config.alert.mode = AlertMode::Off;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(
        log_filter(&config, verbose, debug),
        Some(&config.logging.log_path()),
    )?;

    let client = BinanceClient::with_config(BinanceConfig::from(&config))
        .context("Failed to create Binance client")?;
    let fetcher = PriceFetcher::new(client, config.market.symbol.clone(), FetcherConfig::from(&config));
    let tracker = FrameTracker::new(config.tracker_config()?)
        .context("Failed to create frame tracker")?;
    let alert = build_alert(config.alert.mode, &config.alert.sound_path(), &config.alert.player);

    let mut orchestrator = FrameWatchOrchestrator::new(fetcher, tracker, alert)
        .with_delays(LoopDelays::from(&config));

    // Setup Ctrl+C handler
    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Shutdown signal received");
            stop.stop();
        }
    });

    orchestrator.announce();
    orchestrator.run().await;

    Ok(())
}

/// Handle price command
async fn price_command(cmd: PriceCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = resolve_config(cmd.config.as_deref(), cmd.symbol.as_deref())?;
    config.validate().context("Invalid configuration")?;
    init_logging(log_filter(&config, verbose, debug), None)?;

    let client = BinanceClient::with_config(BinanceConfig::from(&config))
        .context("Failed to create Binance client")?;
    let mut fetcher = PriceFetcher::new(client, config.market.symbol.clone(), FetcherConfig::from(&config));

    match fetcher.fetch(Utc::now()).await {
        FetchOutcome::Fresh(sample) => {
            println!("{}: {}", sample.symbol, format_usd(sample.price));
            println!("24h change: {}%", sample.change_24h.round_dp(2));
            Ok(())
        }
        _ => bail!("Price unavailable for {}", config.market.symbol),
    }
}

/// Handle check-config command
fn check_config_command(cmd: CheckConfigCmd) -> Result<()> {
    let mut config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;

    println!("Configuration OK: {}", cmd.config.display());
    println!("{}", toml::to_string_pretty(&config).context("Failed to render configuration")?);
    Ok(())
}
