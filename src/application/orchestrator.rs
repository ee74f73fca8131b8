//! Frame Watch Orchestrator
//!
//! Drives the polling loop: fetch a sample, run it through the frame tracker,
//! log the result and fire the alert port on a signal. One tick at a time,
//! with a stop flag checked between ticks.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use tokio::sync::watch;

use super::price_fetcher::{FetchOutcome, PriceFetcher};
use crate::domain::{
    format_signed_usd, format_usd, FrameError, FrameEvent, FrameTracker, PriceSample,
};
use crate::ports::alert::{AlertError, AlertPort};
use crate::ports::market_data::PriceSource;

#[derive(Debug, Error)]
pub enum TickError {
    #[error("Frame tracker rejected sample: {0}")]
    Frame(#[from] FrameError),
    #[error("Alert failed: {0}")]
    Alert(#[from] AlertError),
}

/// What a successful tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Processed(FrameEvent),
    NoData,
}

/// Named pauses between ticks
#[derive(Debug, Clone, PartialEq)]
pub struct LoopDelays {
    /// After a tick that produced a sample (cached, stale or fresh)
    pub after_tick: Duration,
    /// After a tick where no sample was available at all
    pub no_data: Duration,
    /// After a tick error
    pub after_error: Duration,
}

impl Default for LoopDelays {
    fn default() -> Self {
        Self {
            after_tick: Duration::from_secs(1),
            no_data: Duration::from_secs(5),
            after_error: Duration::from_secs(5),
        }
    }
}

/// Requests a stop of a running orchestrator from another task
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
        tracing::debug!("Stop signal sent to orchestrator");
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Main loop tying the fetcher, the tracker and the alert port together
pub struct FrameWatchOrchestrator<S: PriceSource, A: AlertPort> {
    fetcher: PriceFetcher<S>,
    tracker: FrameTracker,
    alert: A,
    delays: LoopDelays,
    stop_tx: std::sync::Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl<S: PriceSource, A: AlertPort> FrameWatchOrchestrator<S, A> {
    pub fn new(fetcher: PriceFetcher<S>, tracker: FrameTracker, alert: A) -> Self {
        let (tx, stop_rx) = watch::channel(false);
        Self {
            fetcher,
            tracker,
            alert,
            delays: LoopDelays::default(),
            stop_tx: std::sync::Arc::new(tx),
            stop_rx,
        }
    }

    /// Set custom loop delays
    pub fn with_delays(mut self, delays: LoopDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn delays(&self) -> &LoopDelays {
        &self.delays
    }

    pub fn tracker(&self) -> &FrameTracker {
        &self.tracker
    }

    pub fn fetcher(&self) -> &PriceFetcher<S> {
        &self.fetcher
    }

    /// Handle that can stop `run` from another task
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: std::sync::Arc::clone(&self.stop_tx),
        }
    }

    fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Log the startup banner
    pub fn announce(&self) {
        tracing::info!(
            "Starting {} {} frame tracking...",
            frame_label(self.tracker.config().frame_length),
            self.fetcher.symbol()
        );
        tracing::info!(
            "Signal threshold: ±{} price change per frame",
            format_usd(self.tracker.threshold())
        );
        tracing::info!("{}", "-".repeat(80));
    }

    /// Run ticks until stopped
    pub async fn run(&mut self) {
        while !self.is_stopped() {
            let pause = match self.tick(Utc::now()).await {
                Ok(TickOutcome::Processed(_)) => self.delays.after_tick,
                Ok(TickOutcome::NoData) => self.delays.no_data,
                Err(TickError::Frame(e @ FrameError::OutOfOrder { .. })) => {
                    tracing::warn!("Skipping sample: {}", e);
                    self.delays.after_tick
                }
                Err(e) => {
                    tracing::error!("Unexpected error: {}", e);
                    self.delays.after_error
                }
            };
            self.pause(pause).await;
        }

        tracing::info!("Stopping...");
    }

    /// Sleep, waking early on stop
    async fn pause(&mut self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.stop_rx.changed() => {}
        }
    }

    /// Execute one cycle at `now`
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, TickError> {
        let outcome = self.fetcher.fetch(now).await;
        if let FetchOutcome::Stale(sample) = &outcome {
            tracing::debug!("Using stale {} price from {}", sample.symbol, sample.timestamp);
        }

        let Some(sample) = outcome.into_sample() else {
            return Ok(TickOutcome::NoData);
        };

        let event = self.tracker.update(&sample)?;
        report(&event, &sample, now);

        if let FrameEvent::SignalFired(alert) = &event {
            self.alert.trigger(alert)?;
        }

        Ok(TickOutcome::Processed(event))
    }
}

/// "5-minute" for whole minutes, "30-second" otherwise
fn frame_label(length: Duration) -> String {
    let secs = length.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}-minute", secs / 60)
    } else {
        format!("{}-second", secs)
    }
}

fn clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Write the operator-facing line(s) for an event
fn report(event: &FrameEvent, sample: &PriceSample, now: DateTime<Utc>) {
    match event {
        FrameEvent::FrameStarted { frame_start, open_price } => {
            tracing::info!(
                "[NEW FRAME] Now: {} | Frame: {} | Frame Start Price: {} | 24h: {}%",
                clock(now),
                clock(*frame_start),
                format_usd(*open_price),
                sample.change_24h.round_dp(2)
            );
            tracing::info!("Scanning for signals...");
        }
        FrameEvent::SignalFired(alert) => {
            tracing::info!(
                "[SIGNAL] {} {} SIGNAL @ {} | Frame: {} | {}: {} | Change: {} from {}",
                alert.direction.marker(),
                alert.direction,
                clock(alert.timestamp),
                clock(alert.frame_start),
                alert.symbol,
                format_usd(alert.price),
                format_signed_usd(alert.delta),
                format_usd(alert.open_price)
            );
        }
        FrameEvent::Update { frame_start, delta, post_signal: true, .. } => {
            tracing::info!(
                "[{}] Frame: {} | {}: {} | Change: {} (Signal triggered)",
                clock(sample.timestamp),
                clock(*frame_start),
                sample.symbol,
                format_usd(sample.price),
                format_signed_usd(*delta)
            );
        }
        FrameEvent::Update { frame_start, delta, post_signal: false, .. } => {
            tracing::debug!(
                "[{}] Frame: {} | {}: {} | Change: {}",
                clock(sample.timestamp),
                clock(*frame_start),
                sample.symbol,
                format_usd(sample.price),
                format_signed_usd(*delta)
            );
        }
    }
}
