//! Frame Watch Integration Tests
//!
//! Drives the orchestrator end to end with scripted price responses:
//! 1. PriceFetcher cache/backoff -> FrameTracker frame transitions
//! 2. FrameTracker signals -> AlertPort
//!
//! All tests are deterministic (no real network calls) and use mock data.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use frame_watch::application::{
    FetcherConfig, FrameWatchOrchestrator, PriceFetcher, TickOutcome,
};
use frame_watch::domain::{Direction, FrameEvent, FrameTracker, TrackerConfig};
use frame_watch::ports::mocks::{RecordingAlert, ScriptedPriceSource};
use frame_watch::ports::MarketDataError;

// ============================================================================
// Test Fixtures
// ============================================================================

/// 2024-01-01T00:00:00Z plus `secs`
fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap()
}

fn build(
    source: ScriptedPriceSource,
    alert: RecordingAlert,
    threshold: Decimal,
) -> FrameWatchOrchestrator<ScriptedPriceSource, RecordingAlert> {
    let fetcher = PriceFetcher::new(source, "BTCUSDT", FetcherConfig::default());
    let tracker = FrameTracker::new(TrackerConfig {
        threshold,
        ..Default::default()
    })
    .unwrap();
    FrameWatchOrchestrator::new(fetcher, tracker, alert)
}

fn event(outcome: TickOutcome) -> FrameEvent {
    match outcome {
        TickOutcome::Processed(event) => event,
        TickOutcome::NoData => panic!("expected a processed tick"),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_increase_signal_across_one_frame() {
    let source = ScriptedPriceSource::new()
        .with_sample(dec!(50000), dec!(1.2))
        .with_sample(dec!(50100), dec!(1.3))
        .with_sample(dec!(50200), dec!(1.4))
        .with_sample(dec!(50250), dec!(1.5));
    let alert = RecordingAlert::new();
    let mut orchestrator = build(source, alert.clone(), dec!(180));

    assert!(matches!(
        event(orchestrator.tick(at(0)).await.unwrap()),
        FrameEvent::FrameStarted { open_price, .. } if open_price == dec!(50000)
    ));
    assert!(matches!(
        event(orchestrator.tick(at(30)).await.unwrap()),
        FrameEvent::Update { post_signal: false, delta, .. } if delta == dec!(100)
    ));
    assert!(matches!(
        event(orchestrator.tick(at(60)).await.unwrap()),
        FrameEvent::SignalFired(_)
    ));
    assert!(matches!(
        event(orchestrator.tick(at(90)).await.unwrap()),
        FrameEvent::Update { post_signal: true, .. }
    ));

    let alerts = alert.get_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, Direction::Increase);
    assert_eq!(alerts[0].delta, dec!(200));
    assert_eq!(alerts[0].open_price, dec!(50000));
    assert_eq!(alerts[0].timestamp, at(60));
}

#[tokio::test]
async fn test_one_signal_per_frame_and_reset_on_new_frame() {
    let source = ScriptedPriceSource::new()
        .with_sample(dec!(50000), dec!(0))
        .with_sample(dec!(49800), dec!(0)) // decrease in frame 1
        .with_sample(dec!(49500), dec!(0)) // no second alert
        .with_sample(dec!(49500), dec!(0)) // frame 2 opens here
        .with_sample(dec!(49700), dec!(0)); // increase in frame 2
    let alert = RecordingAlert::new();
    let mut orchestrator = build(source, alert.clone(), dec!(180));

    for secs in [0, 60, 120, 300, 360] {
        orchestrator.tick(at(secs)).await.unwrap();
    }

    let alerts = alert.get_alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].direction, Direction::Decrease);
    assert_eq!(alerts[0].delta, dec!(-200));
    assert_eq!(alerts[0].frame_start, at(0));
    assert_eq!(alerts[1].direction, Direction::Increase);
    assert_eq!(alerts[1].open_price, dec!(49500));
    assert_eq!(alerts[1].frame_start, at(300));
}

#[tokio::test]
async fn test_stale_price_keeps_loop_alive_during_rate_limit() {
    let source = ScriptedPriceSource::new()
        .with_sample(dec!(50000), dec!(0))
        .with_price(Err(MarketDataError::RateLimited))
        .with_sample(dec!(50300), dec!(0));
    let alert = RecordingAlert::new();
    let mut orchestrator = build(source.clone(), alert.clone(), dec!(180));

    orchestrator.tick(at(0)).await.unwrap();

    // 429: last sample is reused, no frame change, no alert
    let stale = event(orchestrator.tick(at(10)).await.unwrap());
    assert!(matches!(stale, FrameEvent::Update { delta, .. } if delta.is_zero()));
    assert_eq!(orchestrator.fetcher().cache().interval().as_secs(), 2);

    // Inside the backoff window: no request at all
    orchestrator.tick(at(11)).await.unwrap();
    assert_eq!(source.price_calls(), 2);

    // Backoff over: fresh price fires the signal and resets the interval
    let fired = event(orchestrator.tick(at(12)).await.unwrap());
    assert!(matches!(fired, FrameEvent::SignalFired(_)));
    assert_eq!(orchestrator.fetcher().cache().interval().as_secs(), 1);
    assert_eq!(alert.get_alerts().len(), 1);
}

#[tokio::test]
async fn test_no_data_until_first_success() {
    let source = ScriptedPriceSource::new()
        .with_price(Err(MarketDataError::HttpStatus { status: 503, message: "down".into() }))
        .with_price(Ok(dec!(50000)))
        .with_change(Err(MarketDataError::ParseError("bad".into())));
    let alert = RecordingAlert::new();
    let mut orchestrator = build(source, alert, dec!(180));

    assert_eq!(orchestrator.tick(at(0)).await.unwrap(), TickOutcome::NoData);

    let started = event(orchestrator.tick(at(5)).await.unwrap());
    assert!(matches!(started, FrameEvent::FrameStarted { .. }));
    assert_eq!(
        orchestrator.fetcher().cache().last_sample().unwrap().change_24h,
        Decimal::ZERO
    );
}
