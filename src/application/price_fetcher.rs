//! Price Fetcher
//!
//! Wraps a `PriceSource` with a time-based cache and exponential backoff on
//! rate limiting. The loop may call `fetch` every second; real requests only
//! go out once the current interval has elapsed, and the last good sample is
//! served while the source is throttled or failing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::PriceSample;
use crate::ports::market_data::{MarketDataError, PriceSource};

/// Fetcher cadence settings
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Interval after a successful fetch
    pub base_interval: Duration,
    /// Backoff cap
    pub max_interval: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
        }
    }
}

/// Result of one `fetch` call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// New sample from the network
    Fresh(PriceSample),
    /// Cached sample, interval not yet elapsed
    Cached(PriceSample),
    /// Last good sample, served because the fetch failed or is backing off
    Stale(PriceSample),
    /// Nothing fetched yet and the fetch failed
    Unavailable,
}

impl FetchOutcome {
    pub fn sample(&self) -> Option<&PriceSample> {
        match self {
            FetchOutcome::Fresh(s) | FetchOutcome::Cached(s) | FetchOutcome::Stale(s) => Some(s),
            FetchOutcome::Unavailable => None,
        }
    }

    pub fn into_sample(self) -> Option<PriceSample> {
        match self {
            FetchOutcome::Fresh(s) | FetchOutcome::Cached(s) | FetchOutcome::Stale(s) => Some(s),
            FetchOutcome::Unavailable => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, FetchOutcome::Fresh(_))
    }
}

/// Cache and backoff state, owned by the fetcher
#[derive(Debug, Clone)]
pub struct FetchCache {
    last_sample: Option<PriceSample>,
    /// Time of the last successful fetch
    last_fetch: Option<DateTime<Utc>>,
    interval: Duration,
    /// No primary request before this instant (set on HTTP 429)
    backoff_until: Option<DateTime<Utc>>,
}

impl FetchCache {
    fn new(interval: Duration) -> Self {
        Self {
            last_sample: None,
            last_fetch: None,
            interval,
            backoff_until: None,
        }
    }

    pub fn last_sample(&self) -> Option<&PriceSample> {
        self.last_sample.as_ref()
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.last_sample, self.last_fetch) {
            (Some(_), Some(last)) => elapsed(last, now) < self.interval,
            _ => false,
        }
    }

    fn in_backoff(&self, now: DateTime<Utc>) -> bool {
        self.backoff_until.is_some_and(|until| now < until)
    }

    /// Last sample as `Stale`, or `Unavailable`
    fn fallback(&self) -> FetchOutcome {
        match &self.last_sample {
            Some(sample) => FetchOutcome::Stale(sample.clone()),
            None => FetchOutcome::Unavailable,
        }
    }
}

fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

/// Double `current`, capped at `max` (also on overflow)
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.checked_mul(2).unwrap_or(max).min(max)
}

/// Cached, rate-limit aware price fetcher for one symbol
#[derive(Debug)]
pub struct PriceFetcher<S: PriceSource> {
    source: S,
    symbol: String,
    config: FetcherConfig,
    cache: FetchCache,
}

impl<S: PriceSource> PriceFetcher<S> {
    pub fn new(source: S, symbol: impl Into<String>, config: FetcherConfig) -> Self {
        let cache = FetchCache::new(config.base_interval);
        Self {
            source,
            symbol: symbol.into(),
            config,
            cache,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Return a price sample for `now`, hitting the network only when the
    /// cache is older than the current interval.
    pub async fn fetch(&mut self, now: DateTime<Utc>) -> FetchOutcome {
        if self.cache.is_fresh(now) {
            if let Some(sample) = &self.cache.last_sample {
                return FetchOutcome::Cached(sample.clone());
            }
        }

        if self.cache.in_backoff(now) {
            tracing::debug!(
                "Backing off, next request in {:?}",
                self.cache.backoff_until.map(|until| elapsed(now, until))
            );
            return self.cache.fallback();
        }

        let price = match self.source.ticker_price(&self.symbol).await {
            Ok(price) => price,
            Err(MarketDataError::RateLimited) => {
                let previous = self.cache.interval;
                self.cache.interval = next_backoff(previous, self.config.max_interval);
                self.cache.backoff_until = Some(
                    chrono::Duration::from_std(self.cache.interval)
                        .ok()
                        .and_then(|interval| now.checked_add_signed(interval))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                );
                tracing::warn!(
                    "Rate limited by price API, backing off... (fetch interval: {}s -> {}s)",
                    previous.as_secs(),
                    self.cache.interval.as_secs()
                );
                return self.cache.fallback();
            }
            Err(e) => {
                tracing::warn!("Error fetching {} price: {}", self.symbol, e);
                return self.cache.fallback();
            }
        };

        let change_24h = match self.source.change_24h_pct(&self.symbol).await {
            Ok(change) => change,
            Err(e) => {
                tracing::debug!("24h change unavailable for {}: {}", self.symbol, e);
                Decimal::ZERO
            }
        };

        let sample = PriceSample::new(self.symbol.clone(), price, change_24h, now);

        self.cache.last_sample = Some(sample.clone());
        self.cache.last_fetch = Some(now);
        self.cache.interval = self.config.base_interval;
        self.cache.backoff_until = None;

        FetchOutcome::Fresh(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::ScriptedPriceSource;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap()
    }

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_704_067_200_000 + millis).unwrap()
    }

    fn fetcher(source: ScriptedPriceSource) -> PriceFetcher<ScriptedPriceSource> {
        PriceFetcher::new(source, "BTCUSDT", FetcherConfig::default())
    }

    fn http_500() -> MarketDataError {
        MarketDataError::HttpStatus { status: 500, message: "Internal".into() }
    }

    #[tokio::test]
    async fn test_fresh_fetch_populates_cache() {
        let source = ScriptedPriceSource::new().with_sample(dec!(50000), dec!(2.5));
        let mut fetcher = fetcher(source);

        let outcome = fetcher.fetch(at(0)).await;
        let sample = outcome.sample().unwrap();
        assert!(outcome.is_fresh());
        assert_eq!(sample.price, dec!(50000));
        assert_eq!(sample.change_24h, dec!(2.5));
        assert_eq!(sample.timestamp, at(0));
        assert_eq!(sample.symbol, "BTCUSDT");

        assert_eq!(fetcher.cache().last_fetch(), Some(at(0)));
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let source = ScriptedPriceSource::new().with_sample(dec!(50000), dec!(0));
        let mut fetcher = fetcher(source.clone());

        let first = fetcher.fetch(at_millis(0)).await.into_sample().unwrap();
        let second = fetcher.fetch(at_millis(500)).await;

        assert_eq!(second, FetchOutcome::Cached(first));
        assert_eq!(source.price_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_after_interval_hits_network() {
        let source = ScriptedPriceSource::new()
            .with_sample(dec!(50000), dec!(0))
            .with_sample(dec!(50010), dec!(0));
        let mut fetcher = fetcher(source.clone());

        fetcher.fetch(at(0)).await;
        let outcome = fetcher.fetch(at(1)).await;

        assert!(outcome.is_fresh());
        assert_eq!(outcome.sample().unwrap().price, dec!(50010));
        assert_eq!(source.price_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_unavailable() {
        let source = ScriptedPriceSource::new().with_price(Err(http_500()));
        let mut fetcher = fetcher(source);

        assert_eq!(fetcher.fetch(at(0)).await, FetchOutcome::Unavailable);
        assert!(fetcher.cache().last_sample().is_none());
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_failure_serves_stale_sample() {
        let source = ScriptedPriceSource::new()
            .with_sample(dec!(50000), dec!(1))
            .with_price(Err(MarketDataError::ParseError("bad body".into())));
        let mut fetcher = fetcher(source);

        let first = fetcher.fetch(at(0)).await.into_sample().unwrap();
        let outcome = fetcher.fetch(at(5)).await;

        assert_eq!(outcome, FetchOutcome::Stale(first));
        // Non-429 failures do not touch the interval
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(1));
        assert_eq!(fetcher.cache().last_fetch(), Some(at(0)));
    }

    #[tokio::test]
    async fn test_rate_limit_doubles_interval_then_success_resets() {
        let source = ScriptedPriceSource::new()
            .with_sample(dec!(50000), dec!(0))
            .with_price(Err(MarketDataError::RateLimited))
            .with_price(Err(MarketDataError::RateLimited))
            .with_price(Err(MarketDataError::RateLimited))
            .with_sample(dec!(50100), dec!(0));
        let mut fetcher = fetcher(source.clone());

        fetcher.fetch(at(0)).await;

        let outcome = fetcher.fetch(at(10)).await;
        assert!(matches!(outcome, FetchOutcome::Stale(_)));
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(2));

        fetcher.fetch(at(20)).await;
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(4));

        fetcher.fetch(at(30)).await;
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(8));

        let outcome = fetcher.fetch(at(40)).await;
        assert!(outcome.is_fresh());
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(1));
        assert_eq!(source.price_calls(), 5);
    }

    #[tokio::test]
    async fn test_backoff_suppresses_requests() {
        let source = ScriptedPriceSource::new()
            .with_price(Err(MarketDataError::RateLimited))
            .with_sample(dec!(50000), dec!(0));
        let mut fetcher = fetcher(source.clone());

        assert_eq!(fetcher.fetch(at(0)).await, FetchOutcome::Unavailable);
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(2));

        // Still inside the 2s backoff window
        assert_eq!(fetcher.fetch(at(1)).await, FetchOutcome::Unavailable);
        assert_eq!(source.price_calls(), 1);

        assert!(fetcher.fetch(at(2)).await.is_fresh());
        assert_eq!(source.price_calls(), 2);
    }

    #[tokio::test]
    async fn test_backoff_caps_at_max_interval() {
        let mut source = ScriptedPriceSource::new();
        for _ in 0..10 {
            source = source.with_price(Err(MarketDataError::RateLimited));
        }
        let mut fetcher = fetcher(source);

        let mut previous = fetcher.cache().interval();
        for i in 0..10 {
            fetcher.fetch(at(i * 100)).await;
            let interval = fetcher.cache().interval();
            assert!(interval >= previous);
            assert!(interval <= Duration::from_secs(60));
            previous = interval;
        }
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_secondary_failure_substitutes_zero() {
        let source = ScriptedPriceSource::new()
            .with_price(Err(MarketDataError::RateLimited))
            .with_price(Ok(dec!(50000)))
            .with_change(Err(http_500()));
        let mut fetcher = fetcher(source);

        fetcher.fetch(at(0)).await;
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(2));

        let outcome = fetcher.fetch(at(5)).await;
        assert!(outcome.is_fresh());
        let sample = outcome.sample().unwrap();
        assert_eq!(sample.price, dec!(50000));
        assert_eq!(sample.change_24h, Decimal::ZERO);

        assert_eq!(fetcher.cache().last_fetch(), Some(at(5)));
        assert_eq!(fetcher.cache().interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_next_backoff_doubles_and_caps() {
        let max = Duration::from_secs(60);
        assert_eq!(next_backoff(Duration::from_secs(1), max), Duration::from_secs(2));
        assert_eq!(next_backoff(Duration::from_secs(32), max), max);
        assert_eq!(next_backoff(Duration::MAX, Duration::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn test_huge_intervals_do_not_overflow() {
        let source = ScriptedPriceSource::new()
            .with_price(Err(MarketDataError::RateLimited))
            .with_sample(dec!(50000), dec!(0));
        let config = FetcherConfig {
            base_interval: Duration::MAX,
            max_interval: Duration::MAX,
        };
        let mut fetcher = PriceFetcher::new(source.clone(), "BTCUSDT", config);

        assert_eq!(fetcher.fetch(at(0)).await, FetchOutcome::Unavailable);
        assert_eq!(fetcher.cache().interval(), Duration::MAX);

        // Backoff window saturates instead of wrapping
        assert_eq!(fetcher.fetch(at(86_400)).await, FetchOutcome::Unavailable);
        assert_eq!(source.price_calls(), 1);
    }
}
