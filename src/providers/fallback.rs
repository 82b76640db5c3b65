//! Rate provider that tries several sources in order and never fails.
//!
//! Lookup order: fresh cache entry, each configured source (bounded by a
//! timeout and optionally retried), the stale cache entry, and finally a
//! built-in default table.
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::exchange_rate_api::ExchangeRateApiProvider;
use super::frankfurter::FrankfurterProvider;
use super::util::with_retry;
use crate::core::cache::{Cache, Clock, Lookup, SystemClock};
use crate::core::config::{RateSourceKind, RatesConfig};
use crate::core::currency::{ExchangeRateProvider, ExchangeRates, RateOrigin};

/// Units of each currency per 1 USD, served when nothing else is available.
const DEFAULT_USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("RUB", 92.5),
    ("GBP", 0.79),
    ("JPY", 150.0),
    ("CNY", 7.2),
];

/// The fallback table for `base`. Known bases are cross-computed through USD;
/// an unknown base gets a rate of 1 for every code.
pub fn default_rates(base: &str) -> ExchangeRates {
    let base = base.to_uppercase();
    let usd: BTreeMap<String, f64> = DEFAULT_USD_RATES
        .iter()
        .map(|(code, rate)| (code.to_string(), *rate))
        .collect();
    let rates = match usd.get(&base).copied() {
        Some(base_per_usd) => usd
            .iter()
            .map(|(code, rate)| (code.clone(), rate / base_per_usd))
            .collect(),
        None => usd.keys().map(|code| (code.clone(), 1.0)).collect(),
    };
    ExchangeRates::new(&base, rates, RateOrigin::Default)
}

pub struct FallbackRateProvider {
    sources: Vec<Box<dyn ExchangeRateProvider>>,
    cache: Cache<String, ExchangeRates>,
    timeout: Duration,
    retries: usize,
    retry_delay_ms: u64,
}

impl FallbackRateProvider {
    pub fn new(
        sources: Vec<Box<dyn ExchangeRateProvider>>,
        cache_ttl: TimeDelta,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        FallbackRateProvider {
            sources,
            cache: Cache::new(cache_ttl, clock),
            timeout,
            retries: 0,
            retry_delay_ms: 0,
        }
    }

    pub fn with_retries(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn from_config(config: &RatesConfig) -> Self {
        let sources = config
            .sources
            .iter()
            .map(|source| -> Box<dyn ExchangeRateProvider> {
                match source.kind {
                    RateSourceKind::ExchangeRateApi => {
                        Box::new(ExchangeRateApiProvider::new(&source.base_url))
                    }
                    RateSourceKind::Frankfurter => {
                        Box::new(FrankfurterProvider::new(&source.base_url))
                    }
                }
            })
            .collect();
        let ttl = i64::try_from(config.cache_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        FallbackRateProvider::new(
            sources,
            ttl,
            Duration::from_secs(config.timeout_secs),
            Arc::new(SystemClock),
        )
        .with_retries(config.retries, config.retry_delay_ms)
    }

    async fn fetch_from(
        &self,
        source: &dyn ExchangeRateProvider,
        base: &str,
    ) -> Result<ExchangeRates> {
        with_retry(
            || async {
                let rates = tokio::time::timeout(self.timeout, source.get_exchange_rates(base))
                    .await
                    .map_err(|_| anyhow!("Timed out after {:?}", self.timeout))??;
                if rates.rates.is_empty() {
                    return Err(anyhow!("Empty rate table"));
                }
                Ok(rates)
            },
            self.retries,
            self.retry_delay_ms,
        )
        .await
    }
}

#[async_trait]
impl ExchangeRateProvider for FallbackRateProvider {
    #[instrument(name = "RatesFetch", skip(self), fields(base = %base))]
    async fn get_exchange_rates(&self, base: &str) -> Result<ExchangeRates> {
        let key = base.to_uppercase();
        let stale = match self.cache.get(&key).await {
            Lookup::Fresh(rates) => return Ok(rates.with_origin(RateOrigin::Cached)),
            Lookup::Stale(rates) => Some(rates),
            Lookup::Miss => None,
        };

        for (i, source) in self.sources.iter().enumerate() {
            match self.fetch_from(source.as_ref(), &key).await {
                Ok(rates) => {
                    info!("Exchange rates loaded from source {}", i + 1);
                    let rates = rates.with_origin(RateOrigin::Live);
                    self.cache.put(key, rates.clone()).await;
                    return Ok(rates);
                }
                Err(e) => {
                    warn!("Rate source {} failed: {}", i + 1, e);
                }
            }
        }

        if let Some(rates) = stale {
            warn!("Using cached exchange rates for {}", key);
            return Ok(rates.with_origin(RateOrigin::Stale));
        }

        warn!("Using default exchange rates for {} (all sources unavailable)", key);
        debug!(sources = self.sources.len(), "No source answered");
        Ok(default_rates(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ManualClock;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: answers with `rates` while `up` is set, counting calls.
    struct MockSource {
        calls: Arc<AtomicUsize>,
        up: Arc<Mutex<bool>>,
        rates: BTreeMap<String, f64>,
        delay: Option<Duration>,
    }

    impl MockSource {
        fn new(eur: f64) -> Self {
            MockSource {
                calls: Arc::new(AtomicUsize::new(0)),
                up: Arc::new(Mutex::new(true)),
                rates: BTreeMap::from([("EUR".to_string(), eur)]),
                delay: None,
            }
        }

        fn down(self) -> Self {
            *self.up.lock().unwrap() = false;
            self
        }
    }

    #[async_trait]
    impl ExchangeRateProvider for MockSource {
        async fn get_exchange_rates(&self, base: &str) -> Result<ExchangeRates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if *self.up.lock().unwrap() {
                Ok(ExchangeRates::new(base, self.rates.clone(), RateOrigin::Live))
            } else {
                Err(anyhow!("source down"))
            }
        }
    }

    fn provider(
        sources: Vec<Box<dyn ExchangeRateProvider>>,
    ) -> (Arc<ManualClock>, FallbackRateProvider) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let provider = FallbackRateProvider::new(
            sources,
            TimeDelta::seconds(30),
            Duration::from_millis(50),
            clock.clone(),
        );
        (clock, provider)
    }

    #[tokio::test]
    async fn test_serves_cache_within_ttl() {
        let source = MockSource::new(0.9);
        let calls = source.calls.clone();
        let (clock, provider) = provider(vec![Box::new(source)]);

        let first = provider.get_exchange_rates("usd").await.unwrap();
        assert_eq!(first.origin, RateOrigin::Live);
        assert_eq!(first.rate("EUR"), Some(0.9));

        clock.advance(TimeDelta::seconds(10));
        let second = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(second.origin, RateOrigin::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(TimeDelta::seconds(30));
        let third = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(third.origin, RateOrigin::Live);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_falls_through_to_second_source() {
        let first = MockSource::new(0.1).down();
        let first_calls = first.calls.clone();
        let second = MockSource::new(0.2);
        let (_, provider) = provider(vec![Box::new(first), Box::new(second)]);

        let rates = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(rates.rate("EUR"), Some(0.2));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let mut slow = MockSource::new(0.1);
        slow.delay = Some(Duration::from_secs(5));
        let fast = MockSource::new(0.3);
        let (_, provider) = provider(vec![Box::new(slow), Box::new(fast)]);

        let rates = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(rates.rate("EUR"), Some(0.3));
    }

    #[tokio::test]
    async fn test_serves_stale_cache_when_all_sources_fail() {
        let source = MockSource::new(0.95);
        let up = source.up.clone();
        let (clock, provider) = provider(vec![Box::new(source)]);

        provider.get_exchange_rates("USD").await.unwrap();
        *up.lock().unwrap() = false;
        clock.advance(TimeDelta::minutes(5));

        let rates = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(rates.origin, RateOrigin::Stale);
        assert_eq!(rates.rate("EUR"), Some(0.95));
    }

    #[tokio::test]
    async fn test_serves_defaults_without_cache() {
        let (_, provider) = provider(vec![Box::new(MockSource::new(0.1).down())]);

        let rates = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(rates.origin, RateOrigin::Default);
        assert_eq!(rates.rate("RUB"), Some(92.5));
        assert_eq!(rates.rate("EUR"), Some(0.92));
    }

    #[tokio::test]
    async fn test_retries_before_moving_on() {
        let source = MockSource::new(0.1).down();
        let calls = source.calls.clone();
        let (_, provider) = provider(vec![Box::new(source)]);
        let provider = provider.with_retries(2, 1);

        let rates = provider.get_exchange_rates("USD").await.unwrap();
        assert_eq!(rates.origin, RateOrigin::Default);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_default_rates_cross_through_usd() {
        let eur = default_rates("eur");
        assert_eq!(eur.base, "EUR");
        assert_eq!(eur.rate("EUR"), Some(1.0));
        assert!((eur.rate("USD").unwrap() - 1.0 / 0.92).abs() < 1e-12);

        let unknown = default_rates("CHF");
        assert_eq!(unknown.rate("RUB"), Some(1.0));
        assert_eq!(unknown.rate("CHF"), Some(1.0));
    }
}
