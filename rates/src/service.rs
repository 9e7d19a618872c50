//! Cached rate lookup.

use std::sync::Arc;

use ratekeeper_cache::{ExpiringCache, SharedCache};
use ratekeeper_common::{Currency, CurrencyRates, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::error::{LookupError, LookupResult};
use crate::metrics::{LookupMetrics, MetricsSnapshot};
use crate::provider::RateFetcher;

/// Looks up rates in the cache and falls back to the fetcher on a miss.
///
/// Only successful fetches are cached. Concurrent misses for the same base
/// may each call the fetcher.
pub struct RateLookupService<T> {
    fetcher: Arc<dyn RateFetcher<T>>,
    cache: SharedCache<T>,
    metrics: LookupMetrics,
}

impl<T> RateLookupService<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a service with a fresh cache using the default expiration.
    pub fn new(fetcher: Arc<dyn RateFetcher<T>>) -> Self {
        Self::with_cache(fetcher, Arc::new(ExpiringCache::new()))
    }

    /// Create a service with a fresh cache expiring after `expiration_secs`.
    pub fn with_expiration(fetcher: Arc<dyn RateFetcher<T>>, expiration_secs: i64) -> Result<Self> {
        let cache = ExpiringCache::with_expiration(expiration_secs)?;
        Ok(Self::with_cache(fetcher, Arc::new(cache)))
    }

    /// Create a service over an existing, possibly shared, cache.
    pub fn with_cache(fetcher: Arc<dyn RateFetcher<T>>, cache: SharedCache<T>) -> Self {
        Self {
            fetcher,
            cache,
            metrics: LookupMetrics::new(),
        }
    }

    /// Get rates for `base`, fetching and caching them on a miss.
    ///
    /// Returns `Ok(None)` when the fetcher does not know the base currency.
    #[instrument(skip(self), fields(fetcher = self.fetcher.name()))]
    pub async fn get_rates(&self, base: &str) -> LookupResult<Option<T>> {
        let base = Currency::parse(base)?;

        if let Some(cached) = self.cache.get(base.code())? {
            self.metrics.record_hit();
            debug!(base = %base, "Using cached rates");
            return Ok(Some(cached));
        }
        self.metrics.record_miss();

        match self.fetcher.fetch(&base).await {
            Ok(Some(rates)) => {
                self.metrics.record_fetch_ok();
                self.cache.put(base.code(), rates.clone())?;
                info!(base = %base, "Fetched and cached rates");
                Ok(Some(rates))
            }
            Ok(None) => {
                self.metrics.record_not_found();
                info!(base = %base, "No rates available for base currency");
                Ok(None)
            }
            Err(e) => {
                self.metrics.record_fetch_failed();
                warn!(base = %base, error = %e, "Rate fetch failed");
                Err(LookupError::Fetch { base, source: e })
            }
        }
    }

    /// Shared handle to the underlying cache.
    pub fn cache(&self) -> SharedCache<T> {
        self.cache.clone()
    }

    /// Get current lookup metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl RateLookupService<CurrencyRates> {
    /// Get the rate from `base` to `quote`.
    pub async fn get_rate(&self, base: &str, quote: &str) -> LookupResult<Option<Decimal>> {
        let quote = Currency::parse(quote)?;
        let rates = self.get_rates(base).await?;
        Ok(rates.and_then(|r| r.rate_for(&quote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::provider::MockRateFetcher;
    use ratekeeper_cache::CacheConfig;
    use ratekeeper_common::ManualClock;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn make_rates(base: Currency, usd: Decimal) -> CurrencyRates {
        let mut rates = BTreeMap::new();
        rates.insert(Currency::usd(), usd);
        rates.insert(Currency::gbp(), dec!(0.5));
        CurrencyRates::new(base, ratekeeper_common::now(), rates)
    }

    fn make_fetcher() -> Arc<MockRateFetcher<CurrencyRates>> {
        let fetcher = Arc::new(MockRateFetcher::new("mock"));
        fetcher.set_rates(Currency::eur(), make_rates(Currency::eur(), dec!(1.25)));
        fetcher.set_rates(Currency::usd(), make_rates(Currency::usd(), dec!(1)));
        fetcher
    }

    fn make_service(
        fetcher: Arc<MockRateFetcher<CurrencyRates>>,
        expiration_secs: i64,
    ) -> (RateLookupService<CurrencyRates>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache: ExpiringCache<CurrencyRates> =
            ExpiringCache::with_clock(CacheConfig::with_expiration(expiration_secs), clock.clone())
                .unwrap();
        let fetcher: Arc<dyn RateFetcher<CurrencyRates>> = fetcher;
        (RateLookupService::with_cache(fetcher, Arc::new(cache)), clock)
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_does_not() {
        let fetcher = make_fetcher();
        let (service, _) = make_service(fetcher.clone(), 5);

        assert!(!service.cache().contains_key("EUR").unwrap());

        let first = service.get_rates("EUR").await.unwrap().unwrap();
        assert_eq!(fetcher.calls_for(&Currency::eur()), 1);
        assert!(service.cache().contains_key("EUR").unwrap());

        let second = service.get_rates("EUR").await.unwrap().unwrap();
        assert_eq!(fetcher.calls_for(&Currency::eur()), 1);
        assert_eq!(first, second);

        let metrics = service.metrics();
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_independent_bases() {
        let fetcher = make_fetcher();
        let (service, _) = make_service(fetcher.clone(), 5);

        let eur = service.get_rates("EUR").await.unwrap().unwrap();
        let usd = service.get_rates("USD").await.unwrap().unwrap();
        assert_eq!(eur.base, Currency::eur());
        assert_eq!(usd.base, Currency::usd());
        assert_eq!(service.cache().len(), 2);

        service.cache().remove("EUR").unwrap();
        assert!(service.cache().contains_key("USD").unwrap());

        service.get_rates("USD").await.unwrap();
        assert_eq!(fetcher.calls_for(&Currency::usd()), 1);

        service.get_rates("EUR").await.unwrap();
        assert_eq!(fetcher.calls_for(&Currency::eur()), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let fetcher = make_fetcher();
        let (service, clock) = make_service(fetcher.clone(), 5);

        service.get_rates("EUR").await.unwrap();
        clock.advance_secs(3);
        service.get_rates("EUR").await.unwrap();
        assert_eq!(fetcher.calls(), 1);

        clock.advance_secs(3);
        service.get_rates("EUR").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_base_returns_none_and_is_not_cached() {
        let fetcher = make_fetcher();
        let (service, _) = make_service(fetcher.clone(), 5);

        assert!(service.get_rates("ZZZ").await.unwrap().is_none());
        assert!(!service.cache().contains_key("ZZZ").unwrap());
        assert!(service.cache().is_empty());

        assert!(service.get_rates("ZZZ").await.unwrap().is_none());
        assert_eq!(fetcher.calls_for(&Currency::new("ZZZ")), 2);
        assert_eq!(service.metrics().fetches_not_found, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let fetcher = make_fetcher();
        fetcher.set_failure(Currency::gbp(), FetchError::Transport("connection reset".into()));
        let (service, _) = make_service(fetcher.clone(), 5);

        let err = service.get_rates("GBP").await.unwrap_err();
        assert!(matches!(
            err,
            LookupError::Fetch {
                ref base,
                source: FetchError::Transport(_),
            } if *base == Currency::gbp()
        ));
        assert!(service.cache().is_empty());
        assert_eq!(service.metrics().fetches_failed, 1);
    }

    #[tokio::test]
    async fn test_empty_base_rejected() {
        let fetcher = make_fetcher();
        let (service, _) = make_service(fetcher.clone(), 5);

        assert!(service.get_rates("").await.unwrap_err().is_invalid_argument());
        assert!(service.get_rates("  ").await.unwrap_err().is_invalid_argument());
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(service.metrics().lookups_total, 0);
    }

    #[tokio::test]
    async fn test_base_code_is_normalized() {
        let fetcher = make_fetcher();
        let (service, _) = make_service(fetcher.clone(), 5);

        service.get_rates("eur").await.unwrap().unwrap();
        service.get_rates("EUR").await.unwrap().unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(service.cache().contains_key("EUR").unwrap());
    }

    #[tokio::test]
    async fn test_get_rate() {
        let fetcher = make_fetcher();
        let (service, _) = make_service(fetcher, 5);

        assert_eq!(service.get_rate("EUR", "USD").await.unwrap(), Some(dec!(1.25)));
        assert_eq!(service.get_rate("EUR", "JPY").await.unwrap(), None);
        assert_eq!(service.get_rate("ZZZ", "USD").await.unwrap(), None);
    }

    #[test]
    fn test_negative_expiration_rejected() {
        let fetcher: Arc<dyn RateFetcher<CurrencyRates>> = make_fetcher();
        assert!(RateLookupService::with_expiration(fetcher, -5).is_err());
    }
}
