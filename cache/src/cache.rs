//! Expiring key-value cache.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use ratekeeper_common::{
    constants, expiration_from_secs, is_older_than, require_key, Clock, Result, SystemClock,
    Timestamp,
};
use tracing::debug;

use crate::config::CacheConfig;

/// Cached value together with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    inserted_at: Timestamp,
}

impl<T> CacheEntry<T> {
    fn new(value: T, inserted_at: Timestamp) -> Self {
        Self { value, inserted_at }
    }

    fn is_expired(&self, now: Timestamp, ttl: Duration) -> bool {
        is_older_than(self.inserted_at, ttl, now)
    }
}

/// Thread-safe cache whose entries expire after a shared interval.
///
/// The interval is read on every check, so changing it affects entries
/// that are already stored. An entry is expired once its age is strictly
/// greater than the interval.
pub struct ExpiringCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    /// Validated interval in milliseconds.
    expiration_ms: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> ExpiringCache<T> {
    /// Create a cache with the default five minute expiration.
    pub fn new() -> Self {
        Self::build(constants::default_expiration(), Arc::new(SystemClock))
    }

    /// Create a cache with a custom expiration in seconds.
    pub fn with_expiration(expiration_secs: i64) -> Result<Self> {
        Self::with_config(CacheConfig::with_expiration(expiration_secs))
    }

    /// Create a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let expiration = expiration_from_secs(config.expiration_secs)?;
        Ok(Self::build(expiration, clock))
    }

    fn build(expiration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            expiration_ms: AtomicI64::new(expiration.num_milliseconds()),
            clock,
        }
    }

    /// Store a value, replacing any previous entry and restarting its clock.
    pub fn put(&self, key: &str, value: T) -> Result<()> {
        require_key(key)?;

        let entry = CacheEntry::new(value, self.clock.now());
        debug!(key, inserted_at = %entry.inserted_at, "Inserting cache entry");
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Get a value if it is present and not expired.
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        self.read(key, T::clone)
    }

    /// Check whether a live entry exists for `key`.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.read(key, |_| ())?.is_some())
    }

    /// Remove an entry. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        require_key(key)?;

        if self.entries.remove(key).is_some() {
            debug!(key, "Removed cache entry");
        }
        Ok(())
    }

    /// Remove every entry.
    pub fn clear(&self) {
        debug!("Clearing all cache entries");
        self.entries.clear();
    }

    /// Evict every expired entry and return how many were evicted.
    pub fn clean(&self) -> usize {
        // Taken once so entries inserted during the scan are younger than `now`.
        let now = self.clock.now();
        let ttl = self.expiration();

        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired(now, ttl) {
                evicted += 1;
                false
            } else {
                true
            }
        });

        debug!(evicted, "Cleaned expired cache entries");
        evicted
    }

    /// Replace the expiration interval used by all future checks.
    pub fn set_expiration_interval(&self, seconds: i64) -> Result<()> {
        let expiration = expiration_from_secs(seconds)?;

        self.expiration_ms
            .store(expiration.num_milliseconds(), Ordering::Release);
        debug!(seconds, "Expiration interval changed");
        Ok(())
    }

    /// Current expiration interval in seconds.
    pub fn expiration_interval(&self) -> i64 {
        self.expiration().num_seconds()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let ttl = self.expiration();

        let total = self.entries.len();
        let valid = self
            .entries
            .iter()
            .filter(|e| !e.is_expired(now, ttl))
            .count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total.saturating_sub(valid),
        }
    }

    fn expiration(&self) -> Duration {
        Duration::milliseconds(self.expiration_ms.load(Ordering::Acquire))
    }

    /// Apply `f` to a live entry, lazily evicting it if it has expired.
    fn read<R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Result<Option<R>> {
        require_key(key)?;

        let now = self.clock.now();
        let ttl = self.expiration();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now, ttl) => {
                debug!(key, "Cache hit");
                return Ok(Some(f(&entry.value)));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // Re-check under the shard lock so a concurrent put survives.
            if self
                .entries
                .remove_if(key, |_, entry| entry.is_expired(now, ttl))
                .is_some()
            {
                debug!(key, "Evicted expired cache entry");
            }
        }

        debug!(key, "Cache miss");
        Ok(None)
    }
}

impl<T: Clone> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Shared expiring cache.
pub type SharedCache<T> = Arc<ExpiringCache<T>>;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ratekeeper_common::ManualClock;

    fn make_cache(expiration_secs: i64) -> (ExpiringCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache =
            ExpiringCache::with_clock(CacheConfig::with_expiration(expiration_secs), clock.clone())
                .unwrap();
        (cache, clock)
    }

    #[test]
    fn test_put_and_get() {
        let (cache, _) = make_cache(5);
        cache.put("EUR", "eur-rates".to_string()).unwrap();

        assert_eq!(cache.get("EUR").unwrap(), Some("eur-rates".to_string()));
        assert!(cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_cache_miss() {
        let (cache, _) = make_cache(5);

        assert_eq!(cache.get("EUR").unwrap(), None);
        assert!(!cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_overwrite_resets_clock() {
        let (cache, clock) = make_cache(5);
        cache.put("EUR", "first".to_string()).unwrap();

        clock.advance_secs(4);
        cache.put("EUR", "second".to_string()).unwrap();

        clock.advance_secs(4);
        assert_eq!(cache.get("EUR").unwrap(), Some("second".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expiration_boundary() {
        let (cache, clock) = make_cache(5);
        cache.put("EUR", "rates".to_string()).unwrap();

        clock.advance_secs(3);
        assert!(cache.contains_key("EUR").unwrap());

        clock.advance_secs(3);
        assert!(!cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_age_equal_to_interval_is_valid() {
        let (cache, clock) = make_cache(5);
        cache.put("EUR", "rates".to_string()).unwrap();

        clock.advance_secs(5);
        assert!(cache.contains_key("EUR").unwrap());

        clock.advance(Duration::milliseconds(1));
        assert!(!cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_lazy_eviction_on_get() {
        let (cache, clock) = make_cache(5);
        cache.put("EUR", "eur".to_string()).unwrap();
        cache.put("USD", "usd".to_string()).unwrap();

        clock.advance_secs(6);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get("EUR").unwrap(), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lazy_eviction_on_contains() {
        let (cache, clock) = make_cache(5);
        cache.put("EUR", "eur".to_string()).unwrap();

        clock.advance_secs(6);
        assert!(!cache.contains_key("EUR").unwrap());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clean_removes_only_expired() {
        let (cache, clock) = make_cache(5);
        cache.put("A", "old".to_string()).unwrap();

        clock.advance_secs(9);
        cache.put("B", "new".to_string()).unwrap();
        clock.advance_secs(1);

        assert_eq!(cache.clean(), 1);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains_key("A").unwrap());
        assert!(cache.contains_key("B").unwrap());
    }

    #[test]
    fn test_clean_keeps_fresh_entries() {
        let (cache, _) = make_cache(5);
        cache.put("EUR", "rates".to_string()).unwrap();

        assert_eq!(cache.clean(), 0);
        assert!(cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_remove_and_clear() {
        let (cache, _) = make_cache(5);
        cache.put("EUR", "eur".to_string()).unwrap();
        cache.put("USD", "usd".to_string()).unwrap();

        cache.remove("EUR").unwrap();
        cache.remove("EUR").unwrap();
        assert!(!cache.contains_key("EUR").unwrap());
        assert!(cache.contains_key("USD").unwrap());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_dynamic_threshold_is_retroactive() {
        let (cache, clock) = make_cache(5);
        cache.put("EUR", "rates".to_string()).unwrap();

        clock.advance_secs(3);
        assert!(cache.contains_key("EUR").unwrap());

        cache.set_expiration_interval(2).unwrap();
        assert_eq!(cache.expiration_interval(), 2);
        assert!(!cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_negative_interval_rejected() {
        let (cache, _) = make_cache(5);

        let err = cache.set_expiration_interval(-1).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(cache.expiration_interval(), 5);

        assert!(ExpiringCache::<String>::with_expiration(-1).is_err());
    }

    #[test]
    fn test_out_of_range_interval_rejected() {
        let (cache, _) = make_cache(5);
        cache.put("EUR", "rates".to_string()).unwrap();

        let err = cache.set_expiration_interval(i64::MAX).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(cache.expiration_interval(), 5);
        assert_eq!(cache.get("EUR").unwrap(), Some("rates".to_string()));

        assert!(ExpiringCache::<String>::with_expiration(10_000_000_000_000_000).is_err());
    }

    #[test]
    fn test_largest_valid_interval_keeps_entries() {
        let (cache, clock) = make_cache(5);
        let max_secs = i64::MAX / 1000;
        cache.set_expiration_interval(max_secs).unwrap();
        cache.put("EUR", "rates".to_string()).unwrap();

        clock.advance_secs(365 * 24 * 60 * 60);
        assert!(cache.contains_key("EUR").unwrap());
        assert_eq!(cache.clean(), 0);
        assert_eq!(cache.stats().valid_entries, 1);
    }

    #[test]
    fn test_zero_interval_expires_on_any_age() {
        let (cache, clock) = make_cache(0);
        cache.put("EUR", "rates".to_string()).unwrap();
        assert!(cache.contains_key("EUR").unwrap());

        clock.advance(Duration::milliseconds(1));
        assert!(!cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_invalid_keys_leave_state_unchanged() {
        let (cache, _) = make_cache(5);
        cache.put("EUR", "rates".to_string()).unwrap();

        assert!(cache.put("", "x".to_string()).unwrap_err().is_invalid_argument());
        assert!(cache.get("").unwrap_err().is_invalid_argument());
        assert!(cache.contains_key("").unwrap_err().is_invalid_argument());
        assert!(cache.remove("").unwrap_err().is_invalid_argument());

        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("EUR").unwrap());
    }

    #[test]
    fn test_stats() {
        let (cache, clock) = make_cache(5);
        cache.put("A", "a".to_string()).unwrap();
        clock.advance_secs(6);
        cache.put("B", "b".to_string()).unwrap();

        assert_eq!(
            cache.stats(),
            CacheStats {
                total_entries: 2,
                valid_entries: 1,
                expired_entries: 1,
            }
        );
    }

    #[test]
    fn test_default_expiration() {
        let cache: ExpiringCache<String> = ExpiringCache::default();
        assert_eq!(cache.expiration_interval(), 300);
    }

    proptest! {
        #[test]
        fn prop_repeated_reads_return_same_value(
            key in "[A-Z]{1,8}",
            value in any::<i64>(),
            reads in 1usize..10,
        ) {
            let cache = ExpiringCache::with_expiration(5).unwrap();
            cache.put(&key, value).unwrap();

            for _ in 0..reads {
                prop_assert_eq!(cache.get(&key).unwrap(), Some(value));
            }
        }

        #[test]
        fn prop_removing_one_key_keeps_other(a in "[A-Z]{3}", b in "[A-Z]{3}") {
            prop_assume!(a != b);
            let cache = ExpiringCache::with_expiration(5).unwrap();
            cache.put(&a, 1u32).unwrap();
            cache.put(&b, 2u32).unwrap();

            cache.remove(&a).unwrap();

            prop_assert_eq!(cache.get(&a).unwrap(), None);
            prop_assert_eq!(cache.get(&b).unwrap(), Some(2));
        }
    }
}
