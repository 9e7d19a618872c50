//! Lookup metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for rate lookups.
#[derive(Debug, Default)]
pub struct LookupMetrics {
    /// Total lookups with a valid base.
    pub lookups_total: AtomicU64,
    /// Lookups answered from cache.
    pub cache_hits: AtomicU64,
    /// Lookups that went to the fetcher.
    pub cache_misses: AtomicU64,
    /// Fetches that returned rates.
    pub fetches_ok: AtomicU64,
    /// Fetches that reported an unknown base.
    pub fetches_not_found: AtomicU64,
    /// Fetches that failed.
    pub fetches_failed: AtomicU64,
}

impl LookupMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.lookups_total.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.lookups_total.fetch_add(1, Ordering::Relaxed);
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_ok(&self) {
        self.fetches_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.fetches_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lookups_total: self.lookups_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fetches_ok: self.fetches_ok.load(Ordering::Relaxed),
            fetches_not_found: self.fetches_not_found.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LookupMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lookups_total: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fetches_ok: u64,
    pub fetches_not_found: u64,
    pub fetches_failed: u64,
}

impl MetricsSnapshot {
    /// Fraction of lookups answered from cache.
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups_total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.lookups_total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = LookupMetrics::new();
        metrics.record_miss();
        metrics.record_fetch_ok();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lookups_total, 4);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.fetches_ok, 1);
        assert_eq!(snapshot.hit_ratio(), 0.75);
    }

    #[test]
    fn test_empty_hit_ratio() {
        assert_eq!(MetricsSnapshot::default().hit_ratio(), 0.0);
    }
}
