//! Simulation metrics.

use std::collections::VecDeque;

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Total lookups attempted.
    pub total_lookups: u64,
    /// Lookups that returned rates.
    pub successful_lookups: u64,
    /// Lookups for unknown currencies.
    pub not_found_lookups: u64,
    /// Lookups that failed.
    pub failed_lookups: u64,
    /// Latency samples (microseconds).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            total_lookups: 0,
            successful_lookups: 0,
            not_found_lookups: 0,
            failed_lookups: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record a lookup that returned rates.
    pub fn record_success(&mut self, latency_us: u64) {
        self.total_lookups += 1;
        self.successful_lookups += 1;

        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Record a lookup for an unknown currency.
    pub fn record_not_found(&mut self) {
        self.total_lookups += 1;
        self.not_found_lookups += 1;
    }

    /// Record a failed lookup.
    pub fn record_failure(&mut self) {
        self.total_lookups += 1;
        self.failed_lookups += 1;
    }

    /// Get average latency in microseconds.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p50 latency.
    pub fn p50_latency_us(&self) -> u64 {
        self.percentile_latency(50)
    }

    /// Get p99 latency.
    pub fn p99_latency_us(&self) -> u64 {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
