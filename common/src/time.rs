//! Time utilities and constants for RateKeeper.

use chrono::{DateTime, Duration, Utc};

use crate::error::{RateKeeperError, Result};

/// Cache timing constants.
pub mod constants {
    use super::Duration;

    /// Default cache expiration interval in seconds (5 minutes).
    pub const DEFAULT_EXPIRATION_SECS: i64 = 5 * 60;

    /// Default sweep interval (1 minute).
    pub fn default_sweep_interval() -> std::time::Duration {
        std::time::Duration::from_secs(60)
    }

    /// Default expiration as a duration.
    pub fn default_expiration() -> Duration {
        Duration::seconds(DEFAULT_EXPIRATION_SECS)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check whether something stamped at `stamped_at` is older than `max_age`
/// as of `at`. Equal to `max_age` is still fresh.
pub fn is_older_than(stamped_at: Timestamp, max_age: Duration, at: Timestamp) -> bool {
    at.signed_duration_since(stamped_at) > max_age
}

/// Convert an expiration interval in seconds to a duration.
///
/// Negative values and values beyond the representable range are rejected.
pub fn expiration_from_secs(seconds: i64) -> Result<Duration> {
    if seconds < 0 {
        return Err(RateKeeperError::invalid_field(
            "seconds",
            format!("expiration interval cannot be negative: {}", seconds),
        ));
    }

    Duration::try_seconds(seconds).ok_or_else(|| {
        RateKeeperError::invalid_field(
            "seconds",
            format!("expiration interval out of range: {}", seconds),
        )
    })
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// Manually driven clock for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct ManualClock {
    current: parking_lot::Mutex<Timestamp>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    /// Create a clock frozen at the current wall time.
    pub fn new() -> Self {
        Self::starting_at(now())
    }

    /// Create a clock frozen at `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            current: parking_lot::Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_older_than_boundary() {
        let start = now();
        let max_age = Duration::seconds(5);

        assert!(!is_older_than(start, max_age, start + Duration::seconds(3)));
        assert!(!is_older_than(start, max_age, start + Duration::seconds(5)));
        assert!(is_older_than(start, max_age, start + Duration::milliseconds(5001)));
    }

    #[test]
    fn test_expiration_from_secs() {
        assert_eq!(expiration_from_secs(0).unwrap(), Duration::zero());
        assert_eq!(expiration_from_secs(300).unwrap(), Duration::minutes(5));

        assert!(expiration_from_secs(-1).unwrap_err().is_invalid_argument());
        assert!(expiration_from_secs(i64::MAX).unwrap_err().is_invalid_argument());
        assert!(expiration_from_secs(10_000_000_000_000_000)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.advance_secs(10);
        assert_eq!(clock.now() - start, Duration::seconds(10));
    }

    #[test]
    fn test_default_expiration() {
        assert_eq!(constants::default_expiration(), Duration::minutes(5));
    }
}
