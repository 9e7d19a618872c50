//! Cache configuration.

use std::time::Duration;

use ratekeeper_common::{constants, expiration_from_secs, RateKeeperError, Result};

/// Configuration for an expiring cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Seconds an entry stays valid after insertion.
    pub expiration_secs: i64,
    /// How often the background sweeper runs.
    pub sweep_interval: Duration,
    /// Whether a background sweeper should be started.
    pub sweep_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiration_secs: constants::DEFAULT_EXPIRATION_SECS,
            sweep_interval: constants::default_sweep_interval(),
            sweep_enabled: true,
        }
    }
}

impl CacheConfig {
    /// Default configuration with a custom expiration.
    pub fn with_expiration(expiration_secs: i64) -> Self {
        Self {
            expiration_secs,
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("RATEKEEPER_CACHE_EXPIRATION_SECS") {
            if let Ok(secs) = secs.parse() {
                config.expiration_secs = secs;
            }
        }

        if let Ok(secs) = std::env::var("RATEKEEPER_SWEEP_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.sweep_interval = Duration::from_secs(secs);
            }
        }

        if let Ok(enabled) = std::env::var("RATEKEEPER_SWEEP_ENABLED") {
            if let Ok(enabled) = enabled.parse() {
                config.sweep_enabled = enabled;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = expiration_from_secs(self.expiration_secs) {
            return Err(RateKeeperError::Configuration(e.to_string()));
        }

        if self.sweep_enabled && self.sweep_interval.is_zero() {
            return Err(RateKeeperError::Configuration(
                "Sweep interval cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.expiration_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = CacheConfig::with_expiration(-1);
        assert!(config.validate().is_err());

        let config = CacheConfig::with_expiration(i64::MAX);
        assert!(matches!(
            config.validate(),
            Err(RateKeeperError::Configuration(_))
        ));

        let config = CacheConfig {
            sweep_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sweep_interval_allowed_when_disabled() {
        let config = CacheConfig {
            sweep_interval: Duration::ZERO,
            sweep_enabled: false,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
