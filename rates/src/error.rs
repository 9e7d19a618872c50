//! Rate lookup error types.

use ratekeeper_common::{Currency, RateKeeperError};
use thiserror::Error;

/// Failure reported by a rate fetcher.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection or I/O failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with an unexpected status.
    #[error("Provider returned status {code}")]
    Status { code: u16 },

    /// The response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The provider did not answer in time.
    #[error("Fetch timed out: {0}")]
    Timeout(String),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors returned by the lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request violated the cache contract.
    #[error(transparent)]
    Cache(#[from] RateKeeperError),

    /// The fetcher failed, so no rates are available right now.
    #[error("Failed to fetch rates for {base}: {source}")]
    Fetch {
        base: Currency,
        #[source]
        source: FetchError,
    },
}

impl LookupError {
    /// Check if this error is a contract violation by the caller.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, LookupError::Cache(e) if e.is_invalid_argument())
    }
}

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;
