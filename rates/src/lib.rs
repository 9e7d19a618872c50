//! RateKeeper Rates
//!
//! Exchange rate lookup backed by an [`ExpiringCache`](ratekeeper_cache::ExpiringCache).
//! Rates are fetched through a caller-supplied [`RateFetcher`] only when the
//! cache has no live entry for the requested base currency.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratekeeper_rates::{FnFetcher, RateLookupService};
//!
//! let fetcher = FnFetcher::new("http", |base| async move { client.latest(base).await });
//! let service = RateLookupService::with_expiration(Arc::new(fetcher), 300)?;
//!
//! let rates = service.get_rates("EUR").await?;
//! ```

pub mod error;
pub mod metrics;
pub mod provider;
pub mod service;

pub use error::{FetchError, FetchResult, LookupError, LookupResult};
pub use metrics::{LookupMetrics, MetricsSnapshot};
pub use provider::{FnFetcher, RateFetcher};
pub use service::RateLookupService;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::{MockRateFetcher, MockResponse};
