//! Rate fetcher capability and adapters.

use std::future::Future;

use async_trait::async_trait;
use ratekeeper_common::Currency;

use crate::error::FetchResult;

/// Fetches rates for a base currency from outside the process.
///
/// `Ok(Some(_))` carries data, `Ok(None)` means the provider does not know
/// the base currency, and `Err(_)` is a transport-level failure.
#[async_trait]
pub trait RateFetcher<T>: Send + Sync {
    /// Get the fetcher name.
    fn name(&self) -> &str;

    /// Fetch rates quoted against `base`.
    async fn fetch(&self, base: &Currency) -> FetchResult<Option<T>>;
}

/// Adapts an async closure into a [`RateFetcher`].
pub struct FnFetcher<F> {
    name: String,
    f: F,
}

impl<F> FnFetcher<F> {
    /// Wrap `f` under the given fetcher name.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<T, F, Fut> RateFetcher<T> for FnFetcher<F>
where
    T: Send + 'static,
    F: Fn(Currency) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResult<Option<T>>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, base: &Currency) -> FetchResult<Option<T>> {
        (self.f)(base.clone()).await
    }
}

/// Canned response for [`MockRateFetcher`].
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub enum MockResponse<T> {
    Rates(T),
    NotFound,
    Fail(crate::error::FetchError),
}

/// Mock rate fetcher for testing.
///
/// Bases without a configured response report "not found".
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateFetcher<T> {
    name: String,
    responses: dashmap::DashMap<Currency, MockResponse<T>>,
    calls: dashmap::DashMap<Currency, usize>,
    delay: Option<std::time::Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
impl<T: Clone> MockRateFetcher<T> {
    /// Create a new mock fetcher.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
            delay: None,
        }
    }

    /// Sleep for `delay` before answering each fetch.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer fetches for `base` with `rates`.
    pub fn set_rates(&self, base: Currency, rates: T) {
        self.responses.insert(base, MockResponse::Rates(rates));
    }

    /// Fail fetches for `base` with `error`.
    pub fn set_failure(&self, base: Currency, error: crate::error::FetchError) {
        self.responses.insert(base, MockResponse::Fail(error));
    }

    /// Total number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Number of fetches performed for `base`.
    pub fn calls_for(&self, base: &Currency) -> usize {
        self.calls.get(base).map(|c| *c).unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl<T: Clone + Send + Sync> RateFetcher<T> for MockRateFetcher<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, base: &Currency) -> FetchResult<Option<T>> {
        *self.calls.entry(base.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .get(base)
            .map(|r| r.clone())
            .unwrap_or(MockResponse::NotFound);

        match response {
            MockResponse::Rates(rates) => Ok(Some(rates)),
            MockResponse::NotFound => Ok(None),
            MockResponse::Fail(e) => Err(e),
        }
    }
}
