//! Simulated rate provider.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use ratekeeper_common::{now, Currency, CurrencyRates};
use ratekeeper_rates::{FetchError, FetchResult, RateFetcher};

/// Reference value of one unit of each currency in USD.
const USD_VALUES: &[(&str, &str)] = &[
    ("USD", "1.00"),
    ("EUR", "1.08"),
    ("GBP", "1.27"),
    ("JPY", "0.0067"),
    ("CHF", "1.13"),
    ("CAD", "0.74"),
    ("AUD", "0.66"),
    ("BGN", "0.55"),
];

/// Fetcher that invents rates with configurable latency and failures.
pub struct SimulatedFetcher {
    /// Supported currencies and their USD value.
    usd_values: BTreeMap<Currency, Decimal>,
    /// Base response latency.
    latency: Duration,
    /// Probability of a transport failure per fetch.
    failure_rate: f64,
    /// Random number generator.
    rng: Mutex<StdRng>,
    /// Fetches performed.
    fetch_count: AtomicU64,
}

impl SimulatedFetcher {
    /// Create a new simulated fetcher.
    pub fn new(latency: Duration, failure_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let usd_values = USD_VALUES
            .iter()
            .filter_map(|(code, value)| Some((Currency::new(*code), value.parse().ok()?)))
            .collect();

        Self {
            usd_values,
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Currencies this provider quotes.
    pub fn supported(&self) -> Vec<Currency> {
        self.usd_values.keys().cloned().collect()
    }

    /// Number of fetches performed.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    fn quote(&self, base: &Currency) -> Option<CurrencyRates> {
        let base_value = *self.usd_values.get(base)?;
        let mut rng = self.rng.lock();

        let rates = self
            .usd_values
            .iter()
            .filter(|(currency, _)| *currency != base)
            .map(|(currency, value)| {
                // Up to +/- 0.5% noise per quote.
                let noise = Decimal::new(rng.gen_range(-50..=50), 4);
                let rate = (base_value / *value) * (Decimal::ONE + noise);
                (currency.clone(), rate.round_dp(6))
            })
            .collect();

        Some(CurrencyRates::new(base.clone(), now(), rates))
    }
}

#[async_trait]
impl RateFetcher<CurrencyRates> for SimulatedFetcher {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch(&self, base: &Currency) -> FetchResult<Option<CurrencyRates>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let (delay, fail) = {
            let mut rng = self.rng.lock();
            let jitter = rng.gen_range(0..=self.latency.as_millis() as u64 / 2 + 1);
            (
                self.latency + Duration::from_millis(jitter),
                rng.gen_bool(self.failure_rate),
            )
        };
        tokio::time::sleep(delay).await;

        if fail {
            return Err(FetchError::Transport("simulated connection reset".to_string()));
        }

        Ok(self.quote(base))
    }
}
