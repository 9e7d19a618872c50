//! Simulation controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use ratekeeper_cache::{CacheConfig, CacheStats, ExpiringCache, Sweeper};
use ratekeeper_common::CurrencyRates;
use ratekeeper_rates::{LookupError, MetricsSnapshot, RateFetcher, RateLookupService};

use crate::fetcher::SimulatedFetcher;
use crate::metrics::SimulationMetrics;
use crate::scenario::{LookupOutcome, Scenario, ScenarioStep};

/// Drives lookups against a rate service backed by a simulated provider.
pub struct SimulationController {
    /// Service under test.
    service: Arc<RateLookupService<CurrencyRates>>,
    /// Cache shared with the service.
    cache: Arc<ExpiringCache<CurrencyRates>>,
    /// Background sweeper, if enabled.
    sweeper: Option<Sweeper>,
    /// Simulation metrics.
    metrics: Arc<RwLock<SimulationMetrics>>,
    /// Random seed for reproducibility.
    seed: Option<u64>,
}

impl SimulationController {
    /// Create a new simulation controller. Must be called within a tokio runtime.
    pub fn new(
        config: &CacheConfig,
        fetcher: Arc<SimulatedFetcher>,
        seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        let cache = Arc::new(ExpiringCache::with_config(config.clone())?);

        let sweeper = config
            .sweep_enabled
            .then(|| Sweeper::spawn(cache.clone(), config.sweep_interval));

        let fetcher: Arc<dyn RateFetcher<CurrencyRates>> = fetcher;
        let service = Arc::new(RateLookupService::with_cache(fetcher, cache.clone()));

        Ok(Self {
            service,
            cache,
            sweeper,
            metrics: Arc::new(RwLock::new(SimulationMetrics::new())),
            seed,
        })
    }

    /// Run `workers` concurrent tasks, each performing `requests` lookups
    /// over randomly chosen bases.
    pub async fn run_load(
        &self,
        workers: usize,
        requests: usize,
        bases: &[String],
    ) -> anyhow::Result<()> {
        if bases.is_empty() {
            return Err(anyhow::anyhow!("At least one base currency is required"));
        }

        info!(workers, requests, bases = ?bases, "Running load");

        let handles = (0..workers).map(|worker| {
            let service = self.service.clone();
            let metrics = self.metrics.clone();
            let bases = bases.to_vec();
            let mut rng = match self.seed {
                Some(s) => StdRng::seed_from_u64(s.wrapping_add(worker as u64)),
                None => StdRng::from_entropy(),
            };

            tokio::spawn(async move {
                for _ in 0..requests {
                    let base = &bases[rng.gen_range(0..bases.len())];
                    let started = Instant::now();
                    let result = service.get_rates(base).await;
                    let latency_us = started.elapsed().as_micros() as u64;

                    let mut metrics = metrics.write().await;
                    match result {
                        Ok(Some(_)) => metrics.record_success(latency_us),
                        Ok(None) => metrics.record_not_found(),
                        Err(e) => {
                            debug!(worker, base = %base, error = %e, "Lookup failed");
                            metrics.record_failure();
                        }
                    }
                }
            })
        });

        for result in join_all(handles).await {
            result?;
        }

        Ok(())
    }

    /// Run a scenario, failing on the first unmet expectation.
    pub async fn run_scenario(&self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        self.cache.clear();
        self.cache.set_expiration_interval(scenario.expiration_secs)?;

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(step)
                .await
                .map_err(|e| anyhow::anyhow!("Step {} ({:?}) failed: {}", index, step, e))?;
        }

        info!("Scenario {} passed", scenario.name);
        Ok(())
    }

    /// Execute a single scenario step.
    async fn execute_step(&self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Wait { millis } => {
                info!("Waiting {}ms", millis);
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            ScenarioStep::Lookup { base, expect } => {
                let started = Instant::now();
                let result = self.service.get_rates(base).await;
                let latency_us = started.elapsed().as_micros() as u64;

                let actual = match &result {
                    Ok(Some(rates)) => {
                        info!(base = %base, quotes = rates.len(), "Lookup returned rates");
                        self.metrics.write().await.record_success(latency_us);
                        LookupOutcome::Rates
                    }
                    Ok(None) => {
                        self.metrics.write().await.record_not_found();
                        LookupOutcome::NotFound
                    }
                    Err(LookupError::Cache(e)) => {
                        warn!(base = %base, code = e.error_code(), error = %e, "Lookup rejected");
                        return Err(e.clone().into());
                    }
                    Err(e) => {
                        warn!(base = %base, error = %e, "Lookup failed");
                        self.metrics.write().await.record_failure();
                        LookupOutcome::Failure
                    }
                };

                if *expect != LookupOutcome::Any && actual != *expect {
                    return Err(anyhow::anyhow!(
                        "expected {:?} for {}, got {:?}",
                        expect,
                        base,
                        actual
                    ));
                }
            }
            ScenarioStep::AssertCached { base, cached } => {
                let actual = self.cache.contains_key(base)?;
                if actual != *cached {
                    return Err(anyhow::anyhow!(
                        "expected cached={} for {}, got {}",
                        cached,
                        base,
                        actual
                    ));
                }
            }
            ScenarioStep::SetExpiration { seconds } => {
                info!("Setting expiration interval to {}s", seconds);
                self.cache.set_expiration_interval(*seconds)?;
            }
            ScenarioStep::Clean => {
                let evicted = self.cache.clean();
                info!(evicted, "Cleaned cache");
            }
            ScenarioStep::Clear => {
                info!("Clearing cache");
                self.cache.clear();
            }
        }

        Ok(())
    }

    /// Get simulation metrics.
    pub async fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.read().await.clone()
    }

    /// Get service lookup metrics.
    pub fn lookup_metrics(&self) -> MetricsSnapshot {
        self.service.metrics()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Stop background tasks.
    pub async fn shutdown(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown().await;
        }
    }
}
