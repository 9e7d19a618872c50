//! RateKeeper Simulator
//!
//! Exercises the rate cache with concurrent load or scripted scenarios
//! against a simulated rate provider.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratekeeper_cache::CacheConfig;

mod controller;
mod fetcher;
mod metrics;
mod scenario;

use controller::SimulationController;
use fetcher::SimulatedFetcher;
use scenario::Scenario;

/// RateKeeper Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Load and scenario simulator for the RateKeeper rate cache")]
struct Args {
    /// Number of concurrent workers
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Lookups per worker
    #[arg(short, long, default_value = "100")]
    requests: usize,

    /// Base currencies to request (comma separated)
    #[arg(short, long, value_delimiter = ',', default_value = "EUR,USD,GBP,JPY,CHF,TEST")]
    currencies: Vec<String>,

    /// Scenario to run instead of load (built-in name or path to a JSON file)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Cache expiration in seconds (overrides RATEKEEPER_CACHE_EXPIRATION_SECS)
    #[arg(short, long)]
    expiration: Option<i64>,

    /// Sweep interval in milliseconds (overrides RATEKEEPER_SWEEP_INTERVAL_SECS)
    #[arg(long)]
    sweep_interval_ms: Option<u64>,

    /// Simulated provider latency in milliseconds
    #[arg(long, default_value = "50")]
    latency_ms: u64,

    /// Probability of a simulated transport failure per fetch
    #[arg(long, default_value = "0.0")]
    failure_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the built-in scenario names and exit
    #[arg(long)]
    list_scenarios: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.list_scenarios {
        for name in Scenario::builtin_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    init_logging(args.json_logs);

    let run_id = uuid::Uuid::now_v7();
    info!(run_id = %run_id, "Starting RateKeeper Simulator");

    // Load configuration
    let mut config = CacheConfig::from_env();
    if let Some(expiration) = args.expiration {
        config.expiration_secs = expiration;
    }
    if let Some(millis) = args.sweep_interval_ms {
        config.sweep_interval = Duration::from_millis(millis);
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    info!(
        expiration_secs = config.expiration_secs,
        sweep_enabled = config.sweep_enabled,
        sweep_interval_ms = config.sweep_interval.as_millis() as u64,
        "Cache configured"
    );

    let fetcher = Arc::new(SimulatedFetcher::new(
        Duration::from_millis(args.latency_ms),
        args.failure_rate,
        args.seed,
    ));
    info!("Provider quotes: {:?}", fetcher.supported());

    let controller = SimulationController::new(&config, fetcher.clone(), args.seed)?;

    if let Some(scenario_name) = &args.scenario {
        let scenario = Scenario::load(scenario_name)?;
        controller.run_scenario(&scenario).await?;
    } else {
        controller
            .run_load(args.workers, args.requests, &args.currencies)
            .await?;
    }

    // Print metrics
    let metrics = controller.get_metrics().await;
    let lookups = controller.lookup_metrics();
    let stats = controller.cache_stats();

    info!("Simulation complete");
    info!("Total lookups: {}", metrics.total_lookups);
    info!("With rates: {}", metrics.successful_lookups);
    info!("Not found: {}", metrics.not_found_lookups);
    info!("Failed: {}", metrics.failed_lookups);
    info!("Cache hit ratio: {:.2}", lookups.hit_ratio());
    info!("Provider fetches: {}", fetcher.fetch_count());
    info!(
        "Latency avg/p50/p99: {}us / {}us / {}us",
        metrics.average_latency_us(),
        metrics.p50_latency_us(),
        metrics.p99_latency_us()
    );
    info!(
        "Cache entries: {} total, {} live, {} expired",
        stats.total_entries, stats.valid_entries, stats.expired_entries
    );

    controller.shutdown().await;
    Ok(())
}
