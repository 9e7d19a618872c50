//! Simulation scenarios.

use serde::{Deserialize, Serialize};

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Cache expiration in effect when the scenario starts.
    pub expiration_secs: i64,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Wait for a duration.
    Wait { millis: u64 },
    /// Look up rates and check the outcome.
    Lookup { base: String, expect: LookupOutcome },
    /// Check whether the cache holds a live entry.
    AssertCached { base: String, cached: bool },
    /// Change the cache expiration interval.
    SetExpiration { seconds: i64 },
    /// Sweep expired entries.
    Clean,
    /// Drop every cache entry.
    Clear,
}

/// Expected result of a lookup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOutcome {
    Rates,
    NotFound,
    Failure,
    Any,
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario file by path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "basic" => Ok(Self::basic()),
            "different-bases" => Ok(Self::different_bases()),
            "expiration" => Ok(Self::expiration()),
            "cleanup" => Ok(Self::cleanup()),
            "change-expiration" => Ok(Self::change_expiration()),
            "invalid-currency" => Ok(Self::invalid_currency()),
            path if path.ends_with(".json") => {
                let contents = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&contents)?)
            }
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Names of the built-in scenarios.
    pub fn builtin_names() -> &'static [&'static str] {
        &[
            "basic",
            "different-bases",
            "expiration",
            "cleanup",
            "change-expiration",
            "invalid-currency",
        ]
    }

    fn lookup(base: &str, expect: LookupOutcome) -> ScenarioStep {
        ScenarioStep::Lookup {
            base: base.to_string(),
            expect,
        }
    }

    fn cached(base: &str, cached: bool) -> ScenarioStep {
        ScenarioStep::AssertCached {
            base: base.to_string(),
            cached,
        }
    }

    /// Second lookup of the same base is served from cache.
    fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            description: "Cold lookup populates the cache, warm lookup reuses it".to_string(),
            expiration_secs: 5,
            steps: vec![
                Self::cached("EUR", false),
                Self::lookup("EUR", LookupOutcome::Rates),
                Self::cached("EUR", true),
                Self::lookup("EUR", LookupOutcome::Rates),
            ],
        }
    }

    /// Bases are cached independently.
    fn different_bases() -> Self {
        Self {
            name: "different-bases".to_string(),
            description: "EUR and USD occupy independent cache entries".to_string(),
            expiration_secs: 5,
            steps: vec![
                Self::cached("EUR", false),
                Self::cached("USD", false),
                Self::lookup("EUR", LookupOutcome::Rates),
                Self::lookup("USD", LookupOutcome::Rates),
                Self::cached("EUR", true),
                Self::cached("USD", true),
            ],
        }
    }

    /// Entries disappear once older than the interval.
    fn expiration() -> Self {
        Self {
            name: "expiration".to_string(),
            description: "Entry is live at 3s and gone at 6s under a 5s interval".to_string(),
            expiration_secs: 5,
            steps: vec![
                Self::lookup("EUR", LookupOutcome::Rates),
                Self::cached("EUR", true),
                ScenarioStep::Wait { millis: 3000 },
                Self::cached("EUR", true),
                ScenarioStep::Wait { millis: 3000 },
                Self::cached("EUR", false),
            ],
        }
    }

    /// Sweeping keeps fresh entries and drops stale ones.
    fn cleanup() -> Self {
        Self {
            name: "cleanup".to_string(),
            description: "Clean keeps fresh entries, drops stale ones, clear drops all".to_string(),
            expiration_secs: 5,
            steps: vec![
                Self::lookup("EUR", LookupOutcome::Rates),
                ScenarioStep::Clean,
                Self::cached("EUR", true),
                ScenarioStep::Wait { millis: 6000 },
                ScenarioStep::Clean,
                Self::cached("EUR", false),
                Self::lookup("EUR", LookupOutcome::Rates),
                ScenarioStep::Clear,
                Self::cached("EUR", false),
            ],
        }
    }

    /// A shorter interval applies to subsequent checks.
    fn change_expiration() -> Self {
        Self {
            name: "change-expiration".to_string(),
            description: "Shrinking the interval from 5s to 2s shortens entry lifetime".to_string(),
            expiration_secs: 5,
            steps: vec![
                Self::lookup("EUR", LookupOutcome::Rates),
                ScenarioStep::Wait { millis: 3000 },
                Self::cached("EUR", true),
                ScenarioStep::SetExpiration { seconds: 2 },
                Self::cached("EUR", false),
                Self::lookup("EUR", LookupOutcome::Rates),
                ScenarioStep::Wait { millis: 3000 },
                Self::cached("EUR", false),
            ],
        }
    }

    /// Unknown bases return nothing and are not cached.
    fn invalid_currency() -> Self {
        Self {
            name: "invalid-currency".to_string(),
            description: "Unknown base yields no rates and no cache entry".to_string(),
            expiration_secs: 5,
            steps: vec![
                Self::lookup("TEST", LookupOutcome::NotFound),
                Self::cached("TEST", false),
            ],
        }
    }
}
