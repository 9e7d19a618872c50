//! Exchange rate snapshot model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::monetary::Currency;
use crate::time::Timestamp;

/// A set of exchange rates quoted against one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRates {
    /// Base currency the rates are quoted against.
    pub base: Currency,
    /// When the provider produced the snapshot (epoch seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: Timestamp,
    /// Business date of the snapshot.
    pub date: NaiveDate,
    /// Units of each quote currency per one unit of base.
    pub rates: BTreeMap<Currency, Decimal>,
}

impl CurrencyRates {
    /// Create a new snapshot.
    pub fn new(base: Currency, timestamp: Timestamp, rates: BTreeMap<Currency, Decimal>) -> Self {
        Self {
            base,
            date: timestamp.date_naive(),
            timestamp,
            rates,
        }
    }

    /// Get the rate for a quote currency. The base always quotes at one.
    pub fn rate_for(&self, currency: &Currency) -> Option<Decimal> {
        if *currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }

    /// Rate from one quote currency to another, crossed through the base.
    pub fn cross_rate(&self, from: &Currency, to: &Currency) -> Option<Decimal> {
        let from_rate = self.rate_for(from)?;
        let to_rate = self.rate_for(to)?;
        if from_rate.is_zero() {
            return None;
        }
        Some(to_rate / from_rate)
    }

    /// Convert an amount of base currency into `to`.
    pub fn convert(&self, amount: Decimal, to: &Currency) -> Option<Decimal> {
        self.rate_for(to).map(|rate| amount * rate)
    }

    /// Whether two snapshots describe the same provider quote.
    pub fn is_same_snapshot(&self, other: &CurrencyRates) -> bool {
        self.base == other.base && self.timestamp == other.timestamp
    }

    /// Number of quoted currencies.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if no rates are quoted.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl fmt::Display for CurrencyRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rates: {{", self.base)?;
        for (i, (currency, rate)) in self.rates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", currency, rate)?;
        }
        write!(f, "}}")
    }
}
