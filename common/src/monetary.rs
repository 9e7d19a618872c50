//! Currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RateKeeperError, Result};

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Parse a caller-supplied code, rejecting blank input.
    pub fn parse(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(RateKeeperError::invalid_field(
                "base",
                "currency code must not be empty",
            ));
        }
        Ok(Self::new(trimmed))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let currency = Currency::parse(" eur ").unwrap();
        assert_eq!(currency, Currency::eur());
        assert_eq!(currency.code(), "EUR");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(Currency::parse("").unwrap_err().is_invalid_argument());
        assert!(Currency::parse("   ").unwrap_err().is_invalid_argument());
    }
}
