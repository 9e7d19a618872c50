//! RateKeeper Common Types
//!
//! This crate contains shared types used across the RateKeeper workspace,
//! including the error type, currency codes, the exchange rate snapshot
//! model and time utilities.

pub mod error;
pub mod monetary;
pub mod rates;
pub mod time;

pub use error::*;
pub use monetary::*;
pub use rates::*;
pub use time::*;
