//! RateKeeper Cache
//!
//! Concurrent key-value cache whose entries expire after a single,
//! mutable interval shared by every entry.
//!
//! # Features
//!
//! - Lazy eviction of expired entries on read
//! - Explicit sweep of all expired entries with [`ExpiringCache::clean`]
//! - Background sweeper task driven by tokio
//! - Interval changes apply retroactively to stored entries
//!
//! # Example
//!
//! ```rust,ignore
//! use ratekeeper_cache::ExpiringCache;
//!
//! let cache = ExpiringCache::with_expiration(5)?;
//! cache.put("EUR", rates)?;
//!
//! assert!(cache.contains_key("EUR")?);
//! let cached = cache.get("EUR")?;
//! ```

pub mod cache;
pub mod config;
pub mod sweeper;

pub use cache::{CacheStats, ExpiringCache, SharedCache};
pub use config::CacheConfig;
pub use sweeper::Sweeper;
