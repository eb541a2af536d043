//! Cache Module
//!
//! Provides an in-memory key-value cache with lazy TTL expiration.

mod entry;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::CacheItem;
pub use stats::CacheStats;
pub use store::{Lookup, TtlCache};

// == Public Constants ==
/// TTL applied when a write does not specify one (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
