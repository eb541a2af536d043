//! TTL Cache Store Module
//!
//! String-keyed map of values with per-entry TTL and lazy expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheItem, CacheStats, DEFAULT_TTL};
use crate::clock::{system_clock, Clock};

// == Lookup ==
/// Result of [`TtlCache::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Live entry
    Fresh(T),
    /// Expired entry that has not been swept yet
    Stale(T),
    /// No entry under the key
    Missing,
}

impl<T> Lookup<T> {
    /// Returns the data regardless of freshness.
    pub fn into_any(self) -> Option<T> {
        match self {
            Lookup::Fresh(data) | Lookup::Stale(data) => Some(data),
            Lookup::Missing => None,
        }
    }
}

// == TTL Cache ==
/// In-memory cache with lazy TTL expiration.
///
/// Expired entries are dropped when they are read through [`TtlCache::get`]
/// or [`TtlCache::has`], or when [`TtlCache::cleanup`] sweeps the map.
/// There is no capacity bound.
#[derive(Debug)]
pub struct TtlCache<T> {
    /// Key-value storage
    entries: HashMap<String, CacheItem<T>>,
    /// TTL applied when `set` gets none
    default_ttl: Duration,
    /// Performance statistics
    stats: CacheStats,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    // == Constructor ==
    /// Creates an empty cache on the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, system_clock())
    }

    /// Creates an empty cache reading time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `data` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: impl Into<String>, data: T, ttl: Option<Duration>) {
        let expiry = ttl.unwrap_or(self.default_ttl).as_millis() as u64;
        let item = CacheItem::new(data, self.clock.now_ms(), expiry);
        self.entries.insert(key.into(), item);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value under `key` if it is live.
    ///
    /// An expired entry is removed and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<T> {
        if self.evict_if_expired(key) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(item) => {
                self.stats.record_hit();
                Some(item.data.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns whether a live entry exists under `key`, evicting it if expired.
    pub fn has(&mut self, key: &str) -> bool {
        !self.evict_if_expired(key) && self.entries.contains_key(key)
    }

    // == Lookup ==
    /// Reads an entry without evicting it, reporting whether it is fresh.
    ///
    /// Fresh results count as hits, everything else as a miss.
    pub fn lookup(&mut self, key: &str) -> Lookup<T> {
        let now = self.clock.now_ms();
        let result = match self.entries.get(key) {
            Some(item) if item.is_live(now) => Lookup::Fresh(item.data.clone()),
            Some(item) => Lookup::Stale(item.data.clone()),
            None => Lookup::Missing,
        };

        match result {
            Lookup::Fresh(_) => self.stats.record_hit(),
            _ => self.stats.record_miss(),
        }
        result
    }

    // == Delete ==
    /// Removes an entry. Returns whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, item| item.is_live(now));

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops the entry under `key` if it has expired. Returns whether it did.
    fn evict_if_expired(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .get(key)
            .is_some_and(|item| item.is_expired(now));

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        expired
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
