//! Cache Item Module
//!
//! A stored value together with the time it was written and its TTL.

// == Cache Item ==
/// Represents a single cached value with its write time and lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem<T> {
    /// The stored value
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Lifetime in milliseconds
    pub expiry: u64,
}

impl<T> CacheItem<T> {
    // == Constructor ==
    /// Creates a new item written at `now_ms` that lives for `expiry_ms`.
    pub fn new(data: T, now_ms: u64, expiry_ms: u64) -> Self {
        Self {
            data,
            timestamp: now_ms,
            expiry: expiry_ms,
        }
    }

    // == Is Live ==
    /// Checks whether the item is still live at `now_ms`.
    ///
    /// Boundary condition: an item is live while `now - timestamp <= expiry`,
    /// so it is still served at exactly `expiry` milliseconds of age and
    /// expires one millisecond later.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) <= self.expiry
    }

    /// Inverse of [`CacheItem::is_live`].
    pub fn is_expired(&self, now_ms: u64) -> bool {
        !self.is_live(now_ms)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        let deadline = self.timestamp.saturating_add(self.expiry);
        deadline.saturating_sub(now_ms)
    }
}
