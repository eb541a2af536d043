//! Sliding Window Limiter
//!
//! Each key keeps the timestamps of its accepted requests. A request counts
//! against the quota while it is younger than the window, so capacity frees
//! up one request at a time rather than all at once on a bucket boundary.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{system_clock, Clock};

// == Rate Limiter ==
/// Caps each key at `max_requests` within any trailing `window`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Accepted request timestamps per key, oldest first
    requests: HashMap<String, VecDeque<u64>>,
    max_requests: usize,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter on the system clock.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self::with_clock(max_requests, window, system_clock())
    }

    /// Creates a limiter reading time from `clock`.
    pub fn with_clock(max_requests: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests: HashMap::new(),
            max_requests,
            window_ms: window.as_millis() as u64,
            clock,
        }
    }

    // == Is Allowed ==
    /// Records a request for `key` if it is under quota.
    ///
    /// Returns false without recording anything when the key is at its cap.
    pub fn is_allowed(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let window_ms = self.window_ms;
        let history = self.requests.entry(key.to_string()).or_default();
        prune(history, now, window_ms);

        if history.len() < self.max_requests {
            history.push_back(now);
            true
        } else {
            false
        }
    }

    // == Remaining Requests ==
    /// Returns how many more requests `key` may make right now.
    pub fn remaining_requests(&self, key: &str) -> usize {
        let now = self.clock.now_ms();
        let used = self.requests.get(key).map_or(0, |history| {
            history
                .iter()
                .filter(|&&ts| in_window(ts, now, self.window_ms))
                .count()
        });
        self.max_requests.saturating_sub(used)
    }

    // == Reset ==
    /// Forgets all recorded requests for `key`.
    pub fn reset(&mut self, key: &str) {
        self.requests.remove(key);
    }

    // == Cleanup ==
    /// Prunes every key and drops keys with no requests left in the window.
    ///
    /// Returns the number of keys removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let window_ms = self.window_ms;
        let before = self.requests.len();

        self.requests.retain(|_, history| {
            prune(history, now, window_ms);
            !history.is_empty()
        });
        before - self.requests.len()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.requests.len()
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

fn in_window(timestamp: u64, now: u64, window_ms: u64) -> bool {
    now.saturating_sub(timestamp) < window_ms
}

/// Drops timestamps that have left the window. History is oldest first.
fn prune(history: &mut VecDeque<u64>, now: u64, window_ms: u64) {
    while let Some(&oldest) = history.front() {
        if in_window(oldest, now, window_ms) {
            break;
        }
        history.pop_front();
    }
}
