//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default cache TTL in milliseconds
    pub default_ttl_ms: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Store calls allowed per collection and direction within the window
    pub store_rate_limit: usize,
    /// Store rate limit window in milliseconds
    pub store_rate_window_ms: u64,
    /// HTTP requests allowed per client within the window
    pub client_rate_limit: usize,
    /// Client rate limit window in milliseconds
    pub client_rate_window_ms: u64,
    /// Attempts per store call, the first included
    pub retry_max_attempts: u32,
    /// Base retry backoff in milliseconds
    pub retry_base_delay_ms: u64,
    /// Upper bound of random jitter added to each backoff, in milliseconds
    pub retry_max_jitter_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL_MS` - Cache TTL in milliseconds (default: 300000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 300)
    /// - `STORE_RATE_LIMIT` - Store calls per window (default: 100)
    /// - `STORE_RATE_WINDOW_MS` - Store rate window (default: 60000)
    /// - `CLIENT_RATE_LIMIT` - Requests per client per window (default: 60)
    /// - `CLIENT_RATE_WINDOW_MS` - Client rate window (default: 60000)
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per store call (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - Base backoff (default: 1000)
    /// - `RETRY_MAX_JITTER_MS` - Backoff jitter bound (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            store_rate_limit: env_or("STORE_RATE_LIMIT", defaults.store_rate_limit),
            store_rate_window_ms: env_or("STORE_RATE_WINDOW_MS", defaults.store_rate_window_ms),
            client_rate_limit: env_or("CLIENT_RATE_LIMIT", defaults.client_rate_limit),
            client_rate_window_ms: env_or("CLIENT_RATE_WINDOW_MS", defaults.client_rate_window_ms),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            retry_max_jitter_ms: env_or("RETRY_MAX_JITTER_MS", defaults.retry_max_jitter_ms),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn store_rate_window(&self) -> Duration {
        Duration::from_millis(self.store_rate_window_ms)
    }

    pub fn client_rate_window(&self) -> Duration {
        Duration::from_millis(self.client_rate_window_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_jitter: Duration::from_millis(self.retry_max_jitter_ms),
            ..RetryPolicy::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl_ms: 300_000,
            cleanup_interval: 300,
            store_rate_limit: 100,
            store_rate_window_ms: 60_000,
            client_rate_limit: 60,
            client_rate_window_ms: 60_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_jitter_ms: 1000,
        }
    }
}

/// Parses an environment variable, falling back to `default` when it is
/// missing or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
