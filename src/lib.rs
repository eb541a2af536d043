//! Storefront Cache - caching, rate limiting and retrying document access
//!
//! Sits between a B2B grocery storefront and its document database: reads
//! are served from a TTL cache, store calls are throttled by a sliding-window
//! limiter, and every call is retried with exponential backoff.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod models;
pub mod retry;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use config::Config;
pub use error::{GatewayError, Result};
pub use gateway::DocumentGateway;
pub use limiter::RateLimiter;
pub use retry::{with_retry, RetryPolicy};
pub use tasks::spawn_cleanup_task;
