//! Rate Limiter Module
//!
//! Per-key sliding-window request limiting.

mod sliding;


pub use sliding::RateLimiter;
