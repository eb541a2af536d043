//! Retry Module
//!
//! Runs a store call with exponential backoff. Errors are sorted into three
//! groups: rejections that retrying cannot fix, quota exhaustion, and
//! everything else, which is treated as transient.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::error::{GatewayError, Result};
use crate::store::{ErrorCode, StoreResult};

/// Upper bound on the backoff applied to quota errors
pub const MAX_QUOTA_DELAY: Duration = Duration::from_secs(30);

// == Disposition ==
/// How the retry loop treats a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Fail at once
    Fatal,
    /// Back off with a capped delay, then retry
    Quota,
    /// Back off, then retry
    Transient,
}

/// Sorts a store error code into its retry disposition.
pub fn classify(code: ErrorCode) -> Disposition {
    match code {
        ErrorCode::PermissionDenied
        | ErrorCode::Unauthenticated
        | ErrorCode::InvalidArgument
        | ErrorCode::NotFound => Disposition::Fatal,
        ErrorCode::ResourceExhausted => Disposition::Quota,
        _ => Disposition::Transient,
    }
}

// == Retry Policy ==
/// Attempt budget and backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after every failure
    pub base_delay: Duration,
    /// Cap on the exponential part of quota backoff
    pub max_quota_delay: Duration,
    /// Upper bound of the uniform random jitter added to every delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_quota_delay: MAX_QUOTA_DELAY,
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Disables jitter, making delays deterministic.
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    /// Backoff before the attempt after `attempt` (zero-based), without jitter.
    pub fn backoff(&self, attempt: u32, disposition: Disposition) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.base_delay.saturating_mul(factor);
        match disposition {
            Disposition::Quota => delay.min(self.max_quota_delay),
            _ => delay,
        }
    }

    /// Full wait before the attempt after `attempt`: backoff plus jitter.
    pub fn delay(&self, attempt: u32, disposition: Disposition) -> Duration {
        self.backoff(attempt, disposition).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

// == With Retry ==
/// Runs `op` until it succeeds, fails fatally, or the attempt budget is spent.
///
/// Quota errors consume attempts like any other retryable error, so at most
/// `policy.max_attempts` calls are made.
///
/// # Errors
/// - [`GatewayError::Fatal`] on the first non-retryable error, with no delay
/// - [`GatewayError::RetriesExhausted`] wrapping the last error otherwise
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match op().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, attempt, "Store call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let disposition = classify(err.code);
        if disposition == Disposition::Fatal {
            error!(operation, code = %err.code, "Store call failed with non-retryable error");
            return Err(GatewayError::Fatal {
                operation: operation.to_string(),
                source: err,
            });
        }

        if attempt + 1 >= max_attempts {
            error!(operation, attempts = max_attempts, code = %err.code, "Store call retries exhausted");
            return Err(GatewayError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: max_attempts,
                source: err,
            });
        }

        let delay = policy.delay(attempt, disposition);
        warn!(
            operation,
            attempt = attempt + 1,
            code = %err.code,
            delay_ms = delay.as_millis() as u64,
            "Store call failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
