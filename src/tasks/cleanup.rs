//! Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries and idle
//! rate limiter keys so neither map grows without bound.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::AppState;

/// Spawns a background task that periodically runs [`AppState::cleanup`].
///
/// # Arguments
/// * `state` - Shared application state
/// * `interval` - Time between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(state: AppState, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = state.cleanup().await;
            if report.expired_entries > 0 || report.idle_limiter_keys > 0 {
                info!(
                    "Cleanup: removed {} expired entries and {} idle limiter keys",
                    report.expired_entries, report.idle_limiter_keys
                );
            } else {
                debug!("Cleanup: nothing to remove");
            }
        }
    })
}
