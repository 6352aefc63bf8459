//! Periodic expiry of overdue waiting requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::AdmissionService;

/// Spawns the expiry sweeper.
///
/// Returns `None` when `interval` is zero. Confirmation still expires
/// requests lazily without the sweeper.
pub fn spawn_expiry_sweeper(
    service: Arc<AdmissionService>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        tracing::info!("expiry sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match service.expire_overdue().await {
                Ok(expired) if expired.is_empty() => {}
                Ok(expired) => tracing::info!(count = expired.len(), "expired overdue requests"),
                Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
            }
        }
    }))
}
