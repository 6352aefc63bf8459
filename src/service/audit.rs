//! Audit log consumer for the event bus.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::{AdmissionEvent, EventBus};

/// Spawns a task that writes every admission event to the log.
///
/// The task ends when the bus is dropped.
pub fn spawn_audit_log(event_bus: &EventBus) -> JoinHandle<()> {
    let rx = event_bus.subscribe();
    tokio::spawn(run_audit_log(rx))
}

async fn run_audit_log(mut rx: broadcast::Receiver<AdmissionEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let payload = serde_json::to_string(&event).unwrap_or_default();
                tracing::info!(
                    target: "audit",
                    event_type = event.event_type_str(),
                    event_id = %event.event_id(),
                    %payload,
                    "admission event"
                );
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(target: "audit", lagged = n, "audit log lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!(target: "audit", "audit log stopped");
}
