//! Queue between the admission path and the notifier.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Notifier, VerificationMessage};

/// Fire-and-forget handle for queueing verification messages.
///
/// Cloning is cheap; all clones feed the same worker. The worker exits
/// once every clone has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<VerificationMessage>,
}

impl NotificationDispatcher {
    /// Spawns the delivery worker on the current tokio runtime.
    ///
    /// `capacity` bounds the number of queued messages (minimum 1).
    #[must_use]
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(receiver, notifier));
        (Self { sender }, worker)
    }

    /// Queues a message without waiting. Returns `false` if it was dropped
    /// because the queue is full or the worker has stopped.
    pub fn dispatch(&self, message: VerificationMessage) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::warn!(
                    request_id = %message.request_id,
                    "notification queue full, verification email dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                tracing::warn!(
                    request_id = %message.request_id,
                    "notification worker stopped, verification email dropped"
                );
                false
            }
        }
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<VerificationMessage>, notifier: Arc<dyn Notifier>) {
    while let Some(message) = receiver.recv().await {
        if let Err(err) = notifier.notify(&message).await {
            tracing::warn!(
                request_id = %message.request_id,
                error = %err,
                "verification email failed"
            );
        }
    }
    tracing::debug!("notification worker stopped");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventId, RequestId};
    use crate::notify::RecordingNotifier;

    fn message(code: &str) -> VerificationMessage {
        VerificationMessage {
            to: "ken@example.com".to_string(),
            request_id: RequestId::new(),
            event_id: EventId::new(),
            code: code.to_string(),
            name: "Ken".to_string(),
            party_size: 1,
            event_name: "Unix night".to_string(),
        }
    }

    #[tokio::test]
    async fn worker_delivers_queued_messages() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, worker) =
            NotificationDispatcher::spawn(Arc::clone(&notifier) as Arc<dyn Notifier>, 8);

        assert!(dispatcher.dispatch(message("1111")));
        assert!(dispatcher.dispatch(message("2222")));
        drop(dispatcher);
        let _ = worker.await;

        let codes: Vec<_> = notifier.sent().await.into_iter().map(|m| m.code).collect();
        assert_eq!(codes, vec!["1111".to_string(), "2222".to_string()]);
    }

    #[tokio::test]
    async fn delivery_failures_do_not_stop_the_worker() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let (dispatcher, worker) =
            NotificationDispatcher::spawn(Arc::clone(&notifier) as Arc<dyn Notifier>, 8);

        assert!(dispatcher.dispatch(message("1111")));
        assert!(dispatcher.dispatch(message("2222")));
        drop(dispatcher);
        let _ = worker.await;

        assert_eq!(notifier.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn dispatch_reports_closed_worker() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (dispatcher, worker) = NotificationDispatcher::spawn(notifier, 1);
        worker.abort();
        let _ = worker.await;
        assert!(!dispatcher.dispatch(message("3333")));
    }
}
