//! Fan-out of admission state changes.
//!
//! The admission service publishes one [`AdmissionEvent`] per state change.
//! The audit log is the standing subscriber; tests subscribe to watch
//! transitions happen.

use tokio::sync::broadcast;

use super::AdmissionEvent;

/// Cloneable publisher of [`AdmissionEvent`]s.
///
/// Holds the sending half of a bounded `tokio::sync::broadcast` ring
/// (`EVENT_BUS_CAPACITY`). A subscriber that falls more than a full ring
/// behind misses the oldest events and is told how many it skipped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AdmissionEvent>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per
    /// subscriber. A capacity of `0` is raised to `1`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends `event` to every current subscriber and returns how many
    /// there were. With nobody listening the event is discarded.
    pub fn publish(&self, event: AdmissionEvent) -> usize {
        let event_type = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event_type, delivered, "admission event published");
        delivered
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AdmissionEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::EventId;
    use chrono::Utc;

    fn make_event(event_id: EventId) -> AdmissionEvent {
        AdmissionEvent::EventCreated {
            event_id,
            name: "Launch party".to_string(),
            max_participants: 40,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        assert_eq!(bus.publish(make_event(EventId::new())), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let id = EventId::new();
        assert_eq!(bus.publish(make_event(id)), 2);

        let Ok(e1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(e2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(e1.event_id(), id);
        assert_eq!(e2.event_id(), id);
    }

    #[tokio::test]
    async fn zero_capacity_still_delivers() {
        let bus = EventBus::new(0);
        let mut rx = bus.subscribe();
        let id = EventId::new();
        assert_eq!(bus.publish(make_event(id)), 1);
        let Ok(event) = rx.recv().await else {
            panic!("no event");
        };
        assert_eq!(event.event_id(), id);
    }

    #[tokio::test]
    async fn lagging_subscriber_learns_how_many_it_missed() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        bus.publish(make_event(EventId::new()));
        let last = EventId::new();
        bus.publish(make_event(last));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        let Ok(event) = rx.recv().await else {
            panic!("latest event lost");
        };
        assert_eq!(event.event_id(), last);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        let rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        drop(rx);
        assert_eq!(bus.receiver_count(), 0);
    }
}
