//! Domain events reflecting admission state changes.
//!
//! Every mutation (and every rejected confirmation) emits an
//! [`AdmissionEvent`] through the [`super::EventBus`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, RequestId};

/// Why a confirmation attempt left the request on the waiting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Submitted code did not match.
    IncorrectCode,
    /// Promotion would have exceeded the event capacity.
    EventFull,
}

/// Domain event emitted after every admission state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AdmissionEvent {
    /// A new event was created.
    EventCreated {
        /// Event identifier.
        event_id: EventId,
        /// Display name.
        name: String,
        /// Capacity in party-size units.
        max_participants: u32,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An event and all of its requests were deleted.
    EventDeleted {
        /// Event identifier.
        event_id: EventId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A request entered the waiting list.
    JoinRequested {
        /// Event identifier.
        event_id: EventId,
        /// New request identifier.
        request_id: RequestId,
        /// Party size of the request.
        party_size: u32,
        /// End of the verification window.
        expiration: DateTime<Utc>,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A request was promoted to the confirmed list.
    RequestConfirmed {
        /// Event identifier.
        event_id: EventId,
        /// Request identifier.
        request_id: RequestId,
        /// Party size of the request.
        party_size: u32,
        /// Confirmed occupancy after promotion.
        confirmed_total: u64,
        /// Promotion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A confirmation attempt failed but the request stays retryable.
    ConfirmationRejected {
        /// Event identifier.
        event_id: EventId,
        /// Request identifier.
        request_id: RequestId,
        /// Rejection cause.
        reason: RejectionReason,
        /// Attempt timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A request's verification window elapsed.
    RequestExpired {
        /// Event identifier.
        event_id: EventId,
        /// Request identifier.
        request_id: RequestId,
        /// Timestamp at which expiry was recorded.
        timestamp: DateTime<Utc>,
    },
}

impl AdmissionEvent {
    /// Returns the event ID associated with this domain event.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::EventCreated { event_id, .. }
            | Self::EventDeleted { event_id, .. }
            | Self::JoinRequested { event_id, .. }
            | Self::RequestConfirmed { event_id, .. }
            | Self::ConfirmationRejected { event_id, .. }
            | Self::RequestExpired { event_id, .. } => *event_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::EventCreated { .. } => "event_created",
            Self::EventDeleted { .. } => "event_deleted",
            Self::JoinRequested { .. } => "join_requested",
            Self::RequestConfirmed { .. } => "request_confirmed",
            Self::ConfirmationRejected { .. } => "confirmation_rejected",
            Self::RequestExpired { .. } => "request_expired",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn rejection_serializes_with_tag_and_reason() {
        let event = AdmissionEvent::ConfirmationRejected {
            event_id: EventId::new(),
            request_id: RequestId::new(),
            reason: RejectionReason::EventFull,
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_string(&event) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"event_type\":\"confirmation_rejected\""));
        assert!(json.contains("\"reason\":\"event_full\""));
    }

    #[test]
    fn event_id_accessor() {
        let id = EventId::new();
        let event = AdmissionEvent::EventDeleted {
            event_id: id,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_id(), id);
        assert_eq!(event.event_type_str(), "event_deleted");
    }
}
