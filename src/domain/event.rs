//! Events that attendees can join.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::EventId;
use crate::error::GatewayError;

/// Maximum length of an event name, in characters.
pub const MAX_EVENT_NAME_LEN: usize = 64;

/// An event with a capacity measured in party-size units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Capacity in party-size units, not head count.
    pub max_participants: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new event with a fresh identifier.
    #[must_use]
    pub fn new(name: String, max_participants: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            name,
            max_participants,
            created_at: now,
        }
    }
}

/// Validated input for event creation.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Display name, 1 to [`MAX_EVENT_NAME_LEN`] characters.
    pub name: String,
    /// Capacity in party-size units.
    pub max_participants: u32,
}

impl NewEvent {
    /// Validates raw input. `max_participants` arrives signed so that
    /// negative values can be rejected rather than wrapped.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] on an empty or overlong
    /// name, or a negative or out-of-range capacity.
    pub fn parse(name: &str, max_participants: i64) -> Result<Self, GatewayError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "event name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_EVENT_NAME_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "event name must be at most {MAX_EVENT_NAME_LEN} characters"
            )));
        }
        let max_participants = u32::try_from(max_participants).map_err(|_| {
            GatewayError::InvalidRequest(format!(
                "max_participants must be between 0 and {}, got {max_participants}",
                u32::MAX
            ))
        })?;
        Ok(Self {
            name: name.to_string(),
            max_participants,
        })
    }
}

/// Event together with its current occupancy in both roles.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventSummary {
    /// The event record.
    #[serde(flatten)]
    pub event: Event,
    /// Sum of party sizes of confirmed participants.
    pub participants_count: u64,
    /// Sum of party sizes still on the waiting list.
    pub waiting_participants_count: u64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_zero_capacity() {
        let Ok(input) = NewEvent::parse("Closed rehearsal", 0) else {
            panic!("zero capacity should be valid");
        };
        assert_eq!(input.max_participants, 0);
    }

    #[test]
    fn parse_rejects_negative_capacity() {
        let result = NewEvent::parse("Concert", -1);
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn parse_rejects_blank_and_long_names() {
        assert!(NewEvent::parse("   ", 10).is_err());
        let long = "x".repeat(MAX_EVENT_NAME_LEN + 1);
        assert!(NewEvent::parse(&long, 10).is_err());
    }

    #[test]
    fn parse_trims_name() {
        let Ok(input) = NewEvent::parse("  Meetup ", 5) else {
            panic!("valid input rejected");
        };
        assert_eq!(input.name, "Meetup");
    }

    #[test]
    fn summary_flattens_event_fields() {
        let summary = EventSummary {
            event: Event::new("Meetup".to_string(), 10, Utc::now()),
            participants_count: 4,
            waiting_participants_count: 0,
        };
        let json = serde_json::to_value(&summary).unwrap_or_default();
        assert_eq!(json["name"], "Meetup");
        assert_eq!(json["max_participants"], 10);
        assert_eq!(json["participants_count"], 4);
        assert_eq!(json["waiting_participants_count"], 0);
    }
}
