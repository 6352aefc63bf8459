//! Event DTOs for create, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Event, EventId, EventSummary};

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Display name (1-64 characters).
    pub name: String,
    /// Capacity in party-size units; must not be negative.
    pub max_participants: i64,
}

/// Event with its current occupancy.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    /// Event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Capacity in party-size units.
    pub max_participants: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Sum of confirmed party sizes.
    pub participants_count: u64,
    /// Sum of waiting (and expired) party sizes.
    pub waiting_participants_count: u64,
}

impl From<EventSummary> for EventResponse {
    fn from(summary: EventSummary) -> Self {
        Self {
            id: summary.event.id,
            name: summary.event.name,
            max_participants: summary.event.max_participants,
            created_at: summary.event.created_at,
            participants_count: summary.participants_count,
            waiting_participants_count: summary.waiting_participants_count,
        }
    }
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            max_participants: event.max_participants,
            created_at: event.created_at,
            participants_count: 0,
            waiting_participants_count: 0,
        }
    }
}

/// List response for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events, oldest first.
    pub data: Vec<EventResponse>,
    /// Number of events.
    pub total: usize,
}
