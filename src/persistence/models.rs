//! Database rows for events and participant requests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Event, EventId, ParticipantRequest, RequestId, RequestState, VerificationCode,
};
use crate::error::GatewayError;

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Capacity (non-negative by table constraint).
    pub max_participants: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = GatewayError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let max_participants = u32::try_from(row.max_participants).map_err(|_| {
            GatewayError::PersistenceError(format!(
                "event {} has negative max_participants {}",
                row.id, row.max_participants
            ))
        })?;
        Ok(Self {
            id: EventId::from_uuid(row.id),
            name: row.name,
            max_participants,
            created_at: row.created_at,
        })
    }
}

/// A row from the `participant_requests` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RequestRow {
    /// Request identifier.
    pub id: Uuid,
    /// Owning event.
    pub event_id: Uuid,
    /// Requester name.
    pub name: String,
    /// Requester email.
    pub email: String,
    /// Party size (positive by table constraint).
    pub party_size: i32,
    /// Verification code.
    pub code: String,
    /// End of the verification window.
    pub expiration: DateTime<Utc>,
    /// Lifecycle state string.
    pub state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Promotion timestamp.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for ParticipantRequest {
    type Error = GatewayError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let state = RequestState::parse(&row.state).ok_or_else(|| {
            GatewayError::PersistenceError(format!(
                "request {} has unknown state {:?}",
                row.id, row.state
            ))
        })?;
        let party_size = u32::try_from(row.party_size).map_err(|_| {
            GatewayError::PersistenceError(format!(
                "request {} has negative party_size {}",
                row.id, row.party_size
            ))
        })?;
        Ok(Self {
            id: RequestId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            name: row.name,
            email: row.email,
            party_size,
            code: VerificationCode::from_stored(row.code),
            expiration: row.expiration,
            state,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
        })
    }
}
