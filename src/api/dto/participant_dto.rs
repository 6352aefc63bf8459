//! Participant DTOs for join, verify, and listing.
//!
//! Neither the verification code nor the requester's email address leaves
//! the server through these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{EventId, ParticipantRequest, RequestId, RequestState, Role};

/// Request body for `POST /events/{id}/participants`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateParticipantRequest {
    /// Requester display name.
    pub name: String,
    /// Address the verification code is mailed to.
    pub email: String,
    /// Number of people in the party; must be positive.
    pub party_size: i64,
}

/// Request body for `POST /participants/{id}/verify`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// The 4-digit code from the verification email.
    pub code: String,
}

/// Query parameters for `GET /events/{id}/participants`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    /// Which list to return. Defaults to `confirmed`.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Public view of a join request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantView {
    /// Request identifier.
    pub id: RequestId,
    /// Event the request belongs to.
    pub event_id: EventId,
    /// Requester display name.
    pub name: String,
    /// Party size.
    pub party_size: u32,
    /// Which list the request is on.
    pub role: Role,
    /// Lifecycle state.
    pub state: RequestState,
    /// Last instant at which the code is accepted.
    pub expiration: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Promotion timestamp, if confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<ParticipantRequest> for ParticipantView {
    fn from(request: ParticipantRequest) -> Self {
        Self {
            role: request.role(),
            id: request.id,
            event_id: request.event_id,
            name: request.name,
            party_size: request.party_size,
            state: request.state,
            expiration: request.expiration,
            created_at: request.created_at,
            confirmed_at: request.confirmed_at,
        }
    }
}

/// Response body for join and verify.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantResponse {
    /// Always `true`; failures use the error body instead.
    pub ok: bool,
    /// The affected request.
    pub participant: ParticipantView,
}

impl ParticipantResponse {
    /// Wraps a request in a successful response.
    #[must_use]
    pub fn ok(request: ParticipantRequest) -> Self {
        Self {
            ok: true,
            participant: request.into(),
        }
    }
}

/// List response for `GET /events/{id}/participants`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantListResponse {
    /// Role the list was filtered by.
    pub role: Role,
    /// Requests, oldest first.
    pub data: Vec<ParticipantView>,
}
