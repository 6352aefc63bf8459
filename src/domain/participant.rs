//! Participant requests and their lifecycle states.
//!
//! A [`ParticipantRequest`] is created `Waiting` on an event's waiting list
//! and mutated at most once more: promoted to `Confirmed`, or marked
//! `Expired` once its verification window has passed. Both are terminal.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::code::VerificationCode;
use super::{EventId, RequestId};
use crate::error::GatewayError;

/// Maximum length of a participant name, in characters.
pub const MAX_PARTICIPANT_NAME_LEN: usize = 64;

/// Maximum length of an email address.
pub const MAX_EMAIL_LEN: usize = 254;

/// Explicit lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// On the waiting list, awaiting a correct code.
    Waiting,
    /// Promoted into the confirmed list.
    Confirmed,
    /// Verification window elapsed before promotion.
    Expired,
}

impl RequestState {
    /// Returns the state as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
        }
    }

    /// Parses a stored state string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "confirmed" => Some(Self::Confirmed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Returns the association this state implies.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Confirmed => Role::Confirmed,
            Self::Waiting | Self::Expired => Role::Waiting,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two mutually exclusive associations a request has with its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Linked to the event's waiting list.
    Waiting,
    /// Linked to the event's confirmed participant list.
    Confirmed,
}

/// A join request, unifying "queue entry" and "participant".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// Event this request belongs to.
    pub event_id: EventId,
    /// Requester display name.
    pub name: String,
    /// Address the verification code was mailed to.
    pub email: String,
    /// Number of people this request represents.
    pub party_size: u32,
    /// Code the requester must submit.
    pub code: VerificationCode,
    /// Last instant at which confirmation is accepted.
    pub expiration: DateTime<Utc>,
    /// Lifecycle state.
    pub state: RequestState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set once when the request is promoted.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl ParticipantRequest {
    /// Creates a `Waiting` request with a fresh code that expires `ttl`
    /// after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if `now + ttl` is not a
    /// representable instant.
    pub fn new(
        event_id: EventId,
        input: NewParticipant,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, GatewayError> {
        let expiration = now.checked_add_signed(ttl).ok_or_else(|| {
            GatewayError::Internal(format!("request expiration out of range: {now} + {ttl}"))
        })?;
        Ok(Self {
            id: RequestId::new(),
            event_id,
            name: input.name,
            email: input.email,
            party_size: input.party_size,
            code: VerificationCode::generate(),
            expiration,
            state: RequestState::Waiting,
            created_at: now,
            confirmed_at: None,
        })
    }

    /// Returns the role implied by the current state.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.state.role()
    }

    /// Returns `true` once `now` is past the expiration instant.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration
    }
}

/// Validated input for a join request. Only [`NewParticipant::parse`]
/// builds one, so the party size is always positive.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    name: String,
    email: String,
    party_size: u32,
}

impl NewParticipant {
    /// Validates raw join input.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] on a blank or overlong
    /// name, a malformed email, or a non-positive party size.
    pub fn parse(name: &str, email: &str, party_size: i64) -> Result<Self, GatewayError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_PARTICIPANT_NAME_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "name must be between 1 and {MAX_PARTICIPANT_NAME_LEN} characters"
            )));
        }

        let email = email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed || email.len() > MAX_EMAIL_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid email address: {email}"
            )));
        }

        let party_size = u32::try_from(party_size)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                GatewayError::InvalidRequest(format!(
                    "party_size must be a positive integer, got {party_size}"
                ))
            })?;

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            party_size,
        })
    }

    /// Requester display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requester email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Positive party size.
    #[must_use]
    pub const fn party_size(&self) -> u32 {
        self.party_size
    }
}
