//! Storage for events and participant requests.
//!
//! [`AdmissionStore`] is the only way the service reads or mutates records.
//! Two backends exist: [`memory::MemoryStore`] (tests, and deployments with
//! persistence disabled) and [`crate::persistence::PostgresStore`].
//!
//! The store owns the capacity-checked promotion ([`AdmissionStore::try_promote`])
//! because only the backend can make the read-compare-write atomic per event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Event, EventId, ParticipantRequest, RequestId, Role};
use crate::error::GatewayError;

pub mod memory;

pub use memory::MemoryStore;

/// Outcome of a capacity-checked promotion attempt.
#[derive(Debug, Clone)]
pub enum Promotion {
    /// The request moved to the confirmed list.
    Promoted {
        /// Updated record.
        request: ParticipantRequest,
        /// Confirmed occupancy after promotion.
        confirmed_total: u64,
    },
    /// The request had already been confirmed; nothing changed.
    AlreadyConfirmed(ParticipantRequest),
    /// The request is expired.
    Expired {
        /// Record in its expired state.
        request: ParticipantRequest,
        /// `true` if this call performed the transition.
        newly_expired: bool,
    },
    /// Promotion would exceed capacity; the request stays waiting.
    Full {
        /// Unchanged record.
        request: ParticipantRequest,
        /// Confirmed occupancy at decision time.
        confirmed_total: u64,
    },
}

/// Create/read/update access to events and participant requests.
///
/// Implementations must serialize [`AdmissionStore::try_promote`] calls
/// that target the same event, and must not serialize calls for
/// different events.
#[async_trait]
pub trait AdmissionStore: Send + Sync + std::fmt::Debug {
    /// Persists a new event.
    async fn insert_event(&self, event: Event) -> Result<Event, GatewayError>;

    /// Loads an event by id.
    async fn get_event(&self, id: EventId) -> Result<Option<Event>, GatewayError>;

    /// Lists all events, oldest first.
    async fn list_events(&self) -> Result<Vec<Event>, GatewayError>;

    /// Deletes an event and all of its requests. Returns `false` if the
    /// event did not exist.
    async fn delete_event(&self, id: EventId) -> Result<bool, GatewayError>;

    /// Persists a new waiting request.
    ///
    /// Fails with [`GatewayError::EventNotFound`] if the event is gone.
    async fn insert_request(
        &self,
        request: ParticipantRequest,
    ) -> Result<ParticipantRequest, GatewayError>;

    /// Loads a request by id.
    async fn get_request(&self, id: RequestId) -> Result<Option<ParticipantRequest>, GatewayError>;

    /// Lists the requests of an event in one role, oldest first.
    async fn list_requests(
        &self,
        event_id: EventId,
        role: Role,
    ) -> Result<Vec<ParticipantRequest>, GatewayError>;

    /// Sums party sizes of the event's requests in `role`; `0` when empty.
    async fn occupancy(&self, event_id: EventId, role: Role) -> Result<u64, GatewayError>;

    /// Atomically re-checks state and expiry, computes confirmed occupancy,
    /// and promotes the request if its party fits.
    ///
    /// Fails with [`GatewayError::RequestNotFound`] if the request is gone.
    async fn try_promote(
        &self,
        id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<Promotion, GatewayError>;

    /// Marks a waiting request expired. Returns the updated record, or
    /// `None` if the request is missing or no longer waiting.
    async fn mark_expired(&self, id: RequestId) -> Result<Option<ParticipantRequest>, GatewayError>;

    /// Marks every waiting request whose expiration is before `now` as
    /// expired and returns them.
    async fn expire_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ParticipantRequest>, GatewayError>;

    /// Verifies the backend is reachable.
    async fn health_check(&self) -> Result<(), GatewayError>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}
