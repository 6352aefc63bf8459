//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use crate::api::dto::{
    CreateEventRequest, CreateParticipantRequest, EventListResponse, EventResponse,
    ParticipantListResponse, ParticipantResponse, ParticipantView, VerifyRequest,
};
use crate::api::handlers::{events, participants, system};
use crate::domain::{EventId, RequestId, RequestState, Role};
use crate::error::{ErrorBody, ErrorResponse};

/// Aggregated OpenAPI schema served at `/api/v1/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "waitlist-gateway",
        version = "v1",
        description = "Event registration with email-verified waitlist admission"
    ),
    paths(
        system::health_handler,
        events::create_event,
        events::list_events,
        events::get_event,
        events::delete_event,
        participants::create_participant,
        participants::list_participants,
        participants::get_participant,
        participants::verify_participant
    ),
    components(schemas(
        system::HealthResponse,
        CreateEventRequest,
        EventResponse,
        EventListResponse,
        CreateParticipantRequest,
        VerifyRequest,
        ParticipantView,
        ParticipantResponse,
        ParticipantListResponse,
        EventId,
        RequestId,
        RequestState,
        Role,
        ErrorResponse,
        ErrorBody
    )),
    tags(
        (name = "Events", description = "Event lifecycle"),
        (name = "Participants", description = "Waiting list and verification"),
        (name = "System", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/health",
            "/api/v1/events",
            "/api/v1/events/{id}",
            "/api/v1/events/{id}/participants",
            "/api/v1/participants/{id}",
            "/api/v1/participants/{id}/verify",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
