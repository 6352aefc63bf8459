//! Participant handlers: join, verify, and listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateParticipantRequest, ParticipantListResponse, ParticipantResponse, ParticipantView,
    RoleQuery, VerifyRequest,
};
use crate::app_state::AppState;
use crate::domain::{EventId, NewParticipant, RequestId, Role};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events/{id}/participants`: Join the waiting list.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] for an unknown event, or
/// [`GatewayError::InvalidRequest`] on invalid input.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/participants",
    tag = "Participants",
    summary = "Request to join an event",
    description = "Puts the party on the waiting list and emails a 4-digit verification code. Capacity is not checked here.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = CreateParticipantRequest,
    responses(
        (status = 201, description = "Request created", body = ParticipantResponse),
        (status = 400, description = "Invalid name, email or party size", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn create_participant(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CreateParticipantRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let input = NewParticipant::parse(&req.name, &req.email, req.party_size)?;
    let request = state
        .admission
        .request_join(EventId::from_uuid(id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(ParticipantResponse::ok(request))))
}

/// `GET /events/{id}/participants`: List one of the event's lists.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/participants",
    tag = "Participants",
    summary = "List participants",
    description = "Returns the confirmed list by default, or the waiting list with `role=waiting`.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        RoleQuery,
    ),
    responses(
        (status = 200, description = "Participant list", body = ParticipantListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let role = query.role.unwrap_or(Role::Confirmed);
    let data = state
        .admission
        .list_participants(EventId::from_uuid(id), role)
        .await?
        .into_iter()
        .map(ParticipantView::from)
        .collect();
    Ok(Json(ParticipantListResponse { role, data }))
}

/// `GET /participants/{id}`: Get one participant request.
///
/// # Errors
///
/// Returns [`GatewayError::RequestNotFound`] if the request does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/participants/{id}",
    tag = "Participants",
    summary = "Get participant request",
    params(
        ("id" = uuid::Uuid, Path, description = "Participant request UUID"),
    ),
    responses(
        (status = 200, description = "Participant request", body = ParticipantView),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = state
        .admission
        .get_participant(RequestId::from_uuid(id))
        .await?;
    Ok(Json(ParticipantView::from(request)))
}

/// `POST /participants/{id}/verify`: Confirm a request with its code.
///
/// # Errors
///
/// Returns [`GatewayError::IncorrectCode`], [`GatewayError::RequestExpired`]
/// or [`GatewayError::EventFull`] when the request cannot be promoted, and
/// [`GatewayError::RequestNotFound`] for an unknown id.
#[utoipa::path(
    post,
    path = "/api/v1/participants/{id}/verify",
    tag = "Participants",
    summary = "Verify a participant request",
    description = "Checks the code, the expiration and the event capacity, then moves the party to the confirmed list.",
    params(
        ("id" = uuid::Uuid, Path, description = "Participant request UUID"),
    ),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Request confirmed", body = ParticipantResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "This event is complete.", body = ErrorResponse),
        (status = 410, description = "Your request has expired please try again.", body = ErrorResponse),
        (status = 422, description = "Incorrect code.", body = ErrorResponse),
    )
)]
pub async fn verify_participant(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = state
        .admission
        .confirm(RequestId::from_uuid(id), &req.code)
        .await?;
    Ok(Json(ParticipantResponse::ok(request)))
}

/// Participant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{id}/participants",
            post(create_participant).get(list_participants),
        )
        .route("/participants/{id}", get(get_participant))
        .route("/participants/{id}/verify", post(verify_participant))
}
