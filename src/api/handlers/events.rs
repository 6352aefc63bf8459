//! Event handlers: create, list, get, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CreateEventRequest, EventListResponse, EventResponse};
use crate::app_state::AppState;
use crate::domain::{EventId, NewEvent};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events`: Create an event.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on an empty or overlong name or
/// a negative capacity.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates an event with a fixed capacity measured in party-size units.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid name or capacity", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let input = NewEvent::parse(&req.name, req.max_participants)?;
    let event = state.admission.create_event(input).await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// `GET /events`: List events with their occupancy.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns every event, oldest first, with confirmed and waiting counts.",
    responses(
        (status = 200, description = "Event list", body = EventListResponse),
    )
)]
pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let data: Vec<EventResponse> = state
        .admission
        .list_events()
        .await?
        .into_iter()
        .map(EventResponse::from)
        .collect();
    let total = data.len();
    Ok(Json(EventListResponse { data, total }))
}

/// `GET /events/{id}`: Get one event with its occupancy.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event details",
    description = "Returns the event with freshly computed confirmed and waiting counts.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state.admission.get_event(EventId::from_uuid(id)).await?;
    Ok(Json(EventResponse::from(summary)))
}

/// `DELETE /events/{id}`: Delete an event and all of its requests.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    description = "Removes the event together with every participant request on either list.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state.admission.delete_event(EventId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Event management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/{id}", get(get_event).delete(delete_event))
}
