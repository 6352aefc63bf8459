//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "Incorrect code."
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the table on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Identifier of the missing resource on not-found errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                     |
/// |-----------|-----------------|---------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                 |
/// | 2000–2999 | Not Found       | 404 Not Found                   |
/// | 3000–3999 | Server          | 500 Internal Server Error       |
/// | 4000–4999 | Admission       | 422 / 410 / 409                 |
///
/// The admission messages are shown to end users verbatim.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(uuid::Uuid),

    /// Participant request with the given ID was not found.
    #[error("participant request not found: {0}")]
    RequestNotFound(uuid::Uuid),

    /// Submitted verification code does not match.
    #[error("Incorrect code.")]
    IncorrectCode,

    /// Verification window elapsed; the requester must join again.
    #[error("Your request has expired please try again.")]
    RequestExpired,

    /// Promotion would exceed the event capacity.
    #[error("This event is complete.")]
    EventFull,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::RequestNotFound(_) => 2002,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::IncorrectCode => 4001,
            Self::RequestExpired => 4002,
            Self::EventFull => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::RequestNotFound(_) => StatusCode::NOT_FOUND,
            Self::IncorrectCode => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RequestExpired => StatusCode::GONE,
            Self::EventFull => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns machine-readable context for the error body: the
    /// `field=id` of the missing resource on not-found errors.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::EventNotFound(id) => Some(format!("event_id={id}")),
            Self::RequestNotFound(id) => Some(format!("request_id={id}")),
            _ => None,
        }
    }

    /// Returns `true` for the admission outcomes a requester can act on
    /// (as opposed to validation, lookup, or infrastructure failures).
    #[must_use]
    pub const fn is_admission_failure(&self) -> bool {
        matches!(
            self,
            Self::IncorrectCode | Self::RequestExpired | Self::EventFull
        )
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
