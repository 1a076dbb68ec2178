//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use propdesk_domain::error::{PropdeskError, ValidationError};
use propdesk_domain::id::CorrelationId;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<CorrelationId>,
}

/// Everything a handler can fail with.
pub enum ApiError {
    /// Error returned by the application service.
    Service(PropdeskError),
    /// The request body or query string could not be decoded.
    BadRequest(String),
}

impl From<PropdeskError> for ApiError {
    fn from(err: PropdeskError) -> Self {
        Self::Service(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Service(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

const OPAQUE_MESSAGE: &str = "operation failed";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, correlation_id) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            Self::Service(PropdeskError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            Self::Service(PropdeskError::NotFound(err)) => {
                (StatusCode::NOT_FOUND, err.to_string(), None)
            }
            Self::Service(PropdeskError::Conflict(err)) => {
                (StatusCode::CONFLICT, err.to_string(), None)
            }
            Self::Service(PropdeskError::Backend(correlation_id)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                OPAQUE_MESSAGE.to_string(),
                Some(correlation_id),
            ),
            Self::Service(PropdeskError::Storage(err)) => {
                let correlation_id = CorrelationId::new();
                tracing::error!(%correlation_id, error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    OPAQUE_MESSAGE.to_string(),
                    Some(correlation_id),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error,
                correlation_id,
            }),
        )
            .into_response()
    }
}
