//! HTTP error type and its mapping onto status codes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use campus_core::errors::CoreError;
use campus_core::responses::{MessageResponse, handle_validation_error};
use campus_db::error::DatabaseError;

/// Every failure a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    /// Message is the full text, e.g. "Course not found".
    #[error("{0}")]
    NotFound(String),

    /// Conflicts, invalid states, capacity and transition failures.
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotImplemented(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound { entity_type, .. } => {
                Self::NotFound(format!("{entity_type} not found"))
            }
            CoreError::Validation(errors) => Self::Validation(errors),
            CoreError::Forbidden(message) => Self::Forbidden(message),
            other @ (CoreError::CapacityExceeded(_) | CoreError::InvalidTransition { .. }) => {
                Self::BadRequest(other.to_string())
            }
            CoreError::Other(inner) => Self::Internal(inner),
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Core(core) => core.into(),
            DatabaseError::Validation(errors) => Self::Validation(errors),
            DatabaseError::Conflict(message) | DatabaseError::InvalidState(message) => {
                Self::BadRequest(message)
            }
            DatabaseError::Other(inner) => Self::Internal(inner),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Unreadable bodies: bad syntax, wrong field types, a missing content type.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(handle_validation_error(errors)))
                    .into_response();
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotImplemented(message) => (StatusCode::NOT_IMPLEMENTED, message),
            Self::Internal(error) => {
                tracing::error!("request failed: {error:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

/// Handler result alias.
pub type AppResult<T> = Result<T, AppError>;
