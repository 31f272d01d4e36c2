use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::ProviderError,
    state::{
        errors::SessionError, pin::PinError, question::QuestionSetError, registry::RegistryError,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested session, player or question was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Host-only operation attempted without the host identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Operation lost a race or does not fit the session phase.
    #[error("conflict: {0}")]
    Conflict(String),
    /// A collaborator or resource pool is unavailable.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotHost => ServiceError::Unauthorized(err.to_string()),
            SessionError::SessionClosed => ServiceError::NotFound("session not found".into()),
            SessionError::PlayerUnknown(_) | SessionError::QuestionNotShown(_) => {
                ServiceError::NotFound(err.to_string())
            }
            SessionError::InvalidQuestionSet(QuestionSetError::Empty) => {
                ServiceError::InvalidInput(format!("QuestionSetEmpty: {err}"))
            }
            SessionError::InvalidName(_)
            | SessionError::InvalidOption(_)
            | SessionError::InvalidQuestionSet(_) => ServiceError::InvalidInput(err.to_string()),
            other if other.is_conflict() => ServiceError::Conflict(other.to_string()),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PinsExhausted => ServiceError::Unavailable(err.to_string()),
            RegistryError::Session(inner) => inner.into(),
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        ServiceError::Unavailable(err.to_string())
    }
}

impl From<PinError> for ServiceError {
    fn from(err: PinError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Unavailable(message) => AppError::ServiceUnavailable(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
