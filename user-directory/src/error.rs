//! Error types and HTTP response conversion

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Result type alias using the crate error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Service error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Pool creation or schema migration failure
    #[error("Database error: {0}")]
    Database(String),

    /// Structured repository error with operation context
    #[error("{0}")]
    Repository(RepositoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (malformed body or query string)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Validation error (422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Configuration error from a plain message
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::Config(Box::new(figment::Error::from(message.into())))
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Error::Repository(ref e) => {
                let status = match e.kind {
                    RepositoryErrorKind::NotFound => StatusCode::NOT_FOUND,
                    RepositoryErrorKind::AlreadyExists
                    | RepositoryErrorKind::ConstraintViolation => StatusCode::CONFLICT,
                    RepositoryErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
                    RepositoryErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                if status.is_server_error() {
                    tracing::error!(
                        operation = %e.operation,
                        kind = %e.kind,
                        retriable = e.is_retriable(),
                        "Repository error: {}", e.message
                    );
                } else {
                    tracing::debug!(operation = %e.operation, kind = %e.kind, "{}", e);
                }

                // Internal details stay in the logs
                let message = match e.kind {
                    RepositoryErrorKind::NotFound => match (&e.entity_type, &e.entity_id) {
                        (Some(entity), Some(id)) => format!("{} {} not found", entity, id),
                        _ => "Resource not found".to_string(),
                    },
                    RepositoryErrorKind::AlreadyExists => match &e.entity_type {
                        Some(entity) => format!("{} already exists", entity),
                        None => "Resource already exists".to_string(),
                    },
                    RepositoryErrorKind::ConstraintViolation => {
                        "Operation conflicts with existing data".to_string()
                    }
                    RepositoryErrorKind::ValidationFailed => e.message.clone(),
                    RepositoryErrorKind::Timeout => "Database operation timed out".to_string(),
                    _ => "Database operation failed".to_string(),
                };

                (status, format!("REPOSITORY_{}", e.kind.to_string().to_uppercase()), message)
            }

            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND".to_string(), msg),

            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST".to_string(), msg),

            Error::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR".to_string(),
                msg,
            ),

            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR".to_string(),
                    "Service misconfigured".to_string(),
                )
            }

            Error::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR".to_string(),
                    "Database unavailable".to_string(),
                )
            }

            Error::Io(e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR".to_string(),
                    "Internal server error".to_string(),
                )
            }

            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR".to_string(),
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::with_code(status, code, message))).into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Repository(err)
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Database(format!("migration failed: {}", err))
    }
}

// Syntax errors and a wrong content type are the client's framing problem (400);
// well-formed JSON that does not fit the payload type is a validation failure (422).
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Error::Validation(e.body_text()),
            other => Error::BadRequest(other.body_text()),
        }
    }
}

// An id segment that does not parse names no resource.
impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => Error::NotFound(e.body_text()),
            other => Error::Internal(other.body_text()),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err: Error = RepositoryError::not_found("User", "42").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_repository_already_exists_maps_to_409() {
        let err: Error = RepositoryError::already_exists("User", "alice").into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_repository_database_error_maps_to_500() {
        let err: Error =
            RepositoryError::database_error(RepositoryOperation::Create, "disk I/O error").into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            Error::BadRequest("bad json".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Validation("age must not be negative".into())
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = Error::invalid_config("service.port must be greater than 0");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("service.port"));
    }
}
