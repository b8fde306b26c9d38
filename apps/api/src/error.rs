//! Unified HTTP error handling.
//!
//! Every handler returns `Result<T, ApiError>`. Failures leave the process
//! as one envelope:
//!
//! ```json
//! { "error": "Validation failed", "details": [{ "field": "total", "message": "total must be positive" }] }
//! { "error": "Order not found" }
//! ```
//!
//! `details` appears only on validation failures. Storage internals are
//! logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::services::auth_service::AuthError;
use orderdesk_core::{FieldViolation, ValidationError, ValidationErrors};
use orderdesk_db::DbError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more fields failed the validation gate.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Malformed request that is not a field-level problem.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
            details: None,
        }
    }

    fn validation(details: Vec<FieldViolation>) -> Self {
        ErrorBody {
            error: "Validation failed".to_string(),
            details: Some(details),
        }
    }
}

impl ApiError {
    /// Status code and body for this error.
    fn parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, ErrorBody::validation(errors.violations())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::message(msg.clone())),
            Self::Internal(_) => internal(),
            Self::Auth(err) => match err {
                AuthError::Storage(_) | AuthError::TokenSigning(_) => internal(),
                other => (StatusCode::UNAUTHORIZED, ErrorBody::message(other.to_string())),
            },
            Self::Database(err) => match err {
                DbError::NotFound { entity, .. } => {
                    (StatusCode::NOT_FOUND, ErrorBody::message(format!("{} not found", entity)))
                }
                DbError::UniqueViolation { field, .. } => {
                    (StatusCode::CONFLICT, ErrorBody::message(conflict_message(field)))
                }
                DbError::InvalidReference { field, entity } => {
                    let violation = FieldViolation::from(&ValidationError::UnknownReference {
                        field: field.clone(),
                        entity: reference_entity(entity),
                    });
                    (StatusCode::BAD_REQUEST, ErrorBody::validation(vec![violation]))
                }
                _ => internal(),
            },
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Auth(AuthError::Storage(_) | AuthError::TokenSigning(_))
                | Self::Database(
                    DbError::ForeignKeyViolation { .. }
                        | DbError::ConnectionFailed(_)
                        | DbError::MigrationFailed(_)
                        | DbError::QueryFailed(_)
                        | DbError::PoolExhausted
                        | DbError::DataCorruption { .. }
                        | DbError::PasswordHash(_)
                        | DbError::Internal(_)
                )
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, "Request error");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, ErrorBody) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::message("Internal server error"),
    )
}

fn conflict_message(field: &str) -> String {
    match field {
        "email" => "Email user already exists".to_string(),
        "name" => "Name user already exists".to_string(),
        other => format!("{} already exists", other),
    }
}

fn reference_entity(entity: &str) -> &'static str {
    match entity {
        "client" => "client",
        "order" => "order",
        _ => "record",
    }
}

/// Result type alias for `ApiError`.
pub type ApiResult<T> = Result<T, ApiError>;
