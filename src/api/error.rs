//! API error types with structured JSON responses.
//!
//! Error bodies are `{"error": "<Kind>", "details"?: ...}`. Internal
//! failures are logged and surfaced as a generic 500 — details never
//! reach the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::auth::policy::PolicyError;
use crate::auth::token::TokenError;
use crate::db::DatabaseError;
use crate::registry::ValidationFailure;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no or invalid credential")]
    Unauthorized,
    #[error("insufficient role or ownership")]
    Forbidden,
    #[error("entity absent or not visible")]
    NotFound,
    #[error("payload failed validation")]
    Validation(ValidationFailure),
    #[error("username already registered")]
    UsernameTaken,
    #[error("uniqueness conflict on {0}")]
    Duplicate(String),
    #[error("referenced patient does not exist")]
    PatientNotFound,
    #[error("bad username or password")]
    InvalidCredentials,
    #[error("role not permitted on this surface")]
    InvalidRole,
    #[error("verification code missing")]
    MissingCode,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// One-field validation error, for ad-hoc request shape problems.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut field_errors = std::collections::BTreeMap::new();
        field_errors.insert(field.to_string(), vec![message.to_string()]);
        ApiError::Validation(ValidationFailure { field_errors })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, details) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NotFound", None),
            ApiError::Validation(failure) => (
                StatusCode::BAD_REQUEST,
                "ValidationError",
                serde_json::to_value(&failure).ok(),
            ),
            ApiError::UsernameTaken => (StatusCode::BAD_REQUEST, "UsernameTaken", None),
            ApiError::Duplicate(detail) => (
                StatusCode::BAD_REQUEST,
                "Duplicate",
                Some(Value::String(detail)),
            ),
            ApiError::PatientNotFound => (StatusCode::BAD_REQUEST, "PatientNotFound", None),
            ApiError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "InvalidCredentials", None)
            }
            ApiError::InvalidRole => (StatusCode::FORBIDDEN, "InvalidRole", None),
            ApiError::MissingCode => (StatusCode::BAD_REQUEST, "MissingCode", None),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", None)
            }
        };

        let body = ErrorBody {
            error: kind,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthorized => ApiError::Unauthorized,
            PolicyError::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        ApiError::Validation(failure)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound,
            DatabaseError::Duplicate { entity_type, field }
                if entity_type == "users" && field == "username" =>
            {
                ApiError::UsernameTaken
            }
            DatabaseError::Duplicate { entity_type, field } => {
                ApiError::Duplicate(format!("{entity_type}.{field}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
