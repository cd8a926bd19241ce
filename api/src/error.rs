use authz::{AuthzError, Denial, OwnershipViolation};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use user::UserError;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// An authorization denial, rendered verbatim as `{status, error}`
    #[error("Denied: {0}")]
    Denied(Denial),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Body of an authorization denial
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DenialResponse {
    pub status: u16,
    pub error: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Denied(denial) => {
                StatusCode::from_u16(denial.status).unwrap_or(StatusCode::FORBIDDEN)
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Denied(_) => "DENIED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the client. Infrastructure detail stays in the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Denied(denial) = self {
            return (status, Json(denial)).into_response();
        }

        if status.is_server_error() {
            error!("API error: {}", self);
        }

        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        ApiError::Denied(denial)
    }
}

impl From<OwnershipViolation> for ApiError {
    fn from(violation: OwnershipViolation) -> Self {
        ApiError::Denied(violation.denial())
    }
}

/// Session resolver and store connection failures surface as 500
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ContentNotFound(what) => ApiError::NotFound(what),
            DatabaseError::UnknownKind(kind) => {
                ApiError::NotFound(format!("Unknown content kind: {}", kind))
            }
            DatabaseError::Validation(msg) => ApiError::ValidationError(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound(id) => ApiError::NotFound(format!("User {}", id)),
            UserError::InvalidUserType { .. } | UserError::Validation(_) => {
                ApiError::ValidationError(err.to_string())
            }
            UserError::DuplicateEmail(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
