//! Error types for bbq-pu
//!
//! Every variant maps to one HTTP status. Bodies are `{ "error": message }`
//! except validation failures, which return the error report itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bbq_common::api::AccessError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::normalize::ValidationReport;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Not authenticated (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed (403)
    #[error("Forbidden")]
    Forbidden,

    /// Malformed request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409) - a reconciliation run already holds the lease
    #[error("{0}")]
    Conflict(String),

    /// Rows validated and rejected, nothing written (422)
    #[error("{} validation error(s)", .0.error_count)]
    Validation(ValidationReport),

    /// Input understood but unusable (422)
    #[error("{0}")]
    Unprocessable(String),

    /// Upstream feed unavailable (502)
    #[error("{0}")]
    Upstream(String),

    /// bbq-common error
    #[error(transparent)]
    Common(#[from] bbq_common::Error),
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => ApiError::Unauthorized,
            AccessError::Forbidden { .. } => ApiError::Forbidden,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(report) => {
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(report)).into_response();
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Common(err) => {
                error!("Request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;
