//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
///
/// Every logical failure a handler can produce maps to exactly one
/// variant; persistence failures are kept separate so they never leak
/// detail to the client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation on registration
    #[error("Username or email already exists")]
    Duplicate,

    /// Login failure; unknown user and wrong password are indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing, malformed, expired, or revoked token
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed to use this endpoint
    #[error("Forbidden")]
    Forbidden,

    /// Resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Too many attempts in the window
    #[error("Too many attempts, try again later")]
    RateLimited,

    /// External collaborator is not configured
    #[error("{0}")]
    Unavailable(&'static str),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Duplicate => (StatusCode::CONFLICT, self.to_string()),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.to_string()),
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
