//! Server error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_store::StoreError;
use serde_json::json;

/// Stable error codes carried in error response bodies.
pub mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
    pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const NOT_OWNER: &str = "NOT_OWNER";
    pub const DUPLICATE_USERNAME: &str = "DUPLICATE_USERNAME";
    pub const DUPLICATE_EMAIL: &str = "DUPLICATE_EMAIL";
    pub const NO_AVAILABLE_SPOT: &str = "NO_AVAILABLE_SPOT";
    pub const OCCUPIED_SPOTS: &str = "OCCUPIED_SPOTS";
    pub const ALREADY_RELEASED: &str = "ALREADY_RELEASED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Authentication required.
    #[error("Please log in to access this page")]
    AuthenticationRequired,

    /// Login failed; deliberately the same for unknown user and bad password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The caller does not own the reservation.
    #[error("Unauthorized access")]
    NotOwner,

    /// Username taken.
    #[error("Username already exists")]
    DuplicateUsername,

    /// Email taken.
    #[error("Email already registered")]
    DuplicateEmail,

    /// Every spot of the lot is occupied.
    #[error("No available spots in this lot")]
    NoAvailableSpot,

    /// A lot edit or delete is blocked by occupied spots.
    #[error("{0}")]
    OccupiedSpots(String),

    /// The reservation was already released; its cost is fixed.
    #[error("{0}")]
    AlreadyReleased(String),

    /// Authentication error.
    #[error("Auth error: {0}")]
    Auth(#[from] auth::AuthError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ServerError::NotFound(e.to_string()),
            StoreError::AlreadyExists { .. } => ServerError::InvalidRequest(e.to_string()),
            StoreError::NoAvailableSpot => ServerError::NoAvailableSpot,
            StoreError::OccupiedSpots { .. } => {
                ServerError::OccupiedSpots("Lot has occupied spots".to_string())
            }
            StoreError::AlreadyReleased { .. } => {
                ServerError::AlreadyReleased("Reservation already released".to_string())
            }
            StoreError::Database(e) => ServerError::Database(e.to_string()),
            StoreError::Other(msg) => ServerError::Database(msg),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ServerError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST)
            }
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::RESOURCE_NOT_FOUND),
            ServerError::AuthenticationRequired => {
                (StatusCode::UNAUTHORIZED, error_codes::AUTHENTICATION_REQUIRED)
            }
            ServerError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, error_codes::INVALID_CREDENTIALS)
            }
            ServerError::PermissionDenied(_) => {
                (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED)
            }
            ServerError::NotOwner => (StatusCode::FORBIDDEN, error_codes::NOT_OWNER),
            ServerError::DuplicateUsername => {
                (StatusCode::CONFLICT, error_codes::DUPLICATE_USERNAME)
            }
            ServerError::DuplicateEmail => (StatusCode::CONFLICT, error_codes::DUPLICATE_EMAIL),
            ServerError::NoAvailableSpot => {
                (StatusCode::CONFLICT, error_codes::NO_AVAILABLE_SPOT)
            }
            ServerError::OccupiedSpots(_) => (StatusCode::CONFLICT, error_codes::OCCUPIED_SPOTS),
            ServerError::AlreadyReleased(_) => {
                (StatusCode::CONFLICT, error_codes::ALREADY_RELEASED)
            }
            ServerError::Auth(_) => {
                (StatusCode::UNAUTHORIZED, error_codes::AUTHENTICATION_REQUIRED)
            }
            ServerError::Database(_) | ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
