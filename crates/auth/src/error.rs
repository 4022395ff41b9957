//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token signature or claims validation failed.
    #[error("Session validation failed: {0}")]
    TokenValidation(String),

    /// Token signing failed.
    #[error("Session encoding failed: {0}")]
    TokenEncoding(String),

    /// Token expired.
    #[error("Session expired")]
    TokenExpired,

    /// Invalid token.
    #[error("Invalid session token")]
    InvalidToken,

    /// Password hashing or verification failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::TokenValidation(e.to_string()),
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
