//! Session token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, AuthResult, DEFAULT_SESSION_EXPIRATION_HOURS, DEFAULT_SESSION_ISSUER};

/// Claims carried by a ParkHub session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Login name at issuance time.
    pub username: String,
    /// Administrator flag at issuance time.
    pub is_admin: bool,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Token ID.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a signed-in user.
    pub fn new(user_id: Uuid, username: String, is_admin: bool, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: user_id.to_string(),
            username,
            is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: DEFAULT_SESSION_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> AuthResult<Uuid> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Session signing configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session lifetime in hours.
    pub expiration_hours: u64,
    /// Token issuer.
    pub issuer: String,
}

impl SessionConfig {
    /// Creates a new session configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_SESSION_EXPIRATION_HOURS,
            issuer: DEFAULT_SESSION_ISSUER.to_string(),
        }
    }

    /// Sets the session lifetime in hours.
    pub fn with_expiration_hours(mut self, hours: u64) -> Self {
        self.expiration_hours = hours;
        self
    }
}

/// Signs and validates session tokens.
#[derive(Clone)]
pub struct SessionManager {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a session token for a signed-in user.
    pub fn issue_token(&self, user_id: Uuid, username: String, is_admin: bool) -> AuthResult<String> {
        let claims = Claims::new(user_id, username, is_admin, self.config.expiration_hours);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Validates and decodes a session token.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Returns the session lifetime in seconds.
    pub fn expiration_seconds(&self) -> u64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_issue_and_validation() {
        let config = SessionConfig::new("test-secret-key-must-be-long-enough-for-security");
        let manager = SessionManager::new(config);

        let user_id = Uuid::new_v4();
        let token = manager
            .issue_token(user_id, "alice".to_string(), false)
            .unwrap();

        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.username, "alice");
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_admin_flag_survives_roundtrip() {
        let manager = SessionManager::new(SessionConfig::new("another-long-enough-test-secret"));

        let token = manager
            .issue_token(Uuid::new_v4(), "admin".to_string(), true)
            .unwrap();

        assert!(manager.validate_token(&token).unwrap().is_admin);
    }

    #[test]
    fn test_invalid_token() {
        let manager = SessionManager::new(SessionConfig::new("yet-another-long-test-secret"));

        assert!(manager.validate_token("invalid-token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = SessionManager::new(SessionConfig::new("secret-one-must-be-long-enough"));
        let manager2 = SessionManager::new(SessionConfig::new("secret-two-must-be-long-enough"));

        let token = manager1
            .issue_token(Uuid::new_v4(), "alice".to_string(), false)
            .unwrap();

        assert!(manager2.validate_token(&token).is_err());
    }
}
