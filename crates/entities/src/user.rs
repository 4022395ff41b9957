//! User entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account, either a regular member or an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Login name, unique across the system.
    pub username: String,
    /// Email address, unique across the system.
    pub email: String,
    /// Argon2id PHC-format password hash. Plaintext is never stored.
    pub password_hash: String,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Whether this user may manage lots.
    pub is_admin: bool,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new non-admin user.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            phone: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Grants the administrator flag.
    pub fn with_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}
