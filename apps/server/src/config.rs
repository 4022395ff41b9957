//! Server configuration.

use std::env;

/// Development fallback for the session-signing secret.
pub const DEFAULT_SESSION_SECRET: &str = "parkhub-dev-session-secret";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL.
    pub database_url: String,
    /// Secret key for session signing.
    pub session_secret: String,
    /// Session lifetime in hours.
    pub session_expiration_hours: u64,
    /// Password used when seeding the default admin account.
    pub admin_password: String,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("PARKHUB_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PARKHUB_SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:parkhub.db?mode=rwc".to_string()),
            session_secret: env::var("PARKHUB_SESSION_SECRET")
                .unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string()),
            session_expiration_hours: env::var("PARKHUB_SESSION_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
            admin_password: env::var("PARKHUB_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".to_string()),
            log_level: env::var("PARKHUB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true when the insecure development secret is in use.
    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == DEFAULT_SESSION_SECRET
    }
}
