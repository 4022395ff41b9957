//! Parking store error types.

use thiserror::Error;

/// Errors that can occur during parking store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Duplicate entity.
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// Every spot of the lot is occupied.
    #[error("No available spots in this lot")]
    NoAvailableSpot,

    /// A shrink or delete would remove spots that are currently occupied.
    #[error("Lot {id} has occupied spots")]
    OccupiedSpots { id: String },

    /// The reservation was already closed; its cost is fixed.
    #[error("Reservation already released: {id}")]
    AlreadyReleased { id: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }
}

/// Result type for parking store operations.
pub type StoreResult<T> = Result<T, StoreError>;
