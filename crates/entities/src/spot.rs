//! Parking spot entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a parking spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    /// Free to book.
    #[default]
    Available,
    /// Taken by an open reservation.
    Occupied,
}

impl SpotStatus {
    /// Single-letter code used in storage.
    pub fn as_code(&self) -> &'static str {
        match self {
            SpotStatus::Available => "A",
            SpotStatus::Occupied => "O",
        }
    }

    /// Parses the storage code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(SpotStatus::Available),
            "O" => Some(SpotStatus::Occupied),
            _ => None,
        }
    }
}

/// An individually bookable unit of a lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSpot {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning lot.
    pub lot_id: Uuid,
    /// Human-readable number, unique within the lot (`S001`, `S002`, ...).
    pub spot_number: String,
    /// Current status.
    pub status: SpotStatus,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl ParkingSpot {
    /// Creates the `sequence`-th spot of a lot, starting Available.
    pub fn new(lot_id: Uuid, sequence: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_id,
            spot_number: format_spot_number(sequence),
            status: SpotStatus::Available,
            created_at: Utc::now(),
        }
    }
}

/// Formats a 1-based spot sequence as its display number.
pub fn format_spot_number(sequence: u32) -> String {
    format!("S{sequence:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_number_format() {
        assert_eq!(format_spot_number(1), "S001");
        assert_eq!(format_spot_number(42), "S042");
        assert_eq!(format_spot_number(120), "S120");
    }

    #[test]
    fn test_status_codes_roundtrip() {
        assert_eq!(SpotStatus::from_code("A"), Some(SpotStatus::Available));
        assert_eq!(SpotStatus::from_code("O"), Some(SpotStatus::Occupied));
        assert_eq!(SpotStatus::from_code("X"), None);
        assert_eq!(SpotStatus::Occupied.as_code(), "O");
    }

    #[test]
    fn test_new_spot_is_available() {
        let spot = ParkingSpot::new(Uuid::new_v4(), 7);
        assert_eq!(spot.spot_number, "S007");
        assert_eq!(spot.status, SpotStatus::Available);
    }
}
