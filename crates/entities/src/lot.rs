//! Parking lot entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A parking facility containing a fixed number of spots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingLot {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name of the facility.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Postal code.
    pub pin_code: String,
    /// Hourly price, non-negative.
    pub price_per_hour: f64,
    /// Configured capacity. The lot owns exactly this many spots after any
    /// successful create or resize.
    pub maximum_spots: u32,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl ParkingLot {
    /// Creates a new lot record. Spots are created by the store alongside it.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        pin_code: impl Into<String>,
        price_per_hour: f64,
        maximum_spots: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            pin_code: pin_code.into(),
            price_per_hour,
            maximum_spots,
            created_at: Utc::now(),
        }
    }
}

/// Spot counts for one lot, derived from spot statuses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Occupancy {
    /// Spots currently free.
    pub available: u32,
    /// Spots currently taken by an open reservation.
    pub occupied: u32,
}

impl Occupancy {
    /// Total spot count; always equals the lot's `maximum_spots`.
    pub fn total(&self) -> u32 {
        self.available + self.occupied
    }
}
