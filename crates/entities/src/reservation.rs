//! Reservation entity and pricing logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One parking session: a vehicle occupying one spot between an entry time
/// and an optional exit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier.
    pub id: Uuid,
    /// The spot being occupied.
    pub spot_id: Uuid,
    /// The booking user.
    pub user_id: Uuid,
    /// Vehicle registration, stored upper-cased.
    pub vehicle_number: String,
    /// Entry time.
    pub parking_timestamp: DateTime<Utc>,
    /// Exit time; `None` while the reservation is open.
    pub leaving_timestamp: Option<DateTime<Utc>>,
    /// Final cost, fixed when the reservation closes.
    pub parking_cost: Option<f64>,
}

impl Reservation {
    /// Opens a new reservation starting now.
    pub fn new(spot_id: Uuid, user_id: Uuid, vehicle_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            spot_id,
            user_id,
            vehicle_number: vehicle_number.into().to_uppercase(),
            parking_timestamp: Utc::now(),
            leaving_timestamp: None,
            parking_cost: None,
        }
    }

    /// Returns true while no exit time has been recorded.
    pub fn is_open(&self) -> bool {
        self.leaving_timestamp.is_none()
    }

    /// Closes the reservation at `leaving`, fixing the final cost.
    pub fn close(&mut self, leaving: DateTime<Utc>, price_per_hour: f64) -> f64 {
        let cost = billable_cost(self.parking_timestamp, leaving, price_per_hour);
        self.leaving_timestamp = Some(leaving);
        self.parking_cost = Some(cost);
        cost
    }

    /// Live running estimate for an open reservation, recomputed on every
    /// call and never persisted; the stored cost for a closed one.
    pub fn current_cost(&self, now: DateTime<Utc>, price_per_hour: f64) -> f64 {
        match self.leaving_timestamp {
            None => billable_cost(self.parking_timestamp, now, price_per_hour),
            Some(_) => self.parking_cost.unwrap_or(0.0),
        }
    }

    /// Elapsed time as whole hours and minutes, marked while still open.
    pub fn duration_label(&self, now: DateTime<Utc>) -> String {
        let end = self.leaving_timestamp.unwrap_or(now);
        let seconds = (end - self.parking_timestamp).num_seconds();
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if self.is_open() {
            format!("{hours}h {minutes}m (ongoing)")
        } else {
            format!("{hours}h {minutes}m")
        }
    }
}

/// Charge for a stay from `entry` to `exit` at `price_per_hour`.
///
/// Duration is converted to fractional hours and a minimum one-hour charge
/// always applies, even for sub-hour stays. A negative duration degenerates
/// to the same minimum charge. Rounded to two decimal places.
pub fn billable_cost(
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
    price_per_hour: f64,
) -> f64 {
    let hours = (exit - entry).num_seconds() as f64 / 3600.0;
    let billed = hours.max(1.0);
    round2(billed * price_per_hour)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
