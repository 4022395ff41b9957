//! Parking store trait and shared input types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Occupancy, ParkingLot, ParkingSpot, Reservation, User};
use uuid::Uuid;

use crate::StoreResult;

/// Field updates applied by a lot edit. All fields are replaced; a change to
/// `maximum_spots` triggers the resize rules.
#[derive(Debug, Clone)]
pub struct LotUpdate {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub price_per_hour: f64,
    pub maximum_spots: u32,
}

/// Trait for parking storage operations.
#[async_trait]
pub trait ParkingStore: Send + Sync {
    // ========== User Operations ==========

    /// Creates a new user. Fails with `AlreadyExists` on a duplicate
    /// username or email.
    async fn create_user(&self, user: User) -> StoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Lists all non-admin users, oldest first.
    async fn list_members(&self) -> StoreResult<Vec<User>>;

    /// Sets the administrator flag on an existing user.
    async fn set_admin(&self, id: Uuid) -> StoreResult<()>;

    // ========== Lot Operations ==========

    /// Creates a lot together with its `maximum_spots` spots, numbered
    /// `S001` onwards, all Available.
    async fn create_lot(&self, lot: ParkingLot) -> StoreResult<ParkingLot>;

    /// Gets a lot by ID.
    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>>;

    /// Lists all lots, oldest first.
    async fn list_lots(&self) -> StoreResult<Vec<ParkingLot>>;

    /// Updates a lot's fields and resizes its spot set.
    ///
    /// Growing appends Available spots with numbers continuing from the
    /// current count. Shrinking removes the spots beyond the new capacity in
    /// spot-number order; if any of them is Occupied the whole update fails
    /// with `OccupiedSpots` and nothing changes.
    async fn update_lot(&self, id: Uuid, update: LotUpdate) -> StoreResult<ParkingLot>;

    /// Deletes a lot and its spots. Fails with `OccupiedSpots` if any spot
    /// is occupied; closed reservation history is retained.
    async fn delete_lot(&self, id: Uuid) -> StoreResult<()>;

    /// Counts available and occupied spots of a lot in one aggregate.
    async fn lot_occupancy(&self, lot_id: Uuid) -> StoreResult<Occupancy>;

    // ========== Spot Operations ==========

    /// Lists a lot's spots ordered by spot number.
    async fn list_spots(&self, lot_id: Uuid) -> StoreResult<Vec<ParkingSpot>>;

    /// Gets a spot by ID.
    async fn get_spot(&self, id: Uuid) -> StoreResult<Option<ParkingSpot>>;

    // ========== Reservation Operations ==========

    /// Atomically claims the first Available spot of the lot (by spot
    /// number) and opens a reservation on it.
    ///
    /// The claim and the reservation insert commit together; concurrent
    /// calls can never claim the same spot. Fails with `NoAvailableSpot`
    /// when the lot is full.
    async fn open_reservation(
        &self,
        lot_id: Uuid,
        user_id: Uuid,
        vehicle_number: &str,
    ) -> StoreResult<(Reservation, ParkingSpot)>;

    /// Closes an open reservation, fixing its exit time and cost, and frees
    /// the spot. Fails with `AlreadyReleased` if the reservation is closed.
    async fn close_reservation(
        &self,
        id: Uuid,
        leaving: DateTime<Utc>,
        cost: f64,
    ) -> StoreResult<Reservation>;

    /// Gets a reservation by ID.
    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>>;

    /// Gets the open reservation for a spot, if any.
    async fn open_reservation_for_spot(&self, spot_id: Uuid) -> StoreResult<Option<Reservation>>;

    /// Lists a user's open reservations, oldest first.
    async fn list_open_reservations(&self, user_id: Uuid) -> StoreResult<Vec<Reservation>>;

    /// Lists a user's closed reservations, most recently left first.
    async fn list_closed_reservations(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> StoreResult<Vec<Reservation>>;
}
