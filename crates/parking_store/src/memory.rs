//! In-memory parking store implementation for testing.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Occupancy, ParkingLot, ParkingSpot, Reservation, SpotStatus, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{LotUpdate, ParkingStore, StoreError, StoreResult};

/// In-memory parking store for testing purposes.
///
/// Spot claims and releases mutate spots and reservations under write locks
/// taken together, so the booking invariant holds here too.
#[derive(Debug, Default)]
pub struct MemoryParkingStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    lots: Arc<RwLock<HashMap<Uuid, ParkingLot>>>,
    spots: Arc<RwLock<HashMap<Uuid, ParkingSpot>>>,
    reservations: Arc<RwLock<HashMap<Uuid, Reservation>>>,
}

impl MemoryParkingStore {
    /// Creates a new in-memory parking store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParkingStore for MemoryParkingStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::already_exists("User", user.username));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::already_exists("User", user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list_members(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut members: Vec<User> = users.values().filter(|u| !u.is_admin).cloned().collect();
        members.sort_by_key(|u| u.created_at);
        Ok(members)
    }

    async fn set_admin(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("User", id.to_string()))?;
        user.is_admin = true;
        Ok(())
    }

    // =========================================================================
    // Lot operations
    // =========================================================================

    async fn create_lot(&self, lot: ParkingLot) -> StoreResult<ParkingLot> {
        let mut lots = self.lots.write().await;
        let mut spots = self.spots.write().await;
        if lots.contains_key(&lot.id) {
            return Err(StoreError::already_exists("ParkingLot", lot.id.to_string()));
        }
        for sequence in 1..=lot.maximum_spots {
            let spot = ParkingSpot::new(lot.id, sequence);
            spots.insert(spot.id, spot);
        }
        lots.insert(lot.id, lot.clone());
        Ok(lot)
    }

    async fn get_lot(&self, id: Uuid) -> StoreResult<Option<ParkingLot>> {
        let lots = self.lots.read().await;
        Ok(lots.get(&id).cloned())
    }

    async fn list_lots(&self) -> StoreResult<Vec<ParkingLot>> {
        let lots = self.lots.read().await;
        let mut all: Vec<ParkingLot> = lots.values().cloned().collect();
        all.sort_by_key(|l| l.created_at);
        Ok(all)
    }

    async fn update_lot(&self, id: Uuid, update: LotUpdate) -> StoreResult<ParkingLot> {
        let mut lots = self.lots.write().await;
        let mut spots = self.spots.write().await;
        if !lots.contains_key(&id) {
            return Err(StoreError::not_found("ParkingLot", id.to_string()));
        }

        let mut owned: Vec<(Uuid, String, SpotStatus)> = spots
            .values()
            .filter(|s| s.lot_id == id)
            .map(|s| (s.id, s.spot_number.clone(), s.status))
            .collect();
        owned.sort_by(|a, b| a.1.cmp(&b.1));
        let current = owned.len() as u32;

        // Validate the shrink before touching anything so a rejection leaves
        // the lot and its spots exactly as they were.
        if update.maximum_spots < current {
            let candidates = &owned[update.maximum_spots as usize..];
            if candidates.iter().any(|(_, _, s)| *s == SpotStatus::Occupied) {
                return Err(StoreError::OccupiedSpots { id: id.to_string() });
            }
            for (spot_id, _, _) in candidates {
                spots.remove(spot_id);
            }
        } else if update.maximum_spots > current {
            for sequence in (current + 1)..=update.maximum_spots {
                let spot = ParkingSpot::new(id, sequence);
                spots.insert(spot.id, spot);
            }
        }

        let lot = lots
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("ParkingLot", id.to_string()))?;
        lot.name = update.name;
        lot.address = update.address;
        lot.pin_code = update.pin_code;
        lot.price_per_hour = update.price_per_hour;
        lot.maximum_spots = update.maximum_spots;
        Ok(lot.clone())
    }

    async fn delete_lot(&self, id: Uuid) -> StoreResult<()> {
        let mut lots = self.lots.write().await;
        let mut spots = self.spots.write().await;
        if !lots.contains_key(&id) {
            return Err(StoreError::not_found("ParkingLot", id.to_string()));
        }
        let occupied = spots
            .values()
            .any(|s| s.lot_id == id && s.status == SpotStatus::Occupied);
        if occupied {
            return Err(StoreError::OccupiedSpots { id: id.to_string() });
        }
        spots.retain(|_, s| s.lot_id != id);
        lots.remove(&id);
        Ok(())
    }

    async fn lot_occupancy(&self, lot_id: Uuid) -> StoreResult<Occupancy> {
        let spots = self.spots.read().await;
        let mut occupancy = Occupancy::default();
        for spot in spots.values().filter(|s| s.lot_id == lot_id) {
            match spot.status {
                SpotStatus::Available => occupancy.available += 1,
                SpotStatus::Occupied => occupancy.occupied += 1,
            }
        }
        Ok(occupancy)
    }

    // =========================================================================
    // Spot operations
    // =========================================================================

    async fn list_spots(&self, lot_id: Uuid) -> StoreResult<Vec<ParkingSpot>> {
        let spots = self.spots.read().await;
        let mut owned: Vec<ParkingSpot> = spots
            .values()
            .filter(|s| s.lot_id == lot_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.spot_number.cmp(&b.spot_number));
        Ok(owned)
    }

    async fn get_spot(&self, id: Uuid) -> StoreResult<Option<ParkingSpot>> {
        let spots = self.spots.read().await;
        Ok(spots.get(&id).cloned())
    }

    // =========================================================================
    // Reservation operations
    // =========================================================================

    async fn open_reservation(
        &self,
        lot_id: Uuid,
        user_id: Uuid,
        vehicle_number: &str,
    ) -> StoreResult<(Reservation, ParkingSpot)> {
        let lots = self.lots.read().await;
        if !lots.contains_key(&lot_id) {
            return Err(StoreError::not_found("ParkingLot", lot_id.to_string()));
        }
        drop(lots);

        // Claim and insert under the same write locks; this is the
        // linearization point that rules out double-booking.
        let mut spots = self.spots.write().await;
        let mut reservations = self.reservations.write().await;

        let spot_id = {
            let mut available: Vec<&ParkingSpot> = spots
                .values()
                .filter(|s| s.lot_id == lot_id && s.status == SpotStatus::Available)
                .collect();
            available.sort_by(|a, b| a.spot_number.cmp(&b.spot_number));
            available.first().map(|s| s.id)
        }
        .ok_or(StoreError::NoAvailableSpot)?;

        let spot = spots
            .get_mut(&spot_id)
            .ok_or(StoreError::NoAvailableSpot)?;
        spot.status = SpotStatus::Occupied;
        let claimed = spot.clone();

        let reservation = Reservation::new(claimed.id, user_id, vehicle_number);
        reservations.insert(reservation.id, reservation.clone());
        Ok((reservation, claimed))
    }

    async fn close_reservation(
        &self,
        id: Uuid,
        leaving: DateTime<Utc>,
        cost: f64,
    ) -> StoreResult<Reservation> {
        let mut spots = self.spots.write().await;
        let mut reservations = self.reservations.write().await;

        let reservation = reservations
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Reservation", id.to_string()))?;
        if !reservation.is_open() {
            return Err(StoreError::AlreadyReleased { id: id.to_string() });
        }

        reservation.leaving_timestamp = Some(leaving);
        reservation.parking_cost = Some(cost);
        if let Some(spot) = spots.get_mut(&reservation.spot_id) {
            spot.status = SpotStatus::Available;
        }
        Ok(reservation.clone())
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(&id).cloned())
    }

    async fn open_reservation_for_spot(&self, spot_id: Uuid) -> StoreResult<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .find(|r| r.spot_id == spot_id && r.is_open())
            .cloned())
    }

    async fn list_open_reservations(&self, user_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        let mut open: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.user_id == user_id && r.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|r| r.parking_timestamp);
        Ok(open)
    }

    async fn list_closed_reservations(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> StoreResult<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        let mut closed: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.user_id == user_id && !r.is_open())
            .cloned()
            .collect();
        closed.sort_by_key(|r| std::cmp::Reverse(r.leaving_timestamp));
        closed.truncate(limit as usize);
        Ok(closed)
    }
}
