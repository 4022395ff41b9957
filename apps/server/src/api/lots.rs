//! Public read API over lots and spots.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use entities::SpotStatus;
use parking_store::ParkingStore;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::state::SharedState;

/// One lot with its derived counts.
#[derive(Debug, Serialize)]
pub struct LotSummary {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub price_per_hour: f64,
    pub total_spots: u32,
    pub available_spots: u32,
    pub occupied_spots: u32,
}

/// The open reservation shown on an occupied spot.
#[derive(Debug, Serialize)]
pub struct SpotReservationView {
    pub vehicle_number: String,
    pub user: String,
    pub duration: String,
}

/// One spot with its live state.
#[derive(Debug, Serialize)]
pub struct SpotView {
    pub id: Uuid,
    pub spot_number: String,
    pub status: SpotStatus,
    pub current_reservation: Option<SpotReservationView>,
}

/// Lists all lots with their occupancy counts.
pub async fn list_lots<S: ParkingStore>(
    State(state): State<SharedState<S>>,
) -> ServerResult<Json<Vec<LotSummary>>> {
    let lots = state.store.list_lots().await?;

    let mut summaries = Vec::with_capacity(lots.len());
    for lot in lots {
        let occupancy = state.store.lot_occupancy(lot.id).await?;
        summaries.push(LotSummary {
            id: lot.id,
            name: lot.name,
            address: lot.address,
            price_per_hour: lot.price_per_hour,
            total_spots: lot.maximum_spots,
            available_spots: occupancy.available,
            occupied_spots: occupancy.occupied,
        });
    }

    Ok(Json(summaries))
}

/// Lists a lot's spots with their current reservations.
pub async fn list_lot_spots<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Path(lot_id): Path<Uuid>,
) -> ServerResult<Json<Vec<SpotView>>> {
    state
        .store
        .get_lot(lot_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Parking lot not found".to_string()))?;

    let now = Utc::now();
    let spots = state.store.list_spots(lot_id).await?;

    let mut views = Vec::with_capacity(spots.len());
    for spot in spots {
        let current_reservation = match state.store.open_reservation_for_spot(spot.id).await? {
            Some(reservation) => {
                let user = state.store.get_user(reservation.user_id).await?;
                Some(SpotReservationView {
                    duration: reservation.duration_label(now),
                    vehicle_number: reservation.vehicle_number,
                    user: user.map(|u| u.username).unwrap_or_default(),
                })
            }
            None => None,
        };
        views.push(SpotView {
            id: spot.id,
            spot_number: spot.spot_number,
            status: spot.status,
            current_reservation,
        });
    }

    Ok(Json(views))
}
