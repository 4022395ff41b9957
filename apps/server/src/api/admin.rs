//! Administrator API endpoints: dashboard and lot management.

use axum::{
    Form, Json,
    extract::{Path, State},
};
use entities::ParkingLot;
use parking_store::{LotUpdate, ParkingStore, StoreError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{LotWithOccupancy, MessageResponse, UserInfo};
use crate::error::{ServerError, ServerResult};
use crate::state::SharedState;

/// Lot create/edit form fields.
#[derive(Debug, Deserialize)]
pub struct LotForm {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub price_per_hour: f64,
    pub max_spots: u32,
}

/// Summary numbers across all lots.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_lots: usize,
    pub total_spots: u32,
    pub occupied_spots: u32,
    pub available_spots: u32,
    pub occupancy_rate: f64,
}

/// Admin dashboard payload.
#[derive(Debug, Serialize)]
pub struct AdminDashboardResponse {
    pub lots: Vec<LotWithOccupancy>,
    pub users: Vec<UserInfo>,
    pub stats: DashboardStats,
}

/// Response to a lot create or update.
#[derive(Debug, Serialize)]
pub struct LotResponse {
    pub message: String,
    pub lot: LotWithOccupancy,
}

fn validate_lot_form(form: &LotForm) -> ServerResult<()> {
    if form.name.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "Lot name is required".to_string(),
        ));
    }
    if form.price_per_hour < 0.0 {
        return Err(ServerError::InvalidRequest(
            "Price per hour must be non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Occupancy percentage across all lots, one decimal place.
fn occupancy_rate(occupied: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (occupied as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Shows all lots, registered members and summary statistics.
pub async fn dashboard<S: ParkingStore>(
    State(state): State<SharedState<S>>,
) -> ServerResult<Json<AdminDashboardResponse>> {
    let lots = state.store.list_lots().await?;

    let mut lot_views = Vec::with_capacity(lots.len());
    let mut total_spots = 0;
    let mut occupied_spots = 0;
    for lot in lots {
        let occupancy = state.store.lot_occupancy(lot.id).await?;
        total_spots += lot.maximum_spots;
        occupied_spots += occupancy.occupied;
        lot_views.push(LotWithOccupancy::new(lot, occupancy));
    }

    let users: Vec<UserInfo> = state
        .store
        .list_members()
        .await?
        .into_iter()
        .map(UserInfo::from)
        .collect();

    let stats = DashboardStats {
        total_lots: lot_views.len(),
        total_spots,
        occupied_spots,
        available_spots: total_spots - occupied_spots,
        occupancy_rate: occupancy_rate(occupied_spots, total_spots),
    };

    Ok(Json(AdminDashboardResponse {
        lots: lot_views,
        users,
        stats,
    }))
}

/// Creates a lot together with its numbered spots.
pub async fn create_lot<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Form(form): Form<LotForm>,
) -> ServerResult<Json<LotResponse>> {
    validate_lot_form(&form)?;

    let lot = ParkingLot::new(
        form.name.trim(),
        form.address,
        form.pin_code,
        form.price_per_hour,
        form.max_spots,
    );
    let lot = state.store.create_lot(lot).await?;
    let occupancy = state.store.lot_occupancy(lot.id).await?;

    tracing::info!(
        lot_id = %lot.id,
        name = %lot.name,
        spots = lot.maximum_spots,
        "Parking lot created"
    );

    Ok(Json(LotResponse {
        message: format!(
            "Parking lot \"{}\" created with {} spots!",
            lot.name, lot.maximum_spots
        ),
        lot: LotWithOccupancy::new(lot, occupancy),
    }))
}

/// Updates a lot's fields, resizing its spot set when capacity changes.
pub async fn update_lot<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Path(lot_id): Path<Uuid>,
    Form(form): Form<LotForm>,
) -> ServerResult<Json<LotResponse>> {
    validate_lot_form(&form)?;

    let update = LotUpdate {
        name: form.name.trim().to_string(),
        address: form.address,
        pin_code: form.pin_code,
        price_per_hour: form.price_per_hour,
        maximum_spots: form.max_spots,
    };

    let lot = state
        .store
        .update_lot(lot_id, update)
        .await
        .map_err(|e| match e {
            StoreError::OccupiedSpots { .. } => ServerError::OccupiedSpots(
                "Cannot reduce spots while some are occupied!".to_string(),
            ),
            other => other.into(),
        })?;
    let occupancy = state.store.lot_occupancy(lot.id).await?;

    tracing::info!(lot_id = %lot.id, spots = lot.maximum_spots, "Parking lot updated");

    Ok(Json(LotResponse {
        message: "Parking lot updated successfully!".to_string(),
        lot: LotWithOccupancy::new(lot, occupancy),
    }))
}

/// Deletes a lot and its spots; refused while any spot is occupied.
pub async fn delete_lot<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Path(lot_id): Path<Uuid>,
) -> ServerResult<Json<MessageResponse>> {
    let lot = state
        .store
        .get_lot(lot_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Parking lot not found".to_string()))?;

    state.store.delete_lot(lot_id).await.map_err(|e| match e {
        StoreError::OccupiedSpots { .. } => {
            ServerError::OccupiedSpots("Cannot delete lot with occupied spots!".to_string())
        }
        other => other.into(),
    })?;

    tracing::info!(lot_id = %lot_id, name = %lot.name, "Parking lot deleted");

    Ok(Json(MessageResponse {
        message: format!("Parking lot \"{}\" deleted successfully!", lot.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_rate() {
        assert_eq!(occupancy_rate(0, 0), 0.0);
        assert_eq!(occupancy_rate(1, 3), 33.3);
        assert_eq!(occupancy_rate(2, 2), 100.0);
    }
}
