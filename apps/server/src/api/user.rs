//! Member API endpoints: dashboard, booking and release.

use axum::{
    Extension, Form, Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use entities::{Reservation, billable_cost};
use parking_store::ParkingStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::LotWithOccupancy;
use crate::error::{ServerError, ServerResult};
use crate::middleware::CurrentUser;
use crate::state::{AppState, SharedState};

/// How many past reservations the dashboard shows.
const PAST_RESERVATIONS_LIMIT: u32 = 10;

/// Booking form fields.
#[derive(Debug, Deserialize)]
pub struct BookForm {
    pub vehicle_number: String,
}

/// A reservation as shown to its owner. The lot and spot references are
/// optional because closed history can outlive a deleted lot.
#[derive(Debug, Serialize)]
pub struct ReservationView {
    pub id: Uuid,
    pub lot_name: Option<String>,
    pub spot_number: Option<String>,
    pub vehicle_number: String,
    pub parking_timestamp: DateTime<Utc>,
    pub leaving_timestamp: Option<DateTime<Utc>>,
    pub duration: String,
    pub cost: f64,
}

/// User dashboard payload.
#[derive(Debug, Serialize)]
pub struct UserDashboardResponse {
    /// Lots with at least one available spot.
    pub lots: Vec<LotWithOccupancy>,
    pub current_reservations: Vec<ReservationView>,
    pub past_reservations: Vec<ReservationView>,
}

/// Response to a successful booking.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub message: String,
    pub reservation: ReservationView,
}

/// Response to a successful release.
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub message: String,
    pub reservation: ReservationView,
}

/// Builds the owner-facing view of a reservation. Open reservations get a
/// live running cost recomputed against `now`; closed ones report the fixed
/// stored cost.
async fn reservation_view<S: ParkingStore>(
    state: &AppState<S>,
    reservation: &Reservation,
    now: DateTime<Utc>,
) -> ServerResult<ReservationView> {
    let spot = state.store.get_spot(reservation.spot_id).await?;
    let (spot_number, lot) = match spot {
        Some(spot) => (
            Some(spot.spot_number),
            state.store.get_lot(spot.lot_id).await?,
        ),
        None => (None, None),
    };
    let cost = match &lot {
        Some(lot) => reservation.current_cost(now, lot.price_per_hour),
        None => reservation.parking_cost.unwrap_or(0.0),
    };

    Ok(ReservationView {
        id: reservation.id,
        lot_name: lot.map(|l| l.name),
        spot_number,
        vehicle_number: reservation.vehicle_number.clone(),
        parking_timestamp: reservation.parking_timestamp,
        leaving_timestamp: reservation.leaving_timestamp,
        duration: reservation.duration_label(now),
        cost,
    })
}

/// Shows bookable lots plus the caller's open and recent reservations.
pub async fn dashboard<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Extension(current): Extension<CurrentUser>,
) -> ServerResult<Json<UserDashboardResponse>> {
    let now = Utc::now();

    let mut lots = Vec::new();
    for lot in state.store.list_lots().await? {
        let occupancy = state.store.lot_occupancy(lot.id).await?;
        if occupancy.available > 0 {
            lots.push(LotWithOccupancy::new(lot, occupancy));
        }
    }

    let mut current_reservations = Vec::new();
    for reservation in state.store.list_open_reservations(current.id).await? {
        current_reservations.push(reservation_view(&state, &reservation, now).await?);
    }

    let mut past_reservations = Vec::new();
    for reservation in state
        .store
        .list_closed_reservations(current.id, PAST_RESERVATIONS_LIMIT)
        .await?
    {
        past_reservations.push(reservation_view(&state, &reservation, now).await?);
    }

    Ok(Json(UserDashboardResponse {
        lots,
        current_reservations,
        past_reservations,
    }))
}

/// Books the first available spot of a lot for the caller.
pub async fn book_spot<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Extension(current): Extension<CurrentUser>,
    Path(lot_id): Path<Uuid>,
    Form(form): Form<BookForm>,
) -> ServerResult<Json<BookResponse>> {
    let vehicle_number = form.vehicle_number.trim();
    if vehicle_number.is_empty() {
        return Err(ServerError::InvalidRequest(
            "Vehicle number is required".to_string(),
        ));
    }

    let (reservation, spot) = state
        .store
        .open_reservation(lot_id, current.id, vehicle_number)
        .await?;

    tracing::info!(
        user = %current.username,
        lot_id = %lot_id,
        spot = %spot.spot_number,
        "Spot booked"
    );

    let view = reservation_view(&state, &reservation, Utc::now()).await?;
    Ok(Json(BookResponse {
        message: format!("Spot {} booked successfully!", spot.spot_number),
        reservation: view,
    }))
}

/// Releases the caller's reservation, fixing the final cost and freeing the
/// spot.
pub async fn release_spot<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Extension(current): Extension<CurrentUser>,
    Path(reservation_id): Path<Uuid>,
) -> ServerResult<Json<ReleaseResponse>> {
    let reservation = state
        .store
        .get_reservation(reservation_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Reservation not found".to_string()))?;

    if reservation.user_id != current.id {
        return Err(ServerError::NotOwner);
    }
    if !reservation.is_open() {
        return Err(ServerError::AlreadyReleased(
            "Reservation already released".to_string(),
        ));
    }

    // An open reservation pins its spot and lot: the spot cannot be resized
    // away and the lot cannot be deleted while it is occupied.
    let spot = state
        .store
        .get_spot(reservation.spot_id)
        .await?
        .ok_or_else(|| ServerError::Internal("Spot missing for open reservation".to_string()))?;
    let lot = state
        .store
        .get_lot(spot.lot_id)
        .await?
        .ok_or_else(|| ServerError::Internal("Lot missing for open reservation".to_string()))?;

    let now = Utc::now();
    let cost = billable_cost(reservation.parking_timestamp, now, lot.price_per_hour);
    let closed = state
        .store
        .close_reservation(reservation.id, now, cost)
        .await?;

    tracing::info!(
        user = %current.username,
        spot = %spot.spot_number,
        cost,
        "Spot released"
    );

    let view = reservation_view(&state, &closed, now).await?;
    Ok(Json(ReleaseResponse {
        message: format!("Spot released! Total cost: {cost:.2}"),
        reservation: view,
    }))
}
