//! API endpoints.

pub mod admin;
pub mod auth;
pub mod lots;
pub mod user;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use entities::{Occupancy, ParkingLot, User};
use parking_store::ParkingStore;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::{require_admin, require_auth};
use crate::state::SharedState;

/// Creates the API router with all endpoints.
pub fn create_router<S: ParkingStore + 'static>(state: SharedState<S>) -> Router<SharedState<S>> {
    let public = Router::new()
        // Account endpoints
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Read API
        .route("/api/lots", get(lots::list_lots))
        .route("/api/lot/:lot_id/spots", get(lots::list_lot_spots))
        // Health check
        .route("/health", get(health_check));

    let authenticated = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user/dashboard", get(user::dashboard))
        .route("/api/user/lots/:lot_id/book", post(user::book_spot))
        .route(
            "/api/user/reservations/:reservation_id/release",
            post(user::release_spot),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth::<S>));

    let admin = Router::new()
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/lots", post(admin::create_lot))
        .route("/api/admin/lots/:lot_id/update", post(admin::update_lot))
        .route("/api/admin/lots/:lot_id/delete", post(admin::delete_lot))
        .route_layer(from_fn_with_state(state, require_admin::<S>));

    public.merge(authenticated).merge(admin)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Success body carrying the user-visible notice.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of a user; carries no credential material.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// A lot together with its derived spot counts, as shown on dashboards.
#[derive(Debug, Serialize)]
pub struct LotWithOccupancy {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub price_per_hour: f64,
    pub total_spots: u32,
    pub available_spots: u32,
    pub occupied_spots: u32,
    pub created_at: DateTime<Utc>,
}

impl LotWithOccupancy {
    /// Combines a lot with its occupancy counts.
    pub fn new(lot: ParkingLot, occupancy: Occupancy) -> Self {
        Self {
            id: lot.id,
            name: lot.name,
            address: lot.address,
            pin_code: lot.pin_code,
            price_per_hour: lot.price_per_hour,
            total_spots: lot.maximum_spots,
            available_spots: occupancy.available,
            occupied_spots: occupancy.occupied,
            created_at: lot.created_at,
        }
    }
}
