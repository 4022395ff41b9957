//! ParkHub Server
//!
//! The HTTP surface of the parking reservation manager: administrators
//! manage lots and spots, members book and release spots, and a public read
//! API exposes occupancy.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;

use auth::{SessionConfig, SessionManager};
use axum::Router;
use parking_store::ParkingStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::state::{SharedState, create_shared_state};

/// Creates the application router with all routes configured.
pub fn create_app<S: ParkingStore + 'static>(state: SharedState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router(state.clone())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration and store.
pub fn create_state<S: ParkingStore>(config: Config, store: S) -> SharedState<S> {
    let sessions = SessionManager::new(
        SessionConfig::new(config.session_secret.clone())
            .with_expiration_hours(config.session_expiration_hours),
    );

    create_shared_state(config, store, sessions)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
