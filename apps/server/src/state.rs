//! Application state.

use std::sync::Arc;

use auth::SessionManager;
use parking_store::ParkingStore;

use crate::config::Config;

/// Shared application state.
pub struct AppState<S: ParkingStore> {
    /// Server configuration.
    pub config: Config,
    /// Parking store.
    pub store: S,
    /// Session token manager.
    pub sessions: SessionManager,
}

impl<S: ParkingStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S, sessions: SessionManager) -> Self {
        Self {
            config,
            store,
            sessions,
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config, store and session manager.
pub fn create_shared_state<S: ParkingStore>(
    config: Config,
    store: S,
    sessions: SessionManager,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, sessions))
}
