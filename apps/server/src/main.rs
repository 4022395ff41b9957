//! ParkHub server binary.

use std::net::SocketAddr;

use parkhub_server::{bootstrap, config::Config, create_app, create_state, init_tracing};
use parking_store::SqliteParkingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    tracing::info!(database_url = %config.database_url, "Starting ParkHub server");

    if config.uses_default_secret() {
        tracing::warn!(
            "PARKHUB_SESSION_SECRET is not set; sessions are signed with the development default"
        );
    }

    // Connect the store; the schema is ensured on connect
    let store = SqliteParkingStore::connect(&config.database_url).await?;

    // Ensure the default admin account exists
    bootstrap::ensure_admin(&store, &config.admin_password).await?;

    // Create application state
    let state = create_state(config.clone(), store);

    // Create application router
    let app = create_app(state);

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(addr = %addr, "Server listening");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
