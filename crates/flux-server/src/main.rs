//! Flux status-check server
//!
//! ## Endpoints
//!
//! - `GET /api/` returns `{"message": "Hello World"}`
//! - `POST /api/status` with `{"client_name": "..."}` records a status check
//! - `GET /api/status` lists recorded checks, oldest first

mod config;
mod error;
mod repository;
mod routes;

use config::ServerConfig;
use repository::MemoryRepository;
use routes::{router, AppState};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flux_server=info,tower_http=info".into()),
        )
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = ServerConfig::from_env()?;
    let state = AppState::new(Arc::new(MemoryRepository::new()));
    let app = router(state).layer(config.cors_layer());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.bind, e))?;
    info!("Flux server listening on {}", config.bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}
