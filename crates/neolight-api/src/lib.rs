//! Neolight device API
//!
//! Serves the status documents the update loop maintains, and lets the lamp
//! controller read and update its own fields.

use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use neolight_services::DocumentClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod routes;

pub use error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentClient,
}

impl AppState {
    pub fn new(documents: DocumentClient) -> Self {
        Self { documents }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/neolight/:id",
            get(routes::devices::get_device).put(routes::devices::put_device),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Serve until `shutdown` fires, then drain in-flight requests.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Device API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Device API stopped");
    Ok(())
}
