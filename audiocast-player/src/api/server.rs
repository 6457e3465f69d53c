//! HTTP server setup and routing
//!
//! Sets up the Axum HTTP server with routes for control endpoints and SSE.
//! Commands return only accepted/rejected; every effect is observable on
//! the event stream.

use crate::config::Config;
use crate::engine::EngineHandle;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: EngineHandle,
}

/// Build the application router
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Playback control
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/toggle", post(super::handlers::play_toggle))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/stop", post(super::handlers::stop))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/seek_by", post(super::handlers::seek_by))
        .route("/playback/state", get(super::handlers::get_state))
        .route("/playback/position", get(super::handlers::get_position))
        // Volume
        .route("/audio/volume", get(super::handlers::get_volume))
        .route("/audio/volume", post(super::handlers::set_volume))
        .route("/audio/mute_toggle", post(super::handlers::mute_toggle))
        // Notification pass-through
        .route(
            "/notification/style",
            post(super::handlers::notification_style),
        )
        // Host focus signal intake
        .route("/focus", post(super::handlers::focus))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        // Request tracing + CORS for local clients
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until the listener fails or shutdown completes.
pub async fn run(config: Config, engine: EngineHandle) -> Result<()> {
    let app = router(AppContext { engine });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
