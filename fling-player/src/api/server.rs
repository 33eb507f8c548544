//! HTTP server setup and routing
//!
//! Sets up the Axum router for the session control endpoints and SSE.

use crate::error::{Error, Result};
use crate::session::MediaSession;
use axum::{
    routing::{get, post},
    Router,
};
use fling_common::events::EventBus;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<MediaSession>,
    pub events: EventBus,
}

/// Build the router with every control route
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Session control
        .route("/session/source", post(super::handlers::set_source))
        .route("/session/play", post(super::handlers::play))
        .route("/session/pause", post(super::handlers::pause))
        .route("/session/stop", post(super::handlers::stop))
        .route("/session/seek", post(super::handlers::seek))
        .route("/session/update-interval", post(super::handlers::set_update_interval))

        // Session queries
        .route("/session/status", get(super::handlers::get_status))
        .route("/session/media", get(super::handlers::get_media_info))
        .route("/session/position", get(super::handlers::get_position))
        .route("/session/duration", get(super::handlers::get_duration))
        .route("/session/metadata", get(super::handlers::get_track_info))
        .route("/session/mime", get(super::handlers::mime_supported))

        // Audio output
        .route("/audio/volume", get(super::handlers::get_volume))
        .route("/audio/volume", post(super::handlers::set_volume))
        .route("/audio/mute", post(super::handlers::set_mute))

        // Viewer handshake
        .route("/viewer/surface", post(super::handlers::set_surface))
        .route("/viewer/binder", post(super::handlers::set_binder))
        .route("/viewer/image-complete", post(super::handlers::image_complete))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API on `addr` until `shutdown` resolves
pub async fn run<F>(addr: &str, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {}: {}", addr, e)))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
