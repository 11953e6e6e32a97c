//! REST API implementation for the headless player
//!
//! Exposes the playback command set and the SSE event stream to the
//! out-of-scope presentation layer.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::player::Player;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Player facade
    pub player: Arc<Player>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Playback control endpoints
            .route("/status", get(handlers::get_status))
            .route("/playback/toggle", post(handlers::toggle_play))
            .route("/playback/mute", post(handlers::toggle_mute))
            .route("/playback/seek", post(handlers::seek))
            .route("/playback/topic", post(handlers::play_topic))
            .route("/playback/next", post(handlers::play_next))
            .route("/playback/previous", post(handlers::play_previous))
            .route("/playback/played/:topic_id", get(handlers::is_played))

            // Queue projections
            .route("/queue", get(handlers::get_queue))

            // SSE events
            .route("/events", get(sse::event_stream))
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "briefcast-ap",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}
