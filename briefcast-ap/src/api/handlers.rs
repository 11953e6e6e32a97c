//! HTTP request handlers
//!
//! Implements the REST endpoints for playback control. Domain errors map
//! to HTTP status codes here and nowhere else.

use crate::api::AppState;
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// Signed seek delta in seconds
    pub delta_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct PlayTopicRequest {
    /// Queue member to play (or toggle when already current)
    pub topic_id: String,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    /// Id of the topic advanced to, when a ready neighbour existed
    pub topic_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayedResponse {
    pub topic_id: String,
    pub played: bool,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    /// Topic ids not yet reached
    pub playback_queue: Vec<String>,
    /// Topic ids already passed
    pub played_topics: Vec<String>,
}

/// Map a domain error to an HTTP response
fn error_response(e: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &e {
        Error::NotReady(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidState(_) => StatusCode::BAD_REQUEST,
        Error::ResourceSwitch(_)
        | Error::ManifestFetch(_)
        | Error::TopicFeed(_)
        | Error::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/status - observables snapshot
pub async fn get_status(
    State(state): State<AppState>,
) -> Json<crate::player::PlayerStatus> {
    Json(state.player.status().await)
}

/// POST /api/v1/playback/toggle - play/pause intent
pub async fn toggle_play(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    state.player.toggle_play().await.map_err(error_response)?;
    let status = state.player.status().await;
    Ok(Json(json!({ "is_playing": status.is_playing })))
}

/// POST /api/v1/playback/mute - mute toggle (gain only)
pub async fn toggle_mute(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.player.toggle_mute().await;
    let status = state.player.status().await;
    Json(json!({ "is_muted": status.is_muted }))
}

/// POST /api/v1/playback/seek - relative seek on the loaded track
pub async fn seek(
    State(state): State<AppState>,
    Json(request): Json<SeekRequest>,
) -> Json<serde_json::Value> {
    state.player.seek_by(request.delta_seconds).await;
    let status = state.player.status().await;
    Json(json!({ "current_time": status.current_time }))
}

/// POST /api/v1/playback/topic - play (or toggle) a queue member
pub async fn play_topic(
    State(state): State<AppState>,
    Json(request): Json<PlayTopicRequest>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    info!("Play topic requested: {}", request.topic_id);
    state
        .player
        .play_topic_by_id(&request.topic_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/playback/next - advance to the next ready topic
pub async fn play_next(
    State(state): State<AppState>,
) -> Result<Json<AdvanceResponse>, (StatusCode, Json<serde_json::Value>)> {
    let advanced = state.player.play_next_topic().await.map_err(error_response)?;
    Ok(Json(AdvanceResponse {
        topic_id: advanced.map(|t| t.id),
    }))
}

/// POST /api/v1/playback/previous - step back to the previous ready topic
pub async fn play_previous(
    State(state): State<AppState>,
) -> Result<Json<AdvanceResponse>, (StatusCode, Json<serde_json::Value>)> {
    let advanced = state.player.play_prev_topic().await.map_err(error_response)?;
    Ok(Json(AdvanceResponse {
        topic_id: advanced.map(|t| t.id),
    }))
}

/// GET /api/v1/playback/played/:topic_id - played-set membership
pub async fn is_played(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> Json<PlayedResponse> {
    let played = state.player.is_played(&topic_id).await;
    Json(PlayedResponse { topic_id, played })
}

/// GET /api/v1/queue - recomputed queue projections
pub async fn get_queue(State(state): State<AppState>) -> Json<QueueResponse> {
    Json(QueueResponse {
        playback_queue: state.player.playback_queue_ids().await,
        played_topics: state.player.played_topic_ids().await,
    })
}
