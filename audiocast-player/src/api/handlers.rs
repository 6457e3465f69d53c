//! HTTP request handlers
//!
//! One POST endpoint per engine command. Commands are fire-and-forget: the
//! response only says whether the engine accepted the message; effects are
//! observed on the SSE stream.

use crate::api::server::AppContext;
use crate::engine::{Command, FocusChange, PlayRequest};
use audiocast_common::notification::NotificationConfig;
use audiocast_common::track::{TrackInfo, TrackPatch};
use audiocast_common::PlaybackState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    position_ms: i64,
}

#[derive(Debug, Deserialize)]
pub struct SeekByRequest {
    delta_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeRequest {
    /// Volume level 0.0-1.0
    pub volume: f32,
}

#[derive(Debug, Deserialize)]
pub struct NotificationStyleRequest {
    #[serde(flatten)]
    pub track: TrackPatch,
    pub notification: Option<NotificationConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub change: FocusChange,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: PlaybackState,
    pub track: Option<TrackInfo>,
    pub volume: f32,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub stream_url: Option<String>,
    pub position_ms: u64,
    pub state: PlaybackState,
}

fn accepted(accepted: bool) -> Json<CommandResponse> {
    Json(CommandResponse { accepted })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "audiocast-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback Commands
// ============================================================================

/// POST /playback/play - Load and/or start a stream
pub async fn play(
    State(ctx): State<AppContext>,
    Json(request): Json<PlayRequest>,
) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::Play(request)))
}

/// POST /playback/toggle - Play/pause toggle
pub async fn play_toggle(State(ctx): State<AppContext>) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::PlayToggle))
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::Pause))
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::Stop))
}

/// POST /playback/seek - Absolute seek in milliseconds
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(request): Json<SeekRequest>,
) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::Seek {
        position_ms: request.position_ms,
    }))
}

/// POST /playback/seek_by - Relative seek in milliseconds
pub async fn seek_by(
    State(ctx): State<AppContext>,
    Json(request): Json<SeekByRequest>,
) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::SeekBy {
        delta_ms: request.delta_ms,
    }))
}

/// GET /playback/state - Current state snapshot
pub async fn get_state(State(ctx): State<AppContext>) -> Json<StateResponse> {
    let shared = ctx.engine.shared();
    Json(StateResponse {
        state: shared.playback_state(),
        track: shared.track(),
        volume: shared.volume(),
    })
}

/// GET /playback/position - Last sampled position
pub async fn get_position(State(ctx): State<AppContext>) -> Json<PositionResponse> {
    let shared = ctx.engine.shared();
    Json(PositionResponse {
        stream_url: shared.track().map(|t| t.stream_url),
        position_ms: shared.position_ms(),
        state: shared.playback_state(),
    })
}

// ============================================================================
// Volume Commands
// ============================================================================

/// GET /audio/volume - Current volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeRequest> {
    Json(VolumeRequest {
        volume: ctx.engine.shared().volume(),
    })
}

/// POST /audio/volume - Set volume (0.0-1.0)
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(request): Json<VolumeRequest>,
) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::SetVolume {
        volume: request.volume,
    }))
}

/// POST /audio/mute_toggle
pub async fn mute_toggle(State(ctx): State<AppContext>) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::ToggleMute))
}

// ============================================================================
// Notification and Focus
// ============================================================================

/// POST /notification/style - Update the pass-through notification config
pub async fn notification_style(
    State(ctx): State<AppContext>,
    Json(request): Json<NotificationStyleRequest>,
) -> Json<CommandResponse> {
    accepted(ctx.engine.command(Command::UpdateNotification {
        patch: request.track,
        config: request.notification,
    }))
}

/// POST /focus - Externally observed audio-focus change
pub async fn focus(
    State(ctx): State<AppContext>,
    Json(request): Json<FocusRequest>,
) -> Json<CommandResponse> {
    accepted(ctx.engine.focus_change(request.change))
}
