//! Event types for the audiocast event system
//!
//! Every observable effect of the playback engine is announced as a
//! `PlayerEvent` on a broadcast channel. Events carry a UTC timestamp and are
//! published in the exact order the corresponding internal transitions
//! occurred; listeners (SSE clients, tests) must never see them reordered.

use crate::track::TrackInfo;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the media transport for one playback session.
///
/// Exactly one value is live at a time; the engine's state machine is the
/// only writer. `Ended` is terminal: a session that reaches it must be fully
/// re-initialized before further commands apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Fresh transport, ready for a source URL
    Idle,
    /// Source set, ready to prepare
    Initialized,
    /// Asynchronous prepare in flight
    Preparing,
    /// Prepared, ready to start or seek
    Prepared,
    /// Audible playback
    Started,
    /// Paused, position retained
    Paused,
    /// Stopped, must prepare again before playback
    Stopped,
    /// Playback ran to the end of the stream
    Completed,
    /// Transport reported an unrecoverable failure
    Error,
    /// Transport released; session is dead
    Ended,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Initialized => "initialized",
            PlaybackState::Preparing => "preparing",
            PlaybackState::Prepared => "prepared",
            PlaybackState::Started => "started",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Completed => "completed",
            PlaybackState::Error => "error",
            PlaybackState::Ended => "ended",
        };
        write!(f, "{}", name)
    }
}

/// Audiocast event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed
    StateChanged {
        state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track metadata changed (new snapshot differs from the previous one)
    MetadataChanged {
        track: TrackInfo,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback position sampled or seek completed
    PositionChanged {
        /// Stream the position belongs to (None before any track is loaded)
        stream_url: Option<String>,
        position_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Volume changed (re-emitted even on no-op sets so observers always
    /// see the authoritative current value)
    VolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport buffering progress
    BufferingChanged {
        percent: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Get event type as string for filtering and SSE event names
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::StateChanged { .. } => "StateChanged",
            PlayerEvent::MetadataChanged { .. } => "MetadataChanged",
            PlayerEvent::PositionChanged { .. } => "PositionChanged",
            PlayerEvent::VolumeChanged { .. } => "VolumeChanged",
            PlayerEvent::BufferingChanged { .. } => "BufferingChanged",
        }
    }
}
