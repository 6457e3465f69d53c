//! Shared playback state
//!
//! Thread-safe read model of the engine plus the event broadcast channel.
//! The engine task is the only writer; HTTP handlers and SSE subscribers
//! read from it. Writes are rare and tiny, so plain `std::sync` locks are
//! used and never held across await points.

use audiocast_common::events::{PlaybackState, PlayerEvent};
use audiocast_common::track::TrackInfo;
use std::sync::RwLock;
use tokio::sync::broadcast;

/// Shared state accessible by all components
pub struct SharedState {
    /// Current playback state
    playback_state: RwLock<PlaybackState>,

    /// Currently loaded track (None until first play)
    track: RwLock<Option<TrackInfo>>,

    /// Last applied volume (0.0-1.0)
    volume: RwLock<f32>,

    /// Last sampled playback position
    position_ms: RwLock<u64>,

    /// Event broadcaster for SSE events
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            playback_state: RwLock::new(PlaybackState::Idle),
            track: RwLock::new(None),
            volume: RwLock::new(1.0),
            position_ms: RwLock::new(0),
            event_tx,
        }
    }

    /// Broadcast an event to all listeners
    pub fn broadcast(&self, event: PlayerEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    pub fn playback_state(&self) -> PlaybackState {
        *self.playback_state.read().unwrap()
    }

    pub fn set_playback_state(&self, state: PlaybackState) {
        *self.playback_state.write().unwrap() = state;
    }

    pub fn track(&self) -> Option<TrackInfo> {
        self.track.read().unwrap().clone()
    }

    pub fn set_track(&self, track: Option<TrackInfo>) {
        *self.track.write().unwrap() = track;
    }

    pub fn volume(&self) -> f32 {
        *self.volume.read().unwrap()
    }

    pub fn set_volume(&self, volume: f32) {
        *self.volume.write().unwrap() = volume.clamp(0.0, 1.0);
    }

    pub fn position_ms(&self) -> u64 {
        *self.position_ms.read().unwrap()
    }

    pub fn set_position_ms(&self, position_ms: u64) {
        *self.position_ms.write().unwrap() = position_ms;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
