//! Exclusive host resource arbitration
//!
//! Audio focus and the streaming keep-alive lock are process-wide singletons
//! tied 1:1 to audible playback: both are held exactly while the session is
//! in `Started`. Acquisition and release are idempotent so the dispatcher
//! can call them from any failure path without double-release concerns.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Volume applied while another consumer holds transient focus with ducking
pub const DUCK_VOLUME: f32 = 0.1;

/// Externally signaled audio-focus change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    /// Focus regained; restore volume and resume if not rendering
    Gain,
    /// Focus lost permanently; stop and drop resources
    Loss,
    /// Focus lost for a short interruption; pause
    LossTransient,
    /// Focus lost but ducked playback may continue; lower volume
    LossCanDuck,
}

/// Host-side handles for the two exclusive resources
pub trait HostResources: Send {
    /// Request the exclusive audio-focus grant. False when denied.
    fn request_focus(&mut self) -> bool;

    /// Give the audio-focus grant back.
    fn abandon_focus(&mut self);

    /// Keep the network interface awake while streaming.
    fn acquire_stream_lock(&mut self);

    /// Let the network interface suspend again.
    fn release_stream_lock(&mut self);
}

/// Host binding that only logs; used when no platform integration exists.
#[derive(Default)]
pub struct NullHostResources;

impl HostResources for NullHostResources {
    fn request_focus(&mut self) -> bool {
        debug!("audio focus requested");
        true
    }

    fn abandon_focus(&mut self) {
        debug!("audio focus abandoned");
    }

    fn acquire_stream_lock(&mut self) {
        debug!("stream keep-alive lock acquired");
    }

    fn release_stream_lock(&mut self) {
        debug!("stream keep-alive lock released");
    }
}

/// Tracks which exclusive resources this process currently holds.
pub struct ResourceArbiter {
    host: Box<dyn HostResources>,
    focus_held: bool,
    lock_held: bool,
}

impl ResourceArbiter {
    pub fn new(host: Box<dyn HostResources>) -> Self {
        Self {
            host,
            focus_held: false,
            lock_held: false,
        }
    }

    /// Acquire focus and the keep-alive lock for audible playback.
    /// Re-acquiring already-held resources is a no-op.
    pub fn acquire_for_playback(&mut self) {
        if !self.focus_held {
            if self.host.request_focus() {
                self.focus_held = true;
            } else {
                // Keep playing without the grant; the host will signal a
                // focus change if it wants us silenced.
                warn!("audio focus request denied");
            }
        }
        if !self.lock_held {
            self.host.acquire_stream_lock();
            self.lock_held = true;
        }
    }

    /// Release both resources. Safe to call from any state, repeatedly.
    pub fn release_all(&mut self) {
        if self.focus_held {
            self.host.abandon_focus();
            self.focus_held = false;
        }
        if self.lock_held {
            self.host.release_stream_lock();
            self.lock_held = false;
        }
    }

    /// True while either resource is held
    pub fn holds_any(&self) -> bool {
        self.focus_held || self.lock_held
    }
}
