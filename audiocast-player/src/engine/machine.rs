//! Playback state machine
//!
//! Holds the session's `PlaybackState` and authorizes transitions. The
//! transport throws undefined behavior when commanded out of its legal
//! lifecycle, so every transport call in the dispatcher is gated by a guard
//! check here. An action attempted outside its legal source states is a
//! logged no-op, never an error.

pub use audiocast_common::events::PlaybackState;
use tracing::{debug, trace};

use PlaybackState::*;

/// States from which `start` may be issued
pub const START_SOURCES: &[PlaybackState] = &[Prepared, Started, Paused, Completed];

/// States from which `pause` may be issued
pub const PAUSE_SOURCES: &[PlaybackState] = &[Started];

/// States from which `stop` may be issued
pub const STOP_SOURCES: &[PlaybackState] = &[Started, Completed, Stopped, Prepared, Paused];

/// States from which `seek` may be issued
pub const SEEK_SOURCES: &[PlaybackState] = &[Started, Completed, Prepared, Paused];

/// States from which `prepare` may be issued
pub const PREPARE_SOURCES: &[PlaybackState] = &[Initialized, Stopped];

/// States in which the position sampler reports and persists offsets
pub const SAMPLING_STATES: &[PlaybackState] = &[Started, Paused, Stopped];

/// States the inactivity watchdog must leave alone
pub const WATCHDOG_SAFE: &[PlaybackState] = &[Started, Paused];

/// State holder; `transition` is the only write path.
pub struct PlaybackStateMachine {
    state: PlaybackState,
}

impl PlaybackStateMachine {
    pub fn new() -> Self {
        Self { state: Idle }
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True when the current state is exactly `state`
    pub fn at(&self, state: PlaybackState) -> bool {
        self.state == state
    }

    /// Guard check: is the current state one of `allowed`?
    ///
    /// A failed check logs the mismatch and the caller drops the action.
    pub fn at_any_of(&self, allowed: &[PlaybackState]) -> bool {
        if allowed.contains(&self.state) {
            trace!(state = %self.state, "state guard matched");
            true
        } else {
            debug!(state = %self.state, ?allowed, "state guard rejected, dropping action");
            false
        }
    }

    /// Record a transition and return the previous state.
    pub fn transition(&mut self, new: PlaybackState) -> PlaybackState {
        let previous = self.state;
        debug!(from = %previous, to = %new, "playback state transition");
        self.state = new;
        previous
    }
}

impl Default for PlaybackStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
