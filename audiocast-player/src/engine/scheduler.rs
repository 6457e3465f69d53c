//! Playback timers
//!
//! Two independent timer families, both delivered as messages into the
//! engine queue so that timer work is serialized with commands and
//! callbacks:
//!
//! - position sampling: a self-rescheduling single-shot chain that runs
//!   while the active flag is set
//! - inactivity watchdog: single-shot, never cancelled; multiple pending
//!   watchdogs may coexist, so firings carry the session id and the engine
//!   applies a state-based check
//!
//! Stale firings from a torn-down session are filtered by session identity.

use super::EngineMsg;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct ProgressScheduler {
    tx: mpsc::UnboundedSender<EngineMsg>,
    session: Uuid,
    position_interval: Duration,
    watchdog_timeout: Duration,
    sampling_active: bool,
}

impl ProgressScheduler {
    pub fn new(
        tx: mpsc::UnboundedSender<EngineMsg>,
        session: Uuid,
        position_interval: Duration,
        watchdog_timeout: Duration,
    ) -> Self {
        Self {
            tx,
            session,
            position_interval,
            watchdog_timeout,
            sampling_active: false,
        }
    }

    /// Re-key pending and future firings to a new session.
    pub fn set_session(&mut self, session: Uuid) {
        self.session = session;
        self.sampling_active = false;
    }

    pub fn sampling_active(&self) -> bool {
        self.sampling_active
    }

    /// Begin the sampling chain. No-op while already active.
    pub fn start_sampling(&mut self) {
        if !self.sampling_active {
            self.sampling_active = true;
            self.schedule_sample();
        }
    }

    /// Stop the chain; the pending firing becomes a no-op.
    pub fn stop_sampling(&mut self) {
        self.sampling_active = false;
    }

    /// Queue the next position sample after the configured interval.
    pub fn schedule_sample(&self) {
        let tx = self.tx.clone();
        let session = self.session;
        let interval = self.position_interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = tx.send(EngineMsg::PositionPoll { session });
        });
    }

    /// Arm an inactivity watchdog. Pending watchdogs are not cancelled.
    pub fn arm_watchdog(&self) {
        let tx = self.tx.clone();
        let session = self.session;
        let timeout = self.watchdog_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx.send(EngineMsg::WatchdogFire { session });
        });
    }
}
