//! Command and callback dispatch
//!
//! Executes inbound commands and transport callbacks against the state
//! machine, drives the transport, and emits outbound events. Every method
//! here runs on the engine task; nothing touches session state from any
//! other execution context.

use super::arbiter::{FocusChange, ResourceArbiter, DUCK_VOLUME};
use super::machine::{
    PlaybackState, PlaybackStateMachine, PAUSE_SOURCES, PREPARE_SOURCES, SAMPLING_STATES,
    SEEK_SOURCES, START_SOURCES, STOP_SOURCES, WATCHDOG_SAFE,
};
use super::scheduler::ProgressScheduler;
use super::{Command, EngineDeps, EngineMsg, PlayRequest};
use crate::notify::NotificationPresenter;
use crate::resume::ResumeStore;
use crate::state::SharedState;
use crate::transport::{Transport, TransportEvent, TransportFactory};
use audiocast_common::events::PlayerEvent;
use audiocast_common::notification::NotificationConfig;
use audiocast_common::track::{TrackInfo, TrackPatch};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-session command executor; owned and driven by the engine task.
pub struct CommandDispatcher {
    machine: PlaybackStateMachine,
    transport: Box<dyn Transport>,
    session: Uuid,
    track: Option<TrackInfo>,
    /// Start playback as soon as the transport reports prepared
    autoplay: bool,
    volume: f32,
    /// Volume before the most recent change; what mute-toggle restores
    previous_volume: f32,
    /// Resume offset applied once, right after the transport reports ready
    start_offset_ms: u64,
    notification: NotificationConfig,
    arbiter: ResourceArbiter,
    scheduler: ProgressScheduler,
    resume: Arc<dyn ResumeStore>,
    presenter: Box<dyn NotificationPresenter>,
    shared: Arc<SharedState>,
    factory: TransportFactory,
    engine_tx: mpsc::UnboundedSender<EngineMsg>,
}

impl CommandDispatcher {
    pub fn new(
        deps: EngineDeps,
        shared: Arc<SharedState>,
        engine_tx: mpsc::UnboundedSender<EngineMsg>,
    ) -> Self {
        let session = Uuid::new_v4();
        let transport = spawn_transport(&deps.transport_factory, &engine_tx, session);
        let scheduler = ProgressScheduler::new(
            engine_tx.clone(),
            session,
            deps.position_interval,
            deps.watchdog_timeout,
        );
        // A fresh session may never receive a play command; the watchdog
        // reclaims it.
        scheduler.arm_watchdog();
        info!(%session, "playback session created");

        Self {
            machine: PlaybackStateMachine::new(),
            transport,
            session,
            track: None,
            autoplay: false,
            volume: shared.volume(),
            previous_volume: 0.0,
            start_offset_ms: 0,
            notification: NotificationConfig::default(),
            arbiter: ResourceArbiter::new(deps.host),
            scheduler,
            resume: deps.resume,
            presenter: deps.presenter,
            shared,
            factory: deps.transport_factory,
            engine_tx,
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn is_ended(&self) -> bool {
        self.machine.at(PlaybackState::Ended)
    }

    // ------------------------------------------------------------------
    // Inbound commands
    // ------------------------------------------------------------------

    pub async fn dispatch(&mut self, command: Command) {
        debug!(?command, "dispatching command");
        match command {
            Command::Play(request) => self.play(request).await,
            Command::PlayToggle => self.play_toggle().await,
            Command::Pause => self.pause().await,
            Command::Stop => self.stop().await,
            Command::Seek { position_ms } => self.seek_to(position_ms),
            Command::SeekBy { delta_ms } => self.seek_by(delta_ms),
            Command::SetVolume { volume } => self.set_volume(volume),
            Command::ToggleMute => self.toggle_mute(),
            Command::UpdateNotification { patch, config } => {
                self.update_notification(patch, config)
            }
        }
    }

    async fn play(&mut self, request: PlayRequest) {
        if request.resume {
            if let Some(url) = request.stream_url.as_deref() {
                self.start_offset_ms = match self.resume.get(url).await {
                    Ok(ms) => ms,
                    Err(e) => {
                        warn!(%url, error = %e, "failed to read resume position");
                        0
                    }
                };
            }
        }

        let same_stream = match (&request.stream_url, &self.track) {
            (Some(url), Some(track)) => track.same_stream(url),
            _ => false,
        };

        self.merge_track(request.patch());
        if let Some(config) = request.notification {
            self.notification = config;
        }

        match request.stream_url {
            // Same stream already loaded: resume-only start on the
            // existing transport.
            Some(_) if same_stream => self.start(),
            Some(url) => {
                self.autoplay = request.autoplay;
                self.set_source(&url, true);
                self.prepare();
                self.presenter
                    .update(self.machine.state(), self.track.as_ref(), &self.notification);
            }
            None => {
                if self.track.is_some() {
                    self.start();
                } else {
                    warn!("play request without stream url and no track loaded");
                }
            }
        }
    }

    async fn play_toggle(&mut self) {
        match self.machine.state() {
            PlaybackState::Started => self.pause().await,
            PlaybackState::Stopped => {
                self.autoplay = true;
                self.prepare();
            }
            _ => self.start(),
        }
    }

    async fn pause(&mut self) {
        if self.machine.at_any_of(PAUSE_SOURCES) {
            self.persist_position().await;
            self.transport.pause();
            self.arbiter.release_all();
            self.set_state(PlaybackState::Paused);
            self.scheduler.stop_sampling();
        }
    }

    async fn stop(&mut self) {
        // Stop is the cancellation path for an in-flight prepare: the
        // transport cannot be stopped mid-prepare, so discard the autoplay
        // intent and reset instead.
        if self.machine.at(PlaybackState::Preparing) {
            self.autoplay = false;
            self.reset(false);
            return;
        }
        if self.machine.at_any_of(STOP_SOURCES) {
            self.persist_position().await;
            self.transport.stop();
            self.arbiter.release_all();
            self.set_state(PlaybackState::Stopped);
            self.scheduler.stop_sampling();
            self.scheduler.arm_watchdog();
        }
    }

    fn seek_to(&mut self, position_ms: i64) {
        let target = position_ms.max(0) as u64;
        if self.machine.at_any_of(SEEK_SOURCES) {
            self.transport.seek(target);
        }
    }

    fn seek_by(&mut self, delta_ms: i64) {
        let current = self.transport.position_ms() as i64;
        self.seek_to(current.saturating_add(delta_ms));
    }

    fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if volume != self.volume {
            debug!(from = self.volume, to = volume, "volume change");
            self.previous_volume = self.volume;
            self.volume = volume;
            self.transport.set_volume(volume, volume);
        }
        // Observers always get the authoritative current value, even when
        // the request was a no-op.
        self.shared.set_volume(self.volume);
        self.emit(PlayerEvent::VolumeChanged {
            volume: self.volume,
            timestamp: Utc::now(),
        });
    }

    fn toggle_mute(&mut self) {
        if self.volume == 0.0 {
            let restore = if self.previous_volume > 0.0 {
                self.previous_volume
            } else {
                1.0
            };
            self.set_volume(restore);
        } else {
            self.set_volume(0.0);
        }
    }

    fn update_notification(&mut self, patch: TrackPatch, config: Option<NotificationConfig>) {
        self.merge_track(patch);
        if let Some(config) = config {
            self.notification = config;
        }
        self.presenter
            .update(self.machine.state(), self.track.as_ref(), &self.notification);
    }

    // ------------------------------------------------------------------
    // Transport callbacks
    // ------------------------------------------------------------------

    pub async fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Prepared => self.on_prepared(),
            TransportEvent::Completed => self.on_completed(),
            TransportEvent::Error { reason } => self.on_error(&reason),
            TransportEvent::SeekComplete { position_ms } => {
                self.on_seek_complete(position_ms).await
            }
            TransportEvent::Buffering { percent } => {
                self.emit(PlayerEvent::BufferingChanged {
                    percent,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn on_prepared(&mut self) {
        if !self.machine.at(PlaybackState::Preparing) {
            debug!("stale prepared callback ignored");
            return;
        }
        self.set_state(PlaybackState::Prepared);
        if self.autoplay {
            let offset = self.start_offset_ms;
            if offset > 0 {
                self.seek_to(offset as i64);
            }
            self.start();
        }
    }

    fn on_completed(&mut self) {
        self.set_state(PlaybackState::Completed);
        self.arbiter.release_all();
        self.scheduler.stop_sampling();
        self.scheduler.arm_watchdog();
    }

    fn on_error(&mut self, reason: &str) {
        warn!(%reason, "transport error");
        self.set_state(PlaybackState::Error);
        self.arbiter.release_all();
        self.scheduler.stop_sampling();
        self.scheduler.arm_watchdog();
    }

    async fn on_seek_complete(&mut self, position_ms: u64) {
        // No state change; record and announce the new position.
        if let Some(track) = self.track.clone() {
            self.store_position(&track.stream_url, position_ms).await;
        }
        self.shared.set_position_ms(position_ms);
        self.emit(PlayerEvent::PositionChanged {
            stream_url: self.track.as_ref().map(|t| t.stream_url.clone()),
            position_ms,
            timestamp: Utc::now(),
        });
    }

    // ------------------------------------------------------------------
    // Focus signals
    // ------------------------------------------------------------------

    pub async fn handle_focus(&mut self, change: FocusChange) {
        info!(?change, "audio focus change");
        match change {
            FocusChange::Gain => {
                self.set_volume(1.0);
                if !self.transport.is_rendering() {
                    self.start();
                }
            }
            FocusChange::Loss => {
                self.stop().await;
                self.arbiter.release_all();
            }
            FocusChange::LossTransient => self.pause().await,
            FocusChange::LossCanDuck => self.set_volume(DUCK_VOLUME),
        }
    }

    // ------------------------------------------------------------------
    // Timer firings
    // ------------------------------------------------------------------

    pub async fn on_position_poll(&mut self) {
        if self.machine.at_any_of(SAMPLING_STATES) {
            let position_ms = self.transport.position_ms();
            if let Some(track) = self.track.clone() {
                self.store_position(&track.stream_url, position_ms).await;
            }
            self.shared.set_position_ms(position_ms);
            self.emit(PlayerEvent::PositionChanged {
                stream_url: self.track.as_ref().map(|t| t.stream_url.clone()),
                position_ms,
                timestamp: Utc::now(),
            });
            if self.scheduler.sampling_active() {
                self.scheduler.schedule_sample();
            }
        }
    }

    pub async fn on_watchdog(&mut self) {
        if !self.machine.at_any_of(WATCHDOG_SAFE) {
            info!("inactivity timeout reached, releasing session");
            self.release();
        }
    }

    // ------------------------------------------------------------------
    // Guarded transport operations
    // ------------------------------------------------------------------

    fn set_source(&mut self, url: &str, force: bool) {
        if self.machine.at(PlaybackState::Idle) {
            debug!(%url, "setting stream source");
            match self.transport.set_source(url) {
                Ok(()) => self.set_state(PlaybackState::Initialized),
                Err(e) => {
                    warn!(%url, error = %e, "failed to set stream source");
                    self.set_state(PlaybackState::Error);
                }
            }
        } else if force {
            self.reset(true);
            self.set_source(url, false);
            if self.autoplay {
                self.prepare();
            }
        }
    }

    fn prepare(&mut self) {
        if self.machine.at_any_of(PREPARE_SOURCES) {
            self.transport.prepare_async();
            self.set_state(PlaybackState::Preparing);
        }
    }

    fn start(&mut self) {
        if self.machine.at_any_of(START_SOURCES) {
            self.start_offset_ms = 0;
            self.transport.start();
            self.autoplay = false;
            self.arbiter.acquire_for_playback();
            self.set_state(PlaybackState::Started);
            self.scheduler.start_sampling();
        } else if let Some(track) = self.track.clone() {
            // Out-of-lifecycle start: force a re-source and retry once via
            // the prepared callback.
            debug!("start outside legal state, forcing re-source");
            self.reset(true);
            self.autoplay = true;
            self.set_source(&track.stream_url, true);
            self.prepare();
        }
    }

    fn reset(&mut self, force: bool) {
        if !self.machine.at_any_of(&[PlaybackState::Ended, PlaybackState::Error]) {
            debug!(force, "resetting transport");
            self.transport.reset();
            self.arbiter.release_all();
            self.scheduler.stop_sampling();
            self.set_state(PlaybackState::Idle);
        } else if force {
            self.recreate_session();
        }
        self.scheduler.arm_watchdog();
    }

    fn release(&mut self) {
        if self.machine.at(PlaybackState::Ended) {
            return;
        }
        debug!("releasing transport");
        self.transport.release();
        self.arbiter.release_all();
        self.scheduler.stop_sampling();
        self.presenter.clear();
        self.set_state(PlaybackState::Ended);
    }

    /// Tear down the dead transport and build a fresh session around a new
    /// one. Pending callbacks and timers of the old session are orphaned by
    /// the session id change.
    pub fn recreate_session(&mut self) {
        self.transport.release();
        self.arbiter.release_all();

        self.session = Uuid::new_v4();
        self.transport = spawn_transport(&self.factory, &self.engine_tx, self.session);
        self.machine = PlaybackStateMachine::new();
        self.scheduler.set_session(self.session);
        self.autoplay = false;
        self.start_offset_ms = 0;
        self.publish_state();
        self.scheduler.arm_watchdog();
        info!(session = %self.session, "playback session re-initialized");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn merge_track(&mut self, patch: TrackPatch) {
        if let Some(updated) = patch.apply(self.track.as_ref()) {
            self.track = Some(updated.clone());
            self.shared.set_track(Some(updated.clone()));
            self.presenter
                .update(self.machine.state(), Some(&updated), &self.notification);
            self.emit(PlayerEvent::MetadataChanged {
                track: updated,
                timestamp: Utc::now(),
            });
        }
    }

    fn set_state(&mut self, new: PlaybackState) {
        self.machine.transition(new);
        self.publish_state();
    }

    fn publish_state(&mut self) {
        let state = self.machine.state();
        self.shared.set_playback_state(state);
        self.presenter
            .update(state, self.track.as_ref(), &self.notification);
        self.emit(PlayerEvent::StateChanged {
            state,
            timestamp: Utc::now(),
        });
    }

    async fn persist_position(&mut self) {
        if let Some(track) = self.track.clone() {
            let position_ms = self.transport.position_ms();
            self.store_position(&track.stream_url, position_ms).await;
        }
    }

    async fn store_position(&mut self, url: &str, position_ms: u64) {
        if let Err(e) = self.resume.put(url, position_ms).await {
            warn!(%url, error = %e, "failed to persist resume position");
        }
    }

    fn emit(&self, event: PlayerEvent) {
        self.shared.broadcast(event);
    }
}

/// Build a transport for `session`, forwarding its callbacks into the
/// engine queue tagged with the session id.
fn spawn_transport(
    factory: &TransportFactory,
    engine_tx: &mpsc::UnboundedSender<EngineMsg>,
    session: Uuid,
) -> Box<dyn Transport> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine_tx = engine_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if engine_tx
                .send(EngineMsg::Transport { session, event })
                .is_err()
            {
                break;
            }
        }
    });
    factory(tx)
}
