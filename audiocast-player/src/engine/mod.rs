//! Playback control engine
//!
//! One engine instance drives one logical playback session at a time. All
//! inbound commands, transport callbacks, external focus signals and timer
//! firings are funneled through a single mpsc queue and applied one at a
//! time, in arrival order, by one task. That serialization point is what
//! keeps the state machine, the transport and the resource arbiter
//! consistent without locks.

pub mod arbiter;
pub(crate) mod dispatcher;
pub mod machine;
pub(crate) mod scheduler;

pub use arbiter::{FocusChange, HostResources, NullHostResources};
pub use machine::{PlaybackState, PlaybackStateMachine};

use crate::notify::NotificationPresenter;
use crate::resume::ResumeStore;
use crate::state::SharedState;
use crate::transport::{TransportEvent, TransportFactory};
use audiocast_common::events::PlayerEvent;
use audiocast_common::notification::NotificationConfig;
use audiocast_common::track::TrackPatch;
use dispatcher::CommandDispatcher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;
use uuid::Uuid;

/// Play request carried by [`Command::Play`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    /// Stream to load; absent means "start whatever is loaded"
    pub stream_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub art_uri: Option<String>,
    /// Start playback as soon as the source is ready
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
    /// Resume from the last persisted position for this stream
    #[serde(default)]
    pub resume: bool,
    /// Notification pass-through accompanying this request
    #[serde(default)]
    pub notification: Option<NotificationConfig>,
}

fn default_autoplay() -> bool {
    true
}

impl Default for PlayRequest {
    fn default() -> Self {
        Self {
            stream_url: None,
            title: None,
            description: None,
            art_uri: None,
            autoplay: true,
            resume: false,
            notification: None,
        }
    }
}

impl PlayRequest {
    /// Request to play `url` with default options
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            stream_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub(crate) fn patch(&self) -> TrackPatch {
        TrackPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            art_uri: self.art_uri.clone(),
            stream_url: self.stream_url.clone(),
        }
    }
}

/// Inbound command surface
///
/// Commands are fire-and-forget; the only synchronous answer is whether the
/// engine accepted the message. Effects are observed through the event
/// stream.
#[derive(Debug, Clone)]
pub enum Command {
    Play(PlayRequest),
    PlayToggle,
    Pause,
    Stop,
    Seek { position_ms: i64 },
    SeekBy { delta_ms: i64 },
    SetVolume { volume: f32 },
    ToggleMute,
    UpdateNotification {
        patch: TrackPatch,
        config: Option<NotificationConfig>,
    },
}

/// Everything that flows through the engine's serialization point
#[derive(Debug)]
pub(crate) enum EngineMsg {
    Command(Command),
    Transport {
        session: Uuid,
        event: TransportEvent,
    },
    Focus(FocusChange),
    PositionPoll {
        session: Uuid,
    },
    WatchdogFire {
        session: Uuid,
    },
}

/// Collaborators handed to the engine at spawn
pub struct EngineDeps {
    /// Builds one transport per session
    pub transport_factory: TransportFactory,
    /// Resume-position persistence
    pub resume: Arc<dyn ResumeStore>,
    /// Notification surface
    pub presenter: Box<dyn NotificationPresenter>,
    /// Audio focus + keep-alive lock host binding
    pub host: Box<dyn HostResources>,
    /// Interval between position samples while audible
    pub position_interval: Duration,
    /// Idle time before an inactive session tears itself down
    pub watchdog_timeout: Duration,
}

/// Handle for feeding the engine; cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineMsg>,
    shared: Arc<SharedState>,
}

impl EngineHandle {
    /// Enqueue a command. Returns false when the engine task is gone.
    pub fn command(&self, command: Command) -> bool {
        self.tx.send(EngineMsg::Command(command)).is_ok()
    }

    /// Deliver an externally observed audio-focus change.
    pub fn focus_change(&self, change: FocusChange) -> bool {
        self.tx.send(EngineMsg::Focus(change)).is_ok()
    }

    /// Shared read model and event source
    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    /// Subscribe to the engine's event stream
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.shared.subscribe()
    }
}

/// Engine entry point
pub struct Engine;

impl Engine {
    /// Spawn the engine task and return its handle.
    pub fn spawn(deps: EngineDeps, shared: Arc<SharedState>) -> EngineHandle {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut dispatcher = CommandDispatcher::new(deps, shared.clone(), tx.clone());

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    EngineMsg::Command(command) => {
                        // A terminal session is rebuilt before the next
                        // command applies.
                        if dispatcher.is_ended() {
                            dispatcher.recreate_session();
                        }
                        dispatcher.dispatch(command).await;
                    }
                    EngineMsg::Transport { session, event } => {
                        if session == dispatcher.session() && !dispatcher.is_ended() {
                            dispatcher.handle_transport(event).await;
                        } else {
                            debug!(?event, "dropping callback from stale session");
                        }
                    }
                    EngineMsg::Focus(change) => {
                        dispatcher.handle_focus(change).await;
                    }
                    EngineMsg::PositionPoll { session } => {
                        if session == dispatcher.session() {
                            dispatcher.on_position_poll().await;
                        }
                    }
                    EngineMsg::WatchdogFire { session } => {
                        if session == dispatcher.session() {
                            dispatcher.on_watchdog().await;
                        }
                    }
                }
            }
            debug!("engine queue closed, exiting");
        });

        EngineHandle { tx, shared }
    }
}
