//! # Audiocast Player Library (audiocast-player)
//!
//! Playback control engine for a single streaming audio source.
//!
//! **Purpose:** Drive a media transport through its lifecycle (play, pause,
//! stop, seek, volume, resume-from-position) while arbitrating audio focus
//! and a streaming keep-alive lock, and publish every observable change as
//! an event stream.
//!
//! **Architecture:** Actor-style engine. All commands, transport callbacks,
//! focus signals and timer firings funnel through one queue drained by one
//! task, with an HTTP/SSE control surface on top.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod resume;
pub mod state;
pub mod transport;

pub use engine::{Command, Engine, EngineDeps, EngineHandle, PlayRequest};
pub use error::{Error, Result};
pub use state::SharedState;
