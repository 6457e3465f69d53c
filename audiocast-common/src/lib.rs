//! # Audiocast Common Library
//!
//! Shared code for the audiocast playback service:
//! - Event types (PlayerEvent enum) published to listeners
//! - Playback state and track metadata types
//! - Notification pass-through configuration
//! - Error types
//! - Data directory resolution

pub mod config;
pub mod error;
pub mod events;
pub mod notification;
pub mod track;

pub use error::{Error, Result};
pub use events::{PlaybackState, PlayerEvent};
pub use notification::NotificationConfig;
pub use track::{TrackInfo, TrackPatch};
