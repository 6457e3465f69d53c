//! Notification presentation boundary
//!
//! The engine pushes state, track metadata and the pass-through
//! [`NotificationConfig`] to a presenter on every change; what the presenter
//! renders (system notification, tray item, nothing) is its own business.

use audiocast_common::events::PlaybackState;
use audiocast_common::notification::NotificationConfig;
use audiocast_common::track::TrackInfo;
use tracing::debug;

/// Presentation collaborator for the player notification surface
pub trait NotificationPresenter: Send {
    /// Reflect the current state, track and configuration.
    fn update(&mut self, state: PlaybackState, track: Option<&TrackInfo>, config: &NotificationConfig);

    /// Remove any visible notification.
    fn clear(&mut self);
}

/// Presenter that only logs; the default when no UI host is attached.
#[derive(Default)]
pub struct LogPresenter;

impl NotificationPresenter for LogPresenter {
    fn update(
        &mut self,
        state: PlaybackState,
        track: Option<&TrackInfo>,
        config: &NotificationConfig,
    ) {
        debug!(
            %state,
            title = track.and_then(|t| t.title.as_deref()),
            style = ?config.style,
            flags = config.flags,
            "notification update"
        );
    }

    fn clear(&mut self) {
        debug!("notification cleared");
    }
}
