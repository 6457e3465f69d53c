//! Notification pass-through configuration
//!
//! The engine forwards these values to the presentation collaborator without
//! interpreting them; the presenter owns their meaning.

use serde::{Deserialize, Serialize};

/// Show the notification at all
pub const FLAG_SHOW: u32 = 0b1;
/// Show play/pause as a toggle button
pub const FLAG_PLAY_TOGGLE: u32 = 0b10;
/// Show a stop/close button
pub const FLAG_STOP_BUTTON: u32 = 0b100;
/// Derive the background from the art image palette
pub const FLAG_PALETTE_BACKGROUND: u32 = 0b1000;

/// Default capability flags
pub const DEFAULT_FLAGS: u32 = FLAG_SHOW | FLAG_PLAY_TOGGLE | FLAG_PALETTE_BACKGROUND;

/// Presentation style of the notification surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStyle {
    Normal,
    Compact,
}

/// Style plus capability flags, passed through to the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub style: NotificationStyle,
    /// Bitset of `FLAG_*` values
    pub flags: u32,
}

impl NotificationConfig {
    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            style: NotificationStyle::Normal,
            flags: DEFAULT_FLAGS,
        }
    }
}
