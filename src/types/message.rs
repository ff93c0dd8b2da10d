use serde::{Deserialize, Serialize};

use super::scroll::{ScrollMetrics, SyncCommand};
use super::settings::SettingsPatch;

/// Every message that crosses the observer/relay boundary.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"SCROLL_EVENT","percentage":0.25,"pixel":250}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Observer → relay.
    ScrollEvent(ScrollMetrics),
    /// Relay → observer.
    SyncScroll(SyncCommand),
    /// Settings UI → relay and observers.
    SettingsUpdated(SettingsPatch),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::ScrollEvent(_) => "SCROLL_EVENT",
            Message::SyncScroll(_) => "SYNC_SCROLL",
            Message::SettingsUpdated(_) => "SETTINGS_UPDATED",
        }
    }
}
