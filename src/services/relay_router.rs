//! Relay Router for splitscroll.
//!
//! The single shared dispatcher: takes a scroll event from one tab, works out
//! which tabs in the same window share its group, and forwards a sync command
//! to each of them. Fan-out is best-effort per recipient.

use serde::Serialize;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::services::delivery::{deliver_best_effort, TabMessenger};
use crate::services::settings_store::SettingsStore;
use crate::types::message::Message;
use crate::types::scroll::{ScrollMetrics, SyncCommand};
use crate::types::settings::{SettingsPatch, SyncSettings};
use crate::types::tab::{GroupKey, TabInfo, WindowId};

/// Enumerates the tabs of a top-level window.
pub trait TabDirectory {
    fn tabs_in_window(&self, window_id: WindowId) -> Vec<TabInfo>;
}

impl<T: TabDirectory + ?Sized> TabDirectory for &T {
    fn tabs_in_window(&self, window_id: WindowId) -> Vec<TabInfo> {
        (**self).tabs_in_window(window_id)
    }
}

impl TabDirectory for [TabInfo] {
    fn tabs_in_window(&self, window_id: WindowId) -> Vec<TabInfo> {
        self.iter()
            .filter(|t| t.window_id == window_id)
            .cloned()
            .collect()
    }
}

impl TabDirectory for Vec<TabInfo> {
    fn tabs_in_window(&self, window_id: WindowId) -> Vec<TabInfo> {
        self.as_slice().tabs_in_window(window_id)
    }
}

/// Diagnostic summary of one relay pass. Never carries an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum RelayOutcome {
    /// Sync is turned off; the event was dropped.
    Disabled,
    /// The event was fanned out to the sender's siblings.
    Relayed {
        #[serde(rename = "relayId")]
        relay_id: Uuid,
        #[serde(serialize_with = "serialize_key")]
        group: GroupKey,
        delivered: usize,
        failed: usize,
    },
    /// The message was not a scroll event, or needed no fan-out.
    Ignored,
}

fn serialize_key<S: serde::Serializer>(key: &GroupKey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

impl RelayOutcome {
    pub fn delivered(&self) -> usize {
        match self {
            RelayOutcome::Relayed { delivered, .. } => *delivered,
            _ => 0,
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            RelayOutcome::Relayed { failed, .. } => *failed,
            _ => 0,
        }
    }
}

/// Routes scroll events between sibling tabs.
pub struct RelayRouter<S> {
    store: S,
    /// Last values seen via settings broadcasts; used when the store can't be read.
    cached: SyncSettings,
}

impl<S: SettingsStore> RelayRouter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cached: SyncSettings::default(),
        }
    }

    pub fn cached_settings(&self) -> &SyncSettings {
        &self.cached
    }

    /// Reads both settings fields in one go.
    fn current_settings(&self) -> SyncSettings {
        match self.store.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "settings load failed, using last known values");
                self.cached
            }
        }
    }

    /// Applies a settings broadcast.
    pub fn on_settings_changed(&mut self, patch: &SettingsPatch) {
        self.cached.apply(patch);
    }

    /// Dispatches a message received from `sender`.
    pub fn handle_message<D, M>(
        &mut self,
        message: &Message,
        sender: &TabInfo,
        directory: &D,
        messenger: &M,
    ) -> RelayOutcome
    where
        D: TabDirectory + ?Sized,
        M: TabMessenger + ?Sized,
    {
        match message {
            Message::ScrollEvent(metrics) => {
                self.handle_scroll_event(metrics, sender, directory, messenger)
            }
            Message::SettingsUpdated(patch) => {
                self.on_settings_changed(patch);
                RelayOutcome::Ignored
            }
            Message::SyncScroll(_) => {
                debug!(tab_id = sender.id, "ignoring SYNC_SCROLL sent to the relay");
                RelayOutcome::Ignored
            }
        }
    }

    /// Forwards `event` to every sibling of `sender` in the sender's window.
    pub fn handle_scroll_event<D, M>(
        &self,
        event: &ScrollMetrics,
        sender: &TabInfo,
        directory: &D,
        messenger: &M,
    ) -> RelayOutcome
    where
        D: TabDirectory + ?Sized,
        M: TabMessenger + ?Sized,
    {
        let settings = self.current_settings();
        if !settings.enable_sync {
            return RelayOutcome::Disabled;
        }

        let relay_id = Uuid::new_v4();
        let sender_key = GroupKey::resolve(sender);
        let span = info_span!("relay", %relay_id, sender = sender.id, group = %sender_key);
        let _enter = span.enter();

        let command = Message::SyncScroll(SyncCommand::from_metrics(*event, settings.sync_mode));
        let mut delivered = 0;
        let mut failed = 0;

        for candidate in directory.tabs_in_window(sender.window_id) {
            if candidate.id == sender.id {
                continue;
            }
            if !sender_key.is_same_group(&GroupKey::resolve(&candidate)) {
                continue;
            }
            if deliver_best_effort(messenger, candidate.id, command) {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        debug!(delivered, failed, mode = ?settings.sync_mode, "relay pass complete");
        RelayOutcome::Relayed {
            relay_id,
            group: sender_key,
            delivered,
            failed,
        }
    }
}
