//! App Core for splitscroll.
//!
//! Ties the tab registry, the relay router, the settings store and an outbound
//! messenger together. Hosts (the stdio relay binary, the tokio hub) own one
//! `RelayApp` and feed it messages tagged with the sending tab.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::managers::tab_registry::{TabRegistry, TabRegistryTrait};
use crate::services::delivery::{deliver_best_effort, TabMessenger};
use crate::services::relay_router::{RelayOutcome, RelayRouter};
use crate::services::settings_store::SharedSettings;
use crate::types::errors::DeliveryError;
use crate::types::message::Message;
use crate::types::settings::SettingsPatch;
use crate::types::tab::TabId;

/// Central relay struct holding the registry, router and settings.
pub struct RelayApp<M> {
    pub registry: TabRegistry,
    pub settings: SharedSettings,
    router: RelayRouter<SharedSettings>,
    messenger: M,
}

impl<M: TabMessenger> RelayApp<M> {
    pub fn new(settings: SharedSettings, messenger: M) -> Self {
        let mut router = RelayRouter::new(settings.clone());
        // Seed the router's fallback with whatever the store holds at startup.
        router.on_settings_changed(&SettingsPatch::from(settings.snapshot()));
        info!("relay started");
        Self {
            registry: TabRegistry::new(),
            settings,
            router,
            messenger,
        }
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn messenger_mut(&mut self) -> &mut M {
        &mut self.messenger
    }

    /// Feeds a message that arrived from `sender` into the router.
    /// Messages from tabs the registry doesn't know are dropped.
    pub fn receive(&mut self, sender: TabId, message: &Message) -> RelayOutcome {
        let Some(sender_info) = self.registry.get_tab(sender) else {
            debug!(sender, kind = message.kind(), "message from unknown tab dropped");
            return RelayOutcome::Ignored;
        };
        self.router
            .handle_message(message, &sender_info, &self.registry, &self.messenger)
    }

    /// The settings UI's write path: store the change, then broadcast it.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> usize {
        let patch = self.settings.apply(patch);
        self.broadcast_settings(&patch)
    }

    /// Applies `patch` to the router and sends `SETTINGS_UPDATED` to every
    /// registered tab. Returns how many tabs it reached.
    pub fn broadcast_settings(&mut self, patch: &SettingsPatch) -> usize {
        self.router.on_settings_changed(patch);
        let message = Message::SettingsUpdated(*patch);

        let mut reached = 0;
        for tab_id in self.registry.all_tab_ids() {
            if deliver_best_effort(&self.messenger, tab_id, message) {
                reached += 1;
            }
        }
        info!(?patch, reached, "settings broadcast");
        reached
    }
}

/// Messenger that queues deliveries for the host to flush.
#[derive(Debug, Default)]
pub struct QueueMessenger {
    queue: Mutex<VecDeque<(TabId, Message)>>,
}

impl QueueMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued delivery, oldest first.
    pub fn drain(&self) -> Vec<(TabId, Message)> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }
}

impl TabMessenger for QueueMessenger {
    fn send_to_tab(&self, tab_id: TabId, message: Message) -> Result<(), DeliveryError> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((tab_id, message));
        Ok(())
    }
}
