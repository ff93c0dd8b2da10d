//! In-process relay hub.
//!
//! Runs the relay in one tokio task and every observer in its own task. Tasks
//! only talk over unbounded mpsc channels, so every piece of protocol state
//! has a single owner.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::app::RelayApp;
use crate::managers::tab_registry::TabRegistryTrait;
use crate::services::delivery::{MessageSink, TabMessenger};
use crate::services::scroll_observer::{ScrollObserver, SharedPage, Viewport};
use crate::services::settings_store::{SettingsStore, SharedSettings};
use crate::types::errors::DeliveryError;
use crate::types::message::Message;
use crate::types::settings::{ObserverConfig, SettingsPatch};
use crate::types::tab::{TabId, TabInfo};

/// Routes relay output into each tab's inbox.
#[derive(Debug, Default)]
pub struct ChannelMessenger {
    inboxes: HashMap<TabId, mpsc::UnboundedSender<Message>>,
}

impl ChannelMessenger {
    pub fn register(&mut self, tab_id: TabId, inbox: mpsc::UnboundedSender<Message>) {
        self.inboxes.insert(tab_id, inbox);
    }

    pub fn unregister(&mut self, tab_id: TabId) {
        self.inboxes.remove(&tab_id);
    }
}

impl TabMessenger for ChannelMessenger {
    fn send_to_tab(&self, tab_id: TabId, message: Message) -> Result<(), DeliveryError> {
        let inbox = self
            .inboxes
            .get(&tab_id)
            .ok_or(DeliveryError::TabGone(tab_id))?;
        inbox
            .send(message)
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}

enum HubCommand {
    Open {
        tab: TabInfo,
        inbox: mpsc::UnboundedSender<Message>,
        reply: oneshot::Sender<TabInfo>,
    },
    Close(TabId),
    FromTab {
        sender: TabId,
        message: Message,
    },
    UpdateSettings(SettingsPatch),
    Shutdown,
}

/// An observer's outbound channel: tags each message with the sending tab.
#[derive(Debug, Clone)]
pub struct TabSink {
    tab_id: TabId,
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl MessageSink for TabSink {
    fn send(&self, message: Message) -> Result<(), DeliveryError> {
        self.commands
            .send(HubCommand::FromTab {
                sender: self.tab_id,
                message,
            })
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}

impl std::fmt::Debug for HubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubCommand::Open { tab, .. } => write!(f, "Open({})", tab.id),
            HubCommand::Close(id) => write!(f, "Close({})", id),
            HubCommand::FromTab { sender, message } => {
                write!(f, "FromTab({}, {})", sender, message.kind())
            }
            HubCommand::UpdateSettings(patch) => write!(f, "UpdateSettings({:?})", patch),
            HubCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Clonable handle onto a running hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
    settings: SharedSettings,
    config: ObserverConfig,
}

/// Starts the relay task. Observers are attached with `HubHandle::open_tab`.
pub fn spawn_hub(settings: SharedSettings, config: ObserverConfig) -> (HubHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let app = RelayApp::new(settings.clone(), ChannelMessenger::default());
    let task = tokio::spawn(run_hub(app, rx));
    (
        HubHandle {
            commands,
            settings,
            config,
        },
        task,
    )
}

/// Starts the relay task with observer timings read from the environment
/// (`SPLITSCROLL_QUIESCENCE_MS`, `SPLITSCROLL_FRAME_MS`).
pub fn spawn_hub_from_env(settings: SharedSettings) -> (HubHandle, JoinHandle<()>) {
    spawn_hub(settings, ObserverConfig::from_env())
}

async fn run_hub(
    mut app: RelayApp<ChannelMessenger>,
    mut commands: mpsc::UnboundedReceiver<HubCommand>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Open { tab, inbox, reply } => {
                let info = app.registry.upsert_tab(tab);
                app.messenger_mut().register(info.id, inbox);
                debug!(tab_id = info.id, group = %info.group_key(), "tab attached");
                let _ = reply.send(info);
            }
            HubCommand::Close(tab_id) => {
                let _ = app.registry.remove_tab(tab_id);
                app.messenger_mut().unregister(tab_id);
                debug!(tab_id, "tab detached");
            }
            HubCommand::FromTab { sender, message } => {
                app.receive(sender, &message);
            }
            HubCommand::UpdateSettings(patch) => {
                app.update_settings(patch);
            }
            HubCommand::Shutdown => break,
        }
    }
    info!("relay hub stopped");
}

impl HubHandle {
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Registers `tab` with the relay and starts its observer over `page`.
    pub async fn open_tab(&self, tab: TabInfo, page: SharedPage) -> Result<TabHandle, DeliveryError> {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(HubCommand::Open {
                tab,
                inbox: inbox_tx,
                reply: reply_tx,
            })
            .map_err(|_| DeliveryError::ChannelClosed)?;
        let info = reply_rx.await.map_err(|_| DeliveryError::ChannelClosed)?;

        let sink = TabSink {
            tab_id: info.id,
            commands: self.commands.clone(),
        };
        let (scroll_tx, scroll_rx) = mpsc::unbounded_channel();
        let observer = ScrollObserver::new(page.notifying(scroll_tx.clone()), sink, self.config);
        let task = tokio::spawn(run_observer(
            observer,
            self.settings.clone(),
            inbox_rx,
            scroll_rx,
        ));

        Ok(TabHandle {
            info,
            page,
            scrolls: scroll_tx,
            commands: self.commands.clone(),
            task,
        })
    }

    /// Settings UI write path: store the change and broadcast it.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<(), DeliveryError> {
        self.commands
            .send(HubCommand::UpdateSettings(patch))
            .map_err(|_| DeliveryError::ChannelClosed)
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(HubCommand::Shutdown);
    }
}

/// A tab attached to the hub: its page plus the observer task watching it.
#[derive(Debug)]
pub struct TabHandle {
    info: TabInfo,
    page: SharedPage,
    scrolls: mpsc::UnboundedSender<()>,
    commands: mpsc::UnboundedSender<HubCommand>,
    task: JoinHandle<()>,
}

impl TabHandle {
    pub fn info(&self) -> &TabInfo {
        &self.info
    }

    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    pub fn scroll_top(&self) -> f64 {
        self.page.scroll_top()
    }

    /// Simulates the user scrolling the page, firing a native scroll notification.
    pub fn user_scroll_to(&self, top: f64) {
        self.page.with(|page| page.scroll_to(top));
        self.notify_scroll();
    }

    /// Fires a native scroll notification without moving the page.
    pub fn notify_scroll(&self) {
        let _ = self.scrolls.send(());
    }

    /// Stops the observer while leaving the tab registered, as when a page
    /// navigates away and its listener disappears.
    pub async fn kill_observer(&mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }

    /// Detaches the tab from the relay and stops its observer.
    pub async fn close(self) {
        let _ = self.commands.send(HubCommand::Close(self.info.id));
        drop(self.scrolls);
        if !self.task.is_finished() {
            let _ = self.task.await;
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Drives one observer: inbound messages, native scroll notifications, the
/// frame tick and the quiescence timer.
pub async fn run_observer<V, S, St>(
    mut observer: ScrollObserver<V, S>,
    store: St,
    mut inbox: mpsc::UnboundedReceiver<Message>,
    mut scrolls: mpsc::UnboundedReceiver<()>,
) where
    V: Viewport,
    S: MessageSink,
    St: SettingsStore,
{
    observer.on_settings_loaded(store.read());
    let frame_interval = observer.config().frame_interval;
    let mut frame_at: Option<Instant> = None;

    loop {
        let quiet_at = observer.state().quiescence_deadline();
        tokio::select! {
            message = inbox.recv() => match message {
                Some(message) => observer.handle_message(&message, Instant::now()),
                None => break,
            },
            notification = scrolls.recv() => match notification {
                Some(()) => {
                    if observer.on_native_scroll() {
                        frame_at = Some(Instant::now() + frame_interval);
                    }
                }
                None => break,
            },
            _ = sleep_until_opt(frame_at) => {
                frame_at = None;
                observer.perform_scheduled_emission();
            }
            _ = sleep_until_opt(quiet_at) => {
                observer.on_quiescence_elapsed(Instant::now());
            }
        }
    }
}
