//! Scroll Observer for splitscroll.
//!
//! One observer lives in each tab. It turns native scroll notifications into
//! at most one `SCROLL_EVENT` per frame, and applies inbound `SYNC_SCROLL`
//! commands while keeping its own emission suppressed for a quiescence window.
//!
//! The observer is a plain state machine: time is passed in explicitly and the
//! frame tick / quiescence timer are driven from outside (see `crate::hub`).

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::services::delivery::{send_best_effort, MessageSink};
use crate::types::message::Message;
use crate::types::scroll::{ScrollMetrics, SyncCommand};
use crate::types::settings::{ObserverConfig, SettingsPatch, SyncMode, SyncSettings};

/// The page an observer is attached to.
pub trait Viewport {
    fn scroll_top(&self) -> f64;
    fn scroll_height(&self) -> f64;
    fn viewport_height(&self) -> f64;
    /// Jumps to `top` immediately, without animation.
    fn scroll_to(&mut self, top: f64);
}

/// Per-tab transient state. Never persisted, never shared between tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObserverState {
    pub is_applying_sync: bool,
    pub scroll_emit_scheduled: bool,
    quiescence_deadline: Option<Instant>,
}

impl ObserverState {
    pub fn quiescence_deadline(&self) -> Option<Instant> {
        self.quiescence_deadline
    }
}

/// Scroll observer for a single tab.
pub struct ScrollObserver<V, S> {
    viewport: V,
    sink: S,
    settings: SyncSettings,
    config: ObserverConfig,
    state: ObserverState,
}

impl<V: Viewport, S: MessageSink> ScrollObserver<V, S> {
    /// Creates an observer running on default settings until the real ones
    /// are loaded.
    pub fn new(viewport: V, sink: S, config: ObserverConfig) -> Self {
        Self {
            viewport,
            sink,
            settings: SyncSettings::default(),
            config,
            state: ObserverState::default(),
        }
    }

    pub fn state(&self) -> &ObserverState {
        &self.state
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Current metrics of the page, or `None` if it cannot scroll.
    pub fn metrics(&self) -> Option<ScrollMetrics> {
        ScrollMetrics::compute(
            self.viewport.scroll_top(),
            self.viewport.scroll_height(),
            self.viewport.viewport_height(),
        )
    }

    /// Handles one native scroll notification.
    ///
    /// Returns `true` when this call scheduled a new emission; the caller must
    /// then run `perform_scheduled_emission` on the next frame tick. Returns
    /// `false` when an emission is already pending.
    pub fn on_native_scroll(&mut self) -> bool {
        if self.state.scroll_emit_scheduled {
            return false;
        }
        self.state.scroll_emit_scheduled = true;
        true
    }

    /// Runs a scheduled emission. Returns the metrics handed to the sink, if any.
    pub fn perform_scheduled_emission(&mut self) -> Option<ScrollMetrics> {
        // Cleared first so a scroll arriving now can schedule the next frame.
        self.state.scroll_emit_scheduled = false;

        if !self.settings.enable_sync || self.state.is_applying_sync {
            trace!(
                enabled = self.settings.enable_sync,
                applying = self.state.is_applying_sync,
                "emission suppressed"
            );
            return None;
        }

        let metrics = self.metrics()?;
        send_best_effort(&self.sink, Message::ScrollEvent(metrics));
        Some(metrics)
    }

    /// Applies an inbound sync command. Returns the target offset requested of
    /// the page, or `None` if sync is disabled.
    pub fn on_sync_command(&mut self, command: &SyncCommand, now: Instant) -> Option<f64> {
        if !self.settings.enable_sync {
            return None;
        }

        self.state.is_applying_sync = true;
        let target = self.calculate_target_scroll_position(command);
        self.viewport.scroll_to(target);
        // Measured from application; a later command pushes it out again.
        self.state.quiescence_deadline = Some(now + self.config.quiescence_delay);

        debug!(target, mode = ?command.sync_mode, "applied sync command");
        Some(target)
    }

    /// Quiescence timer callback. Clears `is_applying_sync` once the deadline
    /// has passed, whether or not the jump produced scroll notifications.
    ///
    /// Returns `true` if the flag was released by this call.
    pub fn on_quiescence_elapsed(&mut self, now: Instant) -> bool {
        match self.state.quiescence_deadline {
            Some(deadline) if deadline <= now => {
                self.state.quiescence_deadline = None;
                self.state.is_applying_sync = false;
                true
            }
            _ => false,
        }
    }

    /// Applies a partial settings update.
    pub fn on_settings_changed(&mut self, patch: &SettingsPatch) {
        self.settings.apply(patch);
    }

    /// Replaces the cached settings once the startup load completes.
    pub fn on_settings_loaded(&mut self, settings: SyncSettings) {
        self.settings = settings;
    }

    /// Dispatches an inbound message. Scroll events are relay-bound and are
    /// ignored if they ever reach an observer.
    pub fn handle_message(&mut self, message: &Message, now: Instant) {
        match message {
            Message::SyncScroll(command) => {
                self.on_sync_command(command, now);
            }
            Message::SettingsUpdated(patch) => self.on_settings_changed(patch),
            Message::ScrollEvent(_) => {
                trace!("ignoring SCROLL_EVENT delivered to an observer");
            }
        }
    }

    /// Maps a command onto this page's coordinate space.
    pub fn calculate_target_scroll_position(&self, command: &SyncCommand) -> f64 {
        let mode = command.sync_mode.unwrap_or(self.settings.sync_mode);
        match mode {
            SyncMode::Percentage => {
                let range = self.viewport.scroll_height() - self.viewport.viewport_height();
                command.percentage * range
            }
            // Left unclamped; the page clamps at its own limits.
            SyncMode::Pixel => command.pixel as f64,
        }
    }
}

/// In-memory page with browser-like scroll clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPage {
    scroll_top: f64,
    scroll_height: f64,
    viewport_height: f64,
}

impl SimulatedPage {
    pub fn new(scroll_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            scroll_height,
            viewport_height,
        }
    }

    /// A page whose scrollable range is exactly `range` pixels.
    pub fn with_range(range: f64) -> Self {
        Self::new(range + 600.0, 600.0)
    }

    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.viewport_height).max(0.0)
    }

    pub fn resize(&mut self, scroll_height: f64, viewport_height: f64) {
        self.scroll_height = scroll_height;
        self.viewport_height = viewport_height;
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
    }
}

impl Viewport for SimulatedPage {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_height(&self) -> f64 {
        self.scroll_height
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn scroll_to(&mut self, top: f64) {
        let top = if top.is_finite() { top } else { 0.0 };
        self.scroll_top = top.clamp(0.0, self.max_scroll_top());
    }
}

/// A `SimulatedPage` shared between an observer task and whoever drives the page.
///
/// A handle built with `notifying` fires a native scroll notification whenever
/// its `scroll_to` actually moves the page, as a browser does for
/// programmatic scrolls.
#[derive(Debug, Clone)]
pub struct SharedPage {
    page: Arc<Mutex<SimulatedPage>>,
    scrolls: Option<mpsc::UnboundedSender<()>>,
}

impl SharedPage {
    pub fn new(page: SimulatedPage) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            scrolls: None,
        }
    }

    /// Another handle onto the same page that reports its own jumps to `scrolls`.
    pub fn notifying(&self, scrolls: mpsc::UnboundedSender<()>) -> Self {
        Self {
            page: Arc::clone(&self.page),
            scrolls: Some(scrolls),
        }
    }

    /// Runs `f` with exclusive access to the page.
    pub fn with<R>(&self, f: impl FnOnce(&mut SimulatedPage) -> R) -> R {
        let mut guard = self.page.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Viewport for SharedPage {
    fn scroll_top(&self) -> f64 {
        self.with(|page| page.scroll_top())
    }

    fn scroll_height(&self) -> f64 {
        self.with(|page| page.scroll_height())
    }

    fn viewport_height(&self) -> f64 {
        self.with(|page| page.viewport_height())
    }

    fn scroll_to(&mut self, top: f64) {
        let moved = self.with(|page| {
            let before = page.scroll_top();
            page.scroll_to(top);
            page.scroll_top() != before
        });
        if moved {
            if let Some(scrolls) = &self.scrolls {
                let _ = scrolls.send(());
            }
        }
    }
}
