use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Policy for mapping a scroll position from sender to receiver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Relative position: receivers land at the same fraction of their own range.
    #[default]
    Percentage,
    /// Absolute offset, copied verbatim.
    Pixel,
}

/// User-facing sync settings, owned by the external settings store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default = "default_true")]
    pub enable_sync: bool,
    #[serde(default)]
    pub sync_mode: SyncMode,
}

fn default_true() -> bool {
    true
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enable_sync: true,
            sync_mode: SyncMode::Percentage,
        }
    }
}

impl SyncSettings {
    /// Applies only the fields present in `patch`.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(enable_sync) = patch.enable_sync {
            self.enable_sync = enable_sync;
        }
        if let Some(sync_mode) = patch.sync_mode {
            self.sync_mode = sync_mode;
        }
    }

    /// Decodes a persisted settings blob leniently.
    ///
    /// Each field is read on its own so one bad value does not discard the
    /// other; anything missing or unreadable keeps its default.
    pub fn from_stored(value: &serde_json::Value) -> Self {
        let mut settings = Self::default();
        if let Some(enable_sync) = value.get("enableSync").and_then(|v| v.as_bool()) {
            settings.enable_sync = enable_sync;
        }
        if let Some(mode) = value
            .get("syncMode")
            .and_then(|v| serde_json::from_value::<SyncMode>(v.clone()).ok())
        {
            settings.sync_mode = mode;
        }
        settings
    }
}

/// Partial settings update carried by `SETTINGS_UPDATED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_sync: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<SyncMode>,
}

impl SettingsPatch {
    pub fn enable_sync(enable_sync: bool) -> Self {
        Self {
            enable_sync: Some(enable_sync),
            sync_mode: None,
        }
    }

    pub fn sync_mode(sync_mode: SyncMode) -> Self {
        Self {
            enable_sync: None,
            sync_mode: Some(sync_mode),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.enable_sync.is_none() && self.sync_mode.is_none()
    }
}

impl From<SyncSettings> for SettingsPatch {
    fn from(settings: SyncSettings) -> Self {
        Self {
            enable_sync: Some(settings.enable_sync),
            sync_mode: Some(settings.sync_mode),
        }
    }
}

pub const DEFAULT_QUIESCENCE_MS: u64 = 50;
pub const DEFAULT_FRAME_MS: u64 = 16;

/// Timing knobs for a scroll observer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObserverConfig {
    /// How long outbound emission stays suppressed after applying a sync command.
    #[serde(default = "default_quiescence_ms", rename = "quiescenceMs", with = "millis")]
    pub quiescence_delay: Duration,
    /// Spacing between frame ticks; bounds the emission rate.
    #[serde(default = "default_frame_ms", rename = "frameMs", with = "millis")]
    pub frame_interval: Duration,
}

fn default_quiescence_ms() -> Duration {
    Duration::from_millis(DEFAULT_QUIESCENCE_MS)
}

fn default_frame_ms() -> Duration {
    Duration::from_millis(DEFAULT_FRAME_MS)
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            quiescence_delay: default_quiescence_ms(),
            frame_interval: default_frame_ms(),
        }
    }
}

impl ObserverConfig {
    /// Reads `SPLITSCROLL_QUIESCENCE_MS` / `SPLITSCROLL_FRAME_MS`, keeping
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_millis("SPLITSCROLL_QUIESCENCE_MS") {
            config.quiescence_delay = ms;
        }
        if let Some(ms) = env_millis("SPLITSCROLL_FRAME_MS") {
            config.frame_interval = ms;
        }
        config
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
