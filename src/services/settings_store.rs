// splitscroll Settings Store
// Read side of the externally owned sync settings, plus an in-memory store that
// stands in for the browser's storage area.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::types::errors::SettingsError;
use crate::types::settings::{SettingsPatch, SyncSettings};

/// Read interface onto the externally owned sync settings.
pub trait SettingsStore {
    /// Loads the current settings. May fail if the backing store is unreachable.
    fn load(&self) -> Result<SyncSettings, SettingsError>;

    /// Like `load`, but never fails: any error yields the hardcoded defaults.
    fn read(&self) -> SyncSettings {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "settings load failed, using defaults");
            SyncSettings::default()
        })
    }
}

impl<T: SettingsStore + ?Sized> SettingsStore for &T {
    fn load(&self) -> Result<SyncSettings, SettingsError> {
        (**self).load()
    }
}

/// Clonable in-memory settings store.
///
/// Clones share the same underlying settings. `apply` is the settings UI's
/// write path; relay and observers only ever read.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<SyncSettings>>,
}

impl SharedSettings {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Builds a store from a persisted JSON blob, tolerating malformed input.
    pub fn from_stored(value: &serde_json::Value) -> Self {
        Self::new(SyncSettings::from_stored(value))
    }

    /// Returns a copy of the current settings.
    pub fn snapshot(&self) -> SyncSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the fields present in `patch` and returns the patch so the caller
    /// can broadcast it to every subscriber.
    pub fn apply(&self, patch: SettingsPatch) -> SettingsPatch {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.apply(&patch);
        patch
    }

    /// Serializes the current settings under their storage keys.
    pub fn to_stored(&self) -> Result<serde_json::Value, SettingsError> {
        Ok(serde_json::to_value(self.snapshot())?)
    }
}

impl SettingsStore for SharedSettings {
    fn load(&self) -> Result<SyncSettings, SettingsError> {
        Ok(self.snapshot())
    }
}
