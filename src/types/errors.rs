use thiserror::Error;

use super::tab::TabId;

// === DeliveryError ===

/// Errors raised while handing a message to a single recipient.
///
/// These are transient by nature: the relay path swallows them per recipient.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeliveryError {
    /// The target tab is not (or no longer) known to the relay.
    #[error("Tab is gone: {0}")]
    TabGone(TabId),
    /// The recipient's inbox has been dropped.
    #[error("Delivery channel closed")]
    ChannelClosed,
    /// The transport refused the message.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

// === SettingsError ===

/// Errors related to loading sync settings from the external store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    /// The store could not be read at all.
    #[error("Settings unavailable: {0}")]
    Unavailable(String),
    /// The stored value could not be decoded.
    #[error("Malformed settings: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Malformed(err.to_string())
    }
}

// === RegistryError ===

/// Errors related to tab registry mutations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// Tab with the given ID was not found.
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),
    /// The provided tab index is out of bounds for its window.
    #[error("Invalid tab index: {0}")]
    InvalidIndex(usize),
}
