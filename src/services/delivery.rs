//! Best-effort delivery.
//!
//! Every send on the relay path is fire-and-forget: a failure is traced
//! and discarded. Nothing here retries.

use tracing::debug;

use crate::types::errors::DeliveryError;
use crate::types::message::Message;
use crate::types::tab::TabId;

/// Outbound channel of a single observer (observer → relay).
pub trait MessageSink {
    fn send(&self, message: Message) -> Result<(), DeliveryError>;
}

/// Addressed channel used by the relay (relay → observer in a given tab).
pub trait TabMessenger {
    fn send_to_tab(&self, tab_id: TabId, message: Message) -> Result<(), DeliveryError>;
}

/// Sends via `sink`, swallowing failure. Returns whether the send succeeded.
pub fn send_best_effort<S: MessageSink + ?Sized>(sink: &S, message: Message) -> bool {
    match sink.send(message) {
        Ok(()) => true,
        Err(e) => {
            debug!(kind = message.kind(), error = %e, "dropping outbound message");
            false
        }
    }
}

/// Sends to one tab, swallowing failure. Returns whether the send succeeded.
pub fn deliver_best_effort<M: TabMessenger + ?Sized>(
    messenger: &M,
    tab_id: TabId,
    message: Message,
) -> bool {
    match messenger.send_to_tab(tab_id, message) {
        Ok(()) => true,
        Err(e) => {
            debug!(tab_id, kind = message.kind(), error = %e, "delivery to tab failed");
            false
        }
    }
}

impl<T: MessageSink + ?Sized> MessageSink for &T {
    fn send(&self, message: Message) -> Result<(), DeliveryError> {
        (**self).send(message)
    }
}

impl<T: TabMessenger + ?Sized> TabMessenger for &T {
    fn send_to_tab(&self, tab_id: TabId, message: Message) -> Result<(), DeliveryError> {
        (**self).send_to_tab(tab_id, message)
    }
}

impl MessageSink for tokio::sync::mpsc::UnboundedSender<Message> {
    fn send(&self, message: Message) -> Result<(), DeliveryError> {
        tokio::sync::mpsc::UnboundedSender::send(self, message)
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}
