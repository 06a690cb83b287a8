//! Partner-only forwarding of negotiation payloads and chat.

use std::io;

use signal_protocol::{ChatMsg, Message, SignalMsg};
use tracing::{debug, warn};

use crate::domain::VisitorId;
use crate::infrastructure::storage::{Storage, StorageError};

/// Signaling use case handler
///
/// Messages addressed to anyone other than the sender's current partner are
/// dropped; the sender gets no reply either way.
pub struct SignalingUseCase {
    storage: Storage,
}

impl SignalingUseCase {
    pub fn new(storage: Storage) -> Self {
        SignalingUseCase { storage }
    }

    /// Stamp the sender and forward a negotiation payload to the partner
    pub fn handle_signal(&self, from: &VisitorId, signal: &SignalMsg) -> io::Result<Option<Message>> {
        let stamped = Message::Signal(signal.stamped(from));
        self.relay(from, &signal.to, stamped, "signal");
        Ok(None)
    }

    /// Stamp the sender and forward a chat line to the partner
    pub fn handle_chat(&self, from: &VisitorId, chat: &ChatMsg) -> io::Result<Option<Message>> {
        let stamped = Message::Chat(chat.stamped(from));
        self.relay(from, &chat.to, stamped, "chat");
        Ok(None)
    }

    fn relay(&self, from: &str, to: &str, message: Message, kind: &str) {
        match self.storage.relay_to_partner(from, to, message) {
            Ok(()) => debug!(from = %from, to = %to, kind, "Relayed to partner"),
            Err(StorageError::NotPartner { .. }) => {
                warn!(from = %from, to = %to, kind, "Dropped message for non-partner");
            }
            Err(e @ StorageError::Unframeable { .. }) => {
                warn!(from = %from, to = %to, kind, error = %e, "Dropped oversized message");
            }
            Err(e) => warn!(from = %from, to = %to, kind, error = %e, "Relay failed"),
        }
    }
}
