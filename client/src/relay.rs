//! Relay connection seam.

use std::io;
use std::sync::mpsc::Sender;

use signal_protocol::{Message, ProtocolError};
use thiserror::Error;

use crate::events::ClientEvent;

/// Identifies one relay connection; events from older links are stale
pub type LinkId = u64;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to connect to relay {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Relay link is closed")]
    Closed,
}

/// An open connection to the relay.
///
/// Incoming messages are posted as [`ClientEvent::Relay`] tagged with
/// [`RelayLink::id`]; loss of the connection as [`ClientEvent::RelayClosed`].
pub trait RelayLink: Send {
    fn id(&self) -> LinkId;
    fn send(&mut self, message: &Message) -> Result<(), RelayError>;
    /// Close without reporting `RelayClosed`
    fn close(&mut self);
}

pub trait RelayConnector: Send {
    fn connect(&mut self, events: Sender<ClientEvent>) -> Result<Box<dyn RelayLink>, RelayError>;
}
