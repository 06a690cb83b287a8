//! Wire protocol shared by the signaling relay and its clients.
//!
//! Every frame is `[4 bytes length][1 byte type][N bytes JSON]`, where the
//! length covers the type byte and the payload.

mod codec;
mod error;
mod message;
mod message_type;
pub mod messages;

pub use codec::{MAX_MESSAGE_SIZE, encode_frame, read_message, write_message};
pub use error::{ProtocolError, Result};
pub use message::Message;
pub use message_type::MessageType;
pub use messages::{ChatMsg, ErrorMsg, MatchedMsg, SignalMsg, WelcomeMsg};

/// Relay-issued opaque visitor identity.
pub type VisitorId = String;
