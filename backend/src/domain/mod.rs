//! Domain layer - matchmaking models, free of I/O

/// Relay-issued visitor identity
pub type VisitorId = signal_protocol::VisitorId;

mod session;
mod visitor;
mod wait_entry;

pub use session::Session;
pub use visitor::{VisitorState, generate_visitor_id};
pub use wait_entry::WaitEntry;
