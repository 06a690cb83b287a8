//! StrangerLink signaling relay
//!
//! Pairs anonymous visitors two at a time and relays negotiation payloads
//! between the members of each session. Exposed as a library for
//! integration testing.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod tcp;

pub use domain::{Session, VisitorId, VisitorState};
pub use infrastructure::storage::Storage;
pub use tcp::{BoundServer, TcpServer};
