//! TCP transport for the signaling relay.

mod client_handler;
mod server;
mod stream_type;
pub mod tls;

pub use server::{BoundServer, TcpServer};
