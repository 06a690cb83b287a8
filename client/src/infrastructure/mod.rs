//! Network implementations of the relay seam

mod relay_client;
mod tls_client;

pub use relay_client::{TcpRelayConnector, TcpRelayLink};
