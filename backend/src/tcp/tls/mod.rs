//! TLS support for relay connections.

mod acceptor;
mod error;
mod stream;

pub use acceptor::load_tls_acceptor;
pub use error::TlsError;
pub use stream::TlsStream;
