use std::net::TcpStream;

use native_tls::{TlsConnector, TlsStream};

use crate::relay::RelayError;

/// Runs the client side of the TLS handshake on an open TCP stream.
///
/// `accept_invalid_certs` disables certificate and hostname validation; only
/// meant for relays using self-signed development certificates.
pub(crate) fn connect_tls(
    stream: TcpStream,
    domain: &str,
    accept_invalid_certs: bool,
) -> Result<TlsStream<TcpStream>, RelayError> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .danger_accept_invalid_hostnames(accept_invalid_certs)
        .build()
        .map_err(|e| RelayError::Tls(format!("TLS connector error: {}", e)))?;

    connector
        .connect(domain, stream)
        .map_err(|e| RelayError::Tls(format!("TLS handshake failed: {}", e)))
}
