//! TLS error types.

use std::io;
use std::net::TcpStream;

use native_tls::HandshakeError;
use thiserror::Error;

/// TLS configuration or handshake error
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("TLS error: {0}")]
    NativeTls(#[from] native_tls::Error),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[from] HandshakeError<TcpStream>),
}
