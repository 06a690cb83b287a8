//! Accepted visitor connection after the server-side handshake.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use native_tls::TlsAcceptor;

use super::error::TlsError;

pub struct TlsStream {
    inner: native_tls::TlsStream<TcpStream>,
}

impl TlsStream {
    /// Runs the handshake on a freshly accepted socket
    pub fn accept(socket: TcpStream, acceptor: &TlsAcceptor) -> Result<Self, TlsError> {
        Ok(TlsStream {
            inner: acceptor.accept(socket)?,
        })
    }

    /// Poll interval of the handler loop, applied to the raw socket
    pub fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.inner.get_ref().set_read_timeout(Some(timeout))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.get_ref().peer_addr()
    }

    /// Sends close_notify; the visitor may already be gone
    pub fn shutdown(&mut self) {
        let _ = self.inner.shutdown();
    }
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
