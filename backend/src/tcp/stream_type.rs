//! Plain TCP or TLS stream behind one interface.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use signal_protocol::{Message, ProtocolError, read_message, write_message};

use crate::tcp::tls::TlsStream;

pub(crate) enum StreamType {
    Plain(TcpStream),
    Tls(Box<TlsStream>),
}

impl StreamType {
    pub(crate) fn set_read_timeout(&mut self, duration: Duration) -> io::Result<()> {
        match self {
            StreamType::Plain(stream) => stream.set_read_timeout(Some(duration)),
            StreamType::Tls(stream) => stream.set_read_timeout(duration),
        }
    }

    pub(crate) fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            StreamType::Plain(stream) => stream.peer_addr(),
            StreamType::Tls(stream) => stream.peer_addr(),
        }
    }

    pub(crate) fn read_message(&mut self) -> Result<Message, ProtocolError> {
        match self {
            StreamType::Plain(stream) => read_message(stream),
            StreamType::Tls(stream) => read_message(stream.as_mut()),
        }
    }

    pub(crate) fn write_message(&mut self, msg: &Message) -> Result<(), ProtocolError> {
        match self {
            StreamType::Plain(stream) => write_message(stream, msg),
            StreamType::Tls(stream) => write_message(stream.as_mut(), msg),
        }
    }

    pub(crate) fn shutdown(&mut self) {
        match self {
            StreamType::Plain(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
            }
            StreamType::Tls(stream) => stream.shutdown(),
        }
    }
}
