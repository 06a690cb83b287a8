//! Relay client over plain TCP or TLS.
//!
//! A reader thread owns the receive side and posts every message to the
//! controller's channel. The stream sits behind a mutex shared with
//! [`TcpRelayLink::send`]; the reader only holds it for one read-timeout
//! interval at a time.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use signal_protocol::{Message, read_message, write_message};
use tracing::{debug, info, warn};

use super::tls_client::connect_tls;
use crate::config::RelayConfig;
use crate::events::ClientEvent;
use crate::relay::{LinkId, RelayConnector, RelayError, RelayLink};

/// Pause after an idle poll so writers get the lock
const YIELD_AFTER_POLL: Duration = Duration::from_millis(1);

enum RelayStream {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl Read for RelayStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            RelayStream::Plain(s) => s.read(buf),
            RelayStream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for RelayStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            RelayStream::Plain(s) => s.write(buf),
            RelayStream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            RelayStream::Plain(s) => s.flush(),
            RelayStream::Tls(s) => s.flush(),
        }
    }
}

/// Opens [`TcpRelayLink`]s to the configured relay
pub struct TcpRelayConnector {
    config: RelayConfig,
    next_link: LinkId,
}

impl TcpRelayConnector {
    pub fn new(config: RelayConfig) -> Self {
        TcpRelayConnector {
            config,
            next_link: 1,
        }
    }
}

impl RelayConnector for TcpRelayConnector {
    fn connect(&mut self, events: Sender<ClientEvent>) -> Result<Box<dyn RelayLink>, RelayError> {
        let addr = self.config.address.clone();
        info!(addr = %addr, tls = self.config.enable_tls, "Connecting to relay");

        let tcp = TcpStream::connect(&addr).map_err(|source| RelayError::Connect {
            addr: addr.clone(),
            source,
        })?;
        let raw = tcp.try_clone().map_err(|source| RelayError::Connect {
            addr: addr.clone(),
            source,
        })?;

        let stream = if self.config.enable_tls {
            let tls = connect_tls(
                tcp,
                self.config.domain(),
                self.config.accept_invalid_certs,
            )?;
            RelayStream::Tls(Box::new(tls))
        } else {
            RelayStream::Plain(tcp)
        };

        // Set after the handshake so it cannot time out half-way
        raw.set_read_timeout(Some(self.config.poll_interval()))
            .map_err(|source| RelayError::Connect { addr, source })?;

        let id = self.next_link;
        self.next_link += 1;

        Ok(Box::new(TcpRelayLink::spawn(id, stream, raw, events)))
    }
}

/// One open relay connection with its reader thread
pub struct TcpRelayLink {
    id: LinkId,
    stream: Arc<Mutex<RelayStream>>,
    raw: TcpStream,
    closed: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl TcpRelayLink {
    fn spawn(id: LinkId, stream: RelayStream, raw: TcpStream, events: Sender<ClientEvent>) -> Self {
        let stream = Arc::new(Mutex::new(stream));
        let closed = Arc::new(AtomicBool::new(false));

        let reader = {
            let stream = Arc::clone(&stream);
            let closed = Arc::clone(&closed);
            thread::spawn(move || read_loop(id, stream, closed, events))
        };

        TcpRelayLink {
            id,
            stream,
            raw,
            closed,
            reader: Some(reader),
        }
    }
}

fn read_loop(
    link: LinkId,
    stream: Arc<Mutex<RelayStream>>,
    closed: Arc<AtomicBool>,
    events: Sender<ClientEvent>,
) {
    while !closed.load(Ordering::SeqCst) {
        let result = match stream.lock() {
            Ok(mut guard) => read_message(&mut *guard),
            Err(_) => break,
        };

        match result {
            Ok(message) => {
                if events.send(ClientEvent::Relay { link, message }).is_err() {
                    break;
                }
            }
            Err(e) if e.is_timeout() => thread::sleep(YIELD_AFTER_POLL),
            Err(e) if e.is_recoverable() => warn!(link, error = %e, "Skipping malformed frame"),
            Err(e) => {
                if !closed.load(Ordering::SeqCst) {
                    let reason = e.to_string();
                    debug!(link, reason = %reason, "Relay read failed");
                    let _ = events.send(ClientEvent::RelayClosed { link, reason });
                }
                break;
            }
        }
    }
}

impl RelayLink for TcpRelayLink {
    fn id(&self) -> LinkId {
        self.id
    }

    fn send(&mut self, message: &Message) -> Result<(), RelayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Closed);
        }
        let mut guard = self.stream.lock().map_err(|_| RelayError::Closed)?;
        write_message(&mut *guard, message)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.raw.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        debug!(link = self.id, "Relay link closed");
    }
}

impl Drop for TcpRelayLink {
    fn drop(&mut self) {
        self.close();
    }
}
