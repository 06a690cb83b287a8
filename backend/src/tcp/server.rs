//! TCP server for the signaling relay.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use native_tls::TlsAcceptor;
use signal_protocol::{ErrorMsg, Message, write_message};
use tracing::{error, info, warn};

use crate::infrastructure::storage::Storage;
use crate::tcp::tls::{TlsError, load_tls_acceptor};

use super::client_handler::ClientHandler;

const DEFAULT_MAX_CONNECTIONS: usize = 1000;
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// TCP Server for persistent connections with optional TLS
pub struct TcpServer {
    storage: Storage,
    tls_acceptor: Option<Arc<TlsAcceptor>>,
    max_connections: usize,
    read_timeout: Duration,
}

impl TcpServer {
    pub fn new(storage: Storage) -> Self {
        TcpServer {
            storage,
            tls_acceptor: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Enable TLS with the given PKCS#12 file and password
    pub fn with_tls(mut self, pkcs12_path: &str, password: &str) -> Result<Self, TlsError> {
        let acceptor = load_tls_acceptor(pkcs12_path, password)?;
        info!(certificate = %pkcs12_path, "TLS enabled");
        self.tls_acceptor = Some(acceptor);
        Ok(self)
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Bind the listener without accepting yet
    pub fn bind(self, bind_addr: &str) -> io::Result<BoundServer> {
        let listener = TcpListener::bind(bind_addr)?;
        Ok(BoundServer {
            server: self,
            listener,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Bind and serve forever
    pub fn start(self, bind_addr: &str) -> io::Result<()> {
        self.bind(bind_addr)?.serve()
    }
}

/// A server whose listener is bound; `serve` runs the accept loop
pub struct BoundServer {
    server: TcpServer,
    listener: TcpListener,
    active: Arc<AtomicUsize>,
}

impl BoundServer {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn serve(self) -> io::Result<()> {
        let protocol = if self.server.tls_acceptor.is_some() {
            "TLS"
        } else {
            "Plain TCP"
        };
        info!(
            addr = %self.local_addr()?,
            protocol,
            max_connections = self.server.max_connections,
            "TCP Server listening"
        );

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.accept(stream),
                Err(e) => error!(error = %e, "Failed to accept connection"),
            }
        }

        Ok(())
    }

    fn accept(&self, stream: TcpStream) {
        let Some(slot) = ConnectionSlot::acquire(&self.active, self.server.max_connections) else {
            warn!(
                limit = self.server.max_connections,
                "Connection limit reached, rejecting"
            );
            reject(stream, self.server.tls_acceptor.is_some());
            return;
        };

        let storage = self.server.storage.clone();
        let tls_acceptor = self.server.tls_acceptor.clone();
        let read_timeout = self.server.read_timeout;

        thread::spawn(move || {
            let _slot = slot;
            match ClientHandler::new(stream, storage, tls_acceptor.as_deref(), read_timeout) {
                Ok(mut handler) => {
                    if let Err(e) = handler.handle() {
                        error!(visitor = %handler.visitor_id(), error = %e, "Client handler error");
                    }
                }
                Err(e) => error!(error = %e, "Failed to create client handler"),
            }
        });
    }
}

/// Over-limit connections on plain TCP are told why before closing
fn reject(mut stream: TcpStream, tls: bool) {
    if !tls {
        let busy = Message::Error(ErrorMsg::new(503, "Server at capacity"));
        let _ = write_message(&mut stream, &busy);
    }
    let _ = stream.shutdown(std::net::Shutdown::Both);
}

/// One counted connection; releases its slot on drop
struct ConnectionSlot {
    active: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    fn acquire(active: &Arc<AtomicUsize>, limit: usize) -> Option<Self> {
        active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit).then_some(n + 1)
            })
            .ok()?;
        Some(ConnectionSlot {
            active: Arc::clone(active),
        })
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
