//! Per-connection handler: issues the visitor id, routes messages, flushes
//! queued notifications between reads.

use std::io::{self, ErrorKind};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use native_tls::TlsAcceptor;
use signal_protocol::{ErrorMsg, Message, ProtocolError, WelcomeMsg};
use tracing::{debug, error, info, info_span, warn};

use crate::application::handlers::MessageHandler;
use crate::domain::{VisitorId, generate_visitor_id};
use crate::infrastructure::storage::Storage;
use crate::tcp::stream_type::StreamType;
use crate::tcp::tls::TlsStream;

enum ReadOutcome {
    Message(Message),
    /// Read timeout elapsed with no data
    Idle,
    /// Peer closed the connection
    Closed,
}

/// Client connection handler
pub struct ClientHandler {
    stream: StreamType,
    visitor_id: VisitorId,
    message_handler: MessageHandler,
    msg_receiver: Receiver<Message>,
}

impl ClientHandler {
    /// Performs the TLS handshake (if enabled) and registers a fresh visitor.
    pub fn new(
        stream: TcpStream,
        storage: Storage,
        tls_acceptor: Option<&TlsAcceptor>,
        read_timeout: Duration,
    ) -> io::Result<Self> {
        let peer_addr = stream.peer_addr()?;

        let mut stream = match tls_acceptor {
            Some(acceptor) => {
                debug!(peer = %peer_addr, "Performing TLS handshake");
                let tls_stream = TlsStream::accept(stream, acceptor).map_err(|e| {
                    error!(peer = %peer_addr, error = %e, "TLS handshake failed");
                    io::Error::other(format!("TLS handshake failed: {}", e))
                })?;
                StreamType::Tls(Box::new(tls_stream))
            }
            None => StreamType::Plain(stream),
        };

        // Short read timeout so queued notifications are flushed between reads
        if let Err(e) = stream.set_read_timeout(read_timeout) {
            warn!(error = %e, "Failed to set read timeout");
        }

        let visitor_id = generate_visitor_id();
        let (tx, rx) = mpsc::channel();
        storage
            .connect_visitor(visitor_id.clone(), tx)
            .map_err(io::Error::other)?;

        Ok(ClientHandler {
            stream,
            visitor_id,
            message_handler: MessageHandler::new(storage),
            msg_receiver: rx,
        })
    }

    pub fn visitor_id(&self) -> &VisitorId {
        &self.visitor_id
    }

    /// Serves the connection until the visitor goes away.
    ///
    /// Leave semantics are applied on every exit path.
    pub fn handle(&mut self) -> io::Result<()> {
        let peer_addr = self.stream.peer_addr()?;
        let span = info_span!("visitor", id = %self.visitor_id, peer = %peer_addr);
        let _guard = span.enter();

        info!("New connection");
        let result = self.run();
        self.cleanup_disconnect();

        match &result {
            Ok(()) => info!("Connection closed"),
            Err(e) => warn!(error = %e, "Connection dropped"),
        }
        result
    }

    fn run(&mut self) -> io::Result<()> {
        let welcome = Message::Welcome(WelcomeMsg {
            visitor_id: self.visitor_id.clone(),
        });
        self.write(&welcome)?;

        loop {
            self.send_pending_messages()?;

            let message = match self.read_message_with_timeout()? {
                ReadOutcome::Message(msg) => msg,
                ReadOutcome::Idle => continue,
                ReadOutcome::Closed => return Ok(()),
            };

            debug!(message_type = ?message.message_type(), "Received");
            if let Some(response) = self
                .message_handler
                .process_message(message, &self.visitor_id)?
            {
                self.write(&response)?;
            }
        }
    }

    /// Write every message queued for this visitor, in order
    fn send_pending_messages(&mut self) -> io::Result<()> {
        loop {
            match self.msg_receiver.try_recv() {
                Ok(pending) => match self.stream.write_message(&pending) {
                    Ok(()) => {}
                    Err(ProtocolError::MessageTooLarge(size)) => {
                        warn!(
                            size,
                            message_type = ?pending.message_type(),
                            "Skipped outbound message over the frame limit"
                        );
                    }
                    Err(e) => return Err(io::Error::new(ErrorKind::BrokenPipe, e.to_string())),
                },
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    // Storage dropped our sender; nothing more will arrive
                    return Ok(());
                }
            }
        }
    }

    fn read_message_with_timeout(&mut self) -> io::Result<ReadOutcome> {
        match self.stream.read_message() {
            Ok(msg) => Ok(ReadOutcome::Message(msg)),
            Err(e) if e.is_timeout() => Ok(ReadOutcome::Idle),
            Err(e) if e.is_closed() => Ok(ReadOutcome::Closed),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Malformed frame");
                self.write(&Message::Error(ErrorMsg::new(
                    400,
                    format!("Malformed message: {}", e),
                )))?;
                Ok(ReadOutcome::Idle)
            }
            Err(e) => Err(io::Error::new(ErrorKind::InvalidData, e.to_string())),
        }
    }

    fn write(&mut self, msg: &Message) -> io::Result<()> {
        self.stream
            .write_message(msg)
            .map_err(|e| io::Error::new(ErrorKind::BrokenPipe, e.to_string()))
    }

    fn cleanup_disconnect(&mut self) {
        self.message_handler
            .cleanup_visitor_disconnect(&self.visitor_id);
        self.stream.shutdown();
    }
}
