use std::io;

use thiserror::Error;

/// Errors raised while framing or parsing protocol messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid message type: 0x{0:02X}")]
    InvalidMessageType(u8),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {0} bytes")]
    MessageTooLarge(u32),

    #[error("Empty frame")]
    EmptyFrame,
}

impl ProtocolError {
    /// True when the error only means "no data yet" on a stream with a read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
        )
    }
}

impl ProtocolError {
    /// True when the peer closed the connection.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(e) if matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        )
    }

    /// True when the offending frame was fully consumed and the stream can keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidMessageType(_) | ProtocolError::Json(_) | ProtocolError::EmptyFrame
        )
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
