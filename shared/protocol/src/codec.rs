use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use serde::de::IgnoredAny;

use crate::{Message, MessageType, ProtocolError, Result};

pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024; // 1 MB
const RETRY_DELAY_MS: u64 = 10;

/// Read exact amount of bytes, retrying partial reads on streams with a read timeout.
///
/// A timeout before the first byte is propagated so callers can poll.
fn read_exact_with_retry<S: Read>(
    stream: &mut S,
    buf: &mut [u8],
    description: &str,
) -> io::Result<()> {
    let mut total_read = 0;

    while total_read < buf.len() {
        match stream.read(&mut buf[total_read..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("Connection closed while reading {}", description),
                ));
            }
            Ok(n) => total_read += n,
            Err(e)
                if e.kind() == ErrorKind::WouldBlock
                    || e.kind() == ErrorKind::TimedOut
                    || e.kind() == ErrorKind::Interrupted =>
            {
                if total_read == 0 && e.kind() != ErrorKind::Interrupted {
                    return Err(e);
                }
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Read one framed message.
///
/// Format: [4 bytes length][1 byte type][N bytes JSON]
pub fn read_message<S: Read>(stream: &mut S) -> Result<Message> {
    let mut len_buf = [0u8; 4];
    read_exact_with_retry(stream, &mut len_buf, "length header")?;
    let len = u32::from_be_bytes(len_buf);

    if len == 0 {
        return Err(ProtocolError::EmptyFrame);
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut type_buf = [0u8; 1];
    read_exact_with_retry(stream, &mut type_buf, "message type")?;

    // Consume the whole frame before validating so the stream stays aligned
    let mut payload = vec![0u8; (len - 1) as usize];
    read_exact_with_retry(stream, &mut payload, "payload")?;

    let msg_type =
        MessageType::from_u8(type_buf[0]).ok_or(ProtocolError::InvalidMessageType(type_buf[0]))?;
    parse_message(msg_type, &payload)
}

fn parse_message(msg_type: MessageType, payload: &[u8]) -> Result<Message> {
    let message = match msg_type {
        MessageType::Welcome => Message::Welcome(serde_json::from_slice(payload)?),
        MessageType::Matched => Message::Matched(serde_json::from_slice(payload)?),
        MessageType::Signal => Message::Signal(serde_json::from_slice(payload)?),
        MessageType::Chat => Message::Chat(serde_json::from_slice(payload)?),
        MessageType::Error => Message::Error(serde_json::from_slice(payload)?),
        MessageType::Join
        | MessageType::Leave
        | MessageType::Waiting
        | MessageType::PartnerLeft => {
            // Body carries nothing but must still be well-formed JSON.
            serde_json::from_slice::<IgnoredAny>(payload)?;
            match msg_type {
                MessageType::Join => Message::Join,
                MessageType::Leave => Message::Leave,
                MessageType::Waiting => Message::Waiting,
                _ => Message::PartnerLeft,
            }
        }
    };
    Ok(message)
}

/// Encode a message into a complete frame.
pub fn encode_frame(message: &Message) -> Result<Vec<u8>> {
    let payload = message.payload()?;
    let total_len = u32::try_from(payload.len() + 1)
        .map_err(|_| ProtocolError::MessageTooLarge(u32::MAX))?;

    if total_len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(total_len));
    }

    let mut frame = Vec::with_capacity(4 + total_len as usize);
    frame.extend_from_slice(&total_len.to_be_bytes());
    frame.push(message.message_type() as u8);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Write one framed message and flush.
pub fn write_message<S: Write>(stream: &mut S, message: &Message) -> Result<()> {
    let frame = encode_frame(message)?;
    stream.write_all(&frame)?;
    stream.flush()?;
    Ok(())
}
