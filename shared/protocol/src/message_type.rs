#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Welcome = 0x01,
    Join = 0x02,
    Waiting = 0x03,
    Matched = 0x04,
    Signal = 0x05,
    Leave = 0x06,
    PartnerLeft = 0x07,
    Chat = 0x08,
    Error = 0x09,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(MessageType::Welcome),
            0x02 => Some(MessageType::Join),
            0x03 => Some(MessageType::Waiting),
            0x04 => Some(MessageType::Matched),
            0x05 => Some(MessageType::Signal),
            0x06 => Some(MessageType::Leave),
            0x07 => Some(MessageType::PartnerLeft),
            0x08 => Some(MessageType::Chat),
            0x09 => Some(MessageType::Error),
            _ => None,
        }
    }

    /// Whether a client is allowed to send this message to the relay.
    pub fn is_client_originated(self) -> bool {
        matches!(
            self,
            MessageType::Join | MessageType::Leave | MessageType::Signal | MessageType::Chat
        )
    }
}
