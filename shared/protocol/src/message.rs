use serde::Serialize;

use super::{ChatMsg, ErrorMsg, MatchedMsg, MessageType, SignalMsg, WelcomeMsg};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Client → Server
    Join,
    Leave,

    // Server → Client
    Welcome(WelcomeMsg),
    Waiting,
    Matched(MatchedMsg),
    PartnerLeft,
    Error(ErrorMsg),

    // Both directions
    Signal(SignalMsg),
    Chat(ChatMsg),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Join => MessageType::Join,
            Message::Leave => MessageType::Leave,
            Message::Welcome(_) => MessageType::Welcome,
            Message::Waiting => MessageType::Waiting,
            Message::Matched(_) => MessageType::Matched,
            Message::PartnerLeft => MessageType::PartnerLeft,
            Message::Error(_) => MessageType::Error,
            Message::Signal(_) => MessageType::Signal,
            Message::Chat(_) => MessageType::Chat,
        }
    }

    /// JSON body of the frame; payload-less messages encode as `{}`.
    pub fn payload(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Message::Welcome(m) => serde_json::to_vec(m),
            Message::Matched(m) => serde_json::to_vec(m),
            Message::Error(m) => serde_json::to_vec(m),
            Message::Signal(m) => serde_json::to_vec(m),
            Message::Chat(m) => serde_json::to_vec(m),
            Message::Join | Message::Leave | Message::Waiting | Message::PartnerLeft => {
                serde_json::to_vec(&Empty {})
            }
        }
    }
}

#[derive(Serialize)]
struct Empty {}
