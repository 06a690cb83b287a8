//! Message handler - Orchestrates usecases based on incoming messages

use std::io;

use signal_protocol::{ErrorMsg, Message};

use crate::application::usecases::{MatchmakingUseCase, SignalingUseCase};
use crate::domain::VisitorId;
use crate::infrastructure::storage::Storage;

/// Message orchestrator - delegates to appropriate use case
pub struct MessageHandler {
    matchmaking_usecase: MatchmakingUseCase,
    signaling_usecase: SignalingUseCase,
}

impl MessageHandler {
    pub fn new(storage: Storage) -> Self {
        MessageHandler {
            matchmaking_usecase: MatchmakingUseCase::new(storage.clone()),
            signaling_usecase: SignalingUseCase::new(storage),
        }
    }

    /// Process an incoming message from `visitor_id` and return the direct reply, if any
    pub fn process_message(
        &self,
        message: Message,
        visitor_id: &VisitorId,
    ) -> io::Result<Option<Message>> {
        match message {
            Message::Join => self.matchmaking_usecase.handle_join(visitor_id),
            Message::Leave => self.matchmaking_usecase.handle_leave(visitor_id),
            Message::Signal(signal) => self.signaling_usecase.handle_signal(visitor_id, &signal),
            Message::Chat(chat) => self.signaling_usecase.handle_chat(visitor_id, &chat),
            _ => Ok(Some(Message::Error(ErrorMsg::new(
                400,
                format!(
                    "Invalid message type from client: {:?}",
                    message.message_type()
                ),
            )))),
        }
    }

    /// Cleanup when a visitor disconnects
    pub fn cleanup_visitor_disconnect(&self, visitor_id: &VisitorId) {
        self.matchmaking_usecase.cleanup_visitor_disconnect(visitor_id);
    }
}
