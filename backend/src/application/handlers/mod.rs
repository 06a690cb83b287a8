//! Message handlers
pub mod message_handler;

pub use message_handler::MessageHandler;
