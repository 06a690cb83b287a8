mod chat;
mod common;
mod matchmaking;
mod signaling;

pub use chat::ChatMsg;
pub use common::ErrorMsg;
pub use matchmaking::{MatchedMsg, WelcomeMsg};
pub use signaling::SignalMsg;
