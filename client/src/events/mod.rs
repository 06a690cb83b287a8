//! Controller input and output events

mod client_event;
mod client_update;
mod user_command;

pub use client_event::ClientEvent;
pub use client_update::ClientUpdate;
pub use user_command::UserCommand;
