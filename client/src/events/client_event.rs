use signal_protocol::Message;

use crate::events::UserCommand;
use crate::peer::{PeerEvent, PeerGeneration};
use crate::relay::LinkId;

/// Everything the controller reacts to, funneled through one channel
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Message read from relay link `link`
    Relay { link: LinkId, message: Message },
    /// Relay link `link` failed or was closed by the server
    RelayClosed { link: LinkId, reason: String },
    /// Callback from peer connection `generation`
    Peer {
        generation: PeerGeneration,
        event: PeerEvent,
    },
    Command(UserCommand),
}

impl From<UserCommand> for ClientEvent {
    fn from(command: UserCommand) -> Self {
        ClientEvent::Command(command)
    }
}
