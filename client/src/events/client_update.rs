use crate::negotiation::Status;
use crate::peer::RemoteTrack;

/// What the presentation layer observes
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate {
    Status(Status),
    Chat { from: String, text: String },
    RemoteTrack(RemoteTrack),
    /// Remote tracks of the finished session are gone
    RemoteMediaReleased,
    MediaToggled { audio: bool, video: bool },
}
