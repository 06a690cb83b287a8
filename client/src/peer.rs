//! Peer connection seam.
//!
//! The engine behind [`PeerConnection`] is external; the controller only
//! drives the offer/answer exchange and candidate application, and learns
//! about the connection through [`PeerEvent`]s posted on a [`PeerEventSink`].

use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::config::IceServer;
use crate::events::ClientEvent;
use crate::media::LocalMedia;
use crate::negotiation::{IceCandidate, SessionDescription};

/// Identifies one peer connection instance; events from older ones are stale
pub type PeerGeneration = u64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerConfig {
    pub ice_servers: Vec<IceServer>,
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Failed to create peer connection: {0}")]
    Create(String),

    #[error("Failed to create description: {0}")]
    Description(String),

    #[error("Failed to apply description: {0}")]
    Apply(String),

    #[error("Failed to add candidate: {0}")]
    Candidate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl PeerConnectionState {
    /// States that end the session
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            PeerConnectionState::Disconnected
                | PeerConnectionState::Failed
                | PeerConnectionState::Closed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    LocalCandidate(IceCandidate),
    ConnectionState(PeerConnectionState),
    RemoteTrack(RemoteTrack),
}

/// Where a peer connection posts its callbacks
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    generation: PeerGeneration,
    sender: Sender<ClientEvent>,
}

impl PeerEventSink {
    pub fn new(generation: PeerGeneration, sender: Sender<ClientEvent>) -> Self {
        PeerEventSink { generation, sender }
    }

    pub fn generation(&self) -> PeerGeneration {
        self.generation
    }

    /// Returns false once the controller is gone
    pub fn emit(&self, event: PeerEvent) -> bool {
        self.sender
            .send(ClientEvent::Peer {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

pub trait PeerConnection: Send {
    fn create_offer(&mut self) -> Result<SessionDescription, PeerError>;
    fn create_answer(&mut self) -> Result<SessionDescription, PeerError>;
    fn set_local_description(&mut self, description: &SessionDescription) -> Result<(), PeerError>;
    fn set_remote_description(&mut self, description: &SessionDescription) -> Result<(), PeerError>;
    fn add_ice_candidate(&mut self, candidate: &IceCandidate) -> Result<(), PeerError>;
    fn close(&mut self);
}

pub trait PeerConnectionFactory: Send {
    /// Create a connection that sends the tracks of `media`
    fn create(
        &mut self,
        config: &PeerConfig,
        events: PeerEventSink,
        media: &dyn LocalMedia,
    ) -> Result<Box<dyn PeerConnection>, PeerError>;
}
