//! State owned by one session on this side: partner, peer connection and
//! the candidates that arrived too early to apply.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::negotiation::{IceCandidate, Role, SessionDescription};
use crate::peer::{PeerConnection, PeerError, PeerGeneration, RemoteTrack};

#[derive(Debug, PartialEq, Eq)]
pub enum CandidateOutcome {
    Applied,
    /// Held until the remote description is applied
    Buffered,
    /// The engine rejected it; it is not retried
    Skipped,
}

pub struct SessionContext {
    partner: String,
    role: Role,
    peer: Option<Box<dyn PeerConnection>>,
    generation: Option<PeerGeneration>,
    remote_applied: bool,
    pending_candidates: VecDeque<IceCandidate>,
    remote_tracks: Vec<RemoteTrack>,
}

impl SessionContext {
    pub fn new(partner: String, role: Role) -> Self {
        SessionContext {
            partner,
            role,
            peer: None,
            generation: None,
            remote_applied: false,
            pending_candidates: VecDeque::new(),
            remote_tracks: Vec::new(),
        }
    }

    pub fn partner(&self) -> &str {
        &self.partner
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn has_peer(&self) -> bool {
        self.peer.is_some()
    }

    /// Installs a fresh peer connection; any previous one is closed
    pub fn attach_peer(&mut self, peer: Box<dyn PeerConnection>, generation: PeerGeneration) {
        if let Some(mut old) = self.peer.replace(peer) {
            old.close();
        }
        self.generation = Some(generation);
        self.remote_applied = false;
    }

    pub fn peer_mut(&mut self) -> Option<&mut (dyn PeerConnection + 'static)> {
        self.peer.as_deref_mut()
    }

    pub fn is_current(&self, generation: PeerGeneration) -> bool {
        self.generation == Some(generation)
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Applies a remote candidate now, or holds it until the remote
    /// description is in place
    pub fn add_remote_candidate(&mut self, candidate: IceCandidate) -> CandidateOutcome {
        match self.peer.as_deref_mut() {
            Some(peer) if self.remote_applied => match peer.add_ice_candidate(&candidate) {
                Ok(()) => CandidateOutcome::Applied,
                Err(e) => {
                    warn!(error = %e, "Skipping remote candidate");
                    CandidateOutcome::Skipped
                }
            },
            _ => {
                self.pending_candidates.push_back(candidate);
                CandidateOutcome::Buffered
            }
        }
    }

    /// Sets the remote description, then replays buffered candidates in
    /// arrival order. Returns how many were applied.
    pub fn apply_remote_description(
        &mut self,
        description: &SessionDescription,
    ) -> Result<usize, PeerError> {
        let peer = self
            .peer
            .as_deref_mut()
            .ok_or_else(|| PeerError::Apply("no peer connection".to_string()))?;

        peer.set_remote_description(description)?;
        self.remote_applied = true;

        let mut applied = 0;
        while let Some(candidate) = self.pending_candidates.pop_front() {
            match peer.add_ice_candidate(&candidate) {
                Ok(()) => applied += 1,
                Err(e) => warn!(error = %e, "Skipping buffered candidate"),
            }
        }
        debug!(applied, "Replayed buffered candidates");
        Ok(applied)
    }

    pub fn add_remote_track(&mut self, track: RemoteTrack) {
        self.remote_tracks.push(track);
    }

    pub fn remote_tracks(&self) -> &[RemoteTrack] {
        &self.remote_tracks
    }

    /// Closes the peer connection and drops remote tracks; idempotent.
    ///
    /// Returns true if a peer connection was actually closed.
    pub fn close(&mut self) -> bool {
        self.remote_tracks.clear();
        self.pending_candidates.clear();
        self.generation = None;
        self.remote_applied = false;
        match self.peer.take() {
            Some(mut peer) => {
                peer.close();
                true
            }
            None => false,
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.close();
    }
}
