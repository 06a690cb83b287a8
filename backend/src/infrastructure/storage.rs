//! In-memory state shared by every client handler: matchmaking plus live connections

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use signal_protocol::{MatchedMsg, Message, ProtocolError, encode_frame};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Session, VisitorId, VisitorState};
use crate::infrastructure::matchmaking::{EnqueueOutcome, LeaveOutcome, MatchError, MatchmakingQueue};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to lock {0}")]
    LockPoisoned(&'static str),

    #[error("Visitor {0} not connected")]
    NotConnected(VisitorId),

    #[error("Channel to visitor {0} is closed")]
    ChannelClosed(VisitorId),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Visitor {to} is not the partner of {from}")]
    NotPartner { from: VisitorId, to: VisitorId },

    #[error("Message for {to} does not fit in a frame: {source}")]
    Unframeable {
        to: VisitorId,
        #[source]
        source: ProtocolError,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Queued, nobody to pair with yet
    Waiting,
    /// Was already queued; nothing changed
    AlreadyWaiting,
    /// Paired immediately; both members have been sent their `Matched`
    Matched(Session),
}

/// Thread-safe storage for the relay
///
/// Lock order is always `matchmaking` then `connections`. Notifications that
/// depend on matchmaking state (matched, partner-left, relayed signals) are
/// queued while the matchmaking lock is held, so per-destination delivery
/// order follows the order of state changes.
#[derive(Clone)]
pub struct Storage {
    matchmaking: Arc<Mutex<MatchmakingQueue>>,
    connections: Arc<Mutex<HashMap<VisitorId, Sender<Message>>>>,
}

impl Storage {
    pub fn new() -> Self {
        Self {
            matchmaking: Arc::new(Mutex::new(MatchmakingQueue::new())),
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_matchmaking(&self) -> Result<MutexGuard<'_, MatchmakingQueue>> {
        self.matchmaking
            .lock()
            .map_err(|_| StorageError::LockPoisoned("matchmaking"))
    }

    fn lock_connections(&self) -> Result<MutexGuard<'_, HashMap<VisitorId, Sender<Message>>>> {
        self.connections
            .lock()
            .map_err(|_| StorageError::LockPoisoned("connections"))
    }

    // ===== Connection Management =====

    /// Registers the outbound channel of a freshly accepted visitor
    pub fn connect_visitor(&self, visitor_id: VisitorId, sender: Sender<Message>) -> Result<()> {
        self.lock_connections()?.insert(visitor_id, sender);
        Ok(())
    }

    /// Drops a visitor entirely: leaves queue or session, then forgets the connection.
    ///
    /// Returns the partner that was notified, if the visitor was in a session.
    pub fn disconnect_visitor(&self, visitor_id: &str) -> Result<Option<VisitorId>> {
        let partner = self.leave(visitor_id)?;
        self.lock_connections()?.remove(visitor_id);
        Ok(partner)
    }

    pub fn is_visitor_connected(&self, visitor_id: &str) -> bool {
        self.lock_connections()
            .map(|conns| conns.contains_key(visitor_id))
            .unwrap_or(false)
    }

    pub fn connection_count(&self) -> usize {
        self.lock_connections().map(|c| c.len()).unwrap_or(0)
    }

    /// Queues a message for delivery to one visitor
    pub fn forward_to_visitor(&self, target_id: &str, message: Message) -> Result<()> {
        let conns = self.lock_connections()?;
        Self::send_locked(&conns, target_id, message)
    }

    fn send_locked(
        conns: &HashMap<VisitorId, Sender<Message>>,
        target_id: &str,
        message: Message,
    ) -> Result<()> {
        let sender = conns
            .get(target_id)
            .ok_or_else(|| StorageError::NotConnected(target_id.to_string()))?;

        sender
            .send(message)
            .map_err(|_| StorageError::ChannelClosed(target_id.to_string()))
    }

    // ===== Matchmaking =====

    /// Enqueues a visitor and pairs the two earliest waiters when possible
    pub fn join_queue(&self, visitor_id: &VisitorId) -> Result<JoinOutcome> {
        let mut queue = self.lock_matchmaking()?;

        if queue.enqueue(visitor_id)? == EnqueueOutcome::AlreadyQueued {
            return Ok(JoinOutcome::AlreadyWaiting);
        }

        let Some(session) = queue.dequeue_pair() else {
            return Ok(JoinOutcome::Waiting);
        };

        info!(
            session_id = %session.session_id,
            initiator = %session.initiator,
            responder = %session.responder,
            "Visitors matched"
        );

        let conns = self.lock_connections()?;
        for member in session.members() {
            let partner = session.partner_of(member).cloned().unwrap_or_default();
            let matched = Message::Matched(MatchedMsg {
                partner_id: partner,
                initiator: Some(session.is_initiator(member)),
            });
            if let Err(e) = Self::send_locked(&conns, member, matched) {
                // The member's handler is already exiting; its cleanup ends the session
                debug!(visitor = %member, error = %e, "Matched notification not delivered");
            }
        }

        Ok(JoinOutcome::Matched(session))
    }

    /// Removes a visitor from the queue or its session.
    ///
    /// The former partner, if any, is sent `PartnerLeft` and returned.
    pub fn leave(&self, visitor_id: &str) -> Result<Option<VisitorId>> {
        let mut queue = self.lock_matchmaking()?;

        match queue.leave(visitor_id) {
            LeaveOutcome::SessionEnded { session, partner } => {
                info!(
                    session_id = %session.session_id,
                    visitor = %visitor_id,
                    partner = %partner,
                    "Session ended"
                );
                let conns = self.lock_connections()?;
                if let Err(e) = Self::send_locked(&conns, &partner, Message::PartnerLeft) {
                    debug!(visitor = %partner, error = %e, "PartnerLeft not delivered");
                }
                Ok(Some(partner))
            }
            LeaveOutcome::Dequeued => {
                debug!(visitor = %visitor_id, "Left wait queue");
                Ok(None)
            }
            LeaveOutcome::NotPresent => Ok(None),
        }
    }

    /// Delivers a message to `to` only if `to` is the current partner of `from`.
    ///
    /// The check and the send happen under the same matchmaking lock, so a
    /// message cannot slip past a concurrent leave.
    pub fn relay_to_partner(&self, from: &str, to: &str, message: Message) -> Result<()> {
        let queue = self.lock_matchmaking()?;

        match queue.partner_of(from) {
            Some(partner) if partner == to => {
                // Stamping can push a frame over the limit; the receiver's
                // writer must never see one it cannot send
                encode_frame(&message).map_err(|source| StorageError::Unframeable {
                    to: to.to_string(),
                    source,
                })?;
                let conns = self.lock_connections()?;
                Self::send_locked(&conns, to, message)
            }
            _ => Err(StorageError::NotPartner {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }

    // ===== State Derivation =====

    pub fn visitor_state(&self, visitor_id: &str) -> VisitorState {
        self.lock_matchmaking()
            .map(|q| q.state_of(visitor_id))
            .unwrap_or(VisitorState::Idle)
    }

    pub fn partner_of(&self, visitor_id: &str) -> Option<VisitorId> {
        self.lock_matchmaking().ok()?.partner_of(visitor_id).cloned()
    }

    pub fn queue_len(&self) -> usize {
        self.lock_matchmaking().map(|q| q.queue_len()).unwrap_or(0)
    }

    pub fn session_count(&self) -> usize {
        self.lock_matchmaking().map(|q| q.session_count()).unwrap_or(0)
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}
