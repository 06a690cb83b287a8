//! Join / leave handling for the wait queue.

use std::io;

use signal_protocol::{ErrorMsg, Message};
use tracing::{error, info, warn};

use crate::domain::VisitorId;
use crate::infrastructure::matchmaking::MatchError;
use crate::infrastructure::storage::{JoinOutcome, Storage, StorageError};

/// Matchmaking use case handler
pub struct MatchmakingUseCase {
    storage: Storage,
}

impl MatchmakingUseCase {
    pub fn new(storage: Storage) -> Self {
        MatchmakingUseCase { storage }
    }

    /// Handle a join request.
    ///
    /// Replies `Waiting` when queued (or already queued). A match produces no
    /// direct reply: both members get `Matched` through their channels.
    pub fn handle_join(&self, visitor_id: &VisitorId) -> io::Result<Option<Message>> {
        match self.storage.join_queue(visitor_id) {
            Ok(JoinOutcome::Waiting) => {
                info!(visitor = %visitor_id, "Visitor waiting for a partner");
                Ok(Some(Message::Waiting))
            }
            Ok(JoinOutcome::AlreadyWaiting) => Ok(Some(Message::Waiting)),
            Ok(JoinOutcome::Matched(_)) => Ok(None),
            Err(StorageError::Match(MatchError::AlreadyInSession(_))) => {
                warn!(visitor = %visitor_id, "Join rejected: already in a session");
                Ok(Some(Message::Error(ErrorMsg::new(
                    409,
                    "Already in a session",
                ))))
            }
            Err(e) => {
                error!(visitor = %visitor_id, error = %e, "Join failed");
                Ok(Some(Message::Error(ErrorMsg::new(500, "Internal error"))))
            }
        }
    }

    /// Handle a leave request; never replies to the sender.
    pub fn handle_leave(&self, visitor_id: &VisitorId) -> io::Result<Option<Message>> {
        if let Err(e) = self.storage.leave(visitor_id) {
            error!(visitor = %visitor_id, error = %e, "Leave failed");
        }
        Ok(None)
    }

    /// Cleanup when a visitor's connection goes away
    pub fn cleanup_visitor_disconnect(&self, visitor_id: &VisitorId) {
        match self.storage.disconnect_visitor(visitor_id) {
            Ok(Some(partner)) => {
                info!(visitor = %visitor_id, partner = %partner, "Partner notified of disconnect");
            }
            Ok(None) => {}
            Err(e) => error!(visitor = %visitor_id, error = %e, "Disconnect cleanup failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Receiver};

    fn setup(ids: &[&str]) -> (MatchmakingUseCase, Vec<Receiver<Message>>) {
        let storage = Storage::new();
        let receivers = ids
            .iter()
            .map(|id| {
                let (tx, rx) = mpsc::channel();
                storage.connect_visitor(id.to_string(), tx).unwrap();
                rx
            })
            .collect();
        (MatchmakingUseCase::new(storage), receivers)
    }

    #[test]
    fn test_first_join_replies_waiting() {
        let (usecase, _rx) = setup(&["v_a"]);
        let reply = usecase.handle_join(&"v_a".to_string()).unwrap();
        assert_eq!(reply, Some(Message::Waiting));
    }

    #[test]
    fn test_repeated_join_still_waiting() {
        let (usecase, _rx) = setup(&["v_a"]);
        usecase.handle_join(&"v_a".to_string()).unwrap();
        let reply = usecase.handle_join(&"v_a".to_string()).unwrap();
        assert_eq!(reply, Some(Message::Waiting));
        assert_eq!(usecase.storage.queue_len(), 1);
    }

    #[test]
    fn test_second_join_matches_without_reply() {
        let (usecase, rx) = setup(&["v_a", "v_b"]);
        usecase.handle_join(&"v_a".to_string()).unwrap();
        let reply = usecase.handle_join(&"v_b".to_string()).unwrap();

        assert_eq!(reply, None);
        assert!(matches!(rx[0].try_recv(), Ok(Message::Matched(_))));
        assert!(matches!(rx[1].try_recv(), Ok(Message::Matched(_))));
    }

    #[test]
    fn test_join_in_session_is_conflict() {
        let (usecase, _rx) = setup(&["v_a", "v_b"]);
        usecase.handle_join(&"v_a".to_string()).unwrap();
        usecase.handle_join(&"v_b".to_string()).unwrap();

        match usecase.handle_join(&"v_a".to_string()).unwrap() {
            Some(Message::Error(err)) => assert_eq!(err.code, 409),
            other => panic!("Expected error reply, got {:?}", other),
        }
    }

    #[test]
    fn test_leave_while_idle_is_noop() {
        let (usecase, _rx) = setup(&["v_a"]);
        assert_eq!(usecase.handle_leave(&"v_a".to_string()).unwrap(), None);
    }

    #[test]
    fn test_disconnect_notifies_partner() {
        let (usecase, rx) = setup(&["v_a", "v_b"]);
        usecase.handle_join(&"v_a".to_string()).unwrap();
        usecase.handle_join(&"v_b".to_string()).unwrap();
        let _ = rx[1].try_recv();

        usecase.cleanup_visitor_disconnect(&"v_a".to_string());

        assert_eq!(rx[1].try_recv().unwrap(), Message::PartnerLeft);
        assert!(!usecase.storage.is_visitor_connected("v_a"));
    }
}
