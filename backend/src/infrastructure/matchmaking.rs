//! Matchmaking queue: waiting visitors plus the session table.
//!
//! Not thread-safe on its own; [`Storage`](super::storage::Storage) keeps it
//! behind a single mutex so every mutation is one critical section.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::domain::{Session, VisitorId, VisitorState, WaitEntry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("Visitor {0} is already in a session")]
    AlreadyInSession(VisitorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    AlreadyQueued,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Visitor was waiting and has been removed from the queue
    Dequeued,
    /// Visitor was in a session; the session is gone and `partner` must be told
    SessionEnded { session: Session, partner: VisitorId },
    /// Visitor was neither queued nor paired
    NotPresent,
}

#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    waiting: VecDeque<WaitEntry>,
    sessions: HashMap<String, Session>,
    session_by_visitor: HashMap<VisitorId, String>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a visitor to the back of the queue.
    ///
    /// Idempotent for visitors already waiting; rejected for visitors in a session.
    pub fn enqueue(&mut self, visitor_id: &VisitorId) -> Result<EnqueueOutcome, MatchError> {
        if self.session_by_visitor.contains_key(visitor_id) {
            return Err(MatchError::AlreadyInSession(visitor_id.clone()));
        }
        if self.is_queued(visitor_id) {
            return Ok(EnqueueOutcome::AlreadyQueued);
        }

        self.waiting.push_back(WaitEntry::new(visitor_id.clone()));
        Ok(EnqueueOutcome::Queued)
    }

    /// Pairs the two earliest waiting visitors, if there are at least two.
    pub fn dequeue_pair(&mut self) -> Option<Session> {
        if self.waiting.len() < 2 {
            return None;
        }

        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;

        let Some(session) = Session::pair(first.visitor_id.clone(), second.visitor_id) else {
            // enqueue() never admits duplicates; keep the survivor at the head
            self.waiting.push_front(first);
            return None;
        };

        for member in session.members() {
            self.session_by_visitor
                .insert(member.clone(), session.session_id.clone());
        }
        self.sessions
            .insert(session.session_id.clone(), session.clone());

        Some(session)
    }

    /// Removes a visitor from the queue or from its session.
    pub fn leave(&mut self, visitor_id: &str) -> LeaveOutcome {
        if let Some(pos) = self.waiting.iter().position(|e| e.visitor_id == visitor_id) {
            self.waiting.remove(pos);
            return LeaveOutcome::Dequeued;
        }

        let Some(session_id) = self.session_by_visitor.remove(visitor_id) else {
            return LeaveOutcome::NotPresent;
        };
        let Some(session) = self.sessions.remove(&session_id) else {
            return LeaveOutcome::NotPresent;
        };

        let partner = session
            .partner_of(visitor_id)
            .cloned()
            .unwrap_or_default();
        self.session_by_visitor.remove(&partner);

        LeaveOutcome::SessionEnded { session, partner }
    }

    pub fn is_queued(&self, visitor_id: &str) -> bool {
        self.waiting.iter().any(|e| e.visitor_id == visitor_id)
    }

    pub fn session_of(&self, visitor_id: &str) -> Option<&Session> {
        let session_id = self.session_by_visitor.get(visitor_id)?;
        self.sessions.get(session_id)
    }

    pub fn partner_of(&self, visitor_id: &str) -> Option<&VisitorId> {
        self.session_of(visitor_id)?.partner_of(visitor_id)
    }

    pub fn state_of(&self, visitor_id: &str) -> VisitorState {
        if self.session_by_visitor.contains_key(visitor_id) {
            VisitorState::InSession
        } else if self.is_queued(visitor_id) {
            VisitorState::Waiting
        } else {
            VisitorState::Idle
        }
    }

    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Waiting visitors, earliest first.
    pub fn waiting_visitors(&self) -> impl Iterator<Item = &VisitorId> {
        self.waiting.iter().map(|e| &e.visitor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn id(s: &str) -> VisitorId {
        s.to_string()
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut queue = MatchmakingQueue::new();

        assert_eq!(queue.enqueue(&id("a")), Ok(EnqueueOutcome::Queued));
        assert_eq!(queue.enqueue(&id("a")), Ok(EnqueueOutcome::AlreadyQueued));
        assert_eq!(queue.queue_len(), 1);
    }

    #[test]
    fn test_single_visitor_is_not_paired() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(&id("a")).unwrap();

        assert!(queue.dequeue_pair().is_none());
        assert_eq!(queue.state_of("a"), VisitorState::Waiting);
    }

    #[test]
    fn test_pairs_two_earliest() {
        let mut queue = MatchmakingQueue::new();
        for v in ["first", "second", "third"] {
            queue.enqueue(&id(v)).unwrap();
        }

        let session = queue.dequeue_pair().unwrap();
        assert!(session.contains("first"));
        assert!(session.contains("second"));
        assert!(!session.contains("third"));
        assert_eq!(queue.waiting_visitors().collect::<Vec<_>>(), vec!["third"]);
    }

    #[test]
    fn test_larger_id_is_initiator() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(&id("v_100")).unwrap();
        queue.enqueue(&id("v_200")).unwrap();

        let session = queue.dequeue_pair().unwrap();
        assert_eq!(session.initiator, "v_200");
        assert_eq!(session.responder, "v_100");
    }

    #[test]
    fn test_enqueue_rejected_while_in_session() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(&id("a")).unwrap();
        queue.enqueue(&id("b")).unwrap();
        queue.dequeue_pair().unwrap();

        assert_eq!(
            queue.enqueue(&id("a")),
            Err(MatchError::AlreadyInSession(id("a")))
        );
        assert_eq!(queue.queue_len(), 0);
    }

    #[test]
    fn test_leave_from_queue() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(&id("a")).unwrap();

        assert_eq!(queue.leave("a"), LeaveOutcome::Dequeued);
        assert_eq!(queue.state_of("a"), VisitorState::Idle);
        assert_eq!(queue.leave("a"), LeaveOutcome::NotPresent);
    }

    #[test]
    fn test_leave_session_frees_both_members() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(&id("a")).unwrap();
        queue.enqueue(&id("b")).unwrap();
        let session = queue.dequeue_pair().unwrap();

        match queue.leave("b") {
            LeaveOutcome::SessionEnded { session: ended, partner } => {
                assert_eq!(ended, session);
                assert_eq!(partner, "a");
            }
            other => panic!("Expected SessionEnded, got {:?}", other),
        }

        assert_eq!(queue.session_count(), 0);
        assert_eq!(queue.state_of("a"), VisitorState::Idle);
        assert_eq!(queue.state_of("b"), VisitorState::Idle);
        // The remaining member may queue again
        assert_eq!(queue.enqueue(&id("a")), Ok(EnqueueOutcome::Queued));
    }

    #[test]
    fn test_partner_lookup() {
        let mut queue = MatchmakingQueue::new();
        queue.enqueue(&id("a")).unwrap();
        queue.enqueue(&id("b")).unwrap();
        queue.dequeue_pair().unwrap();

        assert_eq!(queue.partner_of("a").map(String::as_str), Some("b"));
        assert_eq!(queue.partner_of("b").map(String::as_str), Some("a"));
        assert_eq!(queue.partner_of("c"), None);
    }

    /// Random join/leave/pair sequences never put a visitor in two places,
    /// and every session has two distinct members.
    #[test]
    fn test_membership_invariant_under_random_sequences() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let visitors: Vec<VisitorId> = (0..12).map(|i| format!("v_{:02}", i)).collect();

        for _round in 0..50 {
            let mut queue = MatchmakingQueue::new();
            let mut pair_count = std::collections::HashMap::<VisitorId, usize>::new();

            for _step in 0..200 {
                let visitor = &visitors[rng.gen_range(0..visitors.len())];
                match rng.gen_range(0..3) {
                    0 => {
                        let _ = queue.enqueue(visitor);
                    }
                    1 => {
                        if let LeaveOutcome::SessionEnded { session, .. } = queue.leave(visitor) {
                            for member in session.members() {
                                pair_count.remove(member);
                            }
                        }
                    }
                    _ => {
                        if let Some(session) = queue.dequeue_pair() {
                            assert_ne!(session.initiator, session.responder);
                            for member in session.members() {
                                let count = pair_count.entry(member.clone()).or_default();
                                *count += 1;
                                assert_eq!(*count, 1, "{} matched twice", member);
                            }
                        }
                    }
                }

                for v in &visitors {
                    let queued = queue.is_queued(v);
                    let paired = queue.session_of(v).is_some();
                    assert!(!(queued && paired), "{} is both queued and paired", v);
                    if let Some(session) = queue.session_of(v) {
                        assert!(session.contains(v));
                        assert_ne!(session.initiator, session.responder);
                    }
                }
                let queued: Vec<_> = queue.waiting_visitors().collect();
                let mut deduped = queued.clone();
                deduped.sort();
                deduped.dedup();
                assert_eq!(queued.len(), deduped.len(), "duplicate queue entry");
            }
        }
    }
}
