//! Session domain model - one pairing of exactly two visitors

use chrono::{DateTime, Utc};

use crate::domain::VisitorId;

/// A call between two distinct visitors.
///
/// The initiator is the member whose id sorts last under byte-wise
/// lexicographic order, so either side can recompute it from the two ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub initiator: VisitorId,
    pub responder: VisitorId,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Pairs two visitors; `None` when both ids are the same visitor.
    pub fn pair(a: VisitorId, b: VisitorId) -> Option<Self> {
        if a == b {
            return None;
        }

        let (initiator, responder) = if a > b { (a, b) } else { (b, a) };

        Some(Session {
            session_id: Self::generate_session_id(),
            initiator,
            responder,
            created_at: Utc::now(),
        })
    }

    pub fn contains(&self, visitor_id: &str) -> bool {
        self.initiator == visitor_id || self.responder == visitor_id
    }

    pub fn is_initiator(&self, visitor_id: &str) -> bool {
        self.initiator == visitor_id
    }

    /// The other member, if `visitor_id` belongs to this session.
    pub fn partner_of(&self, visitor_id: &str) -> Option<&VisitorId> {
        if self.initiator == visitor_id {
            Some(&self.responder)
        } else if self.responder == visitor_id {
            Some(&self.initiator)
        } else {
            None
        }
    }

    pub fn members(&self) -> [&VisitorId; 2] {
        [&self.initiator, &self.responder]
    }

    fn generate_session_id() -> String {
        let random: u32 = rand::random();
        format!("s_{}_{:08x}", Utc::now().timestamp_millis(), random)
    }
}
