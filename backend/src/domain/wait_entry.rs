use chrono::{DateTime, Utc};

use crate::domain::VisitorId;

/// One visitor waiting to be paired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitEntry {
    pub visitor_id: VisitorId,
    pub enqueued_at: DateTime<Utc>,
}

impl WaitEntry {
    pub fn new(visitor_id: VisitorId) -> Self {
        WaitEntry {
            visitor_id,
            enqueued_at: Utc::now(),
        }
    }
}
