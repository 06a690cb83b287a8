//! Visitor identity and presence

use chrono::Utc;

use crate::domain::VisitorId;

/// Where a connected visitor currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitorState {
    /// Connected, neither queued nor paired
    Idle,
    /// In the wait queue
    Waiting,
    /// Member of a session
    InSession,
}

impl std::fmt::Display for VisitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisitorState::Idle => write!(f, "Idle"),
            VisitorState::Waiting => write!(f, "Waiting"),
            VisitorState::InSession => write!(f, "InSession"),
        }
    }
}

/// Generates an opaque visitor id from the current time and a random suffix
pub fn generate_visitor_id() -> VisitorId {
    let random: u32 = rand::random();
    format!("v_{}_{:08x}", Utc::now().timestamp_millis(), random)
}
