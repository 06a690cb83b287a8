//! Per-session negotiation: payload parsing, states and the session context

mod context;
mod payload;
mod state;

pub use context::{CandidateOutcome, SessionContext};
pub use payload::{
    IceCandidate, NegotiationPayload, PayloadError, PayloadKind, SdpType, SessionDescription,
};
pub use state::{EndReason, NegotiationState, Role, Status, resolve_role};
