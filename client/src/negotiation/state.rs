//! Negotiation states, roles and terminal reasons.

use signal_protocol::MatchedMsg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    AcquiringMedia,
    Waiting,
    Matched,
    Offering,
    Answering,
    Connected,
    Ended,
}

impl NegotiationState {
    /// Paired with a partner
    pub fn in_session(self) -> bool {
        matches!(
            self,
            NegotiationState::Matched
                | NegotiationState::Offering
                | NegotiationState::Answering
                | NegotiationState::Connected
        )
    }

    /// Holding resources that a teardown must release
    pub fn is_live(self) -> bool {
        !matches!(self, NegotiationState::Idle | NegotiationState::Ended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    ManualEnd,
    PermissionDenied,
    RelayUnavailable,
    NegotiationFailed,
    PeerDisconnected,
    PartnerLeft,
}

impl EndReason {
    /// Departures that may send the visitor back to the queue in auto mode
    pub fn allows_requeue(self) -> bool {
        matches!(
            self,
            EndReason::PartnerLeft | EndReason::PeerDisconnected | EndReason::NegotiationFailed
        )
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EndReason::ManualEnd => "ended by user",
            EndReason::PermissionDenied => "media permission denied",
            EndReason::RelayUnavailable => "relay unavailable",
            EndReason::NegotiationFailed => "negotiation failed",
            EndReason::PeerDisconnected => "peer disconnected",
            EndReason::PartnerLeft => "partner left",
        };
        f.write_str(text)
    }
}

/// Snapshot published to the observer on every transition.
///
/// `Ended` with a reason is the resting state between attempts: it holds no
/// resources and accepts `Start` exactly like `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub state: NegotiationState,
    /// Why the last session or attempt ended, if it did
    pub reason: Option<EndReason>,
    pub partner: Option<String>,
}

/// Role for this side of a pairing.
///
/// Uses the relay's flag when present; otherwise the side whose id sorts
/// last (byte-wise) initiates. `None` when neither is available.
pub fn resolve_role(matched: &MatchedMsg, self_id: Option<&str>) -> Option<Role> {
    let initiator = match matched.initiator {
        Some(flag) => flag,
        None => self_id? > matched.partner_id.as_str(),
    };
    Some(if initiator {
        Role::Initiator
    } else {
        Role::Responder
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(partner: &str, initiator: Option<bool>) -> MatchedMsg {
        MatchedMsg {
            partner_id: partner.to_string(),
            initiator,
        }
    }

    #[test]
    fn test_relay_flag_wins() {
        assert_eq!(
            resolve_role(&matched("v_9", Some(true)), Some("v_1")),
            Some(Role::Initiator)
        );
        assert_eq!(
            resolve_role(&matched("v_1", Some(false)), None),
            Some(Role::Responder)
        );
    }

    #[test]
    fn test_fallback_is_symmetric() {
        let a = resolve_role(&matched("v_b", None), Some("v_a"));
        let b = resolve_role(&matched("v_a", None), Some("v_b"));
        assert_eq!(a, Some(Role::Responder));
        assert_eq!(b, Some(Role::Initiator));
    }

    #[test]
    fn test_fallback_needs_self_id() {
        assert_eq!(resolve_role(&matched("v_b", None), None), None);
    }

    #[test]
    fn test_requeue_eligibility() {
        assert!(EndReason::PartnerLeft.allows_requeue());
        assert!(EndReason::PeerDisconnected.allows_requeue());
        assert!(EndReason::NegotiationFailed.allows_requeue());
        assert!(!EndReason::ManualEnd.allows_requeue());
        assert!(!EndReason::RelayUnavailable.allows_requeue());
        assert!(!EndReason::PermissionDenied.allows_requeue());
    }

    #[test]
    fn test_state_classes() {
        assert!(NegotiationState::Answering.in_session());
        assert!(!NegotiationState::Waiting.in_session());
        assert!(NegotiationState::Waiting.is_live());
        assert!(!NegotiationState::Ended.is_live());
    }
}
