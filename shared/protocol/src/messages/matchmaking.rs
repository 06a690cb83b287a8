use serde::{Deserialize, Serialize};

use crate::VisitorId;

/// Identity issued by the relay right after the connection is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub visitor_id: VisitorId,
}

/// Pairing event delivered to both members of a new session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedMsg {
    pub partner_id: VisitorId,
    /// Absent only when talking to relays that do not assign roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<bool>,
}
