use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::VisitorId;

/// Negotiation payload envelope.
///
/// `data` is opaque to the relay; `from` is ignored when sent by a client and
/// stamped by the relay before delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMsg {
    pub to: VisitorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<VisitorId>,
    pub data: Value,
}

impl SignalMsg {
    pub fn to_partner(to: impl Into<VisitorId>, data: Value) -> Self {
        SignalMsg {
            to: to.into(),
            from: None,
            data,
        }
    }

    /// Copy of this message with the sender stamped.
    pub fn stamped(&self, from: &str) -> Self {
        SignalMsg {
            to: self.to.clone(),
            from: Some(from.to_string()),
            data: self.data.clone(),
        }
    }
}
