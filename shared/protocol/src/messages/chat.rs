use serde::{Deserialize, Serialize};

use crate::VisitorId;

/// Optional text message relayed verbatim between partners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMsg {
    pub to: VisitorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<VisitorId>,
    pub text: String,
}

impl ChatMsg {
    pub fn stamped(&self, from: &str) -> Self {
        ChatMsg {
            to: self.to.clone(),
            from: Some(from.to_string()),
            text: self.text.clone(),
        }
    }
}
