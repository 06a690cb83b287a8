//! Typed view of the opaque `signal.data` value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        SessionDescription {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        SessionDescription {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", default)]
    pub sdp_m_line_index: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Offer,
    Answer,
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationPayload {
    Description(SessionDescription),
    Candidate(IceCandidate),
}

#[derive(Debug, Error)]
pub enum PayloadError {
    /// Offer or answer that cannot be used; fatal to the attempt
    #[error("Malformed session description: {0}")]
    MalformedDescription(String),

    /// Candidate that cannot be used; skipped
    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),

    #[error("Unrecognized negotiation payload")]
    Unrecognized,
}

impl NegotiationPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            NegotiationPayload::Description(d) => match d.sdp_type {
                SdpType::Offer => PayloadKind::Offer,
                SdpType::Answer => PayloadKind::Answer,
            },
            NegotiationPayload::Candidate(_) => PayloadKind::Candidate,
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            NegotiationPayload::Description(d) => serde_json::to_value(d),
            NegotiationPayload::Candidate(c) => serde_json::to_value(c),
        }
    }

    /// Classifies by shape: `type` ⇒ description, `candidate` ⇒ candidate
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        let Some(object) = value.as_object() else {
            return Err(PayloadError::Unrecognized);
        };

        if let Some(kind) = object.get("type") {
            if !matches!(kind.as_str(), Some("offer") | Some("answer")) {
                return Err(PayloadError::Unrecognized);
            }
            let description: SessionDescription = serde_json::from_value(value.clone())
                .map_err(|e| PayloadError::MalformedDescription(e.to_string()))?;
            if description.sdp.trim().is_empty() {
                return Err(PayloadError::MalformedDescription("empty sdp".to_string()));
            }
            return Ok(NegotiationPayload::Description(description));
        }

        if object.contains_key("candidate") {
            let candidate: IceCandidate = serde_json::from_value(value.clone())
                .map_err(|e| PayloadError::MalformedCandidate(e.to_string()))?;
            if candidate.candidate.is_empty() {
                return Err(PayloadError::MalformedCandidate(
                    "end-of-candidates marker".to_string(),
                ));
            }
            return Ok(NegotiationPayload::Candidate(candidate));
        }

        Err(PayloadError::Unrecognized)
    }
}
