//! Wire types for the two-peer rendezvous polling protocol
//!
//! Both peers talk to the same endpoint with the same message shape. A
//! [`Signal`] may carry a session description, an ICE candidate, both, or
//! neither. A signal that carries neither is a poll, answered with a
//! [`SignalingResponse`].
//!
//! ```json
//! {"sdp": {"type": "offer", "sdp": "v=0..."}}
//! {"candidate": {"candidate": "candidate:1 1 udp ...", "sdpMid": "0"}}
//! {"role": "answerer"}
//! ```
//!
//! SDP and candidate payloads are opaque: they are stored and handed back
//! verbatim. Only the `type` field of an SDP is ever inspected.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while decoding protocol messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Body was not a JSON object of the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The two parties of a negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Peer that created the offer
    Offerer,
    /// Peer that answers the offer
    Answerer,
}

impl Role {
    /// The party whose data this role is waiting for
    pub fn counterpart(self) -> Role {
        match self {
            Role::Offerer => Role::Answerer,
            Role::Answerer => Role::Offerer,
        }
    }

    fn parse(value: &Value) -> Option<Role> {
        match value.as_str()? {
            "offerer" => Some(Role::Offerer),
            "answerer" => Some(Role::Answerer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offerer"),
            Role::Answerer => f.write_str("answerer"),
        }
    }
}

/// Discriminator read from an SDP payload's `type` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
    /// Any other value, or no string `type` at all
    Other(Option<String>),
}

impl SdpKind {
    pub fn of(sdp: &Value) -> SdpKind {
        match sdp.get("type").and_then(Value::as_str) {
            Some("offer") => SdpKind::Offer,
            Some("answer") => SdpKind::Answer,
            other => SdpKind::Other(other.map(str::to_owned)),
        }
    }
}

/// A message posted by a peer
///
/// JSON `null` fields count as absent. A `role` that is not one of the known
/// values is kept in [`Signal::unknown_role`] so callers can report it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Value>,
}

impl Signal {
    pub fn new(sdp: Option<Value>, candidate: Option<Value>) -> Self {
        Self {
            sdp,
            candidate,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(Value::String(role.to_string()));
        self
    }

    /// The sender's declared role, if it is a known one
    pub fn role(&self) -> Option<Role> {
        self.role.as_ref().and_then(Role::parse)
    }

    /// The raw role value when one was sent but not recognised
    pub fn unknown_role(&self) -> Option<&Value> {
        self.role.as_ref().filter(|value| Role::parse(value).is_none())
    }

    /// True when the message carries data to store
    pub fn is_write(&self) -> bool {
        self.sdp.is_some() || self.candidate.is_some()
    }
}

impl FromStr for Signal {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

/// A decoded request, dispatched on payload shape
#[derive(Debug, Clone, PartialEq)]
pub enum SignalRequest {
    /// Store an SDP and/or candidate; acknowledged without payload
    Write(Signal),
    /// Fetch the counterpart's state
    Poll { role: Option<Role> },
}

impl From<Signal> for SignalRequest {
    fn from(signal: Signal) -> Self {
        if signal.is_write() {
            SignalRequest::Write(signal)
        } else {
            SignalRequest::Poll {
                role: signal.role(),
            }
        }
    }
}

/// Payload returned to a polling peer
///
/// Both keys are always present; `candidates` is `null` rather than `[]`
/// when nothing has been queued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalingResponse {
    pub sdp: Option<Value>,
    pub candidates: Option<Vec<Value>>,
}

impl SignalingResponse {
    pub fn new(sdp: Option<Value>, candidates: &[Value]) -> Self {
        Self {
            sdp,
            candidates: if candidates.is_empty() {
                None
            } else {
                Some(candidates.to_vec())
            },
        }
    }
}

impl fmt::Display for SignalingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
