//! The signaling state machine
//!
//! A single negotiation is held at a time: one offer, one answer, and the
//! candidates each side has trickled in. A new offer discards everything.
//! Without a role hint, a candidate is attributed to the offerer until an
//! answer has been stored and to the answerer afterwards.

use rendezvous_protocol::{Role, SdpKind, Signal, SignalingResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Why part of an accepted message had no effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// SDP `type` was missing or not `offer`/`answer`
    UnknownSdpType(Option<String>),
    /// `role` was present but not a known role; routing fell back to inference
    UnknownRole,
}

/// Effect of applying one part of a [`Signal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new offer was stored and the previous negotiation discarded
    OfferStored,
    AnswerStored,
    /// A candidate was appended to `queue`, which now holds `total` entries
    CandidateQueued { queue: Role, total: usize },
    Ignored(IgnoreReason),
}

/// Offer, answer and candidate queues of the current negotiation
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalingStore {
    offer_sdp: Option<Value>,
    answer_sdp: Option<Value>,
    offer_candidates: Vec<Value>,
    answer_candidates: Vec<Value>,
}

impl SignalingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an incoming message
    ///
    /// The SDP is handled before the candidate, so a candidate sent together
    /// with an answer is already routed to the answerer.
    pub fn apply(&mut self, signal: &Signal) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        if signal.unknown_role().is_some() {
            outcomes.push(Outcome::Ignored(IgnoreReason::UnknownRole));
        }

        if let Some(sdp) = &signal.sdp {
            outcomes.push(self.store_sdp(sdp));
        }

        if let Some(candidate) = &signal.candidate {
            outcomes.push(self.queue_candidate(candidate, signal.role()));
        }

        outcomes
    }

    fn store_sdp(&mut self, sdp: &Value) -> Outcome {
        match SdpKind::of(sdp) {
            SdpKind::Offer => {
                *self = Self {
                    offer_sdp: Some(sdp.clone()),
                    ..Self::default()
                };
                info!("offer stored, negotiation state reset");
                Outcome::OfferStored
            }
            SdpKind::Answer => {
                if self.offer_sdp.is_none() {
                    warn!("answer stored before any offer");
                } else {
                    info!("answer stored");
                }
                self.answer_sdp = Some(sdp.clone());
                Outcome::AnswerStored
            }
            SdpKind::Other(kind) => {
                debug!(?kind, "sdp with unrecognised type ignored");
                Outcome::Ignored(IgnoreReason::UnknownSdpType(kind))
            }
        }
    }

    fn queue_candidate(&mut self, candidate: &Value, role: Option<Role>) -> Outcome {
        let queue = role.unwrap_or(if self.answer_sdp.is_some() {
            Role::Answerer
        } else {
            Role::Offerer
        });
        let candidates = match queue {
            Role::Offerer => &mut self.offer_candidates,
            Role::Answerer => &mut self.answer_candidates,
        };
        candidates.push(candidate.clone());
        let total = candidates.len();
        debug!(%queue, total, explicit = role.is_some(), "candidate queued");
        Outcome::CandidateQueued { queue, total }
    }

    /// Answer a poll whose sender is inferred from the stored state
    ///
    /// Once an answer exists the caller is taken to be the offerer waiting
    /// for it; before that, the answerer waiting for the offer.
    pub fn resolve(&self) -> SignalingResponse {
        if self.answer_sdp.is_some() {
            self.resolve_for(Role::Offerer)
        } else {
            self.resolve_for(Role::Answerer)
        }
    }

    /// Answer a poll from a peer that declared its role
    pub fn resolve_for(&self, role: Role) -> SignalingResponse {
        match role.counterpart() {
            Role::Answerer => {
                SignalingResponse::new(self.answer_sdp.clone(), &self.answer_candidates)
            }
            Role::Offerer => SignalingResponse::new(self.offer_sdp.clone(), &self.offer_candidates),
        }
    }

    pub fn offer_sdp(&self) -> Option<&Value> {
        self.offer_sdp.as_ref()
    }

    pub fn answer_sdp(&self) -> Option<&Value> {
        self.answer_sdp.as_ref()
    }

    pub fn offer_candidates(&self) -> &[Value] {
        &self.offer_candidates
    }

    pub fn answer_candidates(&self) -> &[Value] {
        &self.answer_candidates
    }
}
