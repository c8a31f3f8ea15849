//! Task messages: the signalling-channel payloads this task exchanges with
//! its peer via the outer session (`send_task_message`/`on_task_message`).
//!
//! Unlike the frame-opcode-discriminated payloads of a raw binary protocol,
//! task messages carry their own `type` field — the outer session treats
//! them as an opaque signalling payload, so the discriminator has to travel
//! with the value. CBOR (self-describing, no codegen) is used for the same
//! reasons it is used elsewhere in this protocol family.

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// An SDP offer or answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// SDP type string (`"offer"` or `"answer"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Session description.
    pub sdp: String,
}

/// One ICE candidate, or `None` to signal end-of-candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate string.
    pub candidate: String,
    /// Media stream identification tag.
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,
    /// Media line index.
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u32>,
}

/// A task message exchanged over the signalling channel.
///
/// Serializes with an internally tagged `type` field, matching the wire
/// shape named in the external interface: `{ "type": "offer", "offer":
/// {...} }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaskMessage {
    /// SDP offer.
    Offer {
        /// The offer itself.
        offer: SessionDescription,
    },
    /// SDP answer.
    Answer {
        /// The answer itself.
        answer: SessionDescription,
    },
    /// A batch of ICE candidates.
    Candidates {
        /// Candidates in emission order; a `None` entry marks
        /// end-of-candidates.
        candidates: Vec<Option<Candidate>>,
    },
    /// Signals readiness to hand the signalling channel over to the
    /// negotiated data channel.
    Handover,
}

impl TaskMessage {
    /// Serialize to CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Encoding`] if CBOR serialization fails (it does
    /// not, for any value this enum can hold, but the underlying library is
    /// fallible).
    pub fn encode(&self) -> Result<Vec<u8>, TaskError> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| TaskError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Parse from CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Encoding`] if the bytes do not decode to a
    /// valid task message.
    pub fn decode(bytes: &[u8]) -> Result<Self, TaskError> {
        ciborium::de::from_reader(bytes).map_err(|e| TaskError::Encoding(e.to_string()))
    }
}

/// Validate an offer's SDP is present and non-empty, per the wire contract
/// (`offer.sdp` must be set).
pub fn validate_session_description(desc: &SessionDescription) -> Result<(), &'static str> {
    if desc.sdp.is_empty() {
        return Err("sdp must not be empty");
    }
    Ok(())
}

/// Validate a candidates batch is non-empty.
pub fn validate_candidates(candidates: &[Option<Candidate>]) -> Result<(), &'static str> {
    if candidates.is_empty() {
        return Err("candidates must not be empty");
    }
    Ok(())
}
