//! Events reported by the adapters to a request.

use serde::{Deserialize, Serialize};

/// Facts reported by the transport or audio session.
///
/// Native bridges may hand these over as tagged JSON, e.g.
/// `{"type":"full_transcription","text":"hello"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// The transport is ready to accept audio framing.
    TransmissionBegan,
    PartialTranscription { text: String },
    FullTranscription { text: String },
    /// Raw, undecoded partial response.
    PartialResponse { payload: String },
    /// Raw, undecoded final response.
    FullResponse { payload: String },
    Error {
        code: String,
        message: String,
        #[serde(default)]
        body: String,
    },
    /// Adapter-initiated cancellation (e.g. device interruption).
    Canceled,
}

impl InboundEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::TransmissionBegan => "transmission_began",
            InboundEvent::PartialTranscription { .. } => "partial_transcription",
            InboundEvent::FullTranscription { .. } => "full_transcription",
            InboundEvent::PartialResponse { .. } => "partial_response",
            InboundEvent::FullResponse { .. } => "full_response",
            InboundEvent::Error { .. } => "error",
            InboundEvent::Canceled => "canceled",
        }
    }
}
