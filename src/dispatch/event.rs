use crate::request::envelope::ResponseEnvelope;
use crate::request::options::AudioInputState;
use crate::request::state::RequestState;
use serde::{Deserialize, Serialize};

/// Notifications delivered to subscribers, each tagged with the request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Started {
        request_id: String,
    },
    AudioInputChanged {
        request_id: String,
        state: AudioInputState,
    },
    PartialTranscription {
        request_id: String,
        text: String,
    },
    FullTranscription {
        request_id: String,
        text: String,
    },
    PartialResponse {
        request_id: String,
        envelope: ResponseEnvelope,
    },
    FullResponse {
        request_id: String,
        envelope: ResponseEnvelope,
    },
    Canceled {
        request_id: String,
    },
    Failed {
        request_id: String,
        envelope: ResponseEnvelope,
    },
    /// Last notification of every request, whatever the outcome.
    Finished {
        request_id: String,
        state: RequestState,
    },
}

impl LifecycleEvent {
    pub fn request_id(&self) -> &str {
        match self {
            LifecycleEvent::Started { request_id }
            | LifecycleEvent::AudioInputChanged { request_id, .. }
            | LifecycleEvent::PartialTranscription { request_id, .. }
            | LifecycleEvent::FullTranscription { request_id, .. }
            | LifecycleEvent::PartialResponse { request_id, .. }
            | LifecycleEvent::FullResponse { request_id, .. }
            | LifecycleEvent::Canceled { request_id }
            | LifecycleEvent::Failed { request_id, .. }
            | LifecycleEvent::Finished { request_id, .. } => request_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::Started { .. } => "started",
            LifecycleEvent::AudioInputChanged { .. } => "audio_input_changed",
            LifecycleEvent::PartialTranscription { .. } => "partial_transcription",
            LifecycleEvent::FullTranscription { .. } => "full_transcription",
            LifecycleEvent::PartialResponse { .. } => "partial_response",
            LifecycleEvent::FullResponse { .. } => "full_response",
            LifecycleEvent::Canceled { .. } => "canceled",
            LifecycleEvent::Failed { .. } => "failed",
            LifecycleEvent::Finished { .. } => "finished",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
