use serde::{Deserialize, Serialize};

/// Latest transcription for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionState {
    pub text: String,
    pub is_final: bool,
}

/// Accumulates incremental transcription; finality is a one-way latch.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionAggregator {
    state: TranscriptionState,
}

impl TranscriptionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored text unless it is already final.
    ///
    /// Returns `false` when the update was rejected.
    pub fn apply(&mut self, text: &str, is_final: bool) -> bool {
        if self.state.is_final {
            return false;
        }
        self.state.text.clear();
        self.state.text.push_str(text);
        self.state.is_final = is_final;
        true
    }

    pub fn state(&self) -> &TranscriptionState {
        &self.state
    }

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final
    }
}
