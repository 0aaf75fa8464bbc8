//! Request state machine positions and the edges between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a request in its lifecycle.
///
/// ```text
/// Idle ─► Activating ─► Listening ─┐
///   │                              ├─► AwaitingResponse ─► Completed
///   ├───► Sending ─────────────────┘
///   └──────────────────────────────┘
///
/// any non-terminal ─► Cancelled | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    Activating,
    Listening,
    Sending,
    AwaitingResponse,
    Completed,
    Cancelled,
    Failed,
}

impl RequestState {
    pub const ALL: [RequestState; 8] = [
        RequestState::Idle,
        RequestState::Activating,
        RequestState::Listening,
        RequestState::Sending,
        RequestState::AwaitingResponse,
        RequestState::Completed,
        RequestState::Cancelled,
        RequestState::Failed,
    ];

    /// `Completed`, `Cancelled` and `Failed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Cancelled | RequestState::Failed
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;

        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Cancelled | Failed) => true,
            (Idle, Activating | Sending | AwaitingResponse) => true,
            (Activating, Listening) => true,
            (Listening | Sending, AwaitingResponse) => true,
            (AwaitingResponse, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Idle => "idle",
            RequestState::Activating => "activating",
            RequestState::Listening => "listening",
            RequestState::Sending => "sending",
            RequestState::AwaitingResponse => "awaiting response",
            RequestState::Completed => "completed",
            RequestState::Cancelled => "cancelled",
            RequestState::Failed => "failed",
        };
        f.write_str(name)
    }
}
