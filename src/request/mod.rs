//! A single voice or text request and its lifecycle.

pub mod binding;
pub mod controller;
pub mod envelope;
pub mod inbound;
pub mod options;
pub mod state;
pub mod transcription;

pub use binding::RequestBinding;
pub use controller::{Request, RequestSnapshot};
pub use envelope::{ResponseEnvelope, ResponseError};
pub use inbound::InboundEvent;
pub use options::{AudioInputState, InputType, RequestOptions};
pub use state::RequestState;
pub use transcription::{TranscriptionAggregator, TranscriptionState};
