//! voicereq - lifecycle control for voice and text NLP requests
//!
//! A [`Request`] drives one interaction through
//! `activate → (audio: transmission began) → send → partial* → full`, or to
//! cancellation or failure at any point. Audio capture, the wire transport
//! and payload decoding are external collaborators reached through the
//! traits in [`adapter`]; progress is fanned out to [`Subscriber`]s.
//!
//! ```text
//!  caller ──activate/send/cancel──►┌─────────┐──commands──► AudioSession
//!                                  │ Request │──commands──► Transport
//!  adapters ──InboundEvent────────►└─────────┘
//!                                       │
//!                                       ▼
//!                               EventDispatcher ──► subscribers
//! ```

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod adapter;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod logging;
pub mod request;

// Collaborator seams
pub use adapter::{
    AudioSession, DecodeError, JsonDecoder, MockAudioSession, MockTransport, Payload,
    PayloadDecoder, Transport,
};

// Lifecycle
pub use request::{
    AudioInputState, InboundEvent, InputType, Request, RequestBinding, RequestOptions,
    RequestSnapshot, RequestState, ResponseEnvelope, ResponseError, TranscriptionState,
};

// Notifications
pub use dispatch::{
    ChannelSubscriber, CollectorSubscriber, EventDispatcher, LifecycleEvent, LogSubscriber,
    Subscriber,
};

// Threading
pub use driver::{DriverHandle, InboundRouter, InboundSender, RequestDriver};

// Error handling
pub use error::{Result, VoicereqError};

// Config
pub use config::Config;
