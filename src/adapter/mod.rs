//! External collaborators consumed by the request controller.
//!
//! The audio session and the transport are driven by the controller and
//! report back through [`InboundEvent`](crate::request::inbound::InboundEvent)s.
//! The decoder turns raw response text into a [`Payload`].

pub mod decoder;
pub mod session;
pub mod transport;

pub use decoder::{DecodeError, JsonDecoder, Payload, PayloadDecoder};
pub use session::{AudioSession, MockAudioSession, SessionCall};
pub use transport::{MockTransport, Transport, TransportCall};
