//! Serialized execution of requests across threads.
//!
//! A [`RequestDriver`] confines one request to one thread; an
//! [`InboundRouter`] lets adapters reach it by request id. Different requests
//! run independently.

pub mod router;
pub mod runner;

pub use router::InboundRouter;
pub use runner::{DriverHandle, InboundSender, RequestDriver};
