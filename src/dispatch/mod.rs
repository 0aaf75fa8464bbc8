//! Lifecycle notifications and their fan-out to subscribers.

pub mod dispatcher;
pub mod event;
pub mod subscribers;

pub use dispatcher::{EventDispatcher, Subscriber};
pub use event::LifecycleEvent;
pub use subscribers::{ChannelSubscriber, CollectorSubscriber, LogSubscriber};
