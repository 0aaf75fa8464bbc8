use crate::dispatch::event::LifecycleEvent;
use crate::error::Result;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Receives lifecycle notifications for a request.
pub trait Subscriber: Send + Sync {
    /// Handle one notification. Errors are logged and never reach other
    /// subscribers.
    fn on_event(&self, event: &LifecycleEvent) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &str {
        "subscriber"
    }
}

/// Ordered fan-out of notifications to a fixed set of subscribers.
///
/// Delivery is synchronous and in registration order. A subscriber that
/// returns an error or panics is skipped; the remaining ones still receive
/// the event.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriber(mut self, subscriber: impl Subscriber + 'static) -> Self {
        self.subscribe(Box::new(subscriber));
        self
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every subscriber.
    ///
    /// Returns how many subscribers handled it successfully.
    pub fn notify(&self, event: &LifecycleEvent) -> usize {
        let mut delivered = 0;
        for subscriber in &self.subscribers {
            match panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!(
                    subscriber = subscriber.name(),
                    request_id = event.request_id(),
                    event = event.kind(),
                    error = %e,
                    "subscriber failed"
                ),
                Err(panic_info) => warn!(
                    subscriber = subscriber.name(),
                    request_id = event.request_id(),
                    event = event.kind(),
                    panic = panic_message(panic_info.as_ref()),
                    "subscriber panicked"
                ),
            }
        }
        delivered
    }
}

impl From<Vec<Box<dyn Subscriber>>> for EventDispatcher {
    fn from(subscribers: Vec<Box<dyn Subscriber>>) -> Self {
        Self { subscribers }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("EventDispatcher")
            .field("subscribers", &names)
            .finish()
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> &str {
    panic_info
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::subscribers::CollectorSubscriber;
    use crate::error::VoicereqError;
    use std::sync::{Arc, Mutex};

    struct FailingSubscriber;

    impl Subscriber for FailingSubscriber {
        fn on_event(&self, _event: &LifecycleEvent) -> Result<()> {
            Err(VoicereqError::Other("subscriber is broken".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingSubscriber;

    impl Subscriber for PanickingSubscriber {
        fn on_event(&self, _event: &LifecycleEvent) -> Result<()> {
            panic!("subscriber exploded");
        }
    }

    /// Records its tag into a shared log so ordering can be checked.
    struct OrderSubscriber {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Subscriber for OrderSubscriber {
        fn on_event(&self, _event: &LifecycleEvent) -> Result<()> {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    fn started() -> LifecycleEvent {
        LifecycleEvent::Started {
            request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn test_notify_without_subscribers() {
        let dispatcher = EventDispatcher::new();
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.notify(&started()), 0);
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = EventDispatcher::new()
            .with_subscriber(OrderSubscriber {
                tag: "first",
                log: log.clone(),
            })
            .with_subscriber(OrderSubscriber {
                tag: "second",
                log: log.clone(),
            })
            .with_subscriber(OrderSubscriber {
                tag: "third",
                log: log.clone(),
            });

        assert_eq!(dispatcher.notify(&started()), 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_subscriber_is_isolated() {
        let collector = CollectorSubscriber::new();
        let dispatcher = EventDispatcher::new()
            .with_subscriber(FailingSubscriber)
            .with_subscriber(collector.clone());

        assert_eq!(dispatcher.notify(&started()), 1);
        assert_eq!(collector.events(), vec![started()]);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let collector = CollectorSubscriber::new();
        let dispatcher = EventDispatcher::new()
            .with_subscriber(PanickingSubscriber)
            .with_subscriber(collector.clone());

        assert_eq!(dispatcher.notify(&started()), 1);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_from_boxed_vec() {
        let subscribers: Vec<Box<dyn Subscriber>> =
            vec![Box::new(CollectorSubscriber::new()), Box::new(FailingSubscriber)];
        let dispatcher = EventDispatcher::from(subscribers);
        assert_eq!(dispatcher.len(), 2);
        assert_eq!(
            format!("{:?}", dispatcher),
            "EventDispatcher { subscribers: [\"collector\", \"failing\"] }"
        );
    }

    #[test]
    fn test_panic_message_downcast() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
