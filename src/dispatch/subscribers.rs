//! Ready-made subscribers.

use crate::dispatch::dispatcher::Subscriber;
use crate::dispatch::event::LifecycleEvent;
use crate::error::{Result, VoicereqError};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Collects notifications in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectorSubscriber {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl CollectorSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of notifications of the given kind (see [`LifecycleEvent::kind`]).
    pub fn count(&self, kind: &str) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }

    /// Kinds in delivery order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(LifecycleEvent::kind).collect()
    }

    pub fn last(&self) -> Option<LifecycleEvent> {
        self.events.lock().ok().and_then(|e| e.last().cloned())
    }
}

impl Subscriber for CollectorSubscriber {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| VoicereqError::Other("collector lock poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Forwards notifications to a crossbeam channel without blocking.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: Sender<LifecycleEvent>,
}

impl ChannelSubscriber {
    pub fn new(tx: Sender<LifecycleEvent>) -> Self {
        Self { tx }
    }

    /// Subscriber plus the receiving end of a bounded channel.
    pub fn bounded(capacity: usize) -> (Self, Receiver<LifecycleEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self::new(tx), rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => VoicereqError::Other("event channel full".to_string()),
            TrySendError::Disconnected(_) => {
                VoicereqError::Other("event channel disconnected".to_string())
            }
        })
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Logs every notification at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::PartialTranscription { text, .. }
            | LifecycleEvent::FullTranscription { text, .. } => {
                info!(request_id = event.request_id(), event = event.kind(), text = %text);
            }
            LifecycleEvent::Failed { envelope, .. } => {
                let error = envelope.error().map(|e| e.message.as_str()).unwrap_or("");
                info!(request_id = event.request_id(), event = event.kind(), error);
            }
            _ => info!(request_id = event.request_id(), event = event.kind()),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::envelope::ResponseEnvelope;

    fn canceled() -> LifecycleEvent {
        LifecycleEvent::Canceled {
            request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn test_collector_counts_by_kind() {
        let collector = CollectorSubscriber::new();
        collector.on_event(&canceled()).unwrap();
        collector
            .on_event(&LifecycleEvent::Started {
                request_id: "req-1".to_string(),
            })
            .unwrap();

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.count("canceled"), 1);
        assert_eq!(collector.kinds(), vec!["canceled", "started"]);
        assert_eq!(collector.last().map(|e| e.kind()), Some("started"));
    }

    #[test]
    fn test_channel_subscriber_forwards() {
        let (subscriber, rx) = ChannelSubscriber::bounded(4);
        subscriber.on_event(&canceled()).unwrap();
        assert_eq!(rx.try_recv().ok(), Some(canceled()));
    }

    #[test]
    fn test_channel_subscriber_full_is_error() {
        let (subscriber, _rx) = ChannelSubscriber::bounded(1);
        subscriber.on_event(&canceled()).unwrap();
        let err = subscriber.on_event(&canceled()).unwrap_err();
        assert_eq!(err.to_string(), "event channel full");
    }

    #[test]
    fn test_channel_subscriber_disconnected_is_error() {
        let (subscriber, rx) = ChannelSubscriber::bounded(1);
        drop(rx);
        let err = subscriber.on_event(&canceled()).unwrap_err();
        assert_eq!(err.to_string(), "event channel disconnected");
    }

    #[test]
    fn test_log_subscriber_accepts_all_events() {
        let subscriber = LogSubscriber;
        let failed = LifecycleEvent::Failed {
            request_id: "req-1".to_string(),
            envelope: ResponseEnvelope::from_message("offline"),
        };
        assert!(subscriber.on_event(&failed).is_ok());
        assert!(subscriber.on_event(&canceled()).is_ok());
    }
}
