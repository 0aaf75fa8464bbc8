use crate::driver::runner::InboundSender;
use crate::request::inbound::InboundEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Routes adapter events to driven requests by request id.
///
/// Native bridges usually report callbacks with only a request id attached;
/// the router finds the matching driver. Clones share the same table.
///
/// A route is dropped the first time its driver turns out to have stopped.
/// Callers that finish a driver may also [`remove`](Self::remove) it eagerly.
#[derive(Debug, Clone, Default)]
pub struct InboundRouter {
    routes: Arc<Mutex<HashMap<String, InboundSender>>>,
}

impl InboundRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driven request, replacing any previous route for its id.
    pub fn register(&self, sender: InboundSender) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(sender.request_id().to_string(), sender);
        }
    }

    /// Returns whether a route existed.
    pub fn remove(&self, request_id: &str) -> bool {
        self.routes
            .lock()
            .map(|mut routes| routes.remove(request_id).is_some())
            .unwrap_or(false)
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.routes
            .lock()
            .map(|routes| routes.contains_key(request_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.routes.lock().map(|routes| routes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to the request with `request_id`.
    ///
    /// Events for unknown ids are discarded as stale. Returns whether the
    /// event was queued.
    pub fn route(&self, request_id: &str, event: InboundEvent) -> bool {
        // Deliver outside the lock.
        let sender = self
            .routes
            .lock()
            .ok()
            .and_then(|routes| routes.get(request_id).cloned());

        let Some(sender) = sender else {
            debug!(request_id, event = event.kind(), "no route, discarding stale event");
            return false;
        };

        if sender.deliver(event) {
            return true;
        }
        self.prune(&sender);
        false
    }

    /// Drop the route of a stopped driver, unless the id was re-registered.
    fn prune(&self, stopped: &InboundSender) {
        if let Ok(mut routes) = self.routes.lock()
            && routes
                .get(stopped.request_id())
                .is_some_and(|current| current.same_driver(stopped))
        {
            routes.remove(stopped.request_id());
            debug!(request_id = stopped.request_id(), "driver stopped, route dropped");
        }
    }

    /// Decode a tagged JSON event and route it.
    pub fn route_json(&self, request_id: &str, json: &str) -> Result<bool, serde_json::Error> {
        let event = InboundEvent::from_json(json)?;
        Ok(self.route(request_id, event))
    }
}
