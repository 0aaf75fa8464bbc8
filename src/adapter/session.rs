use crate::error::{Result, VoicereqError};
use crate::request::options::RequestOptions;
use std::sync::{Arc, Mutex};

/// Trait for the audio session that owns the capture device.
///
/// Calls only issue a command and return; outcomes come back to the request
/// as inbound events. The session is expected to arbitrate device ownership
/// between concurrent requests.
pub trait AudioSession: Send + Sync {
    /// Start capturing right away.
    fn activate_now(&self, options: &RequestOptions) -> Result<()>;

    /// Arm capture and let the session decide when to start streaming.
    fn activate_deferred(&self, options: &RequestOptions) -> Result<()>;

    /// Stop capturing for the given request.
    fn deactivate(&self, request_id: &str) -> Result<()>;

    /// Stop capturing and abort the in-flight request.
    fn deactivate_and_abort(&self, request_id: &str) -> Result<()>;
}

impl<T: AudioSession> AudioSession for Arc<T> {
    fn activate_now(&self, options: &RequestOptions) -> Result<()> {
        (**self).activate_now(options)
    }

    fn activate_deferred(&self, options: &RequestOptions) -> Result<()> {
        (**self).activate_deferred(options)
    }

    fn deactivate(&self, request_id: &str) -> Result<()> {
        (**self).deactivate(request_id)
    }

    fn deactivate_and_abort(&self, request_id: &str) -> Result<()> {
        (**self).deactivate_and_abort(request_id)
    }
}

/// A call received by [`MockAudioSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    ActivateNow(String),
    ActivateDeferred(String),
    Deactivate(String),
    DeactivateAndAbort(String),
}

/// Mock audio session for testing
#[derive(Debug, Clone, Default)]
pub struct MockAudioSession {
    calls: Arc<Mutex<Vec<SessionCall>>>,
    should_fail_activate: bool,
    should_fail_deactivate: bool,
}

impl MockAudioSession {
    /// Create a new mock session that accepts every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on activation
    pub fn with_activate_failure(mut self) -> Self {
        self.should_fail_activate = true;
        self
    }

    /// Configure the mock to fail on deactivation
    pub fn with_deactivate_failure(mut self) -> Self {
        self.should_fail_deactivate = true;
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of plain deactivate calls
    pub fn deactivate_count(&self) -> usize {
        self.count(|c| matches!(c, SessionCall::Deactivate(_)))
    }

    /// Number of deactivate-and-abort calls
    pub fn abort_count(&self) -> usize {
        self.count(|c| matches!(c, SessionCall::DeactivateAndAbort(_)))
    }

    fn count(&self, predicate: impl Fn(&SessionCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: SessionCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn activation(&self, call: SessionCall) -> Result<()> {
        self.record(call);
        if self.should_fail_activate {
            Err(VoicereqError::adapter("mock activation failure"))
        } else {
            Ok(())
        }
    }
}

impl AudioSession for MockAudioSession {
    fn activate_now(&self, options: &RequestOptions) -> Result<()> {
        self.activation(SessionCall::ActivateNow(options.request_id.clone()))
    }

    fn activate_deferred(&self, options: &RequestOptions) -> Result<()> {
        self.activation(SessionCall::ActivateDeferred(options.request_id.clone()))
    }

    fn deactivate(&self, request_id: &str) -> Result<()> {
        self.record(SessionCall::Deactivate(request_id.to_string()));
        if self.should_fail_deactivate {
            Err(VoicereqError::adapter("mock deactivation failure"))
        } else {
            Ok(())
        }
    }

    fn deactivate_and_abort(&self, request_id: &str) -> Result<()> {
        self.record(SessionCall::DeactivateAndAbort(request_id.to_string()));
        Ok(())
    }
}
