use crate::error::{Result, VoicereqError};
use crate::request::options::RequestOptions;
use std::sync::{Arc, Mutex};

/// Trait for the wire transport to the NLP service.
///
/// Results are delivered back asynchronously as inbound events; these calls
/// must not block on the network.
pub trait Transport: Send + Sync {
    /// Submit a literal text query.
    fn send_text(&self, text: &str, options: &RequestOptions) -> Result<()>;

    /// Start framing the captured audio stream for the request.
    ///
    /// Called once the transport has reported that transmission began.
    fn stream_audio(&self, options: &RequestOptions) -> Result<()>;
}

impl<T: Transport> Transport for Arc<T> {
    fn send_text(&self, text: &str, options: &RequestOptions) -> Result<()> {
        (**self).send_text(text, options)
    }

    fn stream_audio(&self, options: &RequestOptions) -> Result<()> {
        (**self).stream_audio(options)
    }
}

/// A call received by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    SendText { request_id: String, text: String },
    StreamAudio { request_id: String },
}

/// Mock transport for testing
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    calls: Arc<Mutex<Vec<TransportCall>>>,
    should_fail: bool,
}

impl MockTransport {
    /// Create a new mock transport that accepts every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on every send
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Texts passed to `send_text`, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::SendText { text, .. } => Some(text),
                TransportCall::StreamAudio { .. } => None,
            })
            .collect()
    }

    /// Number of `stream_audio` calls
    pub fn stream_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TransportCall::StreamAudio { .. }))
            .count()
    }

    fn record(&self, call: TransportCall) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.should_fail {
            Err(VoicereqError::adapter("mock transport failure"))
        } else {
            Ok(())
        }
    }
}

impl Transport for MockTransport {
    fn send_text(&self, text: &str, options: &RequestOptions) -> Result<()> {
        self.record(TransportCall::SendText {
            request_id: options.request_id.clone(),
            text: text.to_string(),
        })
    }

    fn stream_audio(&self, options: &RequestOptions) -> Result<()> {
        self.record(TransportCall::StreamAudio {
            request_id: options.request_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_records_text() {
        let transport = MockTransport::new();
        let options = RequestOptions::with_id("req-1");

        transport.send_text("turn on the lights", &options).unwrap();

        assert_eq!(transport.sent_texts(), vec!["turn on the lights"]);
        assert_eq!(transport.stream_count(), 0);
    }

    #[test]
    fn test_mock_transport_records_stream() {
        let transport = MockTransport::new();
        let options = RequestOptions::with_id("req-2");

        transport.stream_audio(&options).unwrap();

        assert_eq!(
            transport.calls(),
            vec![TransportCall::StreamAudio {
                request_id: "req-2".to_string()
            }]
        );
    }

    #[test]
    fn test_mock_transport_failure() {
        let transport = MockTransport::new().with_failure();
        let options = RequestOptions::with_id("req-3");

        let result = transport.send_text("hi", &options);
        match result {
            Err(VoicereqError::AdapterReported { message }) => {
                assert_eq!(message, "mock transport failure");
            }
            other => panic!("Expected AdapterReported error, got {:?}", other),
        }
    }
}
