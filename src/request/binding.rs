use crate::adapter::session::AudioSession;
use crate::adapter::transport::Transport;
use crate::config::AudioConfig;
use crate::request::options::InputType;
use std::fmt;
use std::sync::Arc;

/// How a request reaches the service, chosen at construction.
///
/// Both variants carry the session because cancellation aborts the request
/// through it by id, even when no audio was captured.
#[derive(Clone)]
pub enum RequestBinding {
    /// Literal text submitted through the transport.
    Text {
        session: Arc<dyn AudioSession>,
        transport: Arc<dyn Transport>,
    },
    /// Captured audio streamed through the transport.
    Audio {
        session: Arc<dyn AudioSession>,
        transport: Arc<dyn Transport>,
        /// Use immediate rather than deferred activation.
        immediately: bool,
    },
}

impl RequestBinding {
    pub fn text(session: Arc<dyn AudioSession>, transport: Arc<dyn Transport>) -> Self {
        RequestBinding::Text { session, transport }
    }

    pub fn audio(
        session: Arc<dyn AudioSession>,
        transport: Arc<dyn Transport>,
        immediately: bool,
    ) -> Self {
        RequestBinding::Audio {
            session,
            transport,
            immediately,
        }
    }

    /// Audio binding using the configured activation mode.
    pub fn audio_from_config(
        session: Arc<dyn AudioSession>,
        transport: Arc<dyn Transport>,
        config: &AudioConfig,
    ) -> Self {
        Self::audio(session, transport, config.activate_immediately)
    }

    pub fn input_type(&self) -> InputType {
        match self {
            RequestBinding::Text { .. } => InputType::Text,
            RequestBinding::Audio { .. } => InputType::Audio,
        }
    }

    pub fn session(&self) -> &dyn AudioSession {
        match self {
            RequestBinding::Text { session, .. } | RequestBinding::Audio { session, .. } => {
                session.as_ref()
            }
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        match self {
            RequestBinding::Text { transport, .. } | RequestBinding::Audio { transport, .. } => {
                transport.as_ref()
            }
        }
    }
}

impl fmt::Debug for RequestBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBinding::Text { .. } => f.debug_struct("Text").finish_non_exhaustive(),
            RequestBinding::Audio { immediately, .. } => f
                .debug_struct("Audio")
                .field("immediately", immediately)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::session::MockAudioSession;
    use crate::adapter::transport::MockTransport;

    fn adapters() -> (Arc<dyn AudioSession>, Arc<dyn Transport>) {
        (
            Arc::new(MockAudioSession::new()),
            Arc::new(MockTransport::new()),
        )
    }

    #[test]
    fn test_input_type_follows_variant() {
        let (session, transport) = adapters();
        assert_eq!(
            RequestBinding::text(session.clone(), transport.clone()).input_type(),
            InputType::Text
        );
        assert_eq!(
            RequestBinding::audio(session, transport, true).input_type(),
            InputType::Audio
        );
    }

    #[test]
    fn test_audio_from_config_uses_activation_flag() {
        let (session, transport) = adapters();
        let config = AudioConfig {
            activate_immediately: true,
        };
        match RequestBinding::audio_from_config(session, transport, &config) {
            RequestBinding::Audio { immediately, .. } => assert!(immediately),
            other => panic!("Expected audio binding, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_adapters() {
        let (session, transport) = adapters();
        let debug = format!("{:?}", RequestBinding::audio(session, transport, false));
        assert_eq!(debug, "Audio { immediately: false, .. }");
    }
}
