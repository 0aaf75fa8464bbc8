//! Request lifecycle controller.
//!
//! A [`Request`] owns its state and is the only thing that mutates it. Caller
//! intent arrives through [`Request::activate`], [`Request::send`] and
//! [`Request::cancel`]; adapter-reported facts arrive through
//! [`Request::handle`] (or the `on_*` shorthands). Adapter calls only issue
//! commands, so no operation here blocks on the network or the device.
//!
//! A request is not internally synchronized: all calls for one request must
//! be serialized, e.g. by [`RequestDriver`](crate::driver::RequestDriver).

use crate::adapter::decoder::{JsonDecoder, PayloadDecoder};
use crate::dispatch::dispatcher::EventDispatcher;
use crate::dispatch::event::LifecycleEvent;
use crate::error::{Result, VoicereqError};
use crate::request::binding::RequestBinding;
use crate::request::envelope::ResponseEnvelope;
use crate::request::inbound::InboundEvent;
use crate::request::options::{AudioInputState, InputType, RequestOptions};
use crate::request::state::RequestState;
use crate::request::transcription::{TranscriptionAggregator, TranscriptionState};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Point-in-time view of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSnapshot {
    pub request_id: String,
    pub input_type: InputType,
    pub state: RequestState,
    pub audio_input: AudioInputState,
    pub transcription: TranscriptionState,
}

/// One voice or text interaction, from activation to a terminal outcome.
pub struct Request {
    options: Arc<RequestOptions>,
    binding: RequestBinding,
    decoder: Arc<dyn PayloadDecoder>,
    dispatcher: EventDispatcher,
    state: RequestState,
    audio_input: AudioInputState,
    transcription: TranscriptionAggregator,
    started: bool,
    deactivated: bool,
}

impl Request {
    /// Create an idle request. Responses are decoded as JSON unless
    /// [`with_decoder`](Self::with_decoder) says otherwise.
    pub fn new(
        binding: RequestBinding,
        options: Arc<RequestOptions>,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            options,
            binding,
            decoder: Arc::new(JsonDecoder),
            dispatcher,
            state: RequestState::Idle,
            audio_input: AudioInputState::Off,
            transcription: TranscriptionAggregator::new(),
            started: false,
            deactivated: false,
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn PayloadDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn id(&self) -> &str {
        &self.options.request_id
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn input_type(&self) -> InputType {
        self.binding.input_type()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn audio_input_state(&self) -> AudioInputState {
        self.audio_input
    }

    pub fn transcription(&self) -> &TranscriptionState {
        self.transcription.state()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the deactivation step has run.
    pub fn is_deactivated(&self) -> bool {
        self.deactivated
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            request_id: self.id().to_string(),
            input_type: self.input_type(),
            state: self.state,
            audio_input: self.audio_input,
            transcription: self.transcription.state().clone(),
        }
    }

    // Caller-facing operations

    /// Engage the request. Only valid from `Idle`.
    ///
    /// Audio requests activate the session (immediately or deferred, per the
    /// binding) and start listening; text requests become ready to send.
    pub fn activate(&mut self) -> Result<()> {
        if self.state != RequestState::Idle {
            return Err(self.invalid("activate"));
        }

        let immediately = match self.binding {
            RequestBinding::Audio { immediately, .. } => immediately,
            RequestBinding::Text { .. } => {
                self.transition("activate", RequestState::Sending)?;
                self.emit_started();
                return Ok(());
            }
        };

        self.transition("activate", RequestState::Activating)?;
        let session = self.binding.session();
        let activation = if immediately {
            session.activate_now(&self.options)
        } else {
            session.activate_deferred(&self.options)
        };

        match activation {
            Ok(()) => {
                self.set_audio_input(AudioInputState::On);
                self.transition("activate", RequestState::Listening)?;
                self.emit_started();
                Ok(())
            }
            Err(e) => {
                warn!(request_id = self.id(), error = %e, "audio activation failed");
                self.fail(ResponseEnvelope::from_message(e.to_string()));
                Err(e)
            }
        }
    }

    /// Submit the request.
    ///
    /// Text requests go out from `Idle` or after activation. Audio requests
    /// are sent when the transport reports that transmission began, so a
    /// caller `send` on audio is a no-op. Sends in any other situation are
    /// ignored as a benign race.
    pub fn send(&mut self) -> Result<()> {
        match (self.input_type(), self.state) {
            (InputType::Text, RequestState::Idle | RequestState::Sending) => self.send_text(),
            (input_type, state) => {
                debug!(request_id = self.id(), %input_type, %state, "send ignored");
                Ok(())
            }
        }
    }

    /// Abort the request. Idempotent once terminal.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            debug!(request_id = self.id(), state = %self.state, "cancel ignored");
            return;
        }

        self.deactivate();
        if let Err(e) = self.binding.session().deactivate_and_abort(self.id()) {
            warn!(request_id = self.id(), error = %e, "abort failed");
        }
        self.set_audio_input(AudioInputState::Off);
        self.enter_terminal(RequestState::Cancelled);

        let request_id = self.id().to_string();
        self.dispatcher.notify(&LifecycleEvent::Canceled { request_id });
        self.emit_finished();
    }

    // Adapter-facing events

    /// Apply an adapter-reported fact. Never fails; events reaching a
    /// terminal request are discarded.
    pub fn handle(&mut self, event: InboundEvent) {
        if self.state.is_terminal() {
            debug!(
                request_id = self.id(),
                state = %self.state,
                event = event.kind(),
                "discarding stale event"
            );
            return;
        }

        match event {
            InboundEvent::TransmissionBegan => self.transmission_began(),
            InboundEvent::PartialTranscription { text } => self.apply_transcription(text, false),
            InboundEvent::FullTranscription { text } => self.apply_transcription(text, true),
            InboundEvent::PartialResponse { payload } => self.partial_response(&payload),
            InboundEvent::FullResponse { payload } => self.full_response(&payload),
            InboundEvent::Error {
                code,
                message,
                body,
            } => self.fail(ResponseEnvelope::from_error(&code, &message, &body)),
            InboundEvent::Canceled => self.cancel(),
        }
    }

    pub fn on_transmission_began(&mut self) {
        self.handle(InboundEvent::TransmissionBegan);
    }

    pub fn on_partial_transcription(&mut self, text: impl Into<String>) {
        self.handle(InboundEvent::PartialTranscription { text: text.into() });
    }

    pub fn on_full_transcription(&mut self, text: impl Into<String>) {
        self.handle(InboundEvent::FullTranscription { text: text.into() });
    }

    pub fn on_partial_response(&mut self, payload: impl Into<String>) {
        self.handle(InboundEvent::PartialResponse {
            payload: payload.into(),
        });
    }

    pub fn on_full_response(&mut self, payload: impl Into<String>) {
        self.handle(InboundEvent::FullResponse {
            payload: payload.into(),
        });
    }

    pub fn on_error(&mut self, code: &str, message: &str, body: &str) {
        self.handle(InboundEvent::Error {
            code: code.to_string(),
            message: message.to_string(),
            body: body.to_string(),
        });
    }

    pub fn on_canceled_by_adapter(&mut self) {
        self.handle(InboundEvent::Canceled);
    }

    // Internals

    fn send_text(&mut self) -> Result<()> {
        let Some(text) = self.options.text.as_deref() else {
            warn!(request_id = self.id(), "text request has no text to send");
            return Err(self.invalid("send"));
        };

        match self.binding.transport().send_text(text, &self.options) {
            Ok(()) => {
                self.transition("send", RequestState::AwaitingResponse)?;
                self.emit_started();
                Ok(())
            }
            Err(e) => {
                warn!(request_id = self.id(), error = %e, "text send failed");
                self.fail(ResponseEnvelope::from_message(e.to_string()));
                Err(e)
            }
        }
    }

    fn transmission_began(&mut self) {
        if self.input_type() != InputType::Audio || self.state != RequestState::Listening {
            debug!(request_id = self.id(), state = %self.state, "transmission began ignored");
            return;
        }

        match self.binding.transport().stream_audio(&self.options) {
            Ok(()) => {
                if let Err(e) = self.transition("send", RequestState::AwaitingResponse) {
                    warn!(request_id = self.id(), error = %e, "unexpected transition failure");
                }
            }
            Err(e) => {
                warn!(request_id = self.id(), error = %e, "audio stream failed");
                self.fail(ResponseEnvelope::from_message(e.to_string()));
            }
        }
    }

    fn apply_transcription(&mut self, text: String, is_final: bool) {
        if !self.transcription.apply(&text, is_final) {
            debug!(request_id = self.id(), "transcription already final, update rejected");
            return;
        }

        let request_id = self.id().to_string();
        let event = if is_final {
            LifecycleEvent::FullTranscription { request_id, text }
        } else {
            LifecycleEvent::PartialTranscription { request_id, text }
        };
        self.dispatcher.notify(&event);
    }

    fn partial_response(&mut self, raw: &str) {
        if !matches!(
            self.state,
            RequestState::Listening | RequestState::AwaitingResponse
        ) {
            warn!(request_id = self.id(), state = %self.state, "partial response out of order");
            return;
        }

        let envelope = ResponseEnvelope::build(self.decoder.decode(raw));
        if !envelope.is_success() {
            self.fail(envelope);
            return;
        }
        let request_id = self.id().to_string();
        self.dispatcher
            .notify(&LifecycleEvent::PartialResponse { request_id, envelope });
    }

    fn full_response(&mut self, raw: &str) {
        if self.state != RequestState::AwaitingResponse {
            warn!(request_id = self.id(), state = %self.state, "full response out of order");
            return;
        }

        let envelope = ResponseEnvelope::build(self.decoder.decode(raw));
        if !envelope.is_success() {
            self.fail(envelope);
            return;
        }
        self.enter_terminal(RequestState::Completed);
        self.deactivate();
        let request_id = self.id().to_string();
        self.dispatcher
            .notify(&LifecycleEvent::FullResponse { request_id, envelope });
        self.emit_finished();
    }

    fn fail(&mut self, envelope: ResponseEnvelope) {
        if self.state.is_terminal() {
            return;
        }
        self.enter_terminal(RequestState::Failed);
        self.deactivate();
        let request_id = self.id().to_string();
        self.dispatcher
            .notify(&LifecycleEvent::Failed { request_id, envelope });
        self.emit_finished();
    }

    /// Plain deactivation; runs at most once per request.
    fn deactivate(&mut self) {
        if self.deactivated {
            return;
        }
        self.deactivated = true;
        if self.audio_input == AudioInputState::Off {
            return;
        }

        match self.binding.session().deactivate(self.id()) {
            Ok(()) => self.set_audio_input(AudioInputState::Off),
            Err(e) => warn!(request_id = self.id(), error = %e, "audio deactivation failed"),
        }
    }

    fn transition(&mut self, operation: &'static str, next: RequestState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(self.invalid(operation));
        }
        debug!(request_id = self.id(), from = %self.state, to = %next, "transition");
        self.state = next;
        Ok(())
    }

    /// Terminal edges exist from every live state, so callers only need to
    /// rule out an already-terminal request.
    fn enter_terminal(&mut self, terminal: RequestState) {
        debug_assert!(terminal.is_terminal());
        if let Err(e) = self.transition("finish", terminal) {
            warn!(request_id = self.id(), error = %e, "unexpected transition failure");
        }
    }

    fn invalid(&self, operation: &'static str) -> VoicereqError {
        VoicereqError::InvalidTransition {
            operation,
            state: self.state,
        }
    }

    fn set_audio_input(&mut self, state: AudioInputState) {
        if self.audio_input == state {
            return;
        }
        self.audio_input = state;
        let request_id = self.id().to_string();
        self.dispatcher
            .notify(&LifecycleEvent::AudioInputChanged { request_id, state });
    }

    fn emit_started(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let request_id = self.id().to_string();
        self.dispatcher.notify(&LifecycleEvent::Started { request_id });
    }

    fn emit_finished(&self) {
        self.dispatcher.notify(&LifecycleEvent::Finished {
            request_id: self.id().to_string(),
            state: self.state,
        });
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id())
            .field("binding", &self.binding)
            .field("state", &self.state)
            .field("audio_input", &self.audio_input)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
