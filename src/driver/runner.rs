//! Runs a request on a dedicated thread.
//!
//! Caller commands arrive on a bounded crossbeam queue and adapter events on
//! an unbounded one. The driver thread applies both to the request one at a
//! time. Events keep their order, and a command sees every event delivered
//! before the command was sent. Delivering an event never
//! blocks, so adapters may report from inside an adapter call made by the
//! driver thread itself. The request is never shared between threads.

use crate::error::{Result, VoicereqError};
use crate::request::controller::{Request, RequestSnapshot};
use crate::request::inbound::InboundEvent;
use crate::request::state::RequestState;
use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

enum Command {
    Activate(Sender<Result<()>>),
    Send(Sender<Result<()>>),
    Cancel(Sender<()>),
    Snapshot(Sender<RequestSnapshot>),
}

enum DriverMessage {
    Command(Command),
    Finish,
}

/// Adapter-side handle for delivering events to a driven request.
#[derive(Debug, Clone)]
pub struct InboundSender {
    request_id: String,
    tx: Sender<InboundEvent>,
}

impl InboundSender {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Whether both senders feed the same driver.
    pub fn same_driver(&self, other: &InboundSender) -> bool {
        self.tx.same_channel(&other.tx)
    }

    /// Queue an event without blocking. Events for a stopped driver are
    /// dropped.
    ///
    /// Returns whether the event was queued.
    pub fn deliver(&self, event: InboundEvent) -> bool {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            debug!(
                request_id = %self.request_id,
                event = kind,
                "driver stopped, dropping event"
            );
            return false;
        }
        true
    }
}

/// Spawns request drivers.
pub struct RequestDriver;

impl RequestDriver {
    /// Move `request` onto its own thread.
    ///
    /// `capacity` bounds the caller command queue; callers block while it is
    /// full. Adapter events are never bounded.
    pub fn spawn(request: Request, capacity: usize) -> Result<DriverHandle> {
        let request_id = request.id().to_string();
        let (commands_tx, commands_rx) = bounded(capacity.max(1));
        let (events_tx, events_rx) = unbounded();

        let handle = thread::Builder::new()
            .name(format!("voicereq-{}", request_id))
            .spawn(move || Self::run(request, commands_rx, events_rx))?;

        Ok(DriverHandle {
            request_id,
            commands: commands_tx,
            events: events_tx,
            handle: Some(handle),
        })
    }

    fn run(
        mut request: Request,
        commands: Receiver<DriverMessage>,
        events: Receiver<InboundEvent>,
    ) -> Request {
        loop {
            select! {
                recv(commands) -> message => match message {
                    Ok(DriverMessage::Command(command)) => {
                        Self::drain(&mut request, &events);
                        Self::apply(&mut request, command);
                    }
                    Ok(DriverMessage::Finish) | Err(_) => break,
                },
                recv(events) -> event => match event {
                    Ok(event) => request.handle(event),
                    Err(_) => break,
                },
            }
        }

        // Events queued before the stop still count.
        Self::drain(&mut request, &events);
        debug!(request_id = request.id(), state = %request.state(), "driver stopped");
        request
    }

    /// Apply the events queued so far.
    fn drain(request: &mut Request, events: &Receiver<InboundEvent>) {
        for event in events.try_iter().take(events.len()) {
            request.handle(event);
        }
    }

    fn apply(request: &mut Request, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting.
        let replied = match command {
            Command::Activate(reply) => reply.send(request.activate()).is_ok(),
            Command::Send(reply) => reply.send(request.send()).is_ok(),
            Command::Cancel(reply) => {
                request.cancel();
                reply.send(()).is_ok()
            }
            Command::Snapshot(reply) => reply.send(request.snapshot()).is_ok(),
        };
        if !replied {
            debug!(request_id = request.id(), "caller went away before reply");
        }
    }
}

/// Caller-side handle for a driven request.
///
/// Must not be used from a subscriber of the same request: subscribers run
/// on the driver thread, which would wait on itself.
#[derive(Debug)]
pub struct DriverHandle {
    request_id: String,
    commands: Sender<DriverMessage>,
    events: Sender<InboundEvent>,
    handle: Option<JoinHandle<Request>>,
}

impl DriverHandle {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Sender for the adapters of this request.
    pub fn inbound(&self) -> InboundSender {
        InboundSender {
            request_id: self.request_id.clone(),
            tx: self.events.clone(),
        }
    }

    pub fn activate(&self) -> Result<()> {
        self.call(Command::Activate)?
    }

    pub fn send(&self) -> Result<()> {
        self.call(Command::Send)?
    }

    pub fn cancel(&self) -> Result<()> {
        self.call(Command::Cancel)
    }

    pub fn snapshot(&self) -> Result<RequestSnapshot> {
        self.call(Command::Snapshot)
    }

    pub fn state(&self) -> Result<RequestState> {
        Ok(self.snapshot()?.state)
    }

    /// Stop the driver after everything already queued and hand the request
    /// back.
    pub fn finish(mut self) -> Result<Request> {
        if self.commands.send(DriverMessage::Finish).is_err() {
            debug!(request_id = %self.request_id, "driver already stopped");
        }
        let handle = self.handle.take().ok_or(VoicereqError::DriverStopped)?;
        handle.join().map_err(|panic_info| {
            let msg = panic_info
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic");
            VoicereqError::Other(format!("driver thread panicked: {msg}"))
        })
    }

    fn call<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(DriverMessage::Command(command(reply_tx)))
            .map_err(|_| VoicereqError::DriverStopped)?;
        reply_rx.recv().map_err(|_| VoicereqError::DriverStopped)
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        if self.handle.is_some() && self.commands.send(DriverMessage::Finish).is_err() {
            warn!(request_id = %self.request_id, "driver already stopped on drop");
        }
    }
}
