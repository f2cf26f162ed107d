//! Controller event queue
//!
//! Everything that can change playback state arrives as a [`ControllerEvent`]
//! on one unbounded queue consumed by the controller task: host commands, fade
//! timer ticks, engine callbacks, telephony and settings notifications. The
//! producers never touch controller state directly.

use klaxon_common::{AlarmSettings, CallState, Command, CommandOutcome};
use tokio::sync::{mpsc, oneshot};

/// Monotonically increasing media session identifier
pub type SessionId = u64;

/// Sender half of the controller queue
pub type EventSender = mpsc::UnboundedSender<ControllerEvent>;

/// Receiver half of the controller queue
pub type EventReceiver = mpsc::UnboundedReceiver<ControllerEvent>;

/// Create the controller queue
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// One step of a running fade-in
///
/// `fade_id` identifies the fade that scheduled the tick; ticks from a
/// cancelled fade are discarded by the volume ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTick {
    pub fade_id: u64,
    pub step: u32,
}

/// Callback from a media engine, tagged with the session that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The source played to its end (non-looping)
    Completed { session_id: SessionId },

    /// Device or codec failure
    Failed { session_id: SessionId, message: String },
}

impl EngineEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            EngineEvent::Completed { session_id } | EngineEvent::Failed { session_id, .. } => {
                *session_id
            }
        }
    }
}

/// Events consumed by the playback controller
#[derive(Debug)]
pub enum ControllerEvent {
    /// Host command; the outcome is sent back on `reply` when present
    Command {
        command: Command,
        reply: Option<oneshot::Sender<CommandOutcome>>,
    },

    FadeTick(FadeTick),

    Engine(EngineEvent),

    CallStateChanged(CallState),

    SettingsChanged(AlarmSettings),

    /// Stop playback, release the engine and exit the controller loop
    Shutdown,
}

/// Engine-side handle for reporting completion and errors
///
/// Each engine instance receives a sink bound to its own session id, so a
/// late callback from a replaced engine is recognizably stale.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    session_id: SessionId,
    events: EventSender,
}

impl EngineEventSink {
    pub fn new(session_id: SessionId, events: EventSender) -> Self {
        Self { session_id, events }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Report that playback reached the end of the source
    pub fn completed(&self) {
        // Controller gone means nobody is waiting for this session anymore
        let _ = self.events.send(ControllerEvent::Engine(EngineEvent::Completed {
            session_id: self.session_id,
        }));
    }

    /// Report a device or codec failure
    pub fn failed(&self, message: impl Into<String>) {
        let _ = self.events.send(ControllerEvent::Engine(EngineEvent::Failed {
            session_id: self.session_id,
            message: message.into(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_events_with_session() {
        let (tx, mut rx) = event_channel();
        let sink = EngineEventSink::new(42, tx);

        sink.completed();
        sink.failed("device unplugged");

        match rx.try_recv().unwrap() {
            ControllerEvent::Engine(event) => {
                assert_eq!(event, EngineEvent::Completed { session_id: 42 });
            }
            other => panic!("Expected engine event, got {:?}", other),
        }

        match rx.try_recv().unwrap() {
            ControllerEvent::Engine(EngineEvent::Failed { session_id, message }) => {
                assert_eq!(session_id, 42);
                assert_eq!(message, "device unplugged");
            }
            other => panic!("Expected engine failure, got {:?}", other),
        }
    }

    #[test]
    fn test_sink_survives_closed_queue() {
        let (tx, rx) = event_channel();
        drop(rx);

        let sink = EngineEventSink::new(1, tx);
        sink.completed();
        sink.failed("ignored");
    }

    #[test]
    fn test_engine_event_session_id() {
        let failed = EngineEvent::Failed { session_id: 7, message: String::new() };
        assert_eq!(failed.session_id(), 7);
        assert_eq!(EngineEvent::Completed { session_id: 3 }.session_id(), 3);
    }
}
