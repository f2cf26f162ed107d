//! Media session: the player's only path to the audio output
//!
//! A [`MediaEngine`] is the abstract playback backend (the production one is
//! `audio::CpalEngine`). The controller never holds an engine directly; it
//! holds a [`MediaSession`], which is either idle or wraps the one live engine.
//! The idle variant answers the same calls as no-ops, so no caller ever checks
//! for "no engine".

use crate::error::{Error, Result};
use crate::output::StreamType;
use crate::playback::events::{EngineEventSink, SessionId};
use crate::playback::resolver::SourceRequest;
use crate::playback::source::AudioSource;
use tracing::debug;

/// Capability surface of a playback backend
///
/// Completion and error callbacks are reported through the
/// [`EngineEventSink`] handed to [`MediaEngineFactory::create`].
pub trait MediaEngine: Send {
    /// Open a source; failure means the source cannot be played
    fn set_source(&mut self, source: &AudioSource) -> Result<()>;

    fn set_stream_type(&mut self, stream_type: StreamType);

    fn set_looping(&mut self, looping: bool);

    /// Output gain (0.0-1.0)
    fn set_volume(&mut self, gain: f32);

    /// Acquire the output device; may take bounded time
    fn prepare(&mut self) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);

    /// Release all engine resources; the engine is unusable afterwards
    fn release(&mut self);

    fn is_playing(&self) -> bool;
}

/// Creates one engine per session
pub trait MediaEngineFactory: Send + Sync {
    fn create(&self, events: EngineEventSink) -> Box<dyn MediaEngine>;
}

/// Parameters for opening a session
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub id: SessionId,
    pub stream_type: StreamType,
    pub looping: bool,
    pub alternating_track: bool,
    /// What was asked for, kept so the session can be re-initialized
    pub request: SourceRequest,
}

/// Result of trying to open a session
pub enum SessionStart {
    /// Engine prepared and started
    Started(LiveSession),

    /// Output stream gain is zero; the engine was released without starting
    OutputMuted,
}

/// A session with a live engine
pub struct LiveSession {
    id: SessionId,
    engine: Box<dyn MediaEngine>,
    looping: bool,
    alternating_track: bool,
    request: SourceRequest,
    gain: f32,
}

impl LiveSession {
    /// Open `source` on `engine` and start playback at gain 0.
    ///
    /// `prepare` and `start` only run when `output_gain` is non-zero. Any
    /// failure releases the engine and is reported as a resolution failure
    /// so the caller can fall back to another source.
    pub fn open(
        mut engine: Box<dyn MediaEngine>,
        source: &AudioSource,
        params: SessionParams,
        output_gain: f32,
    ) -> Result<SessionStart> {
        let opened = Self::configure(engine.as_mut(), source, &params);
        if let Err(e) = opened {
            engine.release();
            return Err(match e {
                Error::Resolution(msg) => Error::Resolution(msg),
                other => Error::Resolution(format!("{}: {}", source, other)),
            });
        }

        if output_gain <= 0.0 {
            debug!("{} stream volume is 0, not starting session {}", params.stream_type, params.id);
            engine.release();
            return Ok(SessionStart::OutputMuted);
        }

        if let Err(e) = engine.prepare().and_then(|_| engine.start()) {
            engine.release();
            return Err(Error::Resolution(format!("{}: {}", source, e)));
        }

        debug!("Session {} playing {}", params.id, source);
        Ok(SessionStart::Started(LiveSession {
            id: params.id,
            engine,
            looping: params.looping,
            alternating_track: params.alternating_track,
            request: params.request,
            gain: 0.0,
        }))
    }

    fn configure(engine: &mut dyn MediaEngine, source: &AudioSource, params: &SessionParams) -> Result<()> {
        engine.set_source(source)?;
        engine.set_stream_type(params.stream_type);
        engine.set_looping(params.looping);
        engine.set_volume(0.0);
        Ok(())
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn alternating_track(&self) -> bool {
        self.alternating_track
    }

    pub fn request(&self) -> &SourceRequest {
        &self.request
    }
}

/// The controller's current session: idle or live
pub enum MediaSession {
    Idle,
    Live(LiveSession),
}

impl MediaSession {
    pub fn id(&self) -> Option<SessionId> {
        match self {
            MediaSession::Idle => None,
            MediaSession::Live(live) => Some(live.id),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, MediaSession::Live(_))
    }

    pub fn live(&self) -> Option<&LiveSession> {
        match self {
            MediaSession::Idle => None,
            MediaSession::Live(live) => Some(live),
        }
    }

    pub fn set_volume(&mut self, gain: f32) {
        if let MediaSession::Live(live) = self {
            live.gain = gain;
            live.engine.set_volume(gain);
        }
    }

    /// Last gain applied to the live engine (0 when idle)
    pub fn gain(&self) -> f32 {
        match self {
            MediaSession::Idle => 0.0,
            MediaSession::Live(live) => live.gain,
        }
    }

    pub fn is_playing(&self) -> bool {
        match self {
            MediaSession::Idle => false,
            MediaSession::Live(live) => live.engine.is_playing(),
        }
    }

    /// Stop and release the live engine, leaving the session idle
    ///
    /// Returns the id of the session that was released, if any.
    pub fn release(&mut self) -> Option<SessionId> {
        match std::mem::replace(self, MediaSession::Idle) {
            MediaSession::Idle => None,
            MediaSession::Live(mut live) => {
                if live.engine.is_playing() {
                    live.engine.stop();
                }
                live.engine.release();
                Some(live.id)
            }
        }
    }
}

impl Default for MediaSession {
    fn default() -> Self {
        MediaSession::Idle
    }
}
