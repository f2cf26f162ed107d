//! Playback controller
//!
//! The controller is a single actor: it owns the volume ramp, the source
//! resolver and the one media session, and consumes [`ControllerEvent`]s from
//! one queue. Commands, fade ticks, engine callbacks, telephony and settings
//! changes are all handled in arrival order, so none of the owned state needs
//! locking.
//!
//! **Session ids:** every new session gets a fresh id and each engine reports
//! back through a sink bound to that id. Engine events whose id is not the
//! live session's are discarded.

use crate::assets::AssetCatalog;
use crate::directory::AlarmDirectory;
use crate::error::{Error, Result};
use crate::output::AudioOutputRouter;
use crate::playback::events::{
    event_channel, ControllerEvent, EngineEvent, EngineEventSink, EventReceiver, EventSender,
    SessionId,
};
use crate::playback::resolver::{AudioSourceResolver, ResolvedSource, SourceRequest};
use crate::playback::session::{
    LiveSession, MediaEngineFactory, MediaSession, SessionParams, SessionStart,
};
use crate::playback::state::{PlaybackState, PlayerStatus};
use crate::playback::volume::VolumeRamp;
use chrono::Utc;
use klaxon_common::{AlarmSettings, AlertId, AlertKind, CallState, Command, CommandOutcome};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Injected collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn AlarmDirectory>,
    pub engines: Arc<dyn MediaEngineFactory>,
    pub assets: Arc<dyn AssetCatalog>,
    pub output: Arc<dyn AudioOutputRouter>,
}

#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Pick a random themed variant instead of the alert's own sound
    pub themed_mode: bool,

    /// Fixed seed for the themed pick (tests)
    pub resolver_seed: Option<u64>,
}

pub struct PlaybackController {
    directory: Arc<dyn AlarmDirectory>,
    engines: Arc<dyn MediaEngineFactory>,
    output: Arc<dyn AudioOutputRouter>,
    resolver: AudioSourceResolver,
    volume: VolumeRamp,
    session: MediaSession,
    state: PlaybackState,
    call_state: CallState,
    next_session_id: SessionId,
    events: EventSender,
    status_tx: watch::Sender<PlayerStatus>,
}

impl PlaybackController {
    /// Create an idle controller posting its timer and engine events to `events`
    pub fn new(
        collaborators: Collaborators,
        options: ControllerOptions,
        settings: AlarmSettings,
        call_state: CallState,
        events: EventSender,
    ) -> Self {
        let Collaborators {
            directory,
            engines,
            assets,
            output,
        } = collaborators;

        let resolver = match options.resolver_seed {
            Some(seed) => AudioSourceResolver::with_seed(assets, options.themed_mode, seed),
            None => AudioSourceResolver::new(assets, options.themed_mode),
        };
        let volume = VolumeRamp::new(settings, events.clone());

        let initial = PlayerStatus {
            state: PlaybackState::Idle,
            session_id: None,
            gain: 0.0,
            volume: volume.state(),
            call_state,
            updated_at: Utc::now(),
        };
        let (status_tx, _status_rx) = watch::channel(initial);

        Self {
            directory,
            engines,
            output,
            resolver,
            volume,
            session: MediaSession::Idle,
            state: PlaybackState::Idle,
            call_state,
            next_session_id: 0,
            events,
            status_tx,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    pub fn volume(&self) -> &VolumeRamp {
        &self.volume
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.state,
            session_id: self.session.id(),
            gain: self.session.gain(),
            volume: self.volume.state(),
            call_state: self.call_state,
            updated_at: Utc::now(),
        }
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlayerStatus> {
        self.status_tx.subscribe()
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status());
    }

    /// Consume the queue until shutdown
    pub async fn run(mut self, mut rx: EventReceiver) {
        info!("Playback controller started");
        while let Some(event) = rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }
        self.stop();
        info!("Playback controller stopped");
    }

    /// Handle one event; returns false once the controller has shut down
    pub async fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::Command { command, reply } => {
                let outcome = self.handle_command(command).await;
                // Status first, so a caller woken by the reply sees the new state
                self.publish_status();
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
                return true;
            }
            ControllerEvent::FadeTick(tick) => {
                self.volume.on_tick(tick, &mut self.session);
            }
            ControllerEvent::Engine(event) => self.handle_engine_event(event),
            ControllerEvent::CallStateChanged(call_state) => {
                self.call_state = call_state;
                self.volume
                    .set_call_override(call_state.is_active(), &mut self.session);
            }
            ControllerEvent::SettingsChanged(settings) => {
                self.volume.update_settings(settings, &mut self.session);
            }
            ControllerEvent::Shutdown => {
                info!("Shutting down playback controller");
                self.stop();
                self.publish_status();
                return false;
            }
        }

        self.publish_status();
        true
    }

    /// Execute a command; failures end in `Idle` with a non-sticky outcome
    pub async fn handle_command(&mut self, command: Command) -> CommandOutcome {
        debug!("Handling command: {}", command);
        match self.execute(&command).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Something went wrong handling {}: {}", command, e);
                self.stop();
                CommandOutcome::NotSticky
            }
        }
    }

    async fn execute(&mut self, command: &Command) -> Result<CommandOutcome> {
        match command {
            Command::AlarmFire(id) => self.fire(*id, AlertKind::Normal).await?,
            Command::PreAlarmFire(id) => self.fire(*id, AlertKind::PreAlarm).await?,
            Command::Dismiss | Command::Snooze | Command::SoundExpired | Command::StopSample => {
                self.stop();
            }
            Command::StartSample(kind) => self.start_sample(*kind),
            Command::Mute => self.volume.mute(&mut self.session),
            Command::Demute => self.demute(),
            Command::Unknown(raw) => {
                warn!("{}", Error::UnknownCommand(raw.clone()));
                self.stop();
            }
        }
        Ok(command.outcome())
    }

    async fn fire(&mut self, id: AlertId, kind: AlertKind) -> Result<()> {
        self.stop();
        self.volume.set_mode(kind);

        let alert = match self.directory.lookup(id).await {
            Ok(alert) => alert,
            Err(Error::NotFound(msg)) => {
                warn!("{}, handling {} alarm as silent", msg, kind);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if alert.is_silent {
            info!("Alarm {} is silent, not playing", id);
            return Ok(());
        }

        let request = SourceRequest::for_alert(alert.source_uri);
        if self.start_session(request, alert.alternating_track) {
            self.state = PlaybackState::for_alarm(kind);
            self.volume.fade_in_as_set_in_settings(&mut self.session);
            info!("Alarm {} playing ({})", id, self.state);
        }
        Ok(())
    }

    fn start_sample(&mut self, kind: AlertKind) {
        if self.state == PlaybackState::PlayingSample(kind) && self.session.is_playing() {
            debug!("Sample already playing, reapplying volume");
            self.volume.cancel_fade_in();
            self.volume.apply(&mut self.session);
            return;
        }

        self.stop();
        self.volume.set_mode(kind);
        if self.start_session(SourceRequest::default(), false) {
            self.state = PlaybackState::PlayingSample(kind);
            self.volume.apply(&mut self.session);
        }
    }

    fn demute(&mut self) {
        if self.session.is_live() {
            self.volume.fade_in_fast(&mut self.session);
        } else {
            self.volume.clear_mute();
        }
    }

    /// Cancel the fade, release the session and go idle
    fn stop(&mut self) {
        self.volume.cancel_fade_in();
        if let Some(id) = self.session.release() {
            debug!("Released session {}", id);
        }
        if self.state != PlaybackState::Idle {
            info!("{} -> idle", self.state);
        }
        self.state = PlaybackState::Idle;
    }

    /// Start a fresh session; false when nothing could be started
    fn start_session(&mut self, request: SourceRequest, alternating_track: bool) -> bool {
        self.volume.reset_transients(self.call_state.is_active());
        self.open_with_fallback(request, alternating_track)
    }

    fn open_with_fallback(&mut self, request: SourceRequest, alternating_track: bool) -> bool {
        let resolved = self.resolver.resolve(&request, self.call_state.is_active());
        match self.open_session(&resolved, request.clone(), alternating_track) {
            Ok(started) => return started,
            Err(e) => warn!("Cannot play {} source: {}", resolved.origin, e),
        }

        let fallback = self.resolver.fallback();
        match self.open_session(&fallback, request, alternating_track) {
            Ok(started) => started,
            Err(e) => {
                error!("Fallback source failed, staying silent: {}", e);
                false
            }
        }
    }

    fn open_session(
        &mut self,
        resolved: &ResolvedSource,
        request: SourceRequest,
        alternating_track: bool,
    ) -> Result<bool> {
        self.next_session_id += 1;
        let id = self.next_session_id;

        let engine = self
            .engines
            .create(EngineEventSink::new(id, self.events.clone()));
        let params = SessionParams {
            id,
            stream_type: self.output.stream_type(),
            looping: false,
            alternating_track,
            request,
        };

        match LiveSession::open(engine, &resolved.source, params, self.output.stream_gain())? {
            SessionStart::Started(live) => {
                self.session = MediaSession::Live(live);
                Ok(true)
            }
            SessionStart::OutputMuted => {
                info!("Alarm stream volume is 0, not playing {}", resolved.source);
                Ok(false)
            }
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        let session_id = event.session_id();
        if self.session.id() != Some(session_id) {
            debug!("Discarding stale event from session {}", session_id);
            return;
        }

        match event {
            EngineEvent::Failed { message, .. } => {
                error!("Engine error in session {}: {}", session_id, message);
                self.stop();
            }
            EngineEvent::Completed { .. } => {
                let request = match self.session.live() {
                    Some(live) if live.alternating_track() => live.request().toggled(),
                    _ => {
                        debug!("Session {} completed", session_id);
                        return;
                    }
                };
                self.switch_alternate_track(request);
            }
        }
    }

    /// Replace the completed session with the other track, keeping state and fade
    fn switch_alternate_track(&mut self, request: SourceRequest) {
        self.session.release();
        debug!(
            "Alternating track: now playing {}",
            if request.play_intro { "intro" } else { "alert" }
        );

        if self.open_with_fallback(request, true) {
            self.volume.refresh(&mut self.session);
        } else {
            self.stop();
        }
    }
}

/// Cloneable handle for talking to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    events: EventSender,
    status: watch::Receiver<PlayerStatus>,
}

impl ControllerHandle {
    /// Submit a command and wait for its outcome
    pub async fn send(&self, command: Command) -> Result<CommandOutcome> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(ControllerEvent::Command {
                command,
                reply: Some(tx),
            })
            .map_err(|_| Error::ControllerGone)?;
        rx.await.map_err(|_| Error::ControllerGone)
    }

    /// Post an event without waiting
    pub fn post(&self, event: ControllerEvent) -> Result<()> {
        self.events.send(event).map_err(|_| Error::ControllerGone)
    }

    pub fn status(&self) -> PlayerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlayerStatus> {
        self.status.clone()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.post(ControllerEvent::Shutdown)
    }

    /// Forward call-state changes into the controller queue
    pub fn follow_call_state(&self, rx: watch::Receiver<CallState>) -> JoinHandle<()> {
        self.forward(rx, ControllerEvent::CallStateChanged)
    }

    /// Forward settings changes into the controller queue
    pub fn follow_settings(&self, rx: watch::Receiver<AlarmSettings>) -> JoinHandle<()> {
        self.forward(rx, ControllerEvent::SettingsChanged)
    }

    /// Forwarders end when the source or the controller goes away
    fn forward<T, F>(&self, mut rx: watch::Receiver<T>, to_event: F) -> JoinHandle<()>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T) -> ControllerEvent + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let value = rx.borrow_and_update().clone();
                        if events.send(to_event(value)).is_err() {
                            break;
                        }
                    }
                    _ = events.closed() => break,
                }
            }
        })
    }
}

/// Start the controller task
pub fn spawn(
    collaborators: Collaborators,
    options: ControllerOptions,
    settings: AlarmSettings,
    call_state: CallState,
) -> (ControllerHandle, JoinHandle<()>) {
    let (events, rx) = event_channel();
    let controller = PlaybackController::new(
        collaborators,
        options,
        settings,
        call_state,
        events.clone(),
    );
    let handle = ControllerHandle {
        events,
        status: controller.subscribe_status(),
    };
    let task = tokio::spawn(controller.run(rx));
    (handle, task)
}
