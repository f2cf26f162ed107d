//! Test doubles for the playback controller's collaborators

use async_trait::async_trait;
use klaxon_ap::directory::AlarmDirectory;
use klaxon_ap::error::{Error, Result};
use klaxon_ap::output::StreamType;
use klaxon_ap::playback::session::{MediaEngine, MediaEngineFactory};
use klaxon_ap::playback::{AudioSource, EngineEventSink, SessionId};
use klaxon_common::{AlarmAlert, AlertId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Everything the fake engines were asked to do
#[derive(Debug, Default)]
struct EngineLog {
    created: Vec<SessionId>,
    sources: Vec<(SessionId, AudioSource)>,
    volumes: Vec<(SessionId, f32)>,
    started: Vec<SessionId>,
    released: Vec<SessionId>,
    stream_types: Vec<(SessionId, StreamType)>,
    playing: HashMap<SessionId, bool>,
    sinks: HashMap<SessionId, EngineEventSink>,
    failing_sources: Vec<AudioSource>,
    fail_prepare: bool,
}

/// Factory whose engines record every call instead of playing audio
#[derive(Clone, Default)]
pub struct RecordingEngineFactory {
    log: Arc<Mutex<EngineLog>>,
}

impl RecordingEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set_source` fail for this source
    pub fn fail_source(&self, source: AudioSource) {
        self.log.lock().unwrap().failing_sources.push(source);
    }

    /// Make every `prepare` fail
    pub fn fail_prepare(&self) {
        self.log.lock().unwrap().fail_prepare = true;
    }

    /// Event sink of the engine created for `session_id`
    pub fn sink(&self, session_id: SessionId) -> EngineEventSink {
        self.log
            .lock()
            .unwrap()
            .sinks
            .get(&session_id)
            .cloned()
            .expect("no engine for session")
    }

    pub fn created(&self) -> Vec<SessionId> {
        self.log.lock().unwrap().created.clone()
    }

    /// Sources successfully opened, in order
    pub fn sources(&self) -> Vec<(SessionId, AudioSource)> {
        self.log.lock().unwrap().sources.clone()
    }

    pub fn source_of(&self, session_id: SessionId) -> Option<AudioSource> {
        self.sources()
            .into_iter()
            .find(|(id, _)| *id == session_id)
            .map(|(_, s)| s)
    }

    pub fn volumes(&self, session_id: SessionId) -> Vec<f32> {
        self.log
            .lock()
            .unwrap()
            .volumes
            .iter()
            .filter(|(id, _)| *id == session_id)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn last_volume(&self, session_id: SessionId) -> Option<f32> {
        self.volumes(session_id).last().copied()
    }

    /// Total `set_volume` calls across all engines
    pub fn volume_calls(&self) -> usize {
        self.log.lock().unwrap().volumes.len()
    }

    pub fn started(&self) -> Vec<SessionId> {
        self.log.lock().unwrap().started.clone()
    }

    pub fn released(&self) -> Vec<SessionId> {
        self.log.lock().unwrap().released.clone()
    }

    pub fn stream_type_of(&self, session_id: SessionId) -> Option<StreamType> {
        self.log
            .lock()
            .unwrap()
            .stream_types
            .iter()
            .find(|(id, _)| *id == session_id)
            .map(|(_, t)| *t)
    }

    pub fn is_playing(&self, session_id: SessionId) -> bool {
        self.log
            .lock()
            .unwrap()
            .playing
            .get(&session_id)
            .copied()
            .unwrap_or(false)
    }
}

impl MediaEngineFactory for RecordingEngineFactory {
    fn create(&self, events: EngineEventSink) -> Box<dyn MediaEngine> {
        let id = events.session_id();
        {
            let mut log = self.log.lock().unwrap();
            log.created.push(id);
            log.sinks.insert(id, events);
        }
        Box::new(FakeEngine {
            id,
            log: Arc::clone(&self.log),
        })
    }
}

struct FakeEngine {
    id: SessionId,
    log: Arc<Mutex<EngineLog>>,
}

impl MediaEngine for FakeEngine {
    fn set_source(&mut self, source: &AudioSource) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.failing_sources.contains(source) {
            return Err(Error::Resolution(format!("cannot open {}", source)));
        }
        log.sources.push((self.id, source.clone()));
        Ok(())
    }

    fn set_stream_type(&mut self, stream_type: StreamType) {
        self.log
            .lock()
            .unwrap()
            .stream_types
            .push((self.id, stream_type));
    }

    fn set_looping(&mut self, _looping: bool) {}

    fn set_volume(&mut self, gain: f32) {
        self.log.lock().unwrap().volumes.push((self.id, gain));
    }

    fn prepare(&mut self) -> Result<()> {
        if self.log.lock().unwrap().fail_prepare {
            return Err(Error::AudioOutput("no device".to_string()));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.started.push(self.id);
        log.playing.insert(self.id, true);
        Ok(())
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().playing.insert(self.id, false);
    }

    fn release(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.playing.insert(self.id, false);
        log.released.push(self.id);
    }

    fn is_playing(&self) -> bool {
        self.log
            .lock()
            .unwrap()
            .playing
            .get(&self.id)
            .copied()
            .unwrap_or(false)
    }
}

/// Alarm directory backed by a map
#[derive(Default)]
pub struct MemoryAlarmDirectory {
    alerts: HashMap<AlertId, AlarmAlert>,
    broken: bool,
}

impl MemoryAlarmDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, alert: AlarmAlert) -> Self {
        self.alerts.insert(alert.id, alert);
        self
    }

    /// Every lookup fails with an internal error
    pub fn broken() -> Self {
        Self {
            alerts: HashMap::new(),
            broken: true,
        }
    }
}

#[async_trait]
impl AlarmDirectory for MemoryAlarmDirectory {
    async fn lookup(&self, id: AlertId) -> Result<AlarmAlert> {
        if self.broken {
            return Err(Error::Internal("directory unavailable".to_string()));
        }
        self.alerts
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Alarm {} not found", id)))
    }
}
