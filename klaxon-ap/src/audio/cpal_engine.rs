//! Production media engine: decoded clip played through a cpal output stream
//!
//! cpal streams are not `Send`, so each prepared engine owns a dedicated audio
//! thread that decodes the clip, builds the stream and then waits for
//! [`StreamControl`] messages. `set_source` only reads the file headers. The
//! output callback reads the gain from an atomic and reports end-of-clip and
//! stream errors through the engine's event sink.

use crate::audio::decoder::{AudioDecoder, MAX_CLIP_DURATION};
use crate::audio::resampler::Resampler;
use crate::audio::tone::{render_tone, TONE_SAMPLE_RATE};
use crate::audio::CHANNELS;
use crate::error::{Error, Result};
use crate::output::StreamType;
use crate::playback::events::EngineEventSink;
use crate::playback::session::{MediaEngine, MediaEngineFactory};
use crate::playback::source::{AudioSource, ToneSpec};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest wait for the audio thread to decode the clip and open the device
const PREPARE_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates one [`CpalEngine`] per session
#[derive(Debug, Clone, Default)]
pub struct CpalEngineFactory {
    device_name: Option<String>,
}

impl CpalEngineFactory {
    /// `device_name` of `None` uses the default output device
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl MediaEngineFactory for CpalEngineFactory {
    fn create(&self, events: EngineEventSink) -> Box<dyn MediaEngine> {
        Box::new(CpalEngine::new(self.device_name.clone(), events))
    }
}

/// Probed source, decoded on the audio thread
#[derive(Debug, Clone)]
enum ClipSource {
    File(PathBuf),
    Tone(ToneSpec),
}

/// Decoded audio ready for the device
struct Clip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl ClipSource {
    fn load(&self) -> Result<Clip> {
        match self {
            ClipSource::File(path) => {
                let decoded = AudioDecoder::decode_file(path)?;
                if decoded.truncated {
                    info!(
                        "Playing first {}s of {}",
                        MAX_CLIP_DURATION.as_secs(),
                        path.display()
                    );
                }
                Ok(Clip {
                    samples: decoded.samples,
                    sample_rate: decoded.sample_rate,
                })
            }
            ClipSource::Tone(spec) => Ok(Clip {
                samples: render_tone(spec, TONE_SAMPLE_RATE),
                sample_rate: TONE_SAMPLE_RATE,
            }),
        }
    }
}

/// State shared with the output callback
struct Shared {
    gain_bits: AtomicU32,
    looping: AtomicBool,
    playing: AtomicBool,
}

impl Shared {
    fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }
}

enum StreamControl {
    Play,
    Pause,
    Shutdown,
}

pub struct CpalEngine {
    device_name: Option<String>,
    events: EngineEventSink,
    stream_type: StreamType,
    clip: Option<ClipSource>,
    shared: Arc<Shared>,
    control: Option<mpsc::Sender<StreamControl>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalEngine {
    pub fn new(device_name: Option<String>, events: EngineEventSink) -> Self {
        Self {
            device_name,
            events,
            stream_type: StreamType::Alarm,
            clip: None,
            shared: Arc::new(Shared {
                gain_bits: AtomicU32::new(0.0f32.to_bits()),
                looping: AtomicBool::new(false),
                playing: AtomicBool::new(false),
            }),
            control: None,
            thread: None,
        }
    }

    fn send(&self, message: StreamControl) -> Result<()> {
        match &self.control {
            Some(control) => control
                .send(message)
                .map_err(|_| Error::Engine("Audio thread has exited".to_string())),
            None => Err(Error::Engine("Engine not prepared".to_string())),
        }
    }
}

impl MediaEngine for CpalEngine {
    fn set_source(&mut self, source: &AudioSource) -> Result<()> {
        let clip = match source {
            AudioSource::File(path) => {
                AudioDecoder::validate(path).map_err(|e| Error::Resolution(e.to_string()))?;
                ClipSource::File(path.clone())
            }
            AudioSource::Tone(spec) => ClipSource::Tone(*spec),
            AudioSource::Uri(uri) => {
                return Err(Error::Resolution(format!("Unsupported source URI: {}", uri)));
            }
        };
        self.clip = Some(clip);
        Ok(())
    }

    fn set_stream_type(&mut self, stream_type: StreamType) {
        self.stream_type = stream_type;
    }

    fn set_looping(&mut self, looping: bool) {
        self.shared.looping.store(looping, Ordering::Relaxed);
    }

    fn set_volume(&mut self, gain: f32) {
        self.shared
            .gain_bits
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn prepare(&mut self) -> Result<()> {
        let clip = self
            .clip
            .take()
            .ok_or_else(|| Error::Engine("No source set".to_string()))?;

        let (control_tx, control_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let device_name = self.device_name.clone();
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();

        let thread = std::thread::Builder::new()
            .name(format!("klaxon-audio-{}", self.events.session_id()))
            .spawn(move || {
                audio_thread(device_name, clip, shared, events, control_rx, ready_tx)
            })
            .map_err(|e| Error::AudioOutput(format!("Failed to spawn audio thread: {}", e)))?;

        let ready = ready_rx
            .recv_timeout(PREPARE_TIMEOUT)
            .map_err(|_| Error::AudioOutput("Timed out preparing audio stream".to_string()))
            .and_then(|result| result);

        match ready {
            Ok(()) => {
                debug!("Prepared {} stream for session {}", self.stream_type, self.events.session_id());
                self.control = Some(control_tx);
                self.thread = Some(thread);
                Ok(())
            }
            Err(e) => {
                // Thread exits on its own once the control sender is dropped
                drop(control_tx);
                Err(e)
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        self.send(StreamControl::Play)?;
        self.shared.playing.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) {
        if self.send(StreamControl::Pause).is_ok() {
            self.shared.playing.store(false, Ordering::Relaxed);
        }
    }

    fn release(&mut self) {
        self.shared.playing.store(false, Ordering::Relaxed);
        let _ = self.send(StreamControl::Shutdown);
        self.control = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Audio thread panicked");
            }
        }
        self.clip = None;
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }
}

impl Drop for CpalEngine {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.release();
        }
    }
}

/// Owns the stream for its whole life
fn audio_thread(
    device_name: Option<String>,
    clip: ClipSource,
    shared: Arc<Shared>,
    events: EngineEventSink,
    control: mpsc::Receiver<StreamControl>,
    ready: mpsc::SyncSender<Result<()>>,
) {
    let stream = match open_stream(device_name, clip, shared, events) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while let Ok(message) = control.recv() {
        let result = match message {
            StreamControl::Play => stream.play().map_err(|e| e.to_string()),
            StreamControl::Pause => stream.pause().map_err(|e| e.to_string()),
            StreamControl::Shutdown => break,
        };
        if let Err(e) = result {
            error!("Audio stream control failed: {}", e);
        }
    }
    debug!("Audio thread exiting");
}

fn open_stream(
    device_name: Option<String>,
    source: ClipSource,
    shared: Arc<Shared>,
    events: EngineEventSink,
) -> Result<Stream> {
    let clip = source.load()?;
    let device = find_device(device_name.as_deref())?;
    let supported = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();

    let samples = Resampler::resample(
        &clip.samples,
        clip.sample_rate,
        config.sample_rate.0,
        CHANNELS as u16,
    )?;
    debug!(
        "Audio config: sample_rate={}, channels={}, format={:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let cursor = ClipCursor::new(samples);
    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, cursor, shared, events)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, cursor, shared, events)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, cursor, shared, events)?,
        other => {
            return Err(Error::AudioOutput(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    // Built streams may start running on some hosts
    stream
        .pause()
        .map_err(|e| Error::AudioOutput(format!("Failed to pause new stream: {}", e)))?;
    Ok(stream)
}

/// Requested device by name, falling back to the default device
fn find_device(name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    if let Some(name) = name {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;
        if let Some(device) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            return Ok(device);
        }
        warn!("Requested device '{}' not found, falling back to default device", name);
    }

    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;
    info!(
        "Using audio device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );
    Ok(device)
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut cursor: ClipCursor,
    shared: Arc<Shared>,
    events: EngineEventSink,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let error_events = events.clone();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let gain = shared.gain();
                let looping = shared.looping.load(Ordering::Relaxed);

                for frame in data.chunks_mut(channels) {
                    let (left, right) = cursor.next_frame(looping);
                    for (ch, out) in frame.iter_mut().enumerate() {
                        let sample = match ch {
                            0 => left,
                            1 => right,
                            _ => 0.0,
                        };
                        *out = T::from_sample((sample * gain).clamp(-1.0, 1.0));
                    }
                }

                if cursor.take_finished() {
                    shared.playing.store(false, Ordering::Relaxed);
                    events.completed();
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                error_events.failed(err.to_string());
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}

/// Read position in a stereo clip
struct ClipCursor {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
    reported: bool,
}

impl ClipCursor {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: 0,
            finished: false,
            reported: false,
        }
    }

    /// Next stereo frame; silence once a non-looping clip has ended
    fn next_frame(&mut self, looping: bool) -> (f32, f32) {
        if self.position + 1 >= self.samples.len() {
            if looping && !self.samples.is_empty() {
                self.position = 0;
            } else {
                self.finished = true;
                return (0.0, 0.0);
            }
        }
        let frame = (self.samples[self.position], self.samples[self.position + 1]);
        self.position += CHANNELS;
        frame
    }

    /// True exactly once, after the clip ran out
    fn take_finished(&mut self) -> bool {
        if self.finished && !self.reported {
            self.reported = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_reports_end_once() {
        let mut cursor = ClipCursor::new(vec![0.1, 0.2, 0.3, 0.4]);

        assert_eq!(cursor.next_frame(false), (0.1, 0.2));
        assert_eq!(cursor.next_frame(false), (0.3, 0.4));
        assert!(!cursor.take_finished());

        assert_eq!(cursor.next_frame(false), (0.0, 0.0));
        assert!(cursor.take_finished());
        assert!(!cursor.take_finished());
    }

    #[test]
    fn test_cursor_wraps_when_looping() {
        let mut cursor = ClipCursor::new(vec![0.1, 0.2, 0.3, 0.4]);

        cursor.next_frame(true);
        cursor.next_frame(true);
        assert_eq!(cursor.next_frame(true), (0.1, 0.2));
        assert!(!cursor.take_finished());
    }

    #[test]
    fn test_uri_source_rejected() {
        let (tx, _rx) = crate::playback::events::event_channel();
        let mut engine = CpalEngine::new(None, EngineEventSink::new(1, tx));

        let result = engine.set_source(&AudioSource::Uri("content://media/1".to_string()));
        assert!(matches!(result, Err(Error::Resolution(_))));
    }

    #[test]
    fn test_volume_is_clamped() {
        let (tx, _rx) = crate::playback::events::event_channel();
        let mut engine = CpalEngine::new(None, EngineEventSink::new(1, tx));

        engine.set_volume(1.5);
        assert_eq!(engine.shared.gain(), 1.0);
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_start_before_prepare_fails() {
        let (tx, _rx) = crate::playback::events::event_channel();
        let mut engine = CpalEngine::new(None, EngineEventSink::new(1, tx));

        assert!(matches!(engine.start(), Err(Error::Engine(_))));
        engine.release();
    }
}
