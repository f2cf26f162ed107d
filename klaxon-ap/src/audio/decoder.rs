//! Audio decoder using symphonia
//!
//! Clips are decoded up front into interleaved stereo f32 samples at the
//! file's own sample rate. Decoding stops at [`MAX_CLIP_DURATION`] so a long
//! song used as an alert holds a bounded buffer.

use crate::audio::CHANNELS;
use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Longest stretch of a file that is decoded
pub const MAX_CLIP_DURATION: Duration = Duration::from_secs(120);

/// A decoded clip
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved stereo samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Decoding stopped at the duration limit before the end of the file
    pub truncated: bool,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }
}

/// Opened container with a decoder for its first audio track
struct OpenedTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
}

pub struct AudioDecoder;

impl AudioDecoder {
    /// Check that `path` opens as a decodable audio file
    ///
    /// Reads only the container headers; no packets are decoded.
    pub fn validate(path: &Path) -> Result<()> {
        let opened = Self::open(path)?;
        debug!(
            "Validated {} ({}Hz, track {})",
            path.display(),
            opened.sample_rate,
            opened.track_id
        );
        Ok(())
    }

    /// Decode a file up to [`MAX_CLIP_DURATION`]
    pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
        Self::decode_file_capped(path, MAX_CLIP_DURATION)
    }

    /// Decode a file, stopping once `max_duration` of audio has been produced
    ///
    /// Mono sources are duplicated to both channels; channels beyond the
    /// first two are dropped. Corrupt packets are skipped with a warning.
    pub fn decode_file_capped(path: &Path, max_duration: Duration) -> Result<DecodedAudio> {
        debug!("Decoding {}", path.display());

        let OpenedTrack {
            mut format,
            mut decoder,
            track_id,
            sample_rate,
        } = Self::open(path)?;

        let max_frames = (max_duration.as_millis() as u64 * sample_rate as u64 / 1000) as usize;
        let max_samples = max_frames * CHANNELS;
        let mut samples = Vec::new();
        let mut truncated = false;

        loop {
            if samples.len() >= max_samples {
                truncated = true;
                break;
            }

            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(Error::Decode(format!("Decode failed: {}", e))),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            push_stereo(buf.samples(), channels, &mut samples);
        }

        if samples.is_empty() {
            return Err(Error::Decode(format!("No audio decoded from {}", path.display())));
        }
        if samples.len() > max_samples {
            samples.truncate(max_samples);
            truncated = true;
        }
        if truncated {
            debug!(
                "Stopped decoding {} at {}ms",
                path.display(),
                max_duration.as_millis()
            );
        }

        let decoded = DecodedAudio {
            samples,
            sample_rate,
            truncated,
        };
        debug!(
            "Decoded {} frames at {}Hz ({}ms)",
            decoded.frames(),
            sample_rate,
            decoded.duration_ms()
        );
        Ok(decoded)
    }

    fn open(path: &Path) -> Result<OpenedTrack> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        Ok(OpenedTrack {
            format,
            decoder,
            track_id,
            sample_rate,
        })
    }
}

/// Append interleaved `channels`-wide samples as stereo
fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            for &s in interleaved {
                output.push(s);
                output.push(s);
            }
        }
        n => {
            for frame in interleaved.chunks_exact(n) {
                output.push(frame[0]);
                output.push(frame[1]);
            }
        }
    }
}
