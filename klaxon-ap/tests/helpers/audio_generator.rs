//! WAV fixture generation for decoder tests

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Parameters of a generated sine WAV
#[derive(Debug, Clone, Copy)]
pub struct SineWav {
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency_hz: f32,
    pub amplitude: f32,
    pub duration_ms: u64,
}

impl Default for SineWav {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            frequency_hz: 440.0,
            amplitude: 0.5,
            duration_ms: 500,
        }
    }
}

impl SineWav {
    pub fn frames(&self) -> u64 {
        self.sample_rate as u64 * self.duration_ms / 1000
    }
}

/// Write a 16-bit PCM sine wave with the same signal on every channel
pub fn generate_sine_wav<P: AsRef<Path>>(path: P, wav: SineWav) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: wav.channels,
        sample_rate: wav.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..wav.frames() {
        let t = i as f32 / wav.sample_rate as f32;
        let sample = (2.0 * PI * wav.frequency_hz * t).sin() * wav.amplitude;
        let value = (sample * i16::MAX as f32) as i16;
        for _ in 0..wav.channels {
            writer.write_sample(value)?;
        }
    }
    writer.finalize()
}
