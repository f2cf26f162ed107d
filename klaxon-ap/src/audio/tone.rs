//! Synthesized beep patterns for built-in sources

use crate::audio::CHANNELS;
use crate::playback::source::ToneSpec;
use std::f32::consts::TAU;

/// Rate tones are rendered at; resampled to the device rate like any clip
pub const TONE_SAMPLE_RATE: u32 = 48000;

/// Peak amplitude, leaves headroom for the session gain
const AMPLITUDE: f32 = 0.8;

/// Attack/release ramp per beep, avoids clicks
const EDGE_MS: u32 = 5;

/// Render `spec` as interleaved stereo samples at `sample_rate`
pub fn render_tone(spec: &ToneSpec, sample_rate: u32) -> Vec<f32> {
    let beep_frames = ms_to_frames(spec.beep_ms, sample_rate);
    let gap_frames = ms_to_frames(spec.gap_ms, sample_rate);
    let edge_frames = ms_to_frames(EDGE_MS, sample_rate).min(beep_frames / 2).max(1);

    let total = (beep_frames + gap_frames) * spec.repeats as usize;
    let mut samples = Vec::with_capacity(total * CHANNELS);
    let step = TAU * spec.frequency_hz / sample_rate as f32;

    for _ in 0..spec.repeats {
        for i in 0..beep_frames {
            let envelope = if i < edge_frames {
                i as f32 / edge_frames as f32
            } else if beep_frames - i <= edge_frames {
                (beep_frames - i - 1) as f32 / edge_frames as f32
            } else {
                1.0
            };
            let s = (step * i as f32).sin() * AMPLITUDE * envelope;
            samples.push(s);
            samples.push(s);
        }
        samples.resize(samples.len() + gap_frames * CHANNELS, 0.0);
    }

    samples
}

fn ms_to_frames(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64 / 1000) as usize
}
