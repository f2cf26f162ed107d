//! Audio backend: decoding, resampling, tone synthesis and cpal output

pub mod cpal_engine;
pub mod decoder;
pub mod resampler;
pub mod tone;

pub use cpal_engine::{CpalEngine, CpalEngineFactory};
pub use decoder::{AudioDecoder, DecodedAudio};
pub use resampler::Resampler;

/// Channel count of decoded and synthesized audio (interleaved stereo)
pub const CHANNELS: usize = 2;
