//! Test helper modules for klaxon-ap integration tests
//!
//! - Test doubles for the controller's collaborators (recording media
//!   engine, in-memory alarm directory)
//! - Log capture for asserting on warnings
//! - WAV fixture generation

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;
pub mod log_capture;

pub use audio_generator::{generate_sine_wav, SineWav};
pub use fakes::{MemoryAlarmDirectory, RecordingEngineFactory};
pub use log_capture::LogCapture;
