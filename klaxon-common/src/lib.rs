//! # Klaxon Common Library
//!
//! Shared code for the Klaxon alarm player including:
//! - Alarm alert snapshots and player commands
//! - The discrete volume level table
//! - Alarm playback settings values
//! - Telephony call state
//! - Bootstrap configuration loading

pub mod alert;
pub mod command;
pub mod config;
pub mod error;
pub mod levels;
pub mod settings;
pub mod telephony;

pub use alert::{AlarmAlert, AlertId, AlertKind};
pub use command::{Command, CommandOutcome};
pub use error::{Error, Result};
pub use levels::VolumeLevel;
pub use settings::AlarmSettings;
pub use telephony::CallState;
