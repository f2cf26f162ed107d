//! # Klaxon Alarm Player Library (klaxon-ap)
//!
//! Plays alarms once they fire: picks an audio source, starts a media
//! session, ramps its volume up, reacts to phone calls and tears everything
//! down on dismiss, snooze, expiry or error.
//!
//! **Architecture:** single controller actor fed by one event queue; audio
//! through symphonia + rubato + cpal; settings and alarms in sqlite; HTTP
//! command interface via axum.

pub mod api;
pub mod assets;
pub mod audio;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod output;
pub mod playback;
pub mod settings_store;
pub mod telephony;

pub use error::{Error, Result};
