//! Error types for klaxon-ap
//!
//! No error in the playback path is fatal to the host: the controller turns
//! every failure into a return to `Idle` with resources released.

use thiserror::Error;

/// Main error type for klaxon-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// The chosen source could not be opened or prepared
    #[error("Source resolution failed: {0}")]
    Resolution(String),

    /// Device or codec failure during an active session
    #[error("Engine error: {0}")]
    Engine(String),

    /// Audio decoding or resampling errors
    #[error("Decode error: {0}")]
    Decode(String),

    /// Audio device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Unknown alarm id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unrecognized command
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The controller task has exited
    #[error("Playback controller is not running")]
    ControllerGone,

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<klaxon_common::Error> for Error {
    fn from(err: klaxon_common::Error) -> Self {
        match err {
            klaxon_common::Error::Io(e) => Error::Io(e),
            klaxon_common::Error::Config(msg) => Error::Config(msg),
        }
    }
}

/// Convenience Result type using klaxon-ap Error
pub type Result<T> = std::result::Result<T, Error>;
