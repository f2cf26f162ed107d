//! Database access layer
//!
//! Provides the `settings` key/value store and read-only alarm lookup.

pub mod alarms;
pub mod init;
pub mod settings;
