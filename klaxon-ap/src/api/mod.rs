//! HTTP command interface
//!
//! Hosts drive the player through a small REST API: alarm commands, status,
//! telephony call state, settings and output stream gain.

pub mod handlers;
pub mod server;

pub use server::{router, run, AppContext};
