//! Alarm alert snapshots
//!
//! An [`AlarmAlert`] is the immutable view of an alarm that the alarm directory
//! hands to the player at command time. The player never mutates or persists it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alarm identifier as stored by the alarm directory
pub type AlertId = i64;

/// Alarm mode: the main alarm or the quieter pre-alarm fired before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Normal,
    PreAlarm,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Normal => write!(f, "normal"),
            AlertKind::PreAlarm => write!(f, "pre_alarm"),
        }
    }
}

/// Snapshot of an alarm as seen by the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmAlert {
    pub id: AlertId,

    /// Configured alert sound; `None` means "use the platform default alert"
    #[serde(default)]
    pub source_uri: Option<String>,

    /// Silent alarms are handled without starting any playback
    #[serde(default)]
    pub is_silent: bool,

    pub kind: AlertKind,

    /// Alternate between the intro clip and the alert clip on each completion
    #[serde(default)]
    pub alternating_track: bool,
}

impl AlarmAlert {
    /// Create a normal, audible alert with the default sound
    pub fn new(id: AlertId) -> Self {
        Self {
            id,
            source_uri: None,
            is_silent: false,
            kind: AlertKind::Normal,
            alternating_track: false,
        }
    }

    pub fn with_source(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.is_silent = true;
        self
    }

    pub fn alternating(mut self) -> Self {
        self.alternating_track = true;
        self
    }

    /// The same alert, fired in the given mode
    pub fn firing_as(mut self, kind: AlertKind) -> Self {
        self.kind = kind;
        self
    }
}
