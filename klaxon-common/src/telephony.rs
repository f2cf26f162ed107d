//! Telephony call state as seen by the player

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a phone call is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    #[default]
    Idle,
    Active,
}

impl CallState {
    pub fn is_active(self) -> bool {
        matches!(self, CallState::Active)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => write!(f, "idle"),
            CallState::Active => write!(f, "active"),
        }
    }
}
