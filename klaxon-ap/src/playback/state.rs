//! Playback state and the published status snapshot

use crate::playback::events::SessionId;
use crate::playback::volume::VolumeState;
use chrono::{DateTime, Utc};
use klaxon_common::{AlertKind, CallState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    PlayingNormal,
    PlayingPreAlarm,
    PlayingSample(AlertKind),
}

impl PlaybackState {
    /// State entered when an alarm of `kind` fires
    pub fn for_alarm(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Normal => PlaybackState::PlayingNormal,
            AlertKind::PreAlarm => PlaybackState::PlayingPreAlarm,
        }
    }

    pub fn is_playing(self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::PlayingNormal => write!(f, "playing_normal"),
            PlaybackState::PlayingPreAlarm => write!(f, "playing_pre_alarm"),
            PlaybackState::PlayingSample(kind) => write!(f, "playing_sample({})", kind),
        }
    }
}

/// Snapshot published after every handled event
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub session_id: Option<SessionId>,
    pub gain: f32,
    pub volume: VolumeState,
    pub call_state: CallState,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_alarm() {
        assert_eq!(PlaybackState::for_alarm(AlertKind::Normal), PlaybackState::PlayingNormal);
        assert_eq!(PlaybackState::for_alarm(AlertKind::PreAlarm), PlaybackState::PlayingPreAlarm);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&PlaybackState::Idle).unwrap(), "\"idle\"");
        assert_eq!(
            serde_json::to_string(&PlaybackState::PlayingSample(AlertKind::PreAlarm)).unwrap(),
            "{\"playing_sample\":\"pre_alarm\"}"
        );
        assert_eq!(
            PlaybackState::PlayingSample(AlertKind::Normal).to_string(),
            "playing_sample(normal)"
        );
    }
}
