//! Player commands and their outcome codes
//!
//! Hosts deliver commands over whatever transport they use (HTTP in
//! `klaxon-ap`). Transports map their action names through
//! [`Command::from_action`]; anything unrecognized becomes
//! [`Command::Unknown`] so the player can stop cleanly instead of guessing.

use crate::alert::{AlertId, AlertKind};
use std::fmt;

/// Command accepted by the playback controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AlarmFire(AlertId),
    PreAlarmFire(AlertId),
    Dismiss,
    Snooze,
    SoundExpired,
    StartSample(AlertKind),
    StopSample,
    Mute,
    Demute,
    /// Unrecognized or malformed command, carrying the raw action
    Unknown(String),
}

impl Command {
    /// Map a wire action name (plus optional alarm id) onto a command.
    ///
    /// Fire actions without an alarm id are malformed and map to `Unknown`.
    pub fn from_action(action: &str, alert_id: Option<AlertId>) -> Self {
        match (action, alert_id) {
            ("alarm_fire", Some(id)) => Command::AlarmFire(id),
            ("prealarm_fire", Some(id)) => Command::PreAlarmFire(id),
            ("alarm_fire" | "prealarm_fire", None) => {
                Command::Unknown(format!("{} without alert_id", action))
            }
            ("dismiss", _) => Command::Dismiss,
            ("snooze", _) => Command::Snooze,
            ("sound_expired", _) => Command::SoundExpired,
            ("start_alarm_sample", _) => Command::StartSample(AlertKind::Normal),
            ("start_prealarm_sample", _) => Command::StartSample(AlertKind::PreAlarm),
            ("stop_alarm_sample" | "stop_prealarm_sample", _) => Command::StopSample,
            ("mute", _) => Command::Mute,
            ("demute", _) => Command::Demute,
            (other, _) => Command::Unknown(other.to_string()),
        }
    }

    /// Wire action name for this command
    pub fn action(&self) -> &str {
        match self {
            Command::AlarmFire(_) => "alarm_fire",
            Command::PreAlarmFire(_) => "prealarm_fire",
            Command::Dismiss => "dismiss",
            Command::Snooze => "snooze",
            Command::SoundExpired => "sound_expired",
            Command::StartSample(AlertKind::Normal) => "start_alarm_sample",
            Command::StartSample(AlertKind::PreAlarm) => "start_prealarm_sample",
            Command::StopSample => "stop_alarm_sample",
            Command::Mute => "mute",
            Command::Demute => "demute",
            Command::Unknown(raw) => raw,
        }
    }

    /// Outcome reported to the host when the command is handled normally
    pub fn outcome(&self) -> CommandOutcome {
        match self {
            Command::AlarmFire(_)
            | Command::PreAlarmFire(_)
            | Command::StartSample(_)
            | Command::Mute
            | Command::Demute => CommandOutcome::Sticky,
            Command::Dismiss
            | Command::Snooze
            | Command::SoundExpired
            | Command::StopSample
            | Command::Unknown(_) => CommandOutcome::NotSticky,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::AlarmFire(id) | Command::PreAlarmFire(id) => {
                write!(f, "{}({})", self.action(), id)
            }
            Command::Unknown(raw) => write!(f, "unknown({})", raw),
            _ => write!(f, "{}", self.action()),
        }
    }
}

/// Whether the host should keep the player alive after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Playback (or an active alert) continues; keep the process alive
    Sticky,
    /// Nothing left to do; safe to tear down
    NotSticky,
}

impl CommandOutcome {
    pub fn is_sticky(self) -> bool {
        matches!(self, CommandOutcome::Sticky)
    }
}
