//! User-facing alarm playback settings
//!
//! Only the values live here; storage and change notification belong to the
//! settings store in `klaxon-ap`.

use crate::alert::AlertKind;
use crate::levels::VolumeLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default fade-in time in seconds
pub const DEFAULT_FADE_IN_SECONDS: u32 = 30;

/// Default alarm level index
pub const DEFAULT_ALARM_LEVEL: i64 = 10;

/// Default pre-alarm level index
pub const DEFAULT_PREALARM_LEVEL: i64 = 5;

/// Settings consumed by the volume ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSettings {
    /// Fade-in time for alarms and pre-alarms
    #[serde(default = "default_fade_in_seconds")]
    pub fade_in_seconds: u32,

    /// Level index used in normal alarm mode
    #[serde(default = "default_alarm_level")]
    pub alarm_level: VolumeLevel,

    /// Level index used in pre-alarm mode
    #[serde(default = "default_prealarm_level")]
    pub prealarm_level: VolumeLevel,
}

fn default_fade_in_seconds() -> u32 {
    DEFAULT_FADE_IN_SECONDS
}

fn default_alarm_level() -> VolumeLevel {
    VolumeLevel::clamped(DEFAULT_ALARM_LEVEL)
}

fn default_prealarm_level() -> VolumeLevel {
    VolumeLevel::clamped(DEFAULT_PREALARM_LEVEL)
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            fade_in_seconds: DEFAULT_FADE_IN_SECONDS,
            alarm_level: default_alarm_level(),
            prealarm_level: default_prealarm_level(),
        }
    }
}

impl AlarmSettings {
    /// Configured fade-in time
    pub fn fade_in_duration(&self) -> Duration {
        Duration::from_secs(self.fade_in_seconds as u64)
    }

    /// Level index for the given mode
    pub fn level_for(&self, kind: AlertKind) -> VolumeLevel {
        match kind {
            AlertKind::Normal => self.alarm_level,
            AlertKind::PreAlarm => self.prealarm_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AlarmSettings::default();
        assert_eq!(settings.fade_in_seconds, 30);
        assert_eq!(settings.fade_in_duration(), Duration::from_secs(30));
        assert_eq!(settings.level_for(AlertKind::Normal).index(), 10);
        assert_eq!(settings.level_for(AlertKind::PreAlarm).index(), 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: AlarmSettings = serde_json::from_str(r#"{"alarm_level": 12}"#).unwrap();
        assert_eq!(settings.alarm_level, VolumeLevel::MAX);
        assert_eq!(settings.prealarm_level.index(), 5);
        assert_eq!(settings.fade_in_seconds, 30);
    }
}
