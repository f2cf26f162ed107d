//! Discrete alarm volume levels
//!
//! Alarm and pre-alarm volumes are configured as an index into an 11-entry
//! table following the quadratic curve `gain = i² / 10²`. The quadratic shape
//! matches the perceived loudness of the exponential fade-in: low indices stay
//! gentle, the top few indices are where most of the headroom lives.
//!
//! Out-of-range indices coming from settings are clamped, never rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Highest level index (full gain)
pub const MAX_LEVEL: u8 = 10;

/// Number of entries in the level table
pub const LEVEL_COUNT: usize = MAX_LEVEL as usize + 1;

/// Gain for each level index: `i² / 10²`
pub const LEVEL_GAINS: [f32; LEVEL_COUNT] = [
    0.0, 0.01, 0.04, 0.09, 0.16, 0.25, 0.36, 0.49, 0.64, 0.81, 1.0,
];

/// A volume level index in `0..=10`
///
/// Deserializing accepts any integer and clamps it, so a hand-edited settings
/// value can never produce an out-of-range index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    /// Silent level
    pub const MIN: VolumeLevel = VolumeLevel(0);

    /// Full gain level
    pub const MAX: VolumeLevel = VolumeLevel(MAX_LEVEL);

    /// Build a level from a raw settings value, clamping into `0..=10`.
    ///
    /// Values above the table are truncated to the top level and values below
    /// zero to silence; both cases log a warning.
    pub fn clamped(raw: i64) -> Self {
        if raw > MAX_LEVEL as i64 {
            warn!("Truncated volume level {} to {}", raw, MAX_LEVEL);
            VolumeLevel(MAX_LEVEL)
        } else if raw < 0 {
            warn!("Negative volume level {} clamped to 0", raw);
            VolumeLevel(0)
        } else {
            VolumeLevel(raw as u8)
        }
    }

    /// Index into the level table
    pub fn index(self) -> u8 {
        self.0
    }

    /// Gain (0.0-1.0) for this level
    pub fn gain(self) -> f32 {
        LEVEL_GAINS[self.0 as usize]
    }
}

impl From<i64> for VolumeLevel {
    fn from(raw: i64) -> Self {
        VolumeLevel::clamped(raw)
    }
}

impl From<VolumeLevel> for u8 {
    fn from(level: VolumeLevel) -> Self {
        level.0
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_follows_quadratic_curve() {
        for (i, gain) in LEVEL_GAINS.iter().enumerate() {
            let expected = (i * i) as f32 / 100.0;
            assert!(
                (gain - expected).abs() < 1e-6,
                "level {} should be {}, got {}",
                i,
                expected,
                gain
            );
        }
    }

    #[test]
    fn test_table_is_monotonic() {
        for pair in LEVEL_GAINS.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_clamp_above_max() {
        assert_eq!(VolumeLevel::clamped(11), VolumeLevel::MAX);
        assert_eq!(VolumeLevel::clamped(i64::MAX).index(), 10);
    }

    #[test]
    fn test_clamp_negative() {
        assert_eq!(VolumeLevel::clamped(-1), VolumeLevel::MIN);
        assert_eq!(VolumeLevel::clamped(-1).gain(), 0.0);
    }

    #[test]
    fn test_in_range_unchanged() {
        assert_eq!(VolumeLevel::clamped(4).index(), 4);
        assert_eq!(VolumeLevel::clamped(4).gain(), 0.16);
        assert_eq!(VolumeLevel::MAX.gain(), 1.0);
    }

    #[test]
    fn test_deserialize_clamps() {
        let level: VolumeLevel = serde_json::from_str("42").unwrap();
        assert_eq!(level, VolumeLevel::MAX);

        let level: VolumeLevel = serde_json::from_str("-3").unwrap();
        assert_eq!(level, VolumeLevel::MIN);

        assert_eq!(serde_json::to_string(&VolumeLevel::clamped(7)).unwrap(), "7");
    }
}
