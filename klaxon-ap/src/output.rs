//! Audio output routing
//!
//! The router tells the player which output stream alarms are bound to and
//! how loud that stream currently is. A stream gain of zero (e.g. the alarm
//! stream muted by the user) means alarms must not be force-played at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;

/// Output stream a session is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Alarm,
    Media,
    Notification,
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Alarm => write!(f, "alarm"),
            StreamType::Media => write!(f, "media"),
            StreamType::Notification => write!(f, "notification"),
        }
    }
}

/// Access to the host's output stream state
pub trait AudioOutputRouter: Send + Sync {
    /// Overall gain of the bound stream (0.0-1.0)
    fn stream_gain(&self) -> f32;

    /// Stream type sessions should bind to
    fn stream_type(&self) -> StreamType;
}

/// Router backed by configuration, adjustable at runtime through the API
#[derive(Debug)]
pub struct ConfiguredOutputRouter {
    /// f32 bits of the stream gain
    gain_bits: AtomicU32,
    stream_type: StreamType,
}

impl ConfiguredOutputRouter {
    pub fn new(stream_type: StreamType, gain: f32) -> Self {
        Self {
            gain_bits: AtomicU32::new(gain.clamp(0.0, 1.0).to_bits()),
            stream_type,
        }
    }

    /// Set stream gain (clamped to 0.0-1.0)
    pub fn set_stream_gain(&self, gain: f32) {
        let clamped = gain.clamp(0.0, 1.0);
        info!("{} stream gain set to {:.2}", self.stream_type, clamped);
        self.gain_bits.store(clamped.to_bits(), Ordering::Relaxed);
    }
}

impl AudioOutputRouter for ConfiguredOutputRouter {
    fn stream_gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }

    fn stream_type(&self) -> StreamType {
        self.stream_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_clamped() {
        let router = ConfiguredOutputRouter::new(StreamType::Alarm, 1.5);
        assert_eq!(router.stream_gain(), 1.0);

        router.set_stream_gain(-0.5);
        assert_eq!(router.stream_gain(), 0.0);

        router.set_stream_gain(0.3);
        assert_eq!(router.stream_gain(), 0.3);
    }

    #[test]
    fn test_stream_type() {
        let router = ConfiguredOutputRouter::new(StreamType::Alarm, 1.0);
        assert_eq!(router.stream_type(), StreamType::Alarm);
        assert_eq!(router.stream_type().to_string(), "alarm");
    }
}
