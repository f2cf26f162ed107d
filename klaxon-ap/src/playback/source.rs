//! Playable audio sources

use std::fmt;
use std::path::PathBuf;

/// A concrete source a media engine can open
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Local audio file
    File(PathBuf),

    /// Non-file URI (e.g. a content or network URI) handed through from an alert
    Uri(String),

    /// Synthesized tone; needs no file and therefore cannot go missing
    Tone(ToneSpec),
}

impl AudioSource {
    /// Interpret an alert's source URI
    ///
    /// `file://` URIs and bare paths become [`AudioSource::File`]; any other
    /// scheme is kept as [`AudioSource::Uri`] for the engine to accept or reject.
    pub fn from_uri(uri: &str) -> Self {
        if let Some(path) = uri.strip_prefix("file://") {
            AudioSource::File(PathBuf::from(path))
        } else if uri.contains("://") {
            AudioSource::Uri(uri.to_string())
        } else {
            AudioSource::File(PathBuf::from(uri))
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::File(path) => write!(f, "file:{}", path.display()),
            AudioSource::Uri(uri) => write!(f, "{}", uri),
            AudioSource::Tone(tone) => write!(f, "tone:{}Hz", tone.frequency_hz),
        }
    }
}

/// Beep pattern for synthesized tones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub beep_ms: u32,
    pub gap_ms: u32,
    pub repeats: u32,
}

impl ToneSpec {
    /// Built-in fallback ring used when nothing else can be played
    pub const FALLBACK: ToneSpec = ToneSpec {
        frequency_hz: 880.0,
        beep_ms: 400,
        gap_ms: 200,
        repeats: 10,
    };

    /// Short, soft double beep used while a call is in progress
    pub const IN_CALL: ToneSpec = ToneSpec {
        frequency_hz: 660.0,
        beep_ms: 150,
        gap_ms: 150,
        repeats: 2,
    };

    /// Intro jingle for alternating-track alerts
    pub const INTRO: ToneSpec = ToneSpec {
        frequency_hz: 523.25,
        beep_ms: 250,
        gap_ms: 50,
        repeats: 3,
    };

    /// Default alert when no alert sound is configured
    pub const DEFAULT_ALERT: ToneSpec = ToneSpec {
        frequency_hz: 988.0,
        beep_ms: 500,
        gap_ms: 250,
        repeats: 8,
    };

    /// Total length of the pattern in milliseconds
    pub fn duration_ms(&self) -> u32 {
        (self.beep_ms + self.gap_ms) * self.repeats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri_file_scheme() {
        assert_eq!(
            AudioSource::from_uri("file:///home/me/wake.ogg"),
            AudioSource::File(PathBuf::from("/home/me/wake.ogg"))
        );
    }

    #[test]
    fn test_from_uri_bare_path() {
        assert_eq!(
            AudioSource::from_uri("sounds/wake.mp3"),
            AudioSource::File(PathBuf::from("sounds/wake.mp3"))
        );
    }

    #[test]
    fn test_from_uri_other_scheme() {
        assert_eq!(
            AudioSource::from_uri("content://media/alarm/3"),
            AudioSource::Uri("content://media/alarm/3".to_string())
        );
    }

    #[test]
    fn test_tone_duration() {
        assert_eq!(ToneSpec::FALLBACK.duration_ms(), 6000);
        assert_eq!(ToneSpec::IN_CALL.duration_ms(), 600);
    }
}
