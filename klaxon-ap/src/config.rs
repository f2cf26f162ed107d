//! Bootstrap configuration for klaxon-ap
//!
//! Two tiers:
//! 1. **TOML bootstrap**: database path, port, assets, audio device, logging
//!    (read once at startup)
//! 2. **Database runtime**: fade-in time and volume levels in the `settings`
//!    table, changeable while running
//!
//! Command-line arguments override the TOML file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5750;

/// Database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "klaxon.db";

/// Asset directory name inside the root folder
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// SQLite database path; relative paths resolve against the root folder
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Alarm sound asset directory
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,

    /// Pick a random themed variant for each alarm
    #[serde(default)]
    pub themed_mode: bool,

    /// Initial gain of the alarm output stream (0.0-1.0)
    #[serde(default = "default_stream_gain")]
    pub alarm_stream_gain: f32,

    /// Output device name (default device when absent)
    #[serde(default)]
    pub audio_device: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. `info` or `klaxon_ap=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            port: default_port(),
            assets_dir: None,
            themed_mode: false,
            alarm_stream_gain: default_stream_gain(),
            audio_device: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_stream_gain() -> f32 {
    1.0
}

fn default_log_level() -> String {
    "klaxon_ap=debug,tower_http=debug".to_string()
}

impl TomlConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let config: TomlConfig = klaxon_common::config::load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alarm_stream_gain) {
            return Err(Error::Config(format!(
                "alarm_stream_gain must be within 0.0-1.0, got {}",
                self.alarm_stream_gain
            )));
        }
        Ok(())
    }
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub port: u16,
    pub assets_dir: PathBuf,
    pub themed_mode: bool,
    pub alarm_stream_gain: f32,
    pub audio_device: Option<String>,
}

impl Config {
    /// Resolve paths of a TOML config against `root_folder`
    pub fn resolve(root_folder: PathBuf, toml: TomlConfig) -> Self {
        let database_path = resolve_path(
            &root_folder,
            toml.database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
        );
        let assets_dir = resolve_path(
            &root_folder,
            toml.assets_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
        );

        Self {
            root_folder,
            database_path,
            port: toml.port,
            assets_dir,
            themed_mode: toml.themed_mode,
            alarm_stream_gain: toml.alarm_stream_gain,
            audio_device: toml.audio_device,
        }
    }
}

fn resolve_path(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let config = TomlConfig::load(file.path()).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.alarm_stream_gain, 1.0);
        assert!(!config.themed_mode);
        assert_eq!(config.logging.level, "klaxon_ap=debug,tower_http=debug");
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/var/lib/klaxon/alarms.db"
port = 6000
assets_dir = "sounds"
themed_mode = true
alarm_stream_gain = 0.5
audio_device = "USB Speaker"

[logging]
level = "info"
"#
        )
        .unwrap();

        let toml = TomlConfig::load(file.path()).unwrap();
        let config = Config::resolve(PathBuf::from("/home/me/klaxon"), toml);

        assert_eq!(config.database_path, PathBuf::from("/var/lib/klaxon/alarms.db"));
        assert_eq!(config.assets_dir, PathBuf::from("/home/me/klaxon/sounds"));
        assert_eq!(config.port, 6000);
        assert!(config.themed_mode);
        assert_eq!(config.alarm_stream_gain, 0.5);
        assert_eq!(config.audio_device.as_deref(), Some("USB Speaker"));
    }

    #[test]
    fn test_invalid_stream_gain() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alarm_stream_gain = 2.0").unwrap();

        assert!(matches!(TomlConfig::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_paths_under_root() {
        let config = Config::resolve(PathBuf::from("/srv/klaxon"), TomlConfig::default());
        assert_eq!(config.database_path, PathBuf::from("/srv/klaxon/klaxon.db"));
        assert_eq!(config.assets_dir, PathBuf::from("/srv/klaxon/assets"));
    }
}
