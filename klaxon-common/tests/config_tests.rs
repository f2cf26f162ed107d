//! Tests for bootstrap configuration and root folder resolution
//!
//! Tests touching KLAXON_ROOT_FOLDER are marked #[serial] so they never race
//! on the process environment.

use klaxon_common::config::{default_root_folder, load_toml, resolve_root_folder};
use klaxon_common::AlarmSettings;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

const TEST_ENV: &str = "KLAXON_TEST_ROOT_FOLDER";

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(TEST_ENV, "/from/env");
    let config = write_config("root_folder = \"/from/toml\"\n");

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), TEST_ENV, Some(config.path()));
    assert_eq!(resolved, PathBuf::from("/from/cli"));

    env::remove_var(TEST_ENV);
}

#[test]
#[serial]
fn test_env_beats_config_file() {
    env::set_var(TEST_ENV, "/from/env");
    let config = write_config("root_folder = \"/from/toml\"\n");

    let resolved = resolve_root_folder(None, TEST_ENV, Some(config.path()));
    assert_eq!(resolved, PathBuf::from("/from/env"));

    env::remove_var(TEST_ENV);
}

#[test]
#[serial]
fn test_config_file_used_without_env() {
    env::remove_var(TEST_ENV);
    let config = write_config("root_folder = \"/from/toml\"\n");

    let resolved = resolve_root_folder(None, TEST_ENV, Some(config.path()));
    assert_eq!(resolved, PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_missing_config_falls_back_to_default() {
    env::remove_var(TEST_ENV);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let resolved = resolve_root_folder(None, TEST_ENV, Some(&missing));
    assert_eq!(resolved, default_root_folder());
}

#[test]
fn test_default_root_folder_is_not_empty() {
    assert!(!default_root_folder().as_os_str().is_empty());
}

#[test]
fn test_load_toml_settings() {
    let config = write_config("fade_in_seconds = 12\nalarm_level = 15\n");

    let settings: AlarmSettings = load_toml(config.path()).unwrap();
    assert_eq!(settings.fade_in_seconds, 12);
    assert_eq!(settings.alarm_level.index(), 10);
    assert_eq!(settings.prealarm_level.index(), 5);
}

#[test]
fn test_load_toml_invalid_file() {
    let config = write_config("fade_in_seconds = [not toml");
    assert!(load_toml::<AlarmSettings>(config.path()).is_err());
}
