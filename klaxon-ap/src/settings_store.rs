//! Settings store: persisted alarm settings plus change notification

use crate::db::settings::{load_alarm_settings, save_alarm_settings};
use crate::error::Result;
use klaxon_common::{AlarmSettings, VolumeLevel};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use tokio::sync::watch;
use tracing::info;

/// Partial settings change; absent fields keep their value
///
/// Levels are accepted as raw integers and clamped into `0..=10`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub fade_in_seconds: Option<u32>,
    pub alarm_level: Option<i64>,
    pub prealarm_level: Option<i64>,
}

impl SettingsUpdate {
    fn apply_to(&self, settings: &AlarmSettings) -> AlarmSettings {
        AlarmSettings {
            fade_in_seconds: self.fade_in_seconds.unwrap_or(settings.fade_in_seconds),
            alarm_level: self
                .alarm_level
                .map(VolumeLevel::clamped)
                .unwrap_or(settings.alarm_level),
            prealarm_level: self
                .prealarm_level
                .map(VolumeLevel::clamped)
                .unwrap_or(settings.prealarm_level),
        }
    }
}

pub struct SettingsStore {
    db: Pool<Sqlite>,
    tx: watch::Sender<AlarmSettings>,
}

impl SettingsStore {
    /// Load settings from the database (writing defaults where missing)
    pub async fn load(db: Pool<Sqlite>) -> Result<Self> {
        let settings = load_alarm_settings(&db).await?;
        info!(
            "Loaded settings: fade-in {}s, alarm level {}, pre-alarm level {}",
            settings.fade_in_seconds,
            settings.alarm_level,
            settings.prealarm_level
        );
        let (tx, _rx) = watch::channel(settings);
        Ok(Self { db, tx })
    }

    pub fn current(&self) -> AlarmSettings {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlarmSettings> {
        self.tx.subscribe()
    }

    /// Persist a change and notify subscribers
    pub async fn update(&self, update: SettingsUpdate) -> Result<AlarmSettings> {
        let settings = update.apply_to(&self.current());
        save_alarm_settings(&self.db, &settings).await?;
        self.tx.send_replace(settings);
        info!("Settings updated: {:?}", settings);
        Ok(settings)
    }
}
