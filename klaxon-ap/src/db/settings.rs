//! Settings database access
//!
//! Key/value `settings` table. Level values are clamped on the way in and on
//! the way out, so a hand-edited row can never yield an out-of-range index.

use crate::error::{Error, Result};
use klaxon_common::settings::DEFAULT_FADE_IN_SECONDS;
use klaxon_common::{AlarmSettings, VolumeLevel};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

pub const FADE_IN_SECONDS_KEY: &str = "fade_in_seconds";
pub const ALARM_LEVEL_KEY: &str = "alarm_level";
pub const PREALARM_LEVEL_KEY: &str = "prealarm_level";

/// Load alarm playback settings, writing back defaults for missing keys
pub async fn load_alarm_settings(db: &Pool<Sqlite>) -> Result<AlarmSettings> {
    let defaults = AlarmSettings::default();

    let fade_in_seconds = match get_setting::<u32>(db, FADE_IN_SECONDS_KEY).await? {
        Some(seconds) => seconds,
        None => {
            set_setting(db, FADE_IN_SECONDS_KEY, DEFAULT_FADE_IN_SECONDS).await?;
            DEFAULT_FADE_IN_SECONDS
        }
    };

    let alarm_level = get_level(db, ALARM_LEVEL_KEY, defaults.alarm_level).await?;
    let prealarm_level = get_level(db, PREALARM_LEVEL_KEY, defaults.prealarm_level).await?;

    Ok(AlarmSettings {
        fade_in_seconds,
        alarm_level,
        prealarm_level,
    })
}

/// Persist all alarm playback settings
pub async fn save_alarm_settings(db: &Pool<Sqlite>, settings: &AlarmSettings) -> Result<()> {
    set_setting(db, FADE_IN_SECONDS_KEY, settings.fade_in_seconds).await?;
    set_setting(db, ALARM_LEVEL_KEY, settings.alarm_level.index()).await?;
    set_setting(db, PREALARM_LEVEL_KEY, settings.prealarm_level.index()).await?;
    Ok(())
}

async fn get_level(db: &Pool<Sqlite>, key: &str, default: VolumeLevel) -> Result<VolumeLevel> {
    match get_setting::<i64>(db, key).await? {
        Some(raw) => Ok(VolumeLevel::clamped(raw)),
        None => {
            set_setting(db, key, default.index()).await?;
            Ok(default)
        }
    }
}

/// Generic setting getter
///
/// Returns `None` when the key is missing; unparseable values are an error.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_defaults_written_back() {
        let db = setup_test_db().await;

        let settings = load_alarm_settings(&db).await.unwrap();
        assert_eq!(settings, AlarmSettings::default());

        let stored: Option<u8> = get_setting(&db, PREALARM_LEVEL_KEY).await.unwrap();
        assert_eq!(stored, Some(5));
    }

    #[tokio::test]
    async fn test_out_of_range_levels_clamped() {
        let db = setup_test_db().await;
        set_setting(&db, ALARM_LEVEL_KEY, 11).await.unwrap();
        set_setting(&db, PREALARM_LEVEL_KEY, -1).await.unwrap();

        let settings = load_alarm_settings(&db).await.unwrap();
        assert_eq!(settings.alarm_level.index(), 10);
        assert_eq!(settings.prealarm_level.index(), 0);
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let db = setup_test_db().await;
        let settings = AlarmSettings {
            fade_in_seconds: 12,
            alarm_level: VolumeLevel::clamped(7),
            prealarm_level: VolumeLevel::clamped(3),
        };

        save_alarm_settings(&db, &settings).await.unwrap();
        assert_eq!(load_alarm_settings(&db).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_unparseable_value() {
        let db = setup_test_db().await;
        set_setting(&db, FADE_IN_SECONDS_KEY, "soon").await.unwrap();

        let result = load_alarm_settings(&db).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
