//! Database initialization
//!
//! Creates the player's tables and writes default settings for any key that
//! is missing. Safe to run on every startup.

use crate::error::Result;
use klaxon_common::settings::{DEFAULT_ALARM_LEVEL, DEFAULT_FADE_IN_SECONDS, DEFAULT_PREALARM_LEVEL};
use sqlx::{Pool, Sqlite};
use tracing::info;

use super::settings::{ALARM_LEVEL_KEY, FADE_IN_SECONDS_KEY, PREALARM_LEVEL_KEY};

/// Create tables and default rows
pub async fn init_database(pool: &Pool<Sqlite>) -> Result<()> {
    create_settings_table(pool).await?;
    create_alarms_table(pool).await?;
    init_settings_defaults(pool).await?;
    Ok(())
}

async fn create_settings_table(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Alarm definitions are owned by the scheduler; the player only reads them
async fn create_alarms_table(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alarms (
            id INTEGER PRIMARY KEY,
            source_uri TEXT,
            is_silent INTEGER NOT NULL DEFAULT 0,
            kind TEXT NOT NULL DEFAULT 'normal',
            alternating_track INTEGER NOT NULL DEFAULT 0,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert default values for missing settings
pub async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    let defaults = [
        (FADE_IN_SECONDS_KEY, DEFAULT_FADE_IN_SECONDS.to_string()),
        (ALARM_LEVEL_KEY, DEFAULT_ALARM_LEVEL.to_string()),
        (PREALARM_LEVEL_KEY, DEFAULT_PREALARM_LEVEL.to_string()),
    ];

    for (key, default_value) in defaults {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
                .bind(key)
                .fetch_one(pool)
                .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(&default_value)
                .execute(pool)
                .await?;

            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> Pool<Sqlite> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_writes_defaults() {
        let pool = memory_pool().await;
        init_database(&pool).await.unwrap();

        let fade: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(FADE_IN_SECONDS_KEY)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(fade, "30");

        let alarms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alarms")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(alarms, 0);
    }

    #[tokio::test]
    async fn test_init_keeps_existing_values() {
        let pool = memory_pool().await;
        init_database(&pool).await.unwrap();

        sqlx::query("UPDATE settings SET value = '7' WHERE key = ?")
            .bind(ALARM_LEVEL_KEY)
            .execute(&pool)
            .await
            .unwrap();

        init_database(&pool).await.unwrap();

        let level: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(ALARM_LEVEL_KEY)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(level, "7");
    }
}
