//! Read-only alarm lookup

use crate::error::{Error, Result};
use klaxon_common::{AlarmAlert, AlertId, AlertKind};
use sqlx::{Pool, Row, Sqlite};
use tracing::warn;

/// Fetch one alarm by id
pub async fn get_alarm(db: &Pool<Sqlite>, id: AlertId) -> Result<AlarmAlert> {
    let row = sqlx::query(
        r#"
        SELECT id, source_uri, is_silent, kind, alternating_track
        FROM alarms
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Alarm {} not found", id)))?;

    let kind: String = row.get("kind");
    let kind = match kind.as_str() {
        "normal" => AlertKind::Normal,
        "pre_alarm" => AlertKind::PreAlarm,
        other => {
            warn!("Alarm {} has unknown kind '{}', treating as normal", id, other);
            AlertKind::Normal
        }
    };

    Ok(AlarmAlert {
        id: row.get("id"),
        source_uri: row.get("source_uri"),
        is_silent: row.get::<i64, _>("is_silent") != 0,
        kind,
        alternating_track: row.get::<i64, _>("alternating_track") != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_database(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_alarm() {
        let db = setup_test_db().await;
        sqlx::query(
            "INSERT INTO alarms (id, source_uri, is_silent, kind, alternating_track) VALUES (3, '/a/wake.mp3', 0, 'pre_alarm', 1)",
        )
        .execute(&db)
        .await
        .unwrap();

        let alert = get_alarm(&db, 3).await.unwrap();
        assert_eq!(
            alert,
            AlarmAlert::new(3)
                .with_source("/a/wake.mp3")
                .alternating()
                .firing_as(AlertKind::PreAlarm)
        );
    }

    #[tokio::test]
    async fn test_missing_alarm_is_not_found() {
        let db = setup_test_db().await;
        assert!(matches!(get_alarm(&db, 99).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_silent_alarm_without_source() {
        let db = setup_test_db().await;
        sqlx::query("INSERT INTO alarms (id, is_silent) VALUES (4, 1)")
            .execute(&db)
            .await
            .unwrap();

        let alert = get_alarm(&db, 4).await.unwrap();
        assert!(alert.is_silent);
        assert_eq!(alert.source_uri, None);
        assert_eq!(alert.kind, AlertKind::Normal);
    }
}
