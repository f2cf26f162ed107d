//! Alarm directory: read-only source of alert snapshots

use crate::db::alarms::get_alarm;
use crate::error::Result;
use async_trait::async_trait;
use klaxon_common::{AlarmAlert, AlertId};
use sqlx::{Pool, Sqlite};

/// Looks up the alert an alarm command refers to
///
/// An unknown id is reported as `Error::NotFound`.
#[async_trait]
pub trait AlarmDirectory: Send + Sync {
    async fn lookup(&self, id: AlertId) -> Result<AlarmAlert>;
}

/// Directory over the sqlite `alarms` table
#[derive(Clone)]
pub struct SqliteAlarmDirectory {
    db: Pool<Sqlite>,
}

impl SqliteAlarmDirectory {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlarmDirectory for SqliteAlarmDirectory {
    async fn lookup(&self, id: AlertId) -> Result<AlarmAlert> {
        get_alarm(&self.db, id).await
    }
}
