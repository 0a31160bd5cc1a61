//! Sync log repository implementation

use crate::error::{Error, Result};
use crate::models::{NewSyncLog, SyncDirection, SyncLog, SyncTrigger};
use crate::services::SyncLogStore;
use libsql::params::Params;
use libsql::{Connection, Row, Value};

/// libSQL implementation of [`SyncLogStore`]
pub struct LibSqlSyncLogRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncLogRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_log(row: &Row) -> Result<SyncLog> {
        let trigger: String = row.get(1)?;
        let direction: String = row.get(2)?;

        Ok(SyncLog {
            id: row.get(0)?,
            trigger: trigger.parse::<SyncTrigger>().map_err(Error::Database)?,
            direction: direction
                .parse::<SyncDirection>()
                .map_err(Error::Database)?,
            items_processed: stored_count(row.get(3)?)?,
            items_succeeded: stored_count(row.get(4)?)?,
            items_failed: stored_count(row.get(5)?)?,
            error: row.get::<Option<String>>(6)?,
            started_at: row.get(7)?,
            finished_at: row.get(8)?,
        })
    }
}

// SQLite stores counters as i64
fn count_value(field: &str, count: u64) -> Result<Value> {
    i64::try_from(count)
        .map(Value::Integer)
        .map_err(|_| Error::InvalidInput(format!("{field} out of range: {count}")))
}

fn stored_count(count: i64) -> Result<u64> {
    u64::try_from(count).map_err(|_| Error::Database(format!("invalid item count {count}")))
}

impl SyncLogStore for LibSqlSyncLogRepository<'_> {
    async fn append(&self, entry: &NewSyncLog) -> Result<SyncLog> {
        self.conn
            .execute(
                "INSERT INTO sync_logs (trigger, direction, items_processed, items_succeeded,
                    items_failed, error, started_at, finished_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                Params::Positional(vec![
                    Value::Text(entry.trigger.as_str().to_string()),
                    Value::Text(entry.direction.as_str().to_string()),
                    count_value("items_processed", entry.items_processed)?,
                    count_value("items_succeeded", entry.items_succeeded)?,
                    count_value("items_failed", entry.items_failed)?,
                    entry
                        .error
                        .clone()
                        .map_or(Value::Null, Value::Text),
                    Value::Integer(entry.started_at),
                    Value::Integer(entry.finished_at),
                ]),
            )
            .await?;

        Ok(SyncLog {
            id: self.conn.last_insert_rowid(),
            trigger: entry.trigger,
            direction: entry.direction,
            items_processed: entry.items_processed,
            items_succeeded: entry.items_succeeded,
            items_failed: entry.items_failed,
            error: entry.error.clone(),
            started_at: entry.started_at,
            finished_at: entry.finished_at,
        })
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<SyncLog>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, trigger, direction, items_processed, items_succeeded, items_failed,
                        error, started_at, finished_at
                 FROM sync_logs
                 ORDER BY started_at DESC, id DESC
                 LIMIT ?",
                [i64::try_from(limit).unwrap_or(i64::MAX)],
            )
            .await?;

        let mut logs = Vec::new();
        while let Some(row) = rows.next().await? {
            logs.push(Self::row_to_log(&row)?);
        }
        Ok(logs)
    }
}
