//! Sync queue repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::{
    NewQueueItem, QueueFilter, QueueItem, QueueItemId, SyncDirection, SyncMode, SyncStatus,
};
use crate::services::QueueStore;
use crate::util::unix_millis_now;
use libsql::params::Params;
use libsql::{Connection, Row, Value};

const SELECT_COLUMNS: &str = "SELECT id, natural_key, source_id, target_id, direction, mode,
        last_synced_at, last_sync_status, sync_count, created_at, updated_at
    FROM queue_items";

/// libSQL implementation of [`QueueStore`]
pub struct LibSqlQueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlQueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a queue item from a database row
    fn row_to_item(row: &Row) -> Result<QueueItem> {
        let id: String = row.get(0)?;
        let direction: String = row.get(4)?;
        let mode: String = row.get(5)?;
        let status: String = row.get(7)?;
        let sync_count: i64 = row.get(8)?;

        Ok(QueueItem {
            id: id
                .parse()
                .map_err(|e| Error::Database(format!("invalid queue item id '{id}': {e}")))?,
            natural_key: row.get(1)?,
            source_id: row.get::<Option<String>>(2)?,
            target_id: row.get::<Option<String>>(3)?,
            direction: direction
                .parse::<SyncDirection>()
                .map_err(Error::Database)?,
            mode: mode.parse::<SyncMode>().map_err(Error::Database)?,
            last_synced_at: row.get::<Option<i64>>(6)?,
            last_sync_status: status.parse::<SyncStatus>().map_err(Error::Database)?,
            sync_count: u32::try_from(sync_count)
                .map_err(|_| Error::Database(format!("invalid sync count {sync_count}")))?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    async fn query_items(&self, sql: &str, params: Params) -> Result<Vec<QueueItem>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_item(&row)?);
        }
        Ok(items)
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

impl QueueStore for LibSqlQueueRepository<'_> {
    async fn insert(&self, item: &NewQueueItem) -> Result<QueueItem> {
        let natural_key = item.natural_key.trim();
        if natural_key.is_empty() {
            return Err(Error::InvalidInput(
                "queue item natural key must not be empty".to_string(),
            ));
        }

        let now = unix_millis_now();
        let queued = QueueItem {
            id: QueueItemId::new(),
            natural_key: natural_key.to_string(),
            source_id: item.source_id.clone(),
            target_id: item.target_id.clone(),
            direction: item.direction,
            mode: item.mode,
            last_synced_at: None,
            last_sync_status: SyncStatus::Pending,
            sync_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO queue_items (id, natural_key, source_id, target_id, direction, mode,
                    last_synced_at, last_sync_status, sync_count, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, NULL, ?, 0, ?, ?)",
                Params::Positional(vec![
                    Value::Text(queued.id.as_str()),
                    Value::Text(queued.natural_key.clone()),
                    optional_text(queued.source_id.as_deref()),
                    optional_text(queued.target_id.as_deref()),
                    Value::Text(queued.direction.as_str().to_string()),
                    Value::Text(queued.mode.as_str().to_string()),
                    Value::Text(queued.last_sync_status.as_str().to_string()),
                    Value::Integer(now),
                    Value::Integer(now),
                ]),
            )
            .await?;

        tracing::debug!(item = %queued.id, key = %queued.natural_key, "Queued item");
        Ok(queued)
    }

    async fn update(&self, item: &QueueItem) -> Result<()> {
        let affected = self
            .conn
            .execute(
                "UPDATE queue_items
                 SET natural_key = ?, source_id = ?, target_id = ?, direction = ?, mode = ?,
                     updated_at = ?
                 WHERE id = ?",
                Params::Positional(vec![
                    Value::Text(item.natural_key.clone()),
                    optional_text(item.source_id.as_deref()),
                    optional_text(item.target_id.as_deref()),
                    Value::Text(item.direction.as_str().to_string()),
                    Value::Text(item.mode.as_str().to_string()),
                    Value::Integer(unix_millis_now()),
                    Value::Text(item.id.as_str()),
                ]),
            )
            .await?;

        if affected == 0 {
            return Err(Error::NotFound(format!("queue item {}", item.id)));
        }
        Ok(())
    }

    async fn get(&self, id: &QueueItemId) -> Result<Option<QueueItem>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let mut items = self
            .query_items(&sql, Params::Positional(vec![Value::Text(id.as_str())]))
            .await?;
        Ok(items.pop())
    }

    async fn find_by_key(
        &self,
        natural_key: &str,
        direction: SyncDirection,
    ) -> Result<Option<QueueItem>> {
        let sql = format!("{SELECT_COLUMNS} WHERE natural_key = ? AND direction = ?");
        let mut items = self
            .query_items(
                &sql,
                Params::Positional(vec![
                    Value::Text(natural_key.trim().to_string()),
                    Value::Text(direction.as_str().to_string()),
                ]),
            )
            .await?;
        Ok(items.pop())
    }

    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueItem>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(direction) = filter.direction {
            clauses.push("direction = ?");
            values.push(Value::Text(direction.as_str().to_string()));
        }
        if let Some(status) = filter.status {
            clauses.push("last_sync_status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(prefix) = filter
            .natural_key_prefix
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
        {
            clauses.push("substr(natural_key, 1, length(?)) = ?");
            values.push(Value::Text(prefix.to_string()));
            values.push(Value::Text(prefix.to_string()));
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        // rowid breaks ties between items created in the same millisecond
        sql.push_str(" ORDER BY created_at ASC, rowid ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        self.query_items(&sql, Params::Positional(values)).await
    }

    async fn delete(&self, id: &QueueItemId) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM queue_items WHERE id = ?", [id.as_str()])
            .await?;

        if affected == 0 {
            return Err(Error::NotFound(format!("queue item {id}")));
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[QueueItemId]) -> Result<usize> {
        let mut removed = 0;
        for id in ids {
            let affected = self
                .conn
                .execute("DELETE FROM queue_items WHERE id = ?", [id.as_str()])
                .await?;
            removed += usize::try_from(affected).unwrap_or(usize::MAX);
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM queue_items", ()).await?;
        Ok(usize::try_from(affected).unwrap_or(usize::MAX))
    }

    async fn record_attempt(
        &self,
        id: &QueueItemId,
        status: SyncStatus,
        synced_at: i64,
    ) -> Result<QueueItem> {
        let affected = self
            .conn
            .execute(
                "UPDATE queue_items
                 SET last_sync_status = ?, last_synced_at = ?, sync_count = sync_count + 1,
                     updated_at = ?
                 WHERE id = ?",
                Params::Positional(vec![
                    Value::Text(status.as_str().to_string()),
                    Value::Integer(synced_at),
                    Value::Integer(unix_millis_now()),
                    Value::Text(id.as_str()),
                ]),
            )
            .await?;

        if affected == 0 {
            return Err(Error::NotFound(format!("queue item {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("queue item {id}")))
    }
}
