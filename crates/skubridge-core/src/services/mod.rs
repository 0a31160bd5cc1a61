//! Collaborator contracts consumed by the orchestration core.
//!
//! The core never talks to a platform, the gateway, or storage directly; it is
//! generic over these traits. `crate::remote` provides HTTP implementations,
//! `crate::db` the libSQL-backed stores.

use crate::error::Result;
use crate::models::{
    NewQueueItem, NewSyncLog, Platform, QueueFilter, QueueItem, QueueItemId, Record, SyncDirection,
    SyncLog, SyncRequest, SyncResult, SyncStatus,
};

/// Free-form filter forwarded to the record source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Search text, interpreted by the remote side
    pub query: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            limit: None,
        }
    }

    /// Search text with surrounding whitespace removed; `None` when blank
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Fetches records for one platform
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    /// Records of `platform` matching `filter`; each carries at least id, natural key and platform
    async fn fetch_records(&self, platform: Platform, filter: &RecordFilter)
        -> Result<Vec<Record>>;
}

/// Applies mappings on the remote platforms
#[allow(async_fn_in_trait)]
pub trait SyncService {
    /// Apply `request.mappings` in `request.direction`.
    ///
    /// An `Err` means the call itself did not complete. Per-item failures of a
    /// completed call are reported inside the `SyncResult`.
    async fn sync(&self, request: &SyncRequest) -> Result<SyncResult>;
}

/// Expands a saved filter pattern into concrete records
#[allow(async_fn_in_trait)]
pub trait PatternLookup {
    async fn expand(&self, pattern_id: &str) -> Result<Vec<Record>>;
}

/// Storage for queue items. `(natural_key, direction)` is unique.
#[allow(async_fn_in_trait)]
pub trait QueueStore {
    /// Insert a new item; fails if `(natural_key, direction)` already exists
    async fn insert(&self, item: &NewQueueItem) -> Result<QueueItem>;

    /// Overwrite an existing item's identity, direction and mode. Attempt
    /// bookkeeping is left to [`QueueStore::record_attempt`].
    async fn update(&self, item: &QueueItem) -> Result<()>;

    /// Get an item by id
    async fn get(&self, id: &QueueItemId) -> Result<Option<QueueItem>>;

    /// Look an item up by its unique key
    async fn find_by_key(
        &self,
        natural_key: &str,
        direction: SyncDirection,
    ) -> Result<Option<QueueItem>>;

    /// List items in creation order
    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueItem>>;

    /// Delete one item
    async fn delete(&self, id: &QueueItemId) -> Result<()>;

    /// Delete several items, returning how many existed
    async fn delete_many(&self, ids: &[QueueItemId]) -> Result<usize>;

    /// Delete every item, returning how many existed
    async fn clear(&self) -> Result<usize>;

    /// Record one completed sync attempt: sets status and timestamp and
    /// increments `sync_count` by exactly one
    async fn record_attempt(
        &self,
        id: &QueueItemId,
        status: SyncStatus,
        synced_at: i64,
    ) -> Result<QueueItem>;
}

/// Append-only history of remote sync calls
#[allow(async_fn_in_trait)]
pub trait SyncLogStore {
    async fn append(&self, entry: &NewSyncLog) -> Result<SyncLog>;

    /// Most recent entries first
    async fn list_recent(&self, limit: usize) -> Result<Vec<SyncLog>>;
}
