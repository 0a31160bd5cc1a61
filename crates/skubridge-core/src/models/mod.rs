//! Data models for skubridge

mod direction;
mod mapping;
mod queue_item;
mod record;
mod sync_log;
mod sync_result;

pub use direction::{SyncDirection, SyncMode};
pub use mapping::{FieldConflict, Mapping, MappingAction};
pub use queue_item::{NewQueueItem, QueueFilter, QueueItem, QueueItemId, SyncStatus};
pub use record::{Platform, Record, RecordKey, RecordPatch};
pub use sync_log::{NewSyncLog, SyncLog, SyncTrigger};
pub use sync_result::{SyncItemError, SyncRequest, SyncResult};
