//! Bulk sync of queued items, one remote call per direction group.
//!
//! Groups run one after another, never concurrently. A group whose call fails
//! marks its own items failed and the run moves on to the next group; nothing
//! a single group does can abort the run. Transport failures stop at the group.
//! Any other error is also listed in [`BulkSummary::unexpected`] for the caller.

use serde::{Deserialize, Serialize};

use crate::executor::SyncExecutor;
use crate::models::{
    Mapping, NewSyncLog, QueueItem, QueueItemId, SyncDirection, SyncResult, SyncStatus,
    SyncTrigger,
};
use crate::services::{QueueStore, SyncService};
use crate::util::unix_millis_now;

/// Queue items sharing a direction, in selection order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionGroup {
    pub direction: SyncDirection,
    pub items: Vec<QueueItem>,
}

/// Split `items` by direction. Groups appear in order of each direction's
/// first occurrence and keep the input order of their items.
#[must_use]
pub fn partition_by_direction(items: &[QueueItem]) -> Vec<DirectionGroup> {
    let mut groups: Vec<DirectionGroup> = Vec::new();
    for item in items {
        if let Some(group) = groups
            .iter_mut()
            .find(|group| group.direction == item.direction)
        {
            group.items.push(item.clone());
        } else {
            groups.push(DirectionGroup {
                direction: item.direction,
                items: vec![item.clone()],
            });
        }
    }
    groups
}

/// Mapping sent for a queue item.
///
/// The authoritative id follows the item's direction. When it is unknown the
/// natural key stands in so the gateway can resolve the record itself.
#[must_use]
pub fn queue_item_mapping(item: &QueueItem) -> Mapping {
    let (authoritative, counterpart) = match item.direction {
        SyncDirection::SourceToTarget | SyncDirection::Bidirectional => {
            (item.source_id.as_ref(), item.target_id.as_ref())
        }
        SyncDirection::TargetToSource => (item.target_id.as_ref(), item.source_id.as_ref()),
    };
    Mapping::paired(
        authoritative.map_or_else(|| item.natural_key.clone(), Clone::clone),
        counterpart.cloned(),
        Some(item.natural_key.clone()),
    )
}

/// What happened to one direction group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub direction: SyncDirection,
    pub item_ids: Vec<QueueItemId>,
    pub succeeded: usize,
    pub failed: usize,
    /// Service response, when the call completed
    pub result: Option<SyncResult>,
    /// Error message, when the call did not complete
    pub error: Option<String>,
    /// The call failed with something other than a transport error
    #[serde(default)]
    pub unexpected: bool,
    pub started_at: i64,
    pub finished_at: i64,
}

impl GroupOutcome {
    /// History entry for this group's remote call
    #[must_use]
    pub fn sync_log(&self) -> NewSyncLog {
        let (processed, succeeded, failed) = self.result.as_ref().map_or(
            (self.item_ids.len() as u64, 0, self.item_ids.len() as u64),
            |result| {
                (
                    result.items_processed,
                    result.items_succeeded,
                    result.items_failed,
                )
            },
        );
        NewSyncLog {
            trigger: SyncTrigger::Bulk,
            direction: self.direction,
            items_processed: processed,
            items_succeeded: succeeded,
            items_failed: failed,
            error: self.error.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Totals of a bulk run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Items whose status could not be written back
    pub status_write_failures: usize,
    pub groups: Vec<GroupOutcome>,
    /// Non-transport errors raised by group calls, e.g. malformed responses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unexpected: Vec<String>,
}

impl BulkSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs bulk syncs over queue items
pub struct BulkOrchestrator<'a, S, Q> {
    executor: &'a SyncExecutor<S>,
    store: &'a Q,
}

impl<'a, S: SyncService, Q: QueueStore> BulkOrchestrator<'a, S, Q> {
    pub const fn new(executor: &'a SyncExecutor<S>, store: &'a Q) -> Self {
        Self { executor, store }
    }

    /// Sync `selected`, one call per direction group.
    ///
    /// Every item ends with a status and exactly one more `sync_count`, so
    /// `succeeded + failed` always equals `selected.len()`.
    pub async fn run_bulk(&self, selected: &[QueueItem]) -> BulkSummary {
        let groups = partition_by_direction(selected);
        tracing::info!(
            items = selected.len(),
            groups = groups.len(),
            "Starting bulk sync"
        );

        let mut summary = BulkSummary::default();
        for group in groups {
            let outcome = self.run_group(&group, &mut summary.status_write_failures).await;
            summary.succeeded += outcome.succeeded;
            summary.failed += outcome.failed;
            if outcome.unexpected {
                if let Some(error) = &outcome.error {
                    summary
                        .unexpected
                        .push(format!("{}: {error}", outcome.direction));
                }
            }
            summary.groups.push(outcome);
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk sync finished"
        );
        summary
    }

    async fn run_group(
        &self,
        group: &DirectionGroup,
        status_write_failures: &mut usize,
    ) -> GroupOutcome {
        let started_at = unix_millis_now();
        let mappings = group.items.iter().map(queue_item_mapping).collect::<Vec<_>>();

        let call = self.executor.sync_batch(&mappings, group.direction).await;
        let finished_at = unix_millis_now();

        let (result, error, unexpected) = match call {
            Ok(result) => {
                tracing::info!(
                    direction = %group.direction,
                    processed = result.items_processed,
                    failed = result.items_failed,
                    "Direction group synced"
                );
                (Some(result), None, false)
            }
            Err(error) if error.is_transport() => {
                tracing::error!(
                    direction = %group.direction,
                    items = group.items.len(),
                    "Direction group failed: {error}"
                );
                (None, Some(error.to_string()), false)
            }
            Err(error) => {
                tracing::error!(
                    direction = %group.direction,
                    items = group.items.len(),
                    "Direction group hit an unexpected error: {error}"
                );
                (None, Some(error.to_string()), true)
            }
        };

        let mut succeeded = 0;
        let mut failed = 0;
        for (item, mapping) in group.items.iter().zip(&mappings) {
            let status = match &result {
                Some(result)
                    if !result.has_unattributed_failures()
                        && !result.failed_item(&mapping.source_id) =>
                {
                    SyncStatus::Success
                }
                _ => SyncStatus::Failed,
            };
            if status == SyncStatus::Success {
                succeeded += 1;
            } else {
                failed += 1;
            }

            if let Err(write_error) = self
                .store
                .record_attempt(&item.id, status, finished_at)
                .await
            {
                *status_write_failures += 1;
                tracing::error!(
                    item = %item.id,
                    status = %status,
                    "Failed to record sync attempt: {write_error}"
                );
            }
        }

        GroupOutcome {
            direction: group.direction,
            item_ids: group.items.iter().map(|item| item.id).collect(),
            succeeded,
            failed,
            result,
            error,
            unexpected,
            started_at,
            finished_at,
        }
    }
}
