//! Single-item and batch sends to the sync service.

use crate::error::{Error, Result};
use crate::models::{Mapping, Record, RecordKey, SyncDirection, SyncRequest, SyncResult};
use crate::services::SyncService;
use crate::staging::StagingStore;

/// Sends mappings to a [`SyncService`] and settles the staging overlay.
///
/// The executor never retries. A failed call is returned to the caller as is,
/// and staged edits stay in place so the same call can be made again.
pub struct SyncExecutor<S> {
    service: S,
    staging: StagingStore,
}

impl<S: SyncService> SyncExecutor<S> {
    pub const fn new(service: S, staging: StagingStore) -> Self {
        Self { service, staging }
    }

    pub const fn staging(&self) -> &StagingStore {
        &self.staging
    }

    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Sync one record. The staged value of `record` is sent when there is
    /// one; the staged entry is dropped only if no item failed.
    pub async fn sync_one(
        &self,
        mapping: &Mapping,
        record: &Record,
        direction: SyncDirection,
    ) -> Result<SyncResult> {
        if mapping.source_id != record.id {
            return Err(Error::InvalidInput(format!(
                "mapping for '{}' does not belong to record '{}'",
                mapping.source_id, record.id
            )));
        }
        if mapping.is_skipped() {
            tracing::debug!(record = %record.key(), "Mapping is skipped; nothing to send");
            return Ok(SyncResult::empty());
        }

        let request = SyncRequest {
            direction,
            mappings: vec![mapping.clone()],
            record: Some(self.staging.effective(record)),
            records: Vec::new(),
        };
        let result = self.send(&request).await?;

        if result.is_complete_success() {
            if self.staging.unstage(&record.key()).is_some() {
                tracing::debug!(record = %record.key(), "Cleared staged changes after sync");
            }
        } else {
            tracing::warn!(
                record = %record.key(),
                failed = result.items_failed,
                "Sync reported failures; staged changes kept for retry"
            );
        }

        Ok(result)
    }

    /// Sync a batch of mappings in one call. Skipped mappings are not sent, and
    /// no call is made when nothing is left.
    ///
    /// Staged records of the authoritative platform travel with the request as
    /// their effective values. Only those entries are cleared afterwards.
    pub async fn sync_batch(
        &self,
        mappings: &[Mapping],
        direction: SyncDirection,
    ) -> Result<SyncResult> {
        let outgoing = mappings
            .iter()
            .filter(|mapping| !mapping.is_skipped())
            .cloned()
            .collect::<Vec<_>>();
        if outgoing.is_empty() {
            return Ok(SyncResult::empty());
        }

        let platform = direction.authoritative_platform();
        let records = outgoing
            .iter()
            .filter_map(|mapping| {
                self.staging
                    .get(&RecordKey::new(platform, mapping.source_id.clone()))
                    .map(|staged| staged.effective())
            })
            .collect::<Vec<_>>();

        let request = SyncRequest {
            direction,
            mappings: outgoing,
            record: None,
            records,
        };
        let result = self.send(&request).await?;
        self.clear_synced(&request.records, &result);
        Ok(result)
    }

    async fn send(&self, request: &SyncRequest) -> Result<SyncResult> {
        tracing::debug!(
            direction = %request.direction,
            mappings = request.mappings.len(),
            "Sending sync request"
        );
        let result = self.service.sync(request).await.inspect_err(|error| {
            tracing::warn!(direction = %request.direction, "Sync call failed: {error}");
        })?;
        result.validate().map_err(Error::MalformedResponse)?;
        Ok(result)
    }

    fn clear_synced(&self, sent: &[Record], result: &SyncResult) {
        if result.has_unattributed_failures() {
            tracing::warn!(
                failed = result.items_failed,
                "Batch failures are not attributed to items; staged changes kept"
            );
            return;
        }

        for record in sent {
            if result.failed_item(&record.id) {
                continue;
            }
            let key = record.key();
            // An entry restaged while the call was in flight holds edits that were not sent.
            let unchanged = self
                .staging
                .get(&key)
                .is_some_and(|staged| staged.effective() == *record);
            if unchanged {
                self.staging.unstage(&key);
                tracing::debug!(record = %key, "Cleared staged changes after sync");
            }
        }
    }
}
