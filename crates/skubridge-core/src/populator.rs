//! Fill the sync queue from a saved search pattern.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{NewQueueItem, Platform, Record, SyncDirection, SyncMode};
use crate::services::{PatternLookup, QueueStore};

/// Counts of a populate run. They always add up to the number of records the
/// pattern expanded to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateSummary {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

impl PopulateSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated + self.failed
    }
}

/// Expands patterns through a [`PatternLookup`] and upserts the results into
/// a [`QueueStore`].
pub struct PatternPopulator<'a, L, Q> {
    lookup: &'a L,
    store: &'a Q,
    direction: SyncDirection,
    mode: SyncMode,
}

impl<'a, L: PatternLookup, Q: QueueStore> PatternPopulator<'a, L, Q> {
    /// New populator queueing items `SourceToTarget` in `Delta` mode
    pub const fn new(lookup: &'a L, store: &'a Q) -> Self {
        Self {
            lookup,
            store,
            direction: SyncDirection::SourceToTarget,
            mode: SyncMode::Delta,
        }
    }

    /// Direction and mode given to queued items
    #[must_use]
    pub const fn with_defaults(mut self, direction: SyncDirection, mode: SyncMode) -> Self {
        self.direction = direction;
        self.mode = mode;
        self
    }

    /// Expand `pattern_id` and queue every resulting record.
    ///
    /// With `clear_existing` the whole queue is emptied first; otherwise records
    /// are merged by natural key and direction. The lookup happens before
    /// anything is cleared, so a failed lookup leaves the queue as it was. A
    /// record that cannot be queued is counted as failed and skipped.
    pub async fn populate(
        &self,
        pattern_id: &str,
        clear_existing: bool,
    ) -> Result<PopulateSummary> {
        let pattern_id = pattern_id.trim();
        if pattern_id.is_empty() {
            return Err(Error::InvalidInput("pattern id must not be empty".to_string()));
        }

        let records = self.lookup.expand(pattern_id).await?;
        tracing::info!(
            pattern = pattern_id,
            records = records.len(),
            clear_existing,
            "Expanded sync pattern"
        );

        if clear_existing {
            let removed = self.store.clear().await?;
            tracing::info!(removed, "Cleared sync queue before populating");
        }

        let mut summary = PopulateSummary::default();
        for record in &records {
            match self.upsert(record).await {
                Ok(Upserted::Inserted) => summary.inserted += 1,
                Ok(Upserted::Updated) => summary.updated += 1,
                Err(error) => {
                    summary.failed += 1;
                    tracing::warn!(record = %record.key(), "Failed to queue record: {error}");
                }
            }
        }

        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            failed = summary.failed,
            "Populated sync queue"
        );
        Ok(summary)
    }

    async fn upsert(&self, record: &Record) -> Result<Upserted> {
        let natural_key = record.match_key().ok_or_else(|| {
            Error::InvalidInput(format!("record {} has no natural key", record.key()))
        })?;

        if let Some(mut existing) = self.store.find_by_key(natural_key, self.direction).await? {
            match record.platform {
                Platform::Erp => existing.source_id = Some(record.id.clone()),
                Platform::Storefront => existing.target_id = Some(record.id.clone()),
            }
            existing.mode = self.mode;
            self.store.update(&existing).await?;
            return Ok(Upserted::Updated);
        }

        let item = NewQueueItem::new(natural_key, self.direction).with_mode(self.mode);
        let item = match record.platform {
            Platform::Erp => item.with_source_id(record.id.clone()),
            Platform::Storefront => item.with_target_id(record.id.clone()),
        };
        self.store.insert(&item).await?;
        Ok(Upserted::Inserted)
    }
}

enum Upserted {
    Inserted,
    Updated,
}
