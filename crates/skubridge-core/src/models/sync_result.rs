//! Request and response shapes exchanged with the sync service

use serde::{Deserialize, Serialize};

use super::{Mapping, Record, SyncDirection};

/// One item the sync service reported as failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItemError {
    pub item_id: String,
    pub message: String,
}

/// Outcome counts of one sync call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub items_processed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    #[serde(default)]
    pub errors: Vec<SyncItemError>,
}

impl SyncResult {
    /// Result of a call that had nothing to send
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_complete_success(&self) -> bool {
        self.items_failed == 0
    }

    /// Whether items failed without any of them being named in `errors`.
    /// Such a response cannot be attributed to individual items.
    #[must_use]
    pub fn has_unattributed_failures(&self) -> bool {
        self.items_failed > 0 && self.errors.is_empty()
    }

    /// Whether `item_id` is named in the error list
    #[must_use]
    pub fn failed_item(&self, item_id: &str) -> bool {
        self.errors.iter().any(|error| error.item_id == item_id)
    }

    /// Check the counts are internally consistent
    pub fn validate(&self) -> Result<(), String> {
        let settled = self.items_succeeded.saturating_add(self.items_failed);
        if settled > self.items_processed {
            return Err(format!(
                "succeeded ({}) + failed ({}) exceeds processed ({})",
                self.items_succeeded, self.items_failed, self.items_processed
            ));
        }
        Ok(())
    }

}

/// Payload sent to the sync service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub mappings: Vec<Mapping>,
    /// Effective record value for single-item syncs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    /// Effective values of staged records in a batch, keyed by their ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Record>,
}
