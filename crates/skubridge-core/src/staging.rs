//! In-memory overlay of pending record edits.
//!
//! A `StagingStore` is a cheap-to-clone handle; clones share the same entries.
//! Callers pass it explicitly to whatever needs it (the executor clears entries
//! after a successful sync). Nothing here is persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::models::{Record, RecordKey, RecordPatch};
use crate::util::unix_millis_now;

/// A record with edits that have not been transmitted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRecord {
    /// Record as fetched from its platform
    pub base: Record,
    pub pending_changes: RecordPatch,
    pub staged: bool,
    /// When the entry was staged (Unix ms)
    pub staged_at: i64,
}

impl StagedRecord {
    /// Base record with the pending changes applied
    #[must_use]
    pub fn effective(&self) -> Record {
        self.pending_changes.apply_to(&self.base)
    }
}

/// Shared keyed store of staged records
#[derive(Debug, Clone, Default)]
pub struct StagingStore {
    entries: Arc<Mutex<HashMap<RecordKey, StagedRecord>>>,
}

impl StagingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `changes` for `base`, replacing any earlier entry for the same
    /// record. Patches do not accumulate across calls.
    pub fn stage(&self, base: Record, changes: RecordPatch) {
        let key = base.key();
        tracing::debug!(record = %key, "Staging record changes");
        self.lock().insert(
            key,
            StagedRecord {
                base,
                pending_changes: changes,
                staged: true,
                staged_at: unix_millis_now(),
            },
        );
    }

    /// Drop the staged entry for `key`, returning it if there was one
    pub fn unstage(&self, key: &RecordKey) -> Option<StagedRecord> {
        self.lock().remove(key)
    }

    #[must_use]
    pub fn is_staged(&self, key: &RecordKey) -> bool {
        self.lock().contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &RecordKey) -> Option<StagedRecord> {
        self.lock().get(key).cloned()
    }

    /// Value to transmit for `record`: staged changes merged over it, or the
    /// record unchanged when nothing is staged.
    #[must_use]
    pub fn effective(&self, record: &Record) -> Record {
        self.lock()
            .get(&record.key())
            .map_or_else(|| record.clone(), |staged| staged.pending_changes.apply_to(record))
    }

    /// All staged entries, oldest first
    #[must_use]
    pub fn list_staged(&self) -> Vec<StagedRecord> {
        let mut staged = self.lock().values().cloned().collect::<Vec<_>>();
        staged.sort_by(|a, b| {
            a.staged_at
                .cmp(&b.staged_at)
                .then_with(|| a.base.key().cmp(&b.base.key()))
        });
        staged
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every staged entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RecordKey, StagedRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
