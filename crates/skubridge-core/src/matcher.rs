//! Record matching between the ERP and storefront record sets.
//!
//! Matching is keyed on the natural key (typically the SKU). The record set of
//! the direction's authoritative platform drives the output: one mapping per
//! authoritative record, in input order. The other set is only a lookup table.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Mapping, MappingAction, Platform, Record, SyncDirection};
use crate::services::{RecordFilter, RecordSource};

/// Pair `source` (ERP) and `target` (storefront) records for `direction`.
///
/// For `TargetToSource` the storefront set is authoritative, so each mapping's
/// `source_id` is a storefront id. `Bidirectional` matches exactly like
/// `SourceToTarget`; no reverse pass is made.
///
/// When several non-authoritative records share a natural key, the last one
/// wins and the others are never paired. Authoritative records without a
/// usable natural key always map to `Create`.
#[must_use]
pub fn match_records(
    source: &[Record],
    target: &[Record],
    direction: SyncDirection,
) -> Vec<Mapping> {
    let (authoritative, counterpart) = match direction.authoritative_platform() {
        Platform::Erp => (source, target),
        Platform::Storefront => (target, source),
    };

    let lookup = index_by_natural_key(counterpart);

    authoritative
        .iter()
        .map(|record| {
            let target_id = record
                .match_key()
                .and_then(|key| lookup.get(key))
                .map(|matched| matched.id.clone());
            Mapping::paired(
                record.id.clone(),
                target_id,
                record.match_key().map(str::to_string),
            )
        })
        .collect()
}

/// Mark the mappings of deselected authoritative records as `Skip`.
///
/// Returns how many mappings were changed.
pub fn exclude(mappings: &mut [Mapping], deselected: &HashSet<String>) -> usize {
    let mut changed = 0;
    for mapping in mappings
        .iter_mut()
        .filter(|mapping| deselected.contains(&mapping.source_id))
    {
        if mapping.action != MappingAction::Skip {
            mapping.action = MappingAction::Skip;
            changed += 1;
        }
    }
    changed
}

fn index_by_natural_key(records: &[Record]) -> HashMap<&str, &Record> {
    let mut lookup = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(key) = record.match_key() {
            if lookup.insert(key, record).is_some() {
                tracing::debug!(
                    natural_key = key,
                    "duplicate natural key shadows earlier record"
                );
            }
        }
    }
    lookup
}

/// Counts of mapping actions, for previews and reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub create: usize,
    pub update: usize,
    pub skip: usize,
}

impl MatchStats {
    #[must_use]
    pub fn from_mappings(mappings: &[Mapping]) -> Self {
        mappings
            .iter()
            .fold(Self::default(), |mut stats, mapping| {
                match mapping.action {
                    MappingAction::Create => stats.create += 1,
                    MappingAction::Update => stats.update += 1,
                    MappingAction::Skip => stats.skip += 1,
                }
                stats
            })
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.create + self.update + self.skip
    }
}

/// Both record sets and the mappings computed from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPreview {
    pub direction: SyncDirection,
    pub source_records: Vec<Record>,
    pub target_records: Vec<Record>,
    pub mappings: Vec<Mapping>,
}

impl MatchPreview {
    /// Match two already-loaded record sets
    #[must_use]
    pub fn build(
        source_records: Vec<Record>,
        target_records: Vec<Record>,
        direction: SyncDirection,
    ) -> Self {
        let mappings = match_records(&source_records, &target_records, direction);
        Self {
            direction,
            source_records,
            target_records,
            mappings,
        }
    }

    #[must_use]
    pub fn stats(&self) -> MatchStats {
        MatchStats::from_mappings(&self.mappings)
    }

    /// The authoritative record behind a mapping
    #[must_use]
    pub fn authoritative_record(&self, mapping: &Mapping) -> Option<&Record> {
        let records = match self.direction.authoritative_platform() {
            Platform::Erp => &self.source_records,
            Platform::Storefront => &self.target_records,
        };
        records.iter().find(|record| record.id == mapping.source_id)
    }
}

/// Fetch both platforms' records through `source` and match them.
pub async fn preview<R: RecordSource>(
    source: &R,
    filter: &RecordFilter,
    direction: SyncDirection,
) -> Result<MatchPreview> {
    let source_records = source.fetch_records(Platform::Erp, filter).await?;
    let target_records = source.fetch_records(Platform::Storefront, filter).await?;
    tracing::info!(
        direction = %direction,
        erp = source_records.len(),
        storefront = target_records.len(),
        "Fetched records for matching"
    );
    Ok(MatchPreview::build(source_records, target_records, direction))
}
