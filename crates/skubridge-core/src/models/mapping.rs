//! Matcher output model

use serde::{Deserialize, Serialize};

/// What a sync should do with an authoritative record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingAction {
    /// No counterpart exists; create one
    Create,
    /// A counterpart was found; update it
    Update,
    /// Excluded by the caller
    Skip,
}

impl MappingAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Skip => "skip",
        }
    }
}

/// Field-level discrepancy between paired records (reserved, never produced yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: String,
    pub source_value: String,
    pub target_value: String,
}

/// Pairing of one authoritative record with zero or one counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Id of the authoritative record
    pub source_id: String,
    /// Id of the matched counterpart, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_key: Option<String>,
    pub action: MappingAction,
    #[serde(default)]
    pub conflicts: Vec<FieldConflict>,
}

impl Mapping {
    /// Build a mapping whose action follows from whether a target was found
    pub fn paired(
        source_id: impl Into<String>,
        target_id: Option<String>,
        natural_key: Option<String>,
    ) -> Self {
        let action = if target_id.is_some() {
            MappingAction::Update
        } else {
            MappingAction::Create
        };
        Self {
            source_id: source_id.into(),
            target_id,
            natural_key,
            action,
            conflicts: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.action, MappingAction::Skip)
    }
}
