//! Persisted sync queue entries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{SyncDirection, SyncMode};

/// A unique identifier for a queue item, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueItemId(Uuid);

impl QueueItemId {
    /// Create a new unique queue item ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for QueueItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Outcome of the latest attempt on a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Never attempted
    #[default]
    Pending,
    Success,
    Failed,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown sync status '{other}'")),
        }
    }
}

/// A persisted intent to keep one record synchronized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique identifier
    pub id: QueueItemId,
    /// Business key the item tracks
    pub natural_key: String,
    /// Record id on the ERP side, when known
    pub source_id: Option<String>,
    /// Record id on the storefront side, when known
    pub target_id: Option<String>,
    pub direction: SyncDirection,
    pub mode: SyncMode,
    /// Time of the last completed attempt (Unix ms)
    pub last_synced_at: Option<i64>,
    pub last_sync_status: SyncStatus,
    /// Completed attempts, successful or not
    pub sync_count: u32,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

/// Fields supplied when adding or upserting a queue item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQueueItem {
    pub natural_key: String,
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub direction: SyncDirection,
    pub mode: SyncMode,
}

impl NewQueueItem {
    pub fn new(natural_key: impl Into<String>, direction: SyncDirection) -> Self {
        Self {
            natural_key: natural_key.into(),
            source_id: None,
            target_id: None,
            direction,
            mode: SyncMode::default(),
        }
    }

    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    #[must_use]
    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Query over the queue; unset fields do not filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFilter {
    pub direction: Option<SyncDirection>,
    pub status: Option<SyncStatus>,
    pub natural_key_prefix: Option<String>,
    pub limit: Option<usize>,
}

impl QueueFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}
