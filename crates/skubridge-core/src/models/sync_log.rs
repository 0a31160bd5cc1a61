//! Sync run history model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SyncDirection;

/// What started a logged sync call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTrigger {
    /// Single-item push of one (possibly staged) record
    Single,
    /// One direction group of a bulk run
    Bulk,
}

impl SyncTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Bulk => "bulk",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "bulk" => Ok(Self::Bulk),
            other => Err(format!("unknown sync trigger '{other}'")),
        }
    }
}

/// Recorded outcome of one remote sync call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLog {
    /// Log row identifier
    pub id: i64,
    pub trigger: SyncTrigger,
    pub direction: SyncDirection,
    pub items_processed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    /// Transport error message when the call itself failed
    pub error: Option<String>,
    /// Start of the call (Unix ms)
    pub started_at: i64,
    /// End of the call (Unix ms)
    pub finished_at: i64,
}

/// A log entry before it is assigned an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSyncLog {
    pub trigger: SyncTrigger,
    pub direction: SyncDirection,
    pub items_processed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub error: Option<String>,
    pub started_at: i64,
    pub finished_at: i64,
}
