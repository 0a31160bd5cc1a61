//! Sync direction and queue mode enums

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Platform;

/// Direction of a synchronization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// ERP is authoritative, storefront receives
    #[default]
    SourceToTarget,
    /// Storefront is authoritative, ERP receives
    TargetToSource,
    /// Both ways; matching treats the ERP side as authoritative
    Bidirectional,
}

impl SyncDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceToTarget => "source_to_target",
            Self::TargetToSource => "target_to_source",
            Self::Bidirectional => "bidirectional",
        }
    }

    /// Platform whose record set drives matching for this direction
    #[must_use]
    pub const fn authoritative_platform(self) -> Platform {
        match self {
            Self::SourceToTarget | Self::Bidirectional => Platform::Erp,
            Self::TargetToSource => Platform::Storefront,
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "source_to_target" | "sourcetotarget" => Ok(Self::SourceToTarget),
            "target_to_source" | "targettosource" => Ok(Self::TargetToSource),
            "bidirectional" => Ok(Self::Bidirectional),
            other => Err(format!("unknown sync direction '{other}'")),
        }
    }
}

/// How much of a queued record is sent on each run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Only changed fields
    #[default]
    Delta,
    /// The whole record
    Full,
}

impl SyncMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delta" => Ok(Self::Delta),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown sync mode '{other}'")),
        }
    }
}
