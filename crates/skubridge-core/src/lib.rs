//! skubridge-core - product reconciliation and sync orchestration
//!
//! This crate pairs product records between an ERP and a storefront, keeps
//! unsent edits in a staging overlay, and drives single, bulk and
//! pattern-based syncs through the collaborator traits in [`services`].
//! [`remote`] talks to the integration gateway over HTTP and [`db`] persists
//! the sync queue and run history in libSQL.

pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod populator;
pub mod remote;
pub mod report;
pub mod services;
pub mod staging;
pub mod util;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use executor::SyncExecutor;
pub use matcher::{match_records, MatchPreview};
pub use models::{Mapping, MappingAction, Platform, QueueItem, Record, SyncDirection, SyncResult};
pub use orchestrator::{BulkOrchestrator, BulkSummary};
pub use populator::{PatternPopulator, PopulateSummary};
pub use staging::StagingStore;
