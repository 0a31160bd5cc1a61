use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use skubridge_core::config::ENV_API_BASE_URL;
use skubridge_core::db::{Database, LibSqlSyncLogRepository};
use skubridge_core::models::{
    NewSyncLog, QueueFilter, QueueItem, QueueItemId, Record, RecordPatch, SyncDirection, SyncLog,
    SyncMode,
};
use skubridge_core::remote::GatewayClient;
use skubridge_core::services::{QueueStore, SyncLogStore};
use skubridge_core::GatewayConfig;

use crate::cli::ReportArgs;
use crate::config_profiles::{normalize_text_option, CliProfilesConfig};
use crate::error::CliError;

pub const DB_PATH_ENV: &str = "SKUBRIDGE_DB_PATH";

#[derive(Debug, Serialize)]
pub struct QueueListItem {
    pub id: String,
    pub natural_key: String,
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub direction: String,
    pub mode: String,
    pub last_sync_status: String,
    pub last_synced_at: Option<i64>,
    pub last_synced_at_iso: Option<String>,
    pub sync_count: u32,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct SyncLogItem {
    pub id: i64,
    pub trigger: String,
    pub direction: String,
    pub items_processed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub error: Option<String>,
    pub started_at: i64,
    pub started_at_iso: String,
    pub duration_ms: i64,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skubridge")
        .join("skubridge.db")
}

pub async fn open_database(path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(path).await?)
}

/// Gateway settings for `profile_name`: the profile's values with environment
/// overrides applied, or the environment alone when the profile has no base URL.
pub fn resolve_gateway_config(profile_name: Option<&str>) -> Result<GatewayConfig, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(profile_name);

    let from_profile = match profiles.profile(&profile_name) {
        Some(profile) => profile.gateway_config()?,
        None => None,
    };
    if let Some(config) = from_profile {
        tracing::debug!("Using gateway profile '{}'", profile_name);
        return Ok(config.with_env_overrides()?);
    }

    if normalize_text_option(env::var(ENV_API_BASE_URL).ok()).is_none() {
        return Err(CliError::GatewayNotConfigured);
    }
    Ok(GatewayConfig::from_env()?)
}

/// Default direction and mode from the profile, falling back to the built-in
/// defaults when the profile is missing or sets neither
pub fn profile_defaults(profile_name: Option<&str>) -> Result<(SyncDirection, SyncMode), CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(profile_name);
    let profile = profiles.profile(&profile_name);
    Ok((
        profile
            .and_then(|profile| profile.default_direction)
            .unwrap_or_default(),
        profile
            .and_then(|profile| profile.default_mode)
            .unwrap_or_default(),
    ))
}

pub fn gateway_client(config: &GatewayConfig) -> Result<GatewayClient, CliError> {
    Ok(GatewayClient::new(config)?)
}

/// Persist history entries for remote calls. A failed write is logged and
/// does not fail the command, since the sync itself already happened.
pub async fn append_sync_logs(db: &Database, entries: &[NewSyncLog]) {
    let repo = LibSqlSyncLogRepository::new(db.connection());
    for entry in entries {
        if let Err(error) = repo.append(entry).await {
            tracing::warn!("Failed to record sync log: {error}");
        }
    }
}

pub async fn list_sync_logs(limit: usize, db_path: &Path) -> Result<Vec<SyncLog>, CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlSyncLogRepository::new(db.connection());
    Ok(repo.list_recent(limit).await?)
}

pub fn normalize_queue_item_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyQueueItemId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find a queue item by full id or unique id prefix
pub async fn resolve_queue_item<Q: QueueStore>(
    query: &str,
    store: &Q,
) -> Result<QueueItem, CliError> {
    let query = normalize_queue_item_identifier(query)?;
    if let Ok(id) = query.parse::<QueueItemId>() {
        if let Some(item) = store.get(&id).await? {
            return Ok(item);
        }
    }

    let query_lower = query.to_ascii_lowercase();
    let mut matching = store
        .list(&QueueFilter::all())
        .await?
        .into_iter()
        .filter(|item| item.id.as_str().starts_with(&query_lower))
        .collect::<Vec<_>>();

    match matching.len() {
        0 => Err(CliError::QueueItemNotFound(query)),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|item| short_id(&item.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousQueueItemId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &QueueItemId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn queue_item_to_list_item(item: &QueueItem) -> QueueListItem {
    QueueListItem {
        id: item.id.to_string(),
        natural_key: item.natural_key.clone(),
        source_id: item.source_id.clone(),
        target_id: item.target_id.clone(),
        direction: item.direction.to_string(),
        mode: item.mode.to_string(),
        last_sync_status: item.last_sync_status.to_string(),
        last_synced_at: item.last_synced_at,
        last_synced_at_iso: item.last_synced_at.map(format_sync_timestamp),
        sync_count: item.sync_count,
        created_at: item.created_at,
    }
}

pub fn format_queue_lines(items: &[QueueItem]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    items
        .iter()
        .map(|item| {
            let last_synced = item.last_synced_at.map_or_else(
                || "never".to_string(),
                |synced_at| format_relative_time(synced_at, now_ms),
            );
            format!(
                "{:<13}  {:<20}  {:<16}  {:<7}  x{:<3}  {}",
                short_id(&item.id),
                item.natural_key,
                item.direction.as_str(),
                item.last_sync_status.as_str(),
                item.sync_count,
                last_synced
            )
        })
        .collect()
}

pub fn sync_log_to_item(log: &SyncLog) -> SyncLogItem {
    SyncLogItem {
        id: log.id,
        trigger: log.trigger.to_string(),
        direction: log.direction.to_string(),
        items_processed: log.items_processed,
        items_succeeded: log.items_succeeded,
        items_failed: log.items_failed,
        error: log.error.clone(),
        started_at: log.started_at,
        started_at_iso: format_sync_timestamp(log.started_at),
        duration_ms: log.finished_at.saturating_sub(log.started_at),
    }
}

pub fn format_sync_log_lines(logs: &[SyncLog]) -> Vec<String> {
    logs.iter()
        .map(|log| {
            let mut line = format!(
                "{}  {:<6}  {:<16}  ok={} failed={} of {}",
                format_sync_timestamp(log.started_at),
                log.trigger.as_str(),
                log.direction.as_str(),
                log.items_succeeded,
                log.items_failed,
                log.items_processed
            );
            if let Some(error) = &log.error {
                line.push_str("  error=");
                line.push_str(error);
            }
            line
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Build a patch from `field=value` assignments
pub fn parse_assignments(assignments: &[String]) -> Result<RecordPatch, CliError> {
    let mut patch = RecordPatch::default();
    for assignment in assignments {
        let Some((field, value)) = assignment.split_once('=') else {
            return Err(CliError::InvalidAssignment(
                assignment.clone(),
                "expected FIELD=VALUE".to_string(),
            ));
        };
        patch
            .set_field(field.trim(), value.trim())
            .map_err(|reason| CliError::InvalidAssignment(assignment.clone(), reason))?;
    }
    Ok(patch)
}

pub fn read_records_file(path: &Path) -> Result<Vec<Record>, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|error| CliError::RecordsFile(path.display().to_string(), error.to_string()))?;
    serde_json::from_str::<Vec<Record>>(&raw)
        .map_err(|error| CliError::RecordsFile(path.display().to_string(), error.to_string()))
}

/// Print `rendered`, or write it to the requested file and print the path
pub fn emit_report(rendered: &str, args: &ReportArgs) -> Result<(), CliError> {
    if let Some(path) = args.output.as_deref() {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }
    Ok(())
}
