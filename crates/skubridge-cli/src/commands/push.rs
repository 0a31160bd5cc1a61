use std::path::Path;

use skubridge_core::matcher::{self, MatchPreview};
use skubridge_core::models::{NewSyncLog, Record, RecordPatch, SyncDirection, SyncTrigger};
use skubridge_core::services::{RecordFilter, SyncService};
use skubridge_core::util::unix_millis_now;
use skubridge_core::{StagingStore, SyncExecutor, SyncResult};

use crate::cli::PushArgs;
use crate::commands::common::{
    append_sync_logs, gateway_client, open_database, parse_assignments, resolve_gateway_config,
};
use crate::config_profiles::normalize_text_option;
use crate::error::CliError;

/// What a push did
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Dry run: the record that would have been sent
    Planned(Record),
    Sent(SyncResult),
}

pub async fn run_push(args: &PushArgs, profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let patch = parse_assignments(&args.assignments)?;
    let config = resolve_gateway_config(profile)?;
    let client = gateway_client(&config)?;
    let direction = args.direction.map_or(config.default_direction, Into::into);

    let filter = RecordFilter {
        query: normalize_text_option(args.query.clone())
            .or_else(|| Some(args.source_id.trim().to_string())),
        limit: None,
    };
    let preview = matcher::preview(&client, &filter, direction).await?;

    let executor = SyncExecutor::new(client, StagingStore::new());
    let started_at = unix_millis_now();
    let outcome = push_record(&executor, &preview, &args.source_id, patch, args.dry_run).await;

    let called_remote = !args.dry_run && !matches!(outcome, Err(CliError::RecordNotFound(_)));
    if called_remote {
        let db = open_database(db_path).await?;
        append_sync_logs(&db, &[push_log(direction, &outcome, started_at)]).await;
    }

    match outcome? {
        PushOutcome::Planned(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        PushOutcome::Sent(result) => {
            println!(
                "Pushed {}: {} succeeded, {} failed",
                args.source_id.trim(),
                result.items_succeeded,
                result.items_failed
            );
            for error in &result.errors {
                println!("  {}: {}", error.item_id, error.message);
            }
        }
    }
    Ok(())
}

/// Stage `patch` on the authoritative record `source_id` and sync it.
///
/// With `dry_run` the staged record is returned and nothing is sent. The staged
/// edit stays in the executor's overlay when the sync does not fully succeed.
pub async fn push_record<S: SyncService>(
    executor: &SyncExecutor<S>,
    preview: &MatchPreview,
    source_id: &str,
    patch: RecordPatch,
    dry_run: bool,
) -> Result<PushOutcome, CliError> {
    let source_id = source_id.trim();
    let mapping = preview
        .mappings
        .iter()
        .find(|mapping| mapping.source_id == source_id)
        .ok_or_else(|| CliError::RecordNotFound(source_id.to_string()))?;
    let record = preview
        .authoritative_record(mapping)
        .ok_or_else(|| CliError::RecordNotFound(source_id.to_string()))?;

    if !patch.is_empty() {
        executor.staging().stage(record.clone(), patch);
    }

    if dry_run {
        return Ok(PushOutcome::Planned(executor.staging().effective(record)));
    }

    let result = executor
        .sync_one(mapping, record, preview.direction)
        .await?;
    Ok(PushOutcome::Sent(result))
}

fn push_log(
    direction: SyncDirection,
    outcome: &Result<PushOutcome, CliError>,
    started_at: i64,
) -> NewSyncLog {
    let (processed, succeeded, failed, error) = match outcome {
        Ok(PushOutcome::Sent(result)) => (
            result.items_processed,
            result.items_succeeded,
            result.items_failed,
            None,
        ),
        Ok(PushOutcome::Planned(_)) => (0, 0, 0, None),
        Err(error) => (1, 0, 1, Some(error.to_string())),
    };
    NewSyncLog {
        trigger: SyncTrigger::Single,
        direction,
        items_processed: processed,
        items_succeeded: succeeded,
        items_failed: failed,
        error,
        started_at,
        finished_at: unix_millis_now(),
    }
}
