use std::path::Path;

use skubridge_core::db::LibSqlQueueRepository;
use skubridge_core::models::{QueueFilter, QueueItem};
use skubridge_core::report::{render_bulk_summary, ReportFormat};
use skubridge_core::services::{QueueStore, SyncService};
use skubridge_core::{BulkOrchestrator, BulkSummary, StagingStore, SyncExecutor};

use crate::cli::BulkArgs;
use crate::commands::common::{
    append_sync_logs, emit_report, gateway_client, open_database, resolve_gateway_config,
    resolve_queue_item,
};
use crate::error::CliError;

/// Which queue items a bulk run covers
#[derive(Debug, Clone, Default)]
pub struct BulkSelection {
    pub ids: Vec<String>,
    pub all: bool,
    pub filter: QueueFilter,
}

impl From<&BulkArgs> for BulkSelection {
    fn from(args: &BulkArgs) -> Self {
        Self {
            ids: args.ids.clone(),
            all: args.all,
            filter: QueueFilter {
                direction: args.direction.map(Into::into),
                status: args.status.map(Into::into),
                ..QueueFilter::default()
            },
        }
    }
}

pub async fn run_bulk(args: &BulkArgs, profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let config = resolve_gateway_config(profile)?;
    let client = gateway_client(&config)?;

    let summary = bulk_sync(client, &BulkSelection::from(args), db_path).await?;

    if args.output.json {
        emit_report(&render_bulk_summary(&summary, ReportFormat::Json)?, &args.output)?;
    } else if args.output.markdown {
        emit_report(
            &render_bulk_summary(&summary, ReportFormat::Markdown)?,
            &args.output,
        )?;
    } else {
        print_summary(&summary);
    }
    ensure_no_unexpected(&summary)
}

fn print_summary(summary: &BulkSummary) {
    for group in &summary.groups {
        match &group.error {
            Some(error) => println!("{}: {} items failed: {error}", group.direction, group.failed),
            None => println!(
                "{}: {} succeeded, {} failed",
                group.direction, group.succeeded, group.failed
            ),
        }
    }
    println!(
        "Synced {} items: {} succeeded, {} failed",
        summary.total(),
        summary.succeeded,
        summary.failed
    );
    if summary.status_write_failures > 0 {
        println!(
            "Warning: {} status updates could not be saved",
            summary.status_write_failures
        );
    }
}

/// Fail the command when a group call broke for a reason other than transport.
/// Statuses and history are already written by then.
pub fn ensure_no_unexpected(summary: &BulkSummary) -> Result<(), CliError> {
    if summary.unexpected.is_empty() {
        return Ok(());
    }
    Err(CliError::UnexpectedSyncErrors(summary.unexpected.join("; ")))
}

/// Sync the selected queue items through `service` and record one history
/// entry per direction group
pub async fn bulk_sync<S: SyncService>(
    service: S,
    selection: &BulkSelection,
    db_path: &Path,
) -> Result<BulkSummary, CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlQueueRepository::new(db.connection());

    let selected = select_items(selection, &repo).await?;
    if selected.is_empty() {
        return Err(CliError::NothingSelected);
    }

    let executor = SyncExecutor::new(service, StagingStore::new());
    let summary = BulkOrchestrator::new(&executor, &repo)
        .run_bulk(&selected)
        .await;

    let logs = summary
        .groups
        .iter()
        .map(skubridge_core::orchestrator::GroupOutcome::sync_log)
        .collect::<Vec<_>>();
    append_sync_logs(&db, &logs).await;

    Ok(summary)
}

async fn select_items<Q: QueueStore>(
    selection: &BulkSelection,
    store: &Q,
) -> Result<Vec<QueueItem>, CliError> {
    if selection.all {
        return Ok(store.list(&selection.filter).await?);
    }

    let mut selected: Vec<QueueItem> = Vec::with_capacity(selection.ids.len());
    for id in &selection.ids {
        let item = resolve_queue_item(id, store).await?;
        if !selected.iter().any(|seen| seen.id == item.id) {
            selected.push(item);
        }
    }
    Ok(selected)
}
