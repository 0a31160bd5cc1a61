use std::path::Path;

use skubridge_core::db::LibSqlQueueRepository;
use skubridge_core::models::{SyncDirection, SyncMode};
use skubridge_core::services::PatternLookup;
use skubridge_core::{PatternPopulator, PopulateSummary};

use crate::cli::{DirectionArg, ModeArg};
use crate::commands::common::{gateway_client, open_database, resolve_gateway_config};
use crate::error::CliError;

pub async fn run_populate(
    pattern: &str,
    clear: bool,
    direction: Option<DirectionArg>,
    mode: Option<ModeArg>,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let config = resolve_gateway_config(profile)?;
    let client = gateway_client(&config)?;

    let summary = populate_queue(
        &client,
        pattern,
        clear,
        direction.map_or(config.default_direction, Into::into),
        mode.map_or(config.default_mode, Into::into),
        db_path,
    )
    .await?;

    println!(
        "Queued {} records from '{}': {} new, {} updated, {} failed",
        summary.total(),
        pattern.trim(),
        summary.inserted,
        summary.updated,
        summary.failed
    );
    Ok(())
}

pub async fn populate_queue<L: PatternLookup>(
    lookup: &L,
    pattern: &str,
    clear: bool,
    direction: SyncDirection,
    mode: SyncMode,
    db_path: &Path,
) -> Result<PopulateSummary, CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlQueueRepository::new(db.connection());

    Ok(PatternPopulator::new(lookup, &repo)
        .with_defaults(direction, mode)
        .populate(pattern, clear)
        .await?)
}
