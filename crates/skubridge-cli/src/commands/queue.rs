use std::path::Path;

use skubridge_core::db::LibSqlQueueRepository;
use skubridge_core::models::{NewQueueItem, QueueFilter, QueueItem};
use skubridge_core::services::QueueStore;

use crate::cli::QueueCommands;
use crate::commands::common::{
    format_queue_lines, open_database, profile_defaults, queue_item_to_list_item,
    resolve_queue_item, QueueListItem,
};
use crate::config_profiles::normalize_text_option;
use crate::error::CliError;

pub async fn run_queue(
    command: QueueCommands,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        QueueCommands::List {
            direction,
            status,
            prefix,
            limit,
            json,
        } => {
            let filter = QueueFilter {
                direction: direction.map(Into::into),
                status: status.map(Into::into),
                natural_key_prefix: normalize_text_option(prefix),
                limit: Some(limit),
            };
            run_queue_list(&filter, json, db_path).await
        }
        QueueCommands::Add {
            natural_key,
            source_id,
            target_id,
            direction,
            mode,
        } => {
            let (default_direction, default_mode) = profile_defaults(profile)?;
            let mut item = NewQueueItem::new(
                natural_key,
                direction.map_or(default_direction, Into::into),
            )
            .with_mode(mode.map_or(default_mode, Into::into));
            item.source_id = normalize_text_option(source_id);
            item.target_id = normalize_text_option(target_id);

            let queued = add_queue_item(&item, db_path).await?;
            println!("{}", queued.id);
            Ok(())
        }
        QueueCommands::Remove { ids } => {
            for removed in remove_queue_items(&ids, db_path).await? {
                println!("{}", removed.id);
            }
            Ok(())
        }
        QueueCommands::Clear => {
            let db = open_database(db_path).await?;
            let removed = LibSqlQueueRepository::new(db.connection()).clear().await?;
            println!("Removed {removed} queued items");
            Ok(())
        }
    }
}

pub async fn list_queue(filter: &QueueFilter, db_path: &Path) -> Result<Vec<QueueItem>, CliError> {
    let db = open_database(db_path).await?;
    Ok(LibSqlQueueRepository::new(db.connection()).list(filter).await?)
}

async fn run_queue_list(filter: &QueueFilter, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let items = list_queue(filter, db_path).await?;

    if as_json {
        let json_items = items
            .iter()
            .map(queue_item_to_list_item)
            .collect::<Vec<QueueListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }

    for line in format_queue_lines(&items) {
        println!("{line}");
    }
    Ok(())
}

pub async fn add_queue_item(item: &NewQueueItem, db_path: &Path) -> Result<QueueItem, CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlQueueRepository::new(db.connection());

    if let Some(existing) = repo.find_by_key(&item.natural_key, item.direction).await? {
        return Err(CliError::Config(format!(
            "'{}' is already queued for {} as {}",
            existing.natural_key, existing.direction, existing.id
        )));
    }
    Ok(repo.insert(item).await?)
}

/// Remove items given by id or unique prefix; every id is resolved before
/// anything is deleted
pub async fn remove_queue_items(ids: &[String], db_path: &Path) -> Result<Vec<QueueItem>, CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlQueueRepository::new(db.connection());

    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let item = resolve_queue_item(id, &repo).await?;
        if !resolved.iter().any(|seen: &QueueItem| seen.id == item.id) {
            resolved.push(item);
        }
    }

    let item_ids = resolved.iter().map(|item| item.id).collect::<Vec<_>>();
    repo.delete_many(&item_ids).await?;
    Ok(resolved)
}
