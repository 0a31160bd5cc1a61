use std::path::Path;

use crate::commands::common::{format_sync_log_lines, list_sync_logs, sync_log_to_item, SyncLogItem};
use crate::error::CliError;

pub async fn run_logs(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let logs = list_sync_logs(limit, db_path).await?;

    if as_json {
        let items = logs.iter().map(sync_log_to_item).collect::<Vec<SyncLogItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if logs.is_empty() {
        println!("No sync history yet.");
        return Ok(());
    }

    for line in format_sync_log_lines(&logs) {
        println!("{line}");
    }
    Ok(())
}
