use std::collections::HashSet;
use std::path::Path;

use skubridge_core::matcher::{self, MatchPreview};
use skubridge_core::models::SyncDirection;
use skubridge_core::report::{render_preview, ReportFormat};
use skubridge_core::services::RecordFilter;

use crate::cli::PreviewArgs;
use crate::commands::common::{
    emit_report, gateway_client, profile_defaults, read_records_file, resolve_gateway_config,
};
use crate::config_profiles::normalize_text_option;
use crate::error::CliError;

pub async fn run_preview(args: &PreviewArgs, profile: Option<&str>) -> Result<(), CliError> {
    let mut preview = match (&args.source_file, &args.target_file) {
        (Some(source_file), Some(target_file)) => {
            let (default_direction, _) = profile_defaults(profile)?;
            let direction = args.direction.map_or(default_direction, Into::into);
            preview_from_files(source_file, target_file, direction)?
        }
        _ => {
            let config = resolve_gateway_config(profile)?;
            let client = gateway_client(&config)?;
            let filter = RecordFilter {
                query: normalize_text_option(args.query.clone()),
                limit: args.limit,
            };
            let direction = args.direction.map_or(config.default_direction, Into::into);
            matcher::preview(&client, &filter, direction).await?
        }
    };

    let skipped = exclude_ids(&mut preview, &args.exclude);
    if skipped > 0 {
        tracing::info!(skipped, "Excluded records from the plan");
    }

    if args.output.json {
        return emit_report(&render_preview(&preview, ReportFormat::Json)?, &args.output);
    }
    if args.output.markdown {
        return emit_report(
            &render_preview(&preview, ReportFormat::Markdown)?,
            &args.output,
        );
    }

    if preview.mappings.is_empty() {
        println!("No records to sync.");
        return Ok(());
    }
    for line in format_preview_lines(&preview) {
        println!("{line}");
    }
    Ok(())
}

/// Match two record files without talking to the gateway
pub fn preview_from_files(
    source_file: &Path,
    target_file: &Path,
    direction: SyncDirection,
) -> Result<MatchPreview, CliError> {
    let source_records = read_records_file(source_file)?;
    let target_records = read_records_file(target_file)?;
    Ok(MatchPreview::build(source_records, target_records, direction))
}

pub fn exclude_ids(preview: &mut MatchPreview, ids: &[String]) -> usize {
    let deselected = ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>();
    if deselected.is_empty() {
        return 0;
    }
    matcher::exclude(&mut preview.mappings, &deselected)
}

pub fn format_preview_lines(preview: &MatchPreview) -> Vec<String> {
    let stats = preview.stats();
    let mut lines = preview
        .mappings
        .iter()
        .map(|mapping| {
            format!(
                "{:<6}  {:<20}  {:<16}  -> {}",
                mapping.action.as_str(),
                mapping.natural_key.as_deref().unwrap_or("-"),
                mapping.source_id,
                mapping.target_id.as_deref().unwrap_or("(new)")
            )
        })
        .collect::<Vec<_>>();
    lines.push(format!(
        "{}: {} create, {} update, {} skip",
        preview.direction, stats.create, stats.update, stats.skip
    ));
    lines
}
