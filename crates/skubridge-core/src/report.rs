//! JSON and Markdown renderings of match previews and bulk runs.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::matcher::{MatchPreview, MatchStats};
use crate::models::{FieldConflict, MappingAction, SyncDirection};
use crate::orchestrator::BulkSummary;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Json,
    Markdown,
}

/// One mapping as shown to a reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub source_id: String,
    pub target_id: Option<String>,
    pub natural_key: Option<String>,
    pub action: MappingAction,
    pub name: Option<String>,
    pub conflicts: Vec<FieldConflict>,
}

/// Serializable form of a [`MatchPreview`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewReport {
    pub direction: SyncDirection,
    pub stats: MatchStats,
    pub rows: Vec<PreviewRow>,
}

/// Flatten a preview into rows in mapping order
#[must_use]
pub fn preview_report(preview: &MatchPreview) -> PreviewReport {
    let rows = preview
        .mappings
        .iter()
        .map(|mapping| PreviewRow {
            source_id: mapping.source_id.clone(),
            target_id: mapping.target_id.clone(),
            natural_key: mapping.natural_key.clone(),
            action: mapping.action,
            name: preview
                .authoritative_record(mapping)
                .and_then(|record| record.name.clone()),
            conflicts: mapping.conflicts.clone(),
        })
        .collect();

    PreviewReport {
        direction: preview.direction,
        stats: preview.stats(),
        rows,
    }
}

/// Render a preview in `format`
pub fn render_preview(preview: &MatchPreview, format: ReportFormat) -> serde_json::Result<String> {
    let report = preview_report(preview);
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(&report),
        ReportFormat::Markdown => Ok(preview_markdown(&report)),
    }
}

fn preview_markdown(report: &PreviewReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Match preview ({})", report.direction);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} create, {} update, {} skip",
        report.stats.create, report.stats.update, report.stats.skip
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Source | Target | Key | Action | Name |");
    let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
    for row in &report.rows {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            escape_cell(&row.source_id),
            escape_cell(row.target_id.as_deref().unwrap_or("-")),
            escape_cell(row.natural_key.as_deref().unwrap_or("-")),
            row.action.as_str(),
            escape_cell(row.name.as_deref().unwrap_or("")),
        );
    }

    let conflicted = report
        .rows
        .iter()
        .filter(|row| !row.conflicts.is_empty())
        .collect::<Vec<_>>();
    if !conflicted.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Conflicts");
        for row in conflicted {
            for conflict in &row.conflicts {
                let _ = writeln!(
                    output,
                    "- {} `{}`: {} vs {}",
                    row.source_id, conflict.field, conflict.source_value, conflict.target_value
                );
            }
        }
    }

    output
}

/// Render a bulk run in `format`
pub fn render_bulk_summary(
    summary: &BulkSummary,
    format: ReportFormat,
) -> serde_json::Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(summary),
        ReportFormat::Markdown => Ok(bulk_markdown(summary)),
    }
}

fn bulk_markdown(summary: &BulkSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Bulk sync");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} items: {} succeeded, {} failed",
        summary.total(),
        summary.succeeded,
        summary.failed
    );
    if summary.status_write_failures > 0 {
        let _ = writeln!(
            output,
            "{} status updates could not be saved",
            summary.status_write_failures
        );
    }
    for error in &summary.unexpected {
        let _ = writeln!(output, "Unexpected error: {error}");
    }

    for group in &summary.groups {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", group.direction);
        let _ = writeln!(output, "- items: {}", group.item_ids.len());
        let _ = writeln!(output, "- succeeded: {}", group.succeeded);
        let _ = writeln!(output, "- failed: {}", group.failed);
        let _ = writeln!(
            output,
            "- duration: {} ms",
            group.finished_at.saturating_sub(group.started_at)
        );
        if let Some(error) = &group.error {
            let _ = writeln!(output, "- error: {error}");
        }
        if let Some(result) = &group.result {
            for item_error in &result.errors {
                let _ = writeln!(output, "  - {}: {}", item_error.item_id, item_error.message);
            }
        }
    }

    output
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
