use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use skubridge_core::db::{Database, LibSqlQueueRepository};
use skubridge_core::error::{Error, Result};
use skubridge_core::models::{
    MappingAction, NewQueueItem, Platform, QueueFilter, Record, RecordPatch, SyncDirection,
    SyncItemError, SyncMode, SyncRequest, SyncResult, SyncStatus, SyncTrigger,
};
use skubridge_core::services::{PatternLookup, QueueStore, SyncService};
use skubridge_core::{StagingStore, SyncExecutor};

use crate::cli::{CompletionShell, ReportArgs};
use crate::commands::bulk::{bulk_sync, ensure_no_unexpected, BulkSelection};
use crate::commands::common::{
    emit_report, format_queue_lines, format_relative_time, format_sync_log_lines,
    format_sync_timestamp, list_sync_logs, normalize_queue_item_identifier, parse_assignments,
    resolve_queue_item,
};
use crate::commands::completions::{completion_script, run_completions};
use crate::commands::config::{apply_config_init, ConfigInit};
use crate::commands::populate::populate_queue;
use crate::commands::preview::{exclude_ids, format_preview_lines, preview_from_files};
use crate::commands::push::{push_record, PushOutcome};
use crate::commands::queue::{add_queue_item, list_queue, remove_queue_items};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Succeeds for every mapping except the ids in `rejected`; fails whole calls
/// for `failing_direction` and answers garbage for `garbled_direction`
#[derive(Default)]
struct FakeGateway {
    failing_direction: Option<SyncDirection>,
    garbled_direction: Option<SyncDirection>,
    rejected: Vec<String>,
    requests: RefCell<Vec<SyncRequest>>,
    patterns: BTreeMap<String, Vec<Record>>,
}

impl SyncService for FakeGateway {
    async fn sync(&self, request: &SyncRequest) -> Result<SyncResult> {
        self.requests.borrow_mut().push(request.clone());
        if self.failing_direction == Some(request.direction) {
            return Err(Error::Api("storefront unavailable (503)".to_string()));
        }
        if self.garbled_direction == Some(request.direction) {
            return Err(Error::MalformedResponse(
                "sync result did not parse".to_string(),
            ));
        }

        let errors = request
            .mappings
            .iter()
            .filter(|mapping| self.rejected.contains(&mapping.source_id))
            .map(|mapping| SyncItemError {
                item_id: mapping.source_id.clone(),
                message: "rejected".to_string(),
            })
            .collect::<Vec<_>>();
        let processed = request.mappings.len() as u64;
        let failed = errors.len() as u64;
        Ok(SyncResult {
            items_processed: processed,
            items_succeeded: processed - failed,
            items_failed: failed,
            errors,
        })
    }
}

impl SyncService for &FakeGateway {
    async fn sync(&self, request: &SyncRequest) -> Result<SyncResult> {
        (**self).sync(request).await
    }
}

impl PatternLookup for FakeGateway {
    async fn expand(&self, pattern_id: &str) -> Result<Vec<Record>> {
        self.patterns
            .get(pattern_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("pattern {pattern_id}")))
    }
}

fn erp(id: &str, key: &str) -> Record {
    Record::new(Platform::Erp, id, key)
}

fn storefront(id: &str, key: &str) -> Record {
    Record::new(Platform::Storefront, id, key)
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn normalize_queue_item_identifier_rejects_empty() {
    assert!(matches!(
        normalize_queue_item_identifier(" \n "),
        Err(CliError::EmptyQueueItemId)
    ));
    assert_eq!(normalize_queue_item_identifier("  abc123  ").unwrap(), "abc123");
}

#[test]
fn parse_assignments_builds_patch() {
    let patch = parse_assignments(&[
        "price=12.5".to_string(),
        "name = Blue Widget".to_string(),
        "color=blue".to_string(),
    ])
    .unwrap();

    assert_eq!(patch.price, Some(12.5));
    assert_eq!(patch.name.as_deref(), Some("Blue Widget"));
    assert_eq!(patch.extensions.get("color"), Some(&serde_json::json!("blue")));
}

#[test]
fn parse_assignments_rejects_malformed_input() {
    let missing_equals = parse_assignments(&["price".to_string()]).unwrap_err();
    assert!(matches!(missing_equals, CliError::InvalidAssignment(_, _)));

    let bad_number = parse_assignments(&["quantity=many".to_string()]).unwrap_err();
    assert!(bad_number.to_string().contains("quantity must be an integer"));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn queue_add_list_and_remove() {
    let db_path = unique_test_db_path();

    let first = add_queue_item(
        &NewQueueItem::new("SKU-A", SyncDirection::SourceToTarget).with_source_id("1"),
        &db_path,
    )
    .await
    .unwrap();
    let second = add_queue_item(
        &NewQueueItem::new("SKU-B", SyncDirection::TargetToSource).with_target_id("9"),
        &db_path,
    )
    .await
    .unwrap();

    let duplicate = add_queue_item(
        &NewQueueItem::new("SKU-A", SyncDirection::SourceToTarget),
        &db_path,
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, CliError::Config(_)));

    let listed = list_queue(&QueueFilter::all(), &db_path).await.unwrap();
    assert_eq!(
        listed.iter().map(|item| item.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    let lines = format_queue_lines(&listed);
    assert!(lines[0].contains("SKU-A"));
    assert!(lines[0].contains("pending"));
    assert!(lines[1].contains("target_to_source"));

    let removed = remove_queue_items(&[first.id.to_string()], &db_path)
        .await
        .unwrap();
    assert_eq!(removed.len(), 1);

    let remaining = list_queue(&QueueFilter::all(), &db_path).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].natural_key, "SKU-B");

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn remove_queue_items_resolves_all_ids_before_deleting() {
    let db_path = unique_test_db_path();
    add_queue_item(
        &NewQueueItem::new("SKU-A", SyncDirection::SourceToTarget),
        &db_path,
    )
    .await
    .unwrap();
    let item = list_queue(&QueueFilter::all(), &db_path).await.unwrap().remove(0);

    let error = remove_queue_items(&[item.id.to_string(), "does-not-exist".to_string()], &db_path)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::QueueItemNotFound(_)));
    assert_eq!(list_queue(&QueueFilter::all(), &db_path).await.unwrap().len(), 1);

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "current_thread")]
async fn resolve_queue_item_supports_exact_and_prefix_id() {
    let db = Database::open_in_memory().await.unwrap();
    let repo = LibSqlQueueRepository::new(db.connection());
    let first = repo
        .insert(&NewQueueItem::new("SKU-A", SyncDirection::SourceToTarget))
        .await
        .unwrap();
    let second = repo
        .insert(&NewQueueItem::new("SKU-B", SyncDirection::SourceToTarget))
        .await
        .unwrap();

    let by_exact = resolve_queue_item(&first.id.to_string(), &repo).await.unwrap();
    assert_eq!(by_exact.natural_key, "SKU-A");

    let full = second.id.to_string();
    let by_prefix = resolve_queue_item(&full[..full.len() - 1], &repo)
        .await
        .unwrap();
    assert_eq!(by_prefix.natural_key, "SKU-B");

    let ambiguous = resolve_queue_item(&full[..4], &repo).await.unwrap_err();
    assert!(matches!(ambiguous, CliError::AmbiguousQueueItemId(_)));

    let missing = resolve_queue_item("zzzz", &repo).await.unwrap_err();
    assert!(matches!(missing, CliError::QueueItemNotFound(_)));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn populate_queue_merges_pattern_records_by_natural_key() {
    let db_path = unique_test_db_path();
    let mut gateway = FakeGateway::default();
    gateway.patterns.insert(
        "summer-sale".to_string(),
        vec![erp("1", "SKU-A"), storefront("9", "SKU-A"), erp("2", "SKU-B")],
    );

    let summary = populate_queue(
        &gateway,
        "summer-sale",
        false,
        SyncDirection::SourceToTarget,
        SyncMode::Full,
        &db_path,
    )
    .await
    .unwrap();
    assert_eq!((summary.inserted, summary.updated, summary.failed), (2, 1, 0));

    let queued = list_queue(&QueueFilter::all(), &db_path).await.unwrap();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].source_id.as_deref(), Some("1"));
    assert_eq!(queued[0].target_id.as_deref(), Some("9"));
    assert_eq!(queued[0].mode, SyncMode::Full);

    let missing = populate_queue(
        &gateway,
        "winter",
        true,
        SyncDirection::SourceToTarget,
        SyncMode::Delta,
        &db_path,
    )
    .await
    .unwrap_err();
    assert!(matches!(missing, CliError::Core(Error::NotFound(_))));
    assert_eq!(list_queue(&QueueFilter::all(), &db_path).await.unwrap().len(), 2);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn bulk_sync_updates_statuses_and_writes_history() {
    let db_path = unique_test_db_path();
    for item in [
        NewQueueItem::new("SKU-A", SyncDirection::SourceToTarget).with_source_id("1"),
        NewQueueItem::new("SKU-B", SyncDirection::SourceToTarget).with_source_id("2"),
        NewQueueItem::new("SKU-C", SyncDirection::TargetToSource).with_target_id("9"),
    ] {
        add_queue_item(&item, &db_path).await.unwrap();
    }

    let gateway = FakeGateway {
        failing_direction: Some(SyncDirection::TargetToSource),
        rejected: vec!["2".to_string()],
        ..FakeGateway::default()
    };
    let selection = BulkSelection {
        all: true,
        ..BulkSelection::default()
    };

    let summary = bulk_sync(&gateway, &selection, &db_path).await.unwrap();
    assert_eq!((summary.succeeded, summary.failed), (1, 2));
    assert_eq!(summary.groups.len(), 2);
    assert_eq!(gateway.requests.borrow().len(), 2);

    let queued = list_queue(&QueueFilter::all(), &db_path).await.unwrap();
    let statuses = queued
        .iter()
        .map(|item| (item.natural_key.as_str(), item.last_sync_status, item.sync_count))
        .collect::<Vec<_>>();
    assert_eq!(
        statuses,
        vec![
            ("SKU-A", SyncStatus::Success, 1),
            ("SKU-B", SyncStatus::Failed, 1),
            ("SKU-C", SyncStatus::Failed, 1),
        ]
    );

    let logs = list_sync_logs(10, &db_path).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|log| log.trigger == SyncTrigger::Bulk));
    let failed_group = logs
        .iter()
        .find(|log| log.direction == SyncDirection::TargetToSource)
        .unwrap();
    assert_eq!((failed_group.items_processed, failed_group.items_failed), (1, 1));
    assert!(failed_group.error.as_deref().unwrap().contains("(503)"));

    let lines = format_sync_log_lines(&logs);
    assert!(lines.iter().any(|line| line.contains("error=")));
    assert!(ensure_no_unexpected(&summary).is_ok());

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn bulk_sync_surfaces_malformed_responses_after_recording() {
    let db_path = unique_test_db_path();
    for item in [
        NewQueueItem::new("SKU-A", SyncDirection::SourceToTarget).with_source_id("1"),
        NewQueueItem::new("SKU-C", SyncDirection::TargetToSource).with_target_id("9"),
    ] {
        add_queue_item(&item, &db_path).await.unwrap();
    }

    let gateway = FakeGateway {
        garbled_direction: Some(SyncDirection::SourceToTarget),
        ..FakeGateway::default()
    };
    let selection = BulkSelection {
        all: true,
        ..BulkSelection::default()
    };

    let summary = bulk_sync(&gateway, &selection, &db_path).await.unwrap();
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert_eq!(gateway.requests.borrow().len(), 2);
    assert_eq!(list_sync_logs(10, &db_path).await.unwrap().len(), 2);

    let error = ensure_no_unexpected(&summary).unwrap_err();
    assert!(matches!(error, CliError::UnexpectedSyncErrors(_)));
    assert!(error.to_string().contains("did not parse"));

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn bulk_sync_requires_a_selection() {
    let db_path = unique_test_db_path();
    let gateway = FakeGateway::default();

    let everything = BulkSelection {
        all: true,
        ..BulkSelection::default()
    };
    let error = bulk_sync(&gateway, &everything, &db_path).await.unwrap_err();
    assert!(matches!(error, CliError::NothingSelected));
    assert!(gateway.requests.borrow().is_empty());
    assert!(list_sync_logs(10, &db_path).await.unwrap().is_empty());

    cleanup_db_files(&db_path);
}

#[test]
fn preview_from_files_matches_and_excludes() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("erp.json");
    let target_path = dir.path().join("storefront.json");
    std::fs::write(
        &source_path,
        r#"[
            {"id": "1", "natural_key": "SKU-A", "platform": "erp", "name": "Widget"},
            {"id": "2", "natural_key": "SKU-B", "platform": "erp"}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        &target_path,
        r#"[{"id": "9", "natural_key": "SKU-A", "platform": "storefront"}]"#,
    )
    .unwrap();

    let mut preview =
        preview_from_files(&source_path, &target_path, SyncDirection::SourceToTarget).unwrap();
    assert_eq!(
        preview
            .mappings
            .iter()
            .map(|mapping| mapping.action)
            .collect::<Vec<_>>(),
        vec![MappingAction::Update, MappingAction::Create]
    );

    assert_eq!(exclude_ids(&mut preview, &[" 2 ".to_string(), String::new()]), 1);
    let lines = format_preview_lines(&preview);
    assert!(lines[0].starts_with("update"));
    assert!(lines[1].starts_with("skip"));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("source_to_target: 0 create, 1 update, 1 skip")
    );
}

#[test]
fn preview_from_files_reports_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();

    let error =
        preview_from_files(&garbage, &garbage, SyncDirection::SourceToTarget).unwrap_err();
    assert!(matches!(error, CliError::RecordsFile(_, _)));
}

#[tokio::test(flavor = "current_thread")]
async fn push_record_stages_then_syncs() {
    let gateway = FakeGateway::default();
    let executor = SyncExecutor::new(&gateway, StagingStore::new());
    let preview = skubridge_core::MatchPreview::build(
        vec![erp("1", "SKU-A")],
        vec![storefront("9", "SKU-A")],
        SyncDirection::SourceToTarget,
    );
    let patch = parse_assignments(&["price=12".to_string()]).unwrap();

    let planned = push_record(&executor, &preview, "1", patch.clone(), true)
        .await
        .unwrap();
    let PushOutcome::Planned(record) = planned else {
        panic!("dry run should not send");
    };
    assert_eq!(record.price, Some(12.0));
    assert!(gateway.requests.borrow().is_empty());

    let sent = push_record(&executor, &preview, " 1 ", patch, false)
        .await
        .unwrap();
    assert!(matches!(sent, PushOutcome::Sent(ref result) if result.items_succeeded == 1));

    let requests = gateway.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].record.as_ref().and_then(|record| record.price),
        Some(12.0)
    );
    assert!(executor.staging().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn push_record_rejects_unknown_record() {
    let gateway = FakeGateway::default();
    let executor = SyncExecutor::new(&gateway, StagingStore::new());
    let preview = skubridge_core::MatchPreview::build(
        vec![erp("1", "SKU-A")],
        Vec::new(),
        SyncDirection::SourceToTarget,
    );

    let error = push_record(&executor, &preview, "7", RecordPatch::default(), false)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::RecordNotFound(id) if id == "7"));
    assert!(gateway.requests.borrow().is_empty());
}

#[test]
fn apply_config_init_merges_into_existing_profile() {
    let mut config = CliProfilesConfig::default();
    config.profiles.insert(
        "work".to_string(),
        CliProfile {
            base_url: Some("https://old.example.com".to_string()),
            api_token: Some("keep-me".to_string()),
            timeout_secs: Some(10),
            ..CliProfile::default()
        },
    );

    let init = ConfigInit {
        base_url: Some("https://gateway.example.com/".to_string()),
        default_direction: Some(SyncDirection::Bidirectional),
        activate: true,
        ..ConfigInit::default()
    };
    let name = apply_config_init(&mut config, Some("work"), &init).unwrap();

    assert_eq!(name, "work");
    assert_eq!(config.active_profile.as_deref(), Some("work"));
    let profile = config.profile("work").unwrap();
    assert_eq!(profile.base_url(), Some("https://gateway.example.com".to_string()));
    assert_eq!(profile.api_token.as_deref(), Some("keep-me"));
    assert_eq!(profile.timeout_secs, Some(10));
    assert_eq!(profile.default_direction, Some(SyncDirection::Bidirectional));
}

#[test]
fn apply_config_init_rejects_invalid_values_without_changes() {
    let mut config = CliProfilesConfig::default();

    let bad_url = ConfigInit {
        base_url: Some("gateway.example.com".to_string()),
        activate: true,
        ..ConfigInit::default()
    };
    assert!(matches!(
        apply_config_init(&mut config, Some("work"), &bad_url),
        Err(CliError::Config(_))
    ));

    let bad_timeout = ConfigInit {
        base_url: Some("https://gateway.example.com".to_string()),
        timeout_secs: Some(0),
        activate: true,
        ..ConfigInit::default()
    };
    assert!(apply_config_init(&mut config, Some("work"), &bad_timeout).is_err());
    assert_eq!(config, CliProfilesConfig::default());
}

#[test]
fn emit_report_writes_requested_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.md");
    let args = ReportArgs {
        markdown: true,
        output: Some(output.clone()),
        ..ReportArgs::default()
    };

    emit_report("# Bulk sync\n", &args).unwrap();
    assert_eq!(std::fs::read_to_string(output).unwrap(), "# Bulk sync\n");
}

#[test]
fn completion_script_targets_binary_name() {
    let script = String::from_utf8(completion_script(CompletionShell::Bash)).unwrap();
    assert!(script.contains("_skubridge()"));
    assert!(script.contains("complete -F _skubridge"));
}

#[test]
fn run_completions_writes_fish_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("skubridge.fish");

    run_completions(CompletionShell::Fish, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("complete -c skubridge"));
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("skubridge-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &PathBuf) {
    // libsql can keep file handles alive briefly after drop on Windows
    if cfg!(windows) {
        return;
    }

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}
