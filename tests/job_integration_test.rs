// ==========================================
// Validation Job Integration Tests
// ==========================================
// Run lifecycle (pending -> running -> completed/failed), result
// artifacts, listing and summaries
// ==========================================

mod test_helpers;

use chrono::NaiveDateTime;
use ipo_validation::app::{
    find_run, list_runs, load_summary, JobError, ValidationJobService, PAGE_SIZE,
};
use ipo_validation::config::ConfigManager;
use ipo_validation::domain::{
    TriggerType, ValidationRun, ValidationStatus, VarianceCategory,
};
use ipo_validation::importer::SourceConnector;
use ipo_validation::repository::{CsvResultStore, ResultStore, ValidationRunRepository};
use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;

struct Harness {
    dir: TempDir,
    runs: Arc<ValidationRunRepository>,
    store: Arc<CsvResultStore>,
    service: Arc<ValidationJobService>,
}

fn harness(connector: MockConnector) -> Harness {
    let dir = TempDir::new().unwrap();
    let runs_db = dir.path().join("runs.db");
    let runs = Arc::new(ValidationRunRepository::new(&runs_db.to_string_lossy()).unwrap());
    let store = Arc::new(CsvResultStore::new(dir.path().join("results")).unwrap());

    let config = ConfigManager::from_config(sample_config(&dir.path().join("source.db"), false)).unwrap();
    let store_dyn: Arc<dyn ResultStore> = store.clone();
    let connector: Arc<dyn SourceConnector> = Arc::new(connector);
    let service = Arc::new(ValidationJobService::with_connector(
        config,
        runs.clone(),
        store_dyn,
        connector,
    ));

    Harness {
        dir,
        runs,
        store,
        service,
    }
}

fn scenario() -> MockConnector {
    MockConnector::default()
        .usage_row("SAINC_MfgSys_ABC123", d(2025, 8, 31), 5.0, 0.0)
        .usage_row("SAINC_SAILA_MATCH", d(2025, 8, 31), 0.0, 4.0)
        .plan_row("SAINC", "StoneAge Louisiana", "MATCH", d(2025, 8, 1), 4.0)
        .plan_row("SAINC", "StoneAge Durango", "PLAN-ONLY", d(2025, 8, 1), 2.0)
}

fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn test_trigger_completes_and_saves_artifact() {
    let h = harness(scenario());

    let run = h.service.trigger(TriggerType::Manual).unwrap();

    assert_eq!(run.status, ValidationStatus::Completed);
    assert_eq!(run.triggered_by, TriggerType::Manual);
    assert_eq!(run.total_records, Some(3));
    // ABC123 missing from IP&O, PLAN-ONLY missing from usage
    assert_eq!(run.critical_issues, Some(2));
    assert!(run.execution_time_secs.is_some());
    assert!(run.error.is_none());
    assert!(run.config_snapshot.is_some());

    assert!(h.store.exists(&run.id));
    let rows = h.store.load(&run.id).unwrap();
    assert_eq!(rows.len(), 3);

    let summary = load_summary(h.store.as_ref(), &run.id).unwrap();
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.perfect_matches, 1);
    assert_eq!(summary.critical_issues, 2);
    assert_eq!(
        summary.by_category.get(VarianceCategory::MissingFromIpo.label()),
        Some(&1)
    );
}

#[test]
fn test_source_failure_marks_run_failed() {
    let connector = scenario().failing_on("plan");
    let counters = connector.counters.clone();
    let h = harness(connector);

    let err = h.service.trigger(TriggerType::Scheduler).unwrap_err();
    assert!(matches!(err, JobError::Pipeline(_)));

    let listing = list_runs(&h.runs, 1).unwrap();
    assert_eq!(listing.total_runs, 1);
    let run = &listing.runs[0];
    assert_eq!(run.status, ValidationStatus::Failed);
    assert!(run.error.as_deref().unwrap_or_default().contains("plan query failed"));
    assert!(run.total_records.is_none());
    assert!(!h.store.exists(&run.id));

    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 1);
}

#[test]
fn test_rejected_completion_marks_run_failed() {
    let h = harness(scenario());
    let conn = Connection::open(h.dir.path().join("runs.db")).unwrap();
    conn.execute_batch(
        r#"
        CREATE TRIGGER reject_completion
        BEFORE UPDATE OF status ON validation_runs
        WHEN NEW.status = 'completed'
        BEGIN
            SELECT RAISE(ABORT, 'run database is read-only');
        END;
        "#,
    )
    .unwrap();

    let err = h.service.trigger(TriggerType::Manual).unwrap_err();
    assert!(matches!(err, JobError::Repository(_)));

    let listing = list_runs(&h.runs, 1).unwrap();
    let run = &listing.runs[0];
    assert_eq!(run.status, ValidationStatus::Failed);
    assert!(run
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("run database is read-only"));
    assert!(run.execution_time_secs.is_some());
}

#[test]
fn test_rerunning_finished_run_is_rejected() {
    let h = harness(scenario());
    let run = h.service.trigger(TriggerType::Manual).unwrap();

    let err = h.service.run_job(&run.id).unwrap_err();
    assert!(matches!(
        err,
        JobError::NotPending {
            status: ValidationStatus::Completed,
            ..
        }
    ));

    // the stored run is untouched
    let stored = find_run(&h.runs, &run.id).unwrap();
    assert_eq!(stored.status, ValidationStatus::Completed);
}

#[test]
fn test_unknown_run_id() {
    let h = harness(scenario());
    assert!(matches!(
        h.service.run_job("19990101_000000"),
        Err(JobError::RunNotFound(_))
    ));
    assert!(matches!(
        find_run(&h.runs, "19990101_000000"),
        Err(JobError::RunNotFound(_))
    ));
}

#[test]
fn test_create_run_then_run_job() {
    let h = harness(scenario());

    let pending = h.service.create_run(TriggerType::Scheduler).unwrap();
    assert_eq!(pending.status, ValidationStatus::Pending);
    assert_eq!(pending.companies, vec!["SAINC".to_string(), "SAUK".to_string()]);
    assert_eq!(pending.start_date, d(2025, 1, 1));
    assert_eq!(pending.end_date, d(2025, 8, 31));

    let done = h.service.run_job(&pending.id).unwrap();
    assert_eq!(done.id, pending.id);
    assert_eq!(done.status, ValidationStatus::Completed);
}

#[tokio::test]
async fn test_spawned_job_completes() {
    let h = harness(scenario());

    let handle = h.service.clone().spawn_job(TriggerType::Manual);
    let run = ValidationJobService::join(handle).await.unwrap();

    assert_eq!(run.status, ValidationStatus::Completed);
    assert!(h.store.exists(&run.id));
}

#[test]
fn test_list_runs_paginates_newest_first() {
    let h = harness(scenario());

    let total = PAGE_SIZE + 5;
    for i in 0..total {
        let created_at = ts("2025-09-01 08:00:00") + chrono::Duration::minutes(i as i64);
        let run = ValidationRun::pending(
            created_at,
            TriggerType::Scheduler,
            d(2025, 1, 1),
            d(2025, 8, 31),
            vec!["SAINC".to_string()],
        );
        h.runs.insert(&run).unwrap();
    }

    let first = list_runs(&h.runs, 1).unwrap();
    assert_eq!(first.total_runs, total);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.runs.len(), PAGE_SIZE);
    assert_eq!(first.runs[0].id, "20250901_082400");

    let second = list_runs(&h.runs, 2).unwrap();
    assert_eq!(second.runs.len(), 5);
    assert_eq!(second.runs[4].id, "20250901_080000");

    // page 0 is treated as the first page
    assert_eq!(list_runs(&h.runs, 0).unwrap().page, 1);
}

#[test]
fn test_empty_listing_has_one_page() {
    let h = harness(scenario());
    let listing = list_runs(&h.runs, 1).unwrap();
    assert_eq!(listing.total_runs, 0);
    assert_eq!(listing.total_pages, 1);
    assert!(listing.runs.is_empty());
}

#[test]
fn test_summary_of_missing_artifact() {
    let h = harness(scenario());
    assert!(matches!(
        load_summary(h.store.as_ref(), "20250901_080000"),
        Err(JobError::Repository(_))
    ));
}
