// ==========================================
// IPO Validation - Validation Job Service
// ==========================================
// Job layer around the pipeline:
//   create run (pending) -> running -> pipeline -> save artifact -> completed
//   any failure -> failed + error message, then propagate
// A run id executes at most once at a time (single-flight).
// ==========================================

use crate::config::{ConfigError, ConfigManager};
use crate::domain::types::{TriggerType, ValidationStatus};
use crate::domain::validation::ValidationRun;
use crate::engine::{PipelineError, ValidationPipeline, ValidationSummary};
use crate::importer::source::{connector_for, SourceConnector};
use crate::repository::{RepositoryError, ResultStore, ValidationRunRepository};
use chrono::Local;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Runs per page in listings
pub const PAGE_SIZE: usize = 20;

// ==========================================
// JobError
// ==========================================
#[derive(Error, Debug)]
pub enum JobError {
    #[error("validation run {0} is already executing")]
    AlreadyRunning(String),

    #[error("validation run not found: {0}")]
    RunNotFound(String),

    #[error("validation run {id} is {status}, expected pending")]
    NotPending { id: String, status: ValidationStatus },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("background job aborted: {0}")]
    Join(String),
}

pub type JobResult<T> = Result<T, JobError>;

// ==========================================
// RunPage - one page of the run listing
// ==========================================
#[derive(Debug, Clone)]
pub struct RunPage {
    pub runs: Vec<ValidationRun>,
    pub page: usize,
    pub total_pages: usize,
    pub total_runs: usize,
}

// ==========================================
// Single-flight guard
// ==========================================
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    run_id: String,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, run_id: &str) -> JobResult<Self> {
        let mut guard = set
            .lock()
            .map_err(|e| JobError::Repository(RepositoryError::LockError(e.to_string())))?;
        if !guard.insert(run_id.to_string()) {
            return Err(JobError::AlreadyRunning(run_id.to_string()));
        }
        Ok(Self {
            set,
            run_id: run_id.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.set.lock() {
            guard.remove(&self.run_id);
        }
    }
}

// ==========================================
// ValidationJobService
// ==========================================
pub struct ValidationJobService {
    config: ConfigManager,
    runs: Arc<ValidationRunRepository>,
    store: Arc<dyn ResultStore>,
    connector: Arc<dyn SourceConnector>,
    pipeline: ValidationPipeline,
    in_flight: Mutex<HashSet<String>>,
}

impl ValidationJobService {
    /// Source connector derived from the configured source
    pub fn new(
        config: ConfigManager,
        runs: Arc<ValidationRunRepository>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        let connector: Arc<dyn SourceConnector> = Arc::from(connector_for(&config.config().source));
        Self::with_connector(config, runs, store, connector)
    }

    pub fn with_connector(
        config: ConfigManager,
        runs: Arc<ValidationRunRepository>,
        store: Arc<dyn ResultStore>,
        connector: Arc<dyn SourceConnector>,
    ) -> Self {
        Self {
            config,
            runs,
            store,
            connector,
            pipeline: ValidationPipeline::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    /// Insert a pending run for the configured window
    pub fn create_run(&self, triggered_by: TriggerType) -> JobResult<ValidationRun> {
        let window = &self.config.config().validation;
        let mut run = ValidationRun::pending(
            Local::now().naive_local(),
            triggered_by,
            window.start_date,
            window.end_date,
            window.companies.clone(),
        );
        run.config_snapshot = Some(self.config.snapshot_json()?);

        self.runs.insert(&run)?;
        info!(run_id = %run.id, triggered_by = %triggered_by, "validation run created");
        Ok(run)
    }

    /// Execute a pending run to completion or failure
    pub fn run_job(&self, run_id: &str) -> JobResult<ValidationRun> {
        let _in_flight = InFlight::acquire(&self.in_flight, run_id)?;

        let run = self
            .runs
            .find_by_id(run_id)?
            .ok_or_else(|| JobError::RunNotFound(run_id.to_string()))?;
        if run.status != ValidationStatus::Pending {
            return Err(JobError::NotPending {
                id: run.id,
                status: run.status,
            });
        }

        let started = Instant::now();
        self.runs.mark_running(run_id)?;
        info!(run_id, "validation run started");

        // completion bookkeeping fails the run the same way a pipeline error does
        let outcome = self
            .execute(run_id)
            .and_then(|(total_records, critical_issues)| {
                let secs = started.elapsed().as_secs_f64();
                self.runs
                    .mark_completed(run_id, total_records, critical_issues, secs)?;
                info!(
                    run_id,
                    total_records,
                    critical_issues,
                    execution_time_secs = secs,
                    "validation run completed"
                );
                Ok(())
            });

        if let Err(e) = outcome {
            let secs = started.elapsed().as_secs_f64();
            error!(run_id, error = %e, "validation run failed");
            if let Err(mark_err) = self.runs.mark_failed(run_id, &e.to_string(), Some(secs)) {
                warn!(run_id, error = %mark_err, "could not record run failure");
            }
            return Err(e);
        }

        self.runs
            .find_by_id(run_id)?
            .ok_or_else(|| JobError::RunNotFound(run_id.to_string()))
    }

    /// Pipeline + artifact; returns (total_records, critical_issues)
    fn execute(&self, run_id: &str) -> JobResult<(i64, i64)> {
        let output = self
            .pipeline
            .run(self.config.config(), self.connector.as_ref())?;
        self.store.save(run_id, &output.rows)?;
        Ok((
            output.total_records() as i64,
            output.critical_issues() as i64,
        ))
    }

    /// create_run + run_job
    pub fn trigger(&self, triggered_by: TriggerType) -> JobResult<ValidationRun> {
        let run = self.create_run(triggered_by)?;
        self.run_job(&run.id)
    }

    /// Run a triggered validation on the blocking pool
    pub fn spawn_job(
        self: Arc<Self>,
        triggered_by: TriggerType,
    ) -> JoinHandle<JobResult<ValidationRun>> {
        tokio::task::spawn_blocking(move || self.trigger(triggered_by))
    }

    /// Await a spawned job, folding a panicked task into JobError
    pub async fn join(handle: JoinHandle<JobResult<ValidationRun>>) -> JobResult<ValidationRun> {
        handle.await.map_err(|e| JobError::Join(e.to_string()))?
    }
}

// ==========================================
// Read side
// ==========================================

/// 1-based page, newest first
pub fn list_runs(runs: &ValidationRunRepository, page: usize) -> JobResult<RunPage> {
    let page = page.max(1);
    let total_runs = runs.count()?;
    let total_pages = total_runs.div_ceil(PAGE_SIZE).max(1);
    let runs = runs.list_recent(PAGE_SIZE, (page - 1) * PAGE_SIZE)?;
    Ok(RunPage {
        runs,
        page,
        total_pages,
        total_runs,
    })
}

pub fn find_run(runs: &ValidationRunRepository, run_id: &str) -> JobResult<ValidationRun> {
    runs.find_by_id(run_id)?
        .ok_or_else(|| JobError::RunNotFound(run_id.to_string()))
}

/// Summary statistics over a run's result artifact
pub fn load_summary(store: &dyn ResultStore, run_id: &str) -> JobResult<ValidationSummary> {
    let rows = store.load(run_id)?;
    Ok(ValidationSummary::from_rows(&rows))
}
