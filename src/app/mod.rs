// ==========================================
// IPO Validation - Application Layer
// ==========================================
// Responsibilities: job orchestration around the pipeline, data directory
// layout (run metadata database + result artifacts)
// ==========================================

pub mod validation_job;

pub use validation_job::{
    find_run, list_runs, load_summary, JobError, JobResult, RunPage, ValidationJobService,
    PAGE_SIZE,
};

use std::path::PathBuf;

/// Overrides the data directory
pub const DATA_DIR_ENV: &str = "IPO_VALIDATION_DATA_DIR";

/// Run metadata database file name inside the data directory
pub const RUNS_DB_FILE: &str = "validation_runs.db";

/// Result artifact directory name inside the data directory
pub const RESULTS_DIR: &str = "results";

/// Data directory: `$IPO_VALIDATION_DATA_DIR`, else the platform data dir,
/// else `./ipo_validation_data`
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        #[cfg(debug_assertions)]
        Some(dir) => dir.join("ipo-validation-dev"),
        #[cfg(not(debug_assertions))]
        Some(dir) => dir.join("ipo-validation"),
        None => PathBuf::from("./ipo_validation_data"),
    }
}
