// ==========================================
// IPO Validation - Result Artifact Store
// ==========================================
// One flat table per run, keyed by run id.
// CsvResultStore layout: <dir>/<run_id>.csv
// ==========================================

use crate::domain::reconciled::{ReconciledRow, RECONCILED_COLUMNS};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub trait ResultStore: Send + Sync {
    fn save(&self, run_id: &str, rows: &[ReconciledRow]) -> RepositoryResult<()>;
    fn load(&self, run_id: &str) -> RepositoryResult<Vec<ReconciledRow>>;
    fn exists(&self, run_id: &str) -> bool;
}

pub struct CsvResultStore {
    dir: PathBuf,
}

impl CsvResultStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> RepositoryResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Run ids become file names, so path separators are rejected
    fn path_for(&self, run_id: &str) -> RepositoryResult<PathBuf> {
        if run_id.is_empty()
            || run_id.contains(['/', '\\'])
            || run_id.contains("..")
        {
            return Err(RepositoryError::ArtifactIo(format!(
                "invalid run id for artifact path: {:?}",
                run_id
            )));
        }
        Ok(self.dir.join(format!("{}.csv", run_id)))
    }
}

impl ResultStore for CsvResultStore {
    fn save(&self, run_id: &str, rows: &[ReconciledRow]) -> RepositoryResult<()> {
        let path = self.path_for(run_id)?;
        let tmp = path.with_extension("csv.tmp");

        let written = write_csv(&tmp, rows)
            .and_then(|()| fs::rename(&tmp, &path).map_err(RepositoryError::from));
        if let Err(e) = written {
            if tmp.exists() {
                if let Err(rm_err) = fs::remove_file(&tmp) {
                    warn!(run_id, error = %rm_err, path = %tmp.display(), "could not remove partial artifact");
                }
            }
            return Err(e);
        }

        info!(run_id, rows = rows.len(), path = %path.display(), "results saved");
        Ok(())
    }

    fn load(&self, run_id: &str) -> RepositoryResult<Vec<ReconciledRow>> {
        let path = self.path_for(run_id)?;
        if !path.exists() {
            return Err(RepositoryError::NotFound {
                entity: "ValidationResult".to_string(),
                id: run_id.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let rows = reader
            .deserialize::<ReconciledRow>()
            .collect::<Result<Vec<_>, _>>()?;
        debug!(run_id, rows = rows.len(), "results loaded");
        Ok(rows)
    }

    fn exists(&self, run_id: &str) -> bool {
        self.path_for(run_id).map(|p| p.exists()).unwrap_or(false)
    }
}

fn write_csv(path: &Path, rows: &[ReconciledRow]) -> RepositoryResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(RECONCILED_COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::VarianceCategory;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample() -> ReconciledRow {
        ReconciledRow {
            company: "SAINC".to_string(),
            location: "StoneAge Durango".to_string(),
            part_num: "ABX 326".to_string(),
            period: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            actual_usage: 5.0,
            ipo_usage: 0.0,
            variance: -5.0,
            variance_percent: -999.99,
            absolute_variance: 5.0,
            variance_category: VarianceCategory::MissingFromIpo,
        }
    }

    #[test]
    fn test_save_writes_artifact_columns() {
        let dir = TempDir::new().unwrap();
        let store = CsvResultStore::new(dir.path()).unwrap();
        store.save("20250901_080000", &[sample()]).unwrap();

        let text = fs::read_to_string(dir.path().join("20250901_080000.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), RECONCILED_COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "SAINC,StoneAge Durango,ABX 326,2025-08-31,5.0,0.0,-5.0,-999.99,5.0,Missing From IP&O"
        );
        assert_eq!(store.load("20250901_080000").unwrap(), vec![sample()]);
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let dir = TempDir::new().unwrap();
        let store = CsvResultStore::new(dir.path()).unwrap();
        store.save("20250901_080000", &[]).unwrap();

        assert!(store.exists("20250901_080000"));
        assert!(store.load("20250901_080000").unwrap().is_empty());
    }

    #[test]
    fn test_missing_and_invalid_ids() {
        let dir = TempDir::new().unwrap();
        let store = CsvResultStore::new(dir.path()).unwrap();

        assert!(!store.exists("20250901_080000"));
        assert!(matches!(
            store.load("20250901_080000"),
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(!store.exists("../escape"));
        assert!(store.save("../escape", &[]).is_err());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = CsvResultStore::new(dir.path()).unwrap();
        // a directory in the artifact's place makes the final rename fail
        fs::create_dir(dir.path().join("20250901_080000.csv")).unwrap();

        assert!(store.save("20250901_080000", &[sample()]).is_err());
        assert!(!dir.path().join("20250901_080000.csv.tmp").exists());
    }
}
