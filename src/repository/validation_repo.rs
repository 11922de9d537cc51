// ==========================================
// IPO Validation - Validation Run Repository
// ==========================================
// Table: validation_runs (one row per triggered run)
// Rule: no business logic here beyond guarding status transitions
// ==========================================

use crate::db::{open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::types::{TriggerType, ValidationStatus};
use crate::domain::validation::ValidationRun;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS validation_runs (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    triggered_by TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    companies TEXT NOT NULL,
    status TEXT NOT NULL,
    total_records INTEGER,
    critical_issues INTEGER,
    execution_time_secs REAL,
    error TEXT,
    config_snapshot TEXT
);
CREATE INDEX IF NOT EXISTS idx_validation_runs_created_at ON validation_runs(created_at);
"#;

const SELECT_COLUMNS: &str = r#"
    id, created_at, triggered_by, start_date, end_date, companies, status,
    total_records, critical_issues, execution_time_secs, error, config_snapshot
"#;

// ==========================================
// ValidationRunRepository
// ==========================================
pub struct ValidationRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ValidationRunRepository {
    /// Open the metadata database and create the schema if needed
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        if read_schema_version(&conn)?.is_none() {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![CURRENT_SCHEMA_VERSION],
            )?;
            info!(version = CURRENT_SCHEMA_VERSION, "run metadata schema created");
        }
        Ok(())
    }

    pub fn insert(&self, run: &ValidationRun) -> RepositoryResult<()> {
        let companies = serde_json::to_string(&run.companies).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "companies".to_string(),
                message: e.to_string(),
            }
        })?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO validation_runs (
                id, created_at, triggered_by, start_date, end_date, companies, status,
                total_records, critical_issues, execution_time_secs, error, config_snapshot
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                run.id,
                run.created_at.format(DATETIME_FORMAT).to_string(),
                run.triggered_by.as_str(),
                run.start_date.to_string(),
                run.end_date.to_string(),
                companies,
                run.status.as_str(),
                run.total_records,
                run.critical_issues,
                run.execution_time_secs,
                run.error,
                run.config_snapshot,
            ],
        )?;
        debug!(run_id = %run.id, "validation run inserted");
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ValidationRun>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM validation_runs WHERE id = ?1", SELECT_COLUMNS);
        let raw = conn
            .query_row(&sql, params![id], RawRun::from_row)
            .optional()?;
        raw.map(RawRun::into_run).transpose()
    }

    /// Newest first
    pub fn list_recent(&self, limit: usize, offset: usize) -> RepositoryResult<Vec<ValidationRun>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM validation_runs ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
            .query_map(params![limit as i64, offset as i64], RawRun::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawRun::into_run).collect()
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM validation_runs", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    // ==========================================
    // Status transitions
    // ==========================================

    /// pending -> running
    pub fn mark_running(&self, id: &str) -> RepositoryResult<()> {
        self.transition(
            id,
            &[ValidationStatus::Pending],
            ValidationStatus::Running,
            |conn| {
                conn.execute(
                    "UPDATE validation_runs SET status = ?2 WHERE id = ?1 AND status = ?3",
                    params![
                        id,
                        ValidationStatus::Running.as_str(),
                        ValidationStatus::Pending.as_str()
                    ],
                )
            },
        )
    }

    /// running -> completed
    pub fn mark_completed(
        &self,
        id: &str,
        total_records: i64,
        critical_issues: i64,
        execution_time_secs: f64,
    ) -> RepositoryResult<()> {
        self.transition(
            id,
            &[ValidationStatus::Running],
            ValidationStatus::Completed,
            |conn| {
                conn.execute(
                    r#"
                    UPDATE validation_runs
                    SET status = ?2, total_records = ?3, critical_issues = ?4,
                        execution_time_secs = ?5, error = NULL
                    WHERE id = ?1 AND status = ?6
                    "#,
                    params![
                        id,
                        ValidationStatus::Completed.as_str(),
                        total_records,
                        critical_issues,
                        execution_time_secs,
                        ValidationStatus::Running.as_str()
                    ],
                )
            },
        )
    }

    /// pending | running -> failed
    pub fn mark_failed(
        &self,
        id: &str,
        error: &str,
        execution_time_secs: Option<f64>,
    ) -> RepositoryResult<()> {
        self.transition(
            id,
            &[ValidationStatus::Pending, ValidationStatus::Running],
            ValidationStatus::Failed,
            |conn| {
                conn.execute(
                    r#"
                    UPDATE validation_runs
                    SET status = ?2, error = ?3, execution_time_secs = ?4
                    WHERE id = ?1 AND status IN (?5, ?6)
                    "#,
                    params![
                        id,
                        ValidationStatus::Failed.as_str(),
                        error,
                        execution_time_secs,
                        ValidationStatus::Pending.as_str(),
                        ValidationStatus::Running.as_str()
                    ],
                )
            },
        )
    }

    /// Run a guarded UPDATE; zero affected rows means missing id or bad transition
    fn transition(
        &self,
        id: &str,
        allowed_from: &[ValidationStatus],
        to: ValidationStatus,
        update: impl FnOnce(&Connection) -> rusqlite::Result<usize>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = update(&conn)?;
        if changed == 1 {
            debug!(run_id = %id, status = %to, "validation run status updated");
            return Ok(());
        }

        let current: Option<String> = conn
            .query_row(
                "SELECT status FROM validation_runs WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            None => Err(RepositoryError::NotFound {
                entity: "ValidationRun".to_string(),
                id: id.to_string(),
            }),
            Some(from) => {
                debug!(run_id = %id, from = %from, allowed = ?allowed_from, "transition rejected");
                Err(RepositoryError::InvalidStateTransition {
                    from,
                    to: to.as_str().to_string(),
                })
            }
        }
    }
}

// ==========================================
// Row mapping
// ==========================================
struct RawRun {
    id: String,
    created_at: String,
    triggered_by: String,
    start_date: String,
    end_date: String,
    companies: String,
    status: String,
    total_records: Option<i64>,
    critical_issues: Option<i64>,
    execution_time_secs: Option<f64>,
    error: Option<String>,
    config_snapshot: Option<String>,
}

fn field_error(field: &str, message: impl ToString) -> RepositoryError {
    RepositoryError::FieldValueError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

impl RawRun {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            triggered_by: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            companies: row.get(5)?,
            status: row.get(6)?,
            total_records: row.get(7)?,
            critical_issues: row.get(8)?,
            execution_time_secs: row.get(9)?,
            error: row.get(10)?,
            config_snapshot: row.get(11)?,
        })
    }

    fn into_run(self) -> RepositoryResult<ValidationRun> {
        Ok(ValidationRun {
            created_at: NaiveDateTime::parse_from_str(&self.created_at, DATETIME_FORMAT)
                .map_err(|e| field_error("created_at", e))?,
            triggered_by: self
                .triggered_by
                .parse::<TriggerType>()
                .map_err(|e| field_error("triggered_by", e))?,
            start_date: NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
                .map_err(|e| field_error("start_date", e))?,
            end_date: NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d")
                .map_err(|e| field_error("end_date", e))?,
            companies: serde_json::from_str(&self.companies)
                .map_err(|e| field_error("companies", e))?,
            status: self
                .status
                .parse::<ValidationStatus>()
                .map_err(|e| field_error("status", e))?,
            id: self.id,
            total_records: self.total_records,
            critical_issues: self.critical_issues,
            execution_time_secs: self.execution_time_secs,
            error: self.error,
            config_snapshot: self.config_snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ValidationRunRepository {
        let conn = Connection::open_in_memory().unwrap();
        let repo = ValidationRunRepository::from_connection(Arc::new(Mutex::new(conn)));
        repo.ensure_schema().unwrap();
        repo
    }

    fn run(hour: u32) -> ValidationRun {
        let created_at = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        ValidationRun::pending(
            created_at,
            TriggerType::Manual,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            vec!["SAINC".to_string(), "SAUK".to_string()],
        )
    }

    #[test]
    fn test_insert_and_find() {
        let repo = repo();
        let run = run(8);
        repo.insert(&run).unwrap();

        let loaded = repo.find_by_id(&run.id).unwrap().unwrap();
        assert_eq!(loaded, run);
        assert!(repo.find_by_id("19990101_000000").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let repo = repo();
        repo.insert(&run(8)).unwrap();
        let err = repo.insert(&run(8)).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_lifecycle_completed() {
        let repo = repo();
        let run = run(8);
        repo.insert(&run).unwrap();

        repo.mark_running(&run.id).unwrap();
        repo.mark_completed(&run.id, 120, 7, 1.5).unwrap();

        let loaded = repo.find_by_id(&run.id).unwrap().unwrap();
        assert_eq!(loaded.status, ValidationStatus::Completed);
        assert_eq!(loaded.total_records, Some(120));
        assert_eq!(loaded.critical_issues, Some(7));
        assert_eq!(loaded.execution_time_secs, Some(1.5));
    }

    #[test]
    fn test_invalid_transitions() {
        let repo = repo();
        let run = run(8);
        repo.insert(&run).unwrap();

        // pending -> completed skips running
        let err = repo.mark_completed(&run.id, 1, 0, 0.1).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));

        repo.mark_failed(&run.id, "source unavailable", None).unwrap();
        let err = repo.mark_running(&run.id).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));

        let loaded = repo.find_by_id(&run.id).unwrap().unwrap();
        assert_eq!(loaded.error.as_deref(), Some("source unavailable"));

        let err = repo.mark_running("missing").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_list_recent_paging() {
        let repo = repo();
        for hour in [6, 8, 7] {
            repo.insert(&run(hour)).unwrap();
        }

        let first = repo.list_recent(2, 0).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "20250901_080000");
        assert_eq!(first[1].id, "20250901_070000");

        let rest = repo.list_recent(2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(repo.count().unwrap(), 3);
    }
}
