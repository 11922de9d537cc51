// ==========================================
// IPO Validation - Validation Run
// ==========================================
// One entry per triggered run; owned by the job layer
// ==========================================

use crate::domain::types::{TriggerType, ValidationStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Run id format, e.g. `20250901_080000`
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRun {
    // ===== identity =====
    pub id: String,
    pub created_at: NaiveDateTime,
    pub triggered_by: TriggerType,

    // ===== scope =====
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub companies: Vec<String>,

    // ===== lifecycle =====
    pub status: ValidationStatus,
    pub total_records: Option<i64>,
    pub critical_issues: Option<i64>,
    pub execution_time_secs: Option<f64>,
    pub error: Option<String>,

    // effective configuration at creation time (JSON)
    pub config_snapshot: Option<String>,
}

impl ValidationRun {
    /// New pending run; id derived from the creation timestamp
    pub fn pending(
        created_at: NaiveDateTime,
        triggered_by: TriggerType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        companies: Vec<String>,
    ) -> Self {
        Self {
            id: created_at.format(RUN_ID_FORMAT).to_string(),
            created_at,
            triggered_by,
            start_date,
            end_date,
            companies,
            status: ValidationStatus::Pending,
            total_records: None,
            critical_issues: None,
            execution_time_secs: None,
            error: None,
            config_snapshot: None,
        }
    }
}
