// ==========================================
// IPO Validation - Reconciled Row
// ==========================================
// Output of the full outer join. Field order is the artifact column order:
// company, location, part_num, period, actual_usage, ipo_usage, variance,
// variance_percent, absolute_variance, variance_category
// ==========================================

use crate::domain::types::VarianceCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    // ===== join key =====
    pub company: String,
    pub location: String,
    pub part_num: String,
    pub period: NaiveDate,

    // ===== both sides, missing side = 0 =====
    pub actual_usage: f64,
    pub ipo_usage: f64,

    // ===== derived =====
    pub variance: f64,          // ipo_usage - actual_usage
    pub variance_percent: f64,  // see engine::variance
    pub absolute_variance: f64, // |variance|
    pub variance_category: VarianceCategory,
}

/// Artifact header, in column order
pub const RECONCILED_COLUMNS: [&str; 10] = [
    "company",
    "location",
    "part_num",
    "period",
    "actual_usage",
    "ipo_usage",
    "variance",
    "variance_percent",
    "absolute_variance",
    "variance_category",
];
