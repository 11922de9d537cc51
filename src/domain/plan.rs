// ==========================================
// IPO Validation - Planning Feed Models
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// RawPlanRow - one IPOValidation row from the source
// ==========================================
// Field names follow the feed: Company, Location, Product, Period, Qty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlanRow {
    pub company: String,
    pub location: String,
    pub product: String,
    pub period: NaiveDate,
    pub qty: f64,
}

// ==========================================
// PlanRecord - normalized planning row
// ==========================================
// Location is taken from the feed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub company: String,
    pub location: String,
    pub part_num: String,
    pub period: NaiveDate,
    pub ipo_usage: f64,
}
