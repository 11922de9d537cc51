// ==========================================
// IPO Validation - Part Metadata
// ==========================================
// Only used to build the exclusion set; never persisted
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// MethodCode - IP&O planning method (Number02)
// ==========================================
// Source systems disagree on the column type, so the value is kept in the
// form it arrived in and compared loosely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodCode {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl MethodCode {
    /// Codes 1, 2 and 3 mark parts that IP&O does not plan.
    ///
    /// Matches both numeric and string forms: `1`, `1.0`, `"1"` and the
    /// decimal text of a `Number02` export (`"1.0"`, `"1.000"`) are the same
    /// code.
    pub fn is_unplanned(&self) -> bool {
        match self {
            MethodCode::Integer(v) => (1..=3).contains(v),
            MethodCode::Real(v) => is_unplanned_value(*v),
            MethodCode::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(is_unplanned_value)
                .unwrap_or(false),
        }
    }
}

fn is_unplanned_value(v: f64) -> bool {
    v == 1.0 || v == 2.0 || v == 3.0
}

impl fmt::Display for MethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodCode::Integer(v) => write!(f, "{}", v),
            MethodCode::Real(v) => write!(f, "{}", v),
            MethodCode::Text(s) => f.write_str(s),
        }
    }
}

// ==========================================
// PartMetadata - Part / PartPlant classification
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartMetadata {
    pub company: String,
    pub part_num: String,
    pub plant: String,
    pub class_id: Option<String>,
    pub inactive: bool,
    pub runout: bool,
    pub nonstock: bool,
    pub ipo_method_code: Option<MethodCode>,
}

impl PartMetadata {
    pub fn new(company: &str, plant: &str, part_num: &str) -> Self {
        Self {
            company: company.to_string(),
            part_num: part_num.to_string(),
            plant: plant.to_string(),
            class_id: None,
            inactive: false,
            runout: false,
            nonstock: false,
            ipo_method_code: None,
        }
    }
}
