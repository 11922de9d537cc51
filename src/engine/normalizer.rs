// ==========================================
// IPO Validation - Normalizers
// ==========================================
// Usage ledger and planning feed -> canonical
// (company, location, part_num, period, quantity) rows.
// Data-quality conditions become sentinel values and are counted,
// they never fail the run.
// ==========================================

use crate::config::validation_config::{LocationMap, UsageRule, ValidationWindow};
use crate::domain::plan::{PlanRecord, RawPlanRow};
use crate::domain::usage::{RawUsageRow, UsageRecord};
use crate::engine::composite_key::CompositeKey;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Location value for a (company, plant) pair with no mapping
pub const UNMAPPED_LOCATION_PREFIX: &str = "UNMAPPED_LOCATION";

/// Location value for a ledger row whose composite key could not be parsed
pub const MALFORMED_KEY_PREFIX: &str = "MALFORMED_KEY";

/// Last calendar day of the date's month. Idempotent.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

pub fn unmapped_location(company: &str, plant: &str) -> String {
    format!("{}_{}_{}", UNMAPPED_LOCATION_PREFIX, company, plant)
}

// ==========================================
// DataQualityReport
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub malformed_keys: usize,
    pub unmapped_locations: usize,
    pub negative_usage_rows: usize,
    pub negative_plan_rows: usize,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.malformed_keys == 0
            && self.unmapped_locations == 0
            && self.negative_usage_rows == 0
            && self.negative_plan_rows == 0
    }
}

// ==========================================
// UsageNormalizer
// ==========================================
pub struct UsageNormalizer<'a> {
    locations: &'a LocationMap,
    rule: &'a UsageRule,
    window: &'a ValidationWindow,
}

impl<'a> UsageNormalizer<'a> {
    pub fn new(locations: &'a LocationMap, rule: &'a UsageRule, window: &'a ValidationWindow) -> Self {
        Self {
            locations,
            rule,
            window,
        }
    }

    /// Configured location name for a (company, plant) pair
    pub fn map_location(&self, company: &str, plant: &str) -> Option<String> {
        self.locations.resolve(company, plant).map(str::to_string)
    }

    /// Normalize ledger rows. Rows of denylisted companies are dropped;
    /// every other row yields exactly one record.
    pub fn normalize(
        &self,
        rows: Vec<RawUsageRow>,
        report: &mut DataQualityReport,
    ) -> Vec<UsageRecord> {
        let input = rows.len();
        let mut dropped_companies = 0usize;
        let mut out = Vec::with_capacity(input);

        for row in rows {
            // a. composite key
            let key = match CompositeKey::parse(&row.company_plant_part) {
                Ok(key) => Ok(key),
                Err(malformed) => {
                    let mut parts = row.company_plant_part.splitn(3, '_');
                    let partial = CompositeKey {
                        company: parts.next().unwrap_or_default().to_string(),
                        plant: parts.next().unwrap_or_default().to_string(),
                        part_num: String::new(),
                    };
                    Err((partial, malformed))
                }
            };

            // e. company denylist
            let company = match &key {
                Ok(k) | Err((k, _)) => k.company.as_str(),
            };
            if self.window.is_excluded_company(company) {
                dropped_companies += 1;
                continue;
            }

            // b. location
            let (key, location) = match key {
                Ok(key) => {
                    let location = match self.map_location(&key.company, &key.plant) {
                        Some(name) => name,
                        None => {
                            report.unmapped_locations += 1;
                            unmapped_location(&key.company, &key.plant)
                        }
                    };
                    (key, location)
                }
                Err((partial, malformed)) => {
                    report.malformed_keys += 1;
                    warn!(key = %row.company_plant_part, "{}", malformed);
                    let location = format!("{}_{}", MALFORMED_KEY_PREFIX, row.company_plant_part);
                    (partial, location)
                }
            };

            // c. usage rule
            let actual_usage = self.rule.calculate(&key.company, &key.plant, &row.components);
            if actual_usage < 0.0 {
                report.negative_usage_rows += 1;
            }

            // d. period, f. plant retained for the exclusion filter
            out.push(UsageRecord {
                company: key.company,
                location,
                plant: key.plant,
                part_num: key.part_num,
                period: end_of_month(row.end_of_month),
                actual_usage,
            });
        }

        if report.unmapped_locations > 0 {
            warn!(
                rows = report.unmapped_locations,
                "ledger rows with unmapped locations"
            );
        }
        debug!(dropped_companies, "denylisted company rows dropped");
        info!(input, output = out.len(), "usage ledger normalized");
        out
    }
}

// ==========================================
// PlanNormalizer
// ==========================================
pub struct PlanNormalizer;

impl PlanNormalizer {
    /// Rename to the canonical schema and move Period to month end.
    /// Location is used as given by the feed.
    pub fn normalize(&self, rows: Vec<RawPlanRow>, report: &mut DataQualityReport) -> Vec<PlanRecord> {
        let input = rows.len();
        let out: Vec<PlanRecord> = rows
            .into_iter()
            .map(|row| {
                if row.qty < 0.0 {
                    report.negative_plan_rows += 1;
                }
                PlanRecord {
                    company: row.company,
                    location: row.location,
                    part_num: row.product,
                    period: end_of_month(row.period),
                    ipo_usage: row.qty,
                }
            })
            .collect();

        info!(input, output = out.len(), "planning feed normalized");
        out
    }
}
