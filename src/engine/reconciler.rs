// ==========================================
// IPO Validation - Reconciler
// ==========================================
// Full outer join of actual usage and plan rows on
// (company, location, part_num, period), then variance and category.
// Missing sides default to 0. Keys repeated within one side are joined
// pairwise and never aggregated.
// ==========================================

use crate::domain::plan::PlanRecord;
use crate::domain::reconciled::ReconciledRow;
use crate::domain::types::VarianceCategory;
use crate::domain::usage::ActualUsage;
use crate::engine::variance::{categorize, variance, variance_percent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinKey {
    pub company: String,
    pub location: String,
    pub part_num: String,
    pub period: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinStats {
    pub usage_rows: usize,
    pub plan_rows: usize,
    pub matched_keys: usize,
    pub usage_only_keys: usize,
    pub plan_only_keys: usize,
    /// Keys appearing more than once on either side
    pub duplicate_keys: usize,
    pub output_rows: usize,
}

/// Build one reconciled row from the two quantities
pub fn reconcile_row(key: &JoinKey, actual_usage: f64, ipo_usage: f64) -> ReconciledRow {
    let variance = variance(actual_usage, ipo_usage);
    ReconciledRow {
        company: key.company.clone(),
        location: key.location.clone(),
        part_num: key.part_num.clone(),
        period: key.period,
        actual_usage,
        ipo_usage,
        variance,
        variance_percent: variance_percent(actual_usage, ipo_usage),
        absolute_variance: variance.abs(),
        variance_category: categorize(actual_usage, ipo_usage),
    }
}

pub struct Reconciler;

impl Reconciler {
    /// Output is ordered by join key
    pub fn reconcile(
        &self,
        actual: Vec<ActualUsage>,
        plan: Vec<PlanRecord>,
    ) -> (Vec<ReconciledRow>, JoinStats) {
        let mut stats = JoinStats {
            usage_rows: actual.len(),
            plan_rows: plan.len(),
            ..JoinStats::default()
        };

        let mut joined: BTreeMap<JoinKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for row in actual {
            let key = JoinKey {
                company: row.company,
                location: row.location,
                part_num: row.part_num,
                period: row.period,
            };
            joined.entry(key).or_default().0.push(row.actual_usage);
        }
        for row in plan {
            let key = JoinKey {
                company: row.company,
                location: row.location,
                part_num: row.part_num,
                period: row.period,
            };
            joined.entry(key).or_default().1.push(row.ipo_usage);
        }

        let mut rows = Vec::with_capacity(joined.len());
        for (key, (actuals, ipos)) in &joined {
            if actuals.len() > 1 || ipos.len() > 1 {
                stats.duplicate_keys += 1;
            }
            match (actuals.is_empty(), ipos.is_empty()) {
                (false, false) => {
                    stats.matched_keys += 1;
                    for actual_usage in actuals {
                        for ipo_usage in ipos {
                            rows.push(reconcile_row(key, *actual_usage, *ipo_usage));
                        }
                    }
                }
                (false, true) => {
                    stats.usage_only_keys += 1;
                    rows.extend(actuals.iter().map(|a| reconcile_row(key, *a, 0.0)));
                }
                (true, false) => {
                    stats.plan_only_keys += 1;
                    rows.extend(ipos.iter().map(|i| reconcile_row(key, 0.0, *i)));
                }
                (true, true) => {}
            }
        }
        stats.output_rows = rows.len();

        if stats.duplicate_keys > 0 {
            warn!(
                duplicate_keys = stats.duplicate_keys,
                "join keys repeated within a source; rows joined pairwise without aggregation"
            );
        }
        info!(
            usage_rows = stats.usage_rows,
            plan_rows = stats.plan_rows,
            matched = stats.matched_keys,
            usage_only = stats.usage_only_keys,
            plan_only = stats.plan_only_keys,
            output_rows = stats.output_rows,
            "outer join complete"
        );
        log_distribution(&rows);

        (rows, stats)
    }
}

pub fn category_counts(rows: &[ReconciledRow]) -> HashMap<VarianceCategory, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.variance_category).or_insert(0) += 1;
    }
    counts
}

fn log_distribution(rows: &[ReconciledRow]) {
    let counts = category_counts(rows);
    for category in VarianceCategory::ALL {
        let count = counts.get(&category).copied().unwrap_or(0);
        info!(category = %category, rows = count, "variance category");
    }
    if let Some(errors) = counts.get(&VarianceCategory::Error) {
        error!(rows = *errors, "rows matched no variance category");
    }
}
