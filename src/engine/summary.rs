// ==========================================
// IPO Validation - Summary Statistics
// ==========================================
// Aggregation over a reconciled table, for run listings and the
// `show` command. Reads the artifact; never feeds back into the pipeline.
// ==========================================

use crate::domain::reconciled::ReconciledRow;
use crate::domain::types::VarianceCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// (YYYY-MM, location, category label) -> rows
pub type MonthlyBreakdown = BTreeMap<String, BTreeMap<String, BTreeMap<String, usize>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarianceStats {
    pub mean_abs_variance: f64,
    pub median_abs_variance: f64,
    pub max_abs_variance: f64,
    pub total_abs_variance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_records: usize,
    pub total_variances: usize,
    pub perfect_matches: usize,
    pub critical_issues: usize,

    pub by_category: BTreeMap<String, usize>,
    pub by_company: BTreeMap<String, usize>,
    pub by_location: BTreeMap<String, usize>,

    /// company -> category label -> rows
    pub company_breakdown: BTreeMap<String, BTreeMap<String, usize>>,
    /// location -> category label -> rows
    pub location_breakdown: BTreeMap<String, BTreeMap<String, usize>>,
    pub monthly_breakdown: MonthlyBreakdown,

    pub earliest_period: Option<NaiveDate>,
    pub latest_period: Option<NaiveDate>,
    pub total_months: usize,

    pub variance: VarianceStats,
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

impl ValidationSummary {
    pub fn from_rows(rows: &[ReconciledRow]) -> Self {
        let mut summary = ValidationSummary {
            total_records: rows.len(),
            ..Self::default()
        };
        let mut months = BTreeSet::new();
        let mut abs_variances = Vec::with_capacity(rows.len());

        for row in rows {
            let category = row.variance_category.label();
            let month = row.period.format("%Y-%m").to_string();

            if row.variance_category == VarianceCategory::PerfectMatch {
                summary.perfect_matches += 1;
            } else {
                summary.total_variances += 1;
            }
            if row.variance_category.is_critical() {
                summary.critical_issues += 1;
            }

            bump(&mut summary.by_category, category);
            bump(&mut summary.by_company, &row.company);
            bump(&mut summary.by_location, &row.location);
            bump(
                summary
                    .company_breakdown
                    .entry(row.company.clone())
                    .or_default(),
                category,
            );
            bump(
                summary
                    .location_breakdown
                    .entry(row.location.clone())
                    .or_default(),
                category,
            );
            bump(
                summary
                    .monthly_breakdown
                    .entry(month.clone())
                    .or_default()
                    .entry(row.location.clone())
                    .or_default(),
                category,
            );

            summary.earliest_period = Some(match summary.earliest_period {
                Some(p) if p <= row.period => p,
                _ => row.period,
            });
            summary.latest_period = Some(match summary.latest_period {
                Some(p) if p >= row.period => p,
                _ => row.period,
            });
            months.insert(month);
            abs_variances.push(row.absolute_variance);
        }

        summary.total_months = months.len();

        if !abs_variances.is_empty() {
            abs_variances.sort_by(|a, b| a.total_cmp(b));
            let total: f64 = abs_variances.iter().sum();
            summary.variance = VarianceStats {
                mean_abs_variance: total / abs_variances.len() as f64,
                median_abs_variance: median(&abs_variances),
                max_abs_variance: abs_variances.last().copied().unwrap_or(0.0),
                total_abs_variance: total,
            };
        }

        summary
    }
}
