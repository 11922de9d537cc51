// ==========================================
// IPO Validation - Exclusion Filter
// ==========================================
// A part is excluded for a (company, plant) when its metadata row is
// inactive, runout, non-stock, of class RAW/CSM, or planned with method
// code 1/2/3. Duplicate metadata rows collapse into the same set entry.
// ==========================================

use crate::domain::metadata::PartMetadata;
use crate::domain::usage::{ActualUsage, UsageRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Class codes that are never reconciled
pub const EXCLUDED_CLASS_IDS: [&str; 2] = ["RAW", "CSM"];

/// (company, plant, part_num)
pub type ExclusionKey = (String, String, String);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExclusionStats {
    pub applied: bool,
    pub metadata_rows: usize,
    pub excluded_parts: usize,
    pub rows_before: usize,
    pub rows_removed: usize,
}

impl ExclusionStats {
    pub fn removed_percent(&self) -> f64 {
        if self.rows_before == 0 {
            return 0.0;
        }
        self.rows_removed as f64 * 100.0 / self.rows_before as f64
    }
}

/// Does this metadata row match any exclusion criterion?
pub fn is_excluded(meta: &PartMetadata) -> bool {
    meta.inactive
        || meta.runout
        || meta.nonstock
        || meta
            .class_id
            .as_deref()
            .map(|c| EXCLUDED_CLASS_IDS.contains(&c.trim()))
            .unwrap_or(false)
        || meta
            .ipo_method_code
            .as_ref()
            .map(|code| code.is_unplanned())
            .unwrap_or(false)
}

pub fn build_exclusion_set(metadata: &[PartMetadata]) -> HashSet<ExclusionKey> {
    metadata
        .iter()
        .filter(|meta| is_excluded(meta))
        .map(|meta| {
            (
                meta.company.clone(),
                meta.plant.clone(),
                meta.part_num.clone(),
            )
        })
        .collect()
}

/// Remove excluded usage rows and drop `plant`
pub fn apply(
    rows: Vec<UsageRecord>,
    metadata: &[PartMetadata],
) -> (Vec<ActualUsage>, ExclusionStats) {
    let excluded = build_exclusion_set(metadata);
    let rows_before = rows.len();

    let lookup: HashSet<(&str, &str, &str)> = excluded
        .iter()
        .map(|(company, plant, part)| (company.as_str(), plant.as_str(), part.as_str()))
        .collect();

    let kept: Vec<ActualUsage> = rows
        .into_iter()
        .filter(|row| {
            !lookup.contains(&(
                row.company.as_str(),
                row.plant.as_str(),
                row.part_num.as_str(),
            ))
        })
        .map(UsageRecord::into_actual)
        .collect();

    let stats = ExclusionStats {
        applied: true,
        metadata_rows: metadata.len(),
        excluded_parts: excluded.len(),
        rows_before,
        rows_removed: rows_before - kept.len(),
    };

    info!(
        metadata_rows = stats.metadata_rows,
        excluded_parts = stats.excluded_parts,
        rows_removed = stats.rows_removed,
        removed_percent = format!("{:.1}", stats.removed_percent()),
        rows_after = kept.len(),
        "exclusion filter applied"
    );

    (kept, stats)
}

/// Exclusions disabled: every row passes, `plant` is dropped
pub fn drop_plant(rows: Vec<UsageRecord>) -> (Vec<ActualUsage>, ExclusionStats) {
    let rows_before = rows.len();
    let kept: Vec<ActualUsage> = rows.into_iter().map(UsageRecord::into_actual).collect();
    info!(rows = kept.len(), "exclusion filter skipped");
    (
        kept,
        ExclusionStats {
            rows_before,
            ..ExclusionStats::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metadata::MethodCode;
    use chrono::NaiveDate;

    fn usage(company: &str, plant: &str, part: &str, qty: f64) -> UsageRecord {
        UsageRecord {
            company: company.to_string(),
            location: "StoneAge Durango".to_string(),
            plant: plant.to_string(),
            part_num: part.to_string(),
            period: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            actual_usage: qty,
        }
    }

    #[test]
    fn test_each_criterion_excludes() {
        let mut inactive = PartMetadata::new("SAINC", "MfgSys", "A");
        inactive.inactive = true;
        let mut runout = PartMetadata::new("SAINC", "MfgSys", "B");
        runout.runout = true;
        let mut nonstock = PartMetadata::new("SAINC", "MfgSys", "C");
        nonstock.nonstock = true;
        let mut raw = PartMetadata::new("SAINC", "MfgSys", "D");
        raw.class_id = Some("RAW".to_string());
        let mut csm = PartMetadata::new("SAINC", "MfgSys", "E");
        csm.class_id = Some("CSM".to_string());
        let mut method_int = PartMetadata::new("SAINC", "MfgSys", "F");
        method_int.ipo_method_code = Some(MethodCode::Integer(2));
        let mut method_text = PartMetadata::new("SAINC", "MfgSys", "G");
        method_text.ipo_method_code = Some(MethodCode::Text("3".to_string()));

        for meta in [inactive, runout, nonstock, raw, csm, method_int, method_text] {
            assert!(is_excluded(&meta), "{} should be excluded", meta.part_num);
        }
    }

    #[test]
    fn test_eligible_part_not_excluded() {
        let mut meta = PartMetadata::new("SAINC", "MfgSys", "OK");
        meta.class_id = Some("FG".to_string());
        meta.ipo_method_code = Some(MethodCode::Integer(4));
        assert!(!is_excluded(&meta));
    }

    #[test]
    fn test_apply_removes_inactive_regardless_of_usage() {
        let mut meta = PartMetadata::new("SAINC", "MfgSys", "ABC123");
        meta.inactive = true;
        let duplicate = meta.clone();

        let rows = vec![
            usage("SAINC", "MfgSys", "ABC123", 10_000.0),
            usage("SAINC", "SAILA", "ABC123", 1.0), // other plant
            usage("SAINC", "MfgSys", "XYZ", 1.0),
        ];

        let (kept, stats) = apply(rows, &[meta, duplicate]);

        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| !(r.part_num == "ABC123" && r.actual_usage == 10_000.0)));
        assert_eq!(stats.excluded_parts, 1);
        assert_eq!(stats.rows_removed, 1);
        assert!(stats.applied);
    }

    #[test]
    fn test_drop_plant_keeps_everything() {
        let rows = vec![
            usage("SAINC", "MfgSys", "ABC123", 1.0),
            usage("SAINC", "SAILA", "ABC123", 2.0),
        ];
        let (kept, stats) = drop_plant(rows);
        assert_eq!(kept.len(), 2);
        assert!(!stats.applied);
        assert_eq!(stats.rows_removed, 0);
    }
}
