// ==========================================
// IPO Validation - Usage Ledger Models
// ==========================================
// Raw ledger rows (as extracted) and the normalized forms the pipeline
// passes between stages
// ==========================================

use crate::domain::types::UsageComponent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// UsageComponents - the four ledger value columns
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageComponents {
    pub ic: f64,
    pub indirect: f64,
    pub direct: f64,
    pub rent: f64,
}

impl UsageComponents {
    pub fn get(&self, component: UsageComponent) -> f64 {
        match component {
            UsageComponent::Ic => self.ic,
            UsageComponent::Indirect => self.indirect,
            UsageComponent::Direct => self.direct,
            UsageComponent::Rent => self.rent,
        }
    }

    pub fn set(&mut self, component: UsageComponent, value: f64) {
        match component {
            UsageComponent::Ic => self.ic = value,
            UsageComponent::Indirect => self.indirect = value,
            UsageComponent::Direct => self.direct = value,
            UsageComponent::Rent => self.rent = value,
        }
    }

    /// Sum of the listed components
    pub fn sum_of(&self, components: &[UsageComponent]) -> f64 {
        components.iter().map(|c| self.get(*c)).sum()
    }
}

// ==========================================
// RawUsageRow - one PartUsage row from the source
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUsageRow {
    pub company_plant_part: String, // "COMPANY_PLANT_PARTNUM"
    pub end_of_month: NaiveDate,
    pub components: UsageComponents,
}

// ==========================================
// UsageRecord - normalized ledger row (plant retained)
// ==========================================
// One per (company, plant, part_num, period) from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub company: String,
    pub location: String,
    pub plant: String,
    pub part_num: String,
    pub period: NaiveDate, // last day of the month
    pub actual_usage: f64,
}

impl UsageRecord {
    /// Drop the plant code once exclusion matching no longer needs it
    pub fn into_actual(self) -> ActualUsage {
        ActualUsage {
            company: self.company,
            location: self.location,
            part_num: self.part_num,
            period: self.period,
            actual_usage: self.actual_usage,
        }
    }
}

// ==========================================
// ActualUsage - ledger row in join schema
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualUsage {
    pub company: String,
    pub location: String,
    pub part_num: String,
    pub period: NaiveDate,
    pub actual_usage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_components() {
        let components = UsageComponents {
            ic: 5.0,
            indirect: 2.0,
            direct: 1.5,
            rent: 100.0,
        };
        let total = components.sum_of(&[
            UsageComponent::Ic,
            UsageComponent::Indirect,
            UsageComponent::Direct,
        ]);
        assert_eq!(total, 8.5);
        assert_eq!(components.sum_of(&[]), 0.0);
    }

    #[test]
    fn test_into_actual_drops_plant() {
        let record = UsageRecord {
            company: "SAINC".to_string(),
            location: "StoneAge Durango".to_string(),
            plant: "MfgSys".to_string(),
            part_num: "ABX 326".to_string(),
            period: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            actual_usage: 4.0,
        };
        let actual = record.into_actual();
        assert_eq!(actual.company, "SAINC");
        assert_eq!(actual.part_num, "ABX 326");
        assert_eq!(actual.actual_usage, 4.0);
    }
}
