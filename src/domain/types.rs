// ==========================================
// IPO Validation - Domain Types
// ==========================================
// Enumerations shared by the normalizers, the reconciler and the job layer
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// VarianceCategory - reconciled row classification
// ==========================================
// Serialized with the display labels, which is also the artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VarianceCategory {
    #[serde(rename = "Perfect Match")]
    PerfectMatch,
    #[serde(rename = "Missing From Usage")]
    MissingFromUsage,
    #[serde(rename = "Missing From IP&O")]
    MissingFromIpo,
    #[serde(rename = "More In IP&O")]
    MoreInIpo,
    #[serde(rename = "More In Usage")]
    MoreInUsage,
    /// Invariant violation marker. Never produced for finite inputs.
    #[serde(rename = "ERROR")]
    Error,
}

impl VarianceCategory {
    /// The five real categories, in classification precedence order
    pub const ALL: [VarianceCategory; 5] = [
        VarianceCategory::PerfectMatch,
        VarianceCategory::MissingFromUsage,
        VarianceCategory::MissingFromIpo,
        VarianceCategory::MoreInIpo,
        VarianceCategory::MoreInUsage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VarianceCategory::PerfectMatch => "Perfect Match",
            VarianceCategory::MissingFromUsage => "Missing From Usage",
            VarianceCategory::MissingFromIpo => "Missing From IP&O",
            VarianceCategory::MoreInIpo => "More In IP&O",
            VarianceCategory::MoreInUsage => "More In Usage",
            VarianceCategory::Error => "ERROR",
        }
    }

    /// Missing from either system
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            VarianceCategory::MissingFromIpo | VarianceCategory::MissingFromUsage
        )
    }
}

impl fmt::Display for VarianceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// UsageComponent - usage ledger value columns
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageComponent {
    #[serde(rename = "ICUsage")]
    Ic,
    #[serde(rename = "IndirectUsage")]
    Indirect,
    #[serde(rename = "DirectUsage")]
    Direct,
    #[serde(rename = "RentUsage")]
    Rent,
}

impl UsageComponent {
    pub const ALL: [UsageComponent; 4] = [
        UsageComponent::Ic,
        UsageComponent::Indirect,
        UsageComponent::Direct,
        UsageComponent::Rent,
    ];

    /// Source column name
    pub fn column(&self) -> &'static str {
        match self {
            UsageComponent::Ic => "ICUsage",
            UsageComponent::Indirect => "IndirectUsage",
            UsageComponent::Direct => "DirectUsage",
            UsageComponent::Rent => "RentUsage",
        }
    }
}

impl fmt::Display for UsageComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ==========================================
// ValidationStatus - validation run lifecycle
// ==========================================
// pending -> running -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pending => "pending",
            ValidationStatus::Running => "running",
            ValidationStatus::Completed => "completed",
            ValidationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ValidationStatus::Pending),
            "running" => Ok(ValidationStatus::Running),
            "completed" => Ok(ValidationStatus::Completed),
            "failed" => Ok(ValidationStatus::Failed),
            other => Err(format!("unknown validation status: {}", other)),
        }
    }
}

// ==========================================
// TriggerType - who started the run
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Manual,
    Scheduler,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Manual => "manual",
            TriggerType::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(TriggerType::Manual),
            "scheduler" => Ok(TriggerType::Scheduler),
            other => Err(format!("unknown trigger type: {}", other)),
        }
    }
}
