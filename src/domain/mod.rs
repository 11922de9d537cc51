// ==========================================
// IPO Validation - Domain Layer
// ==========================================
// Run-scoped, immutable row types. Nothing here performs I/O.
// ==========================================

pub mod metadata;
pub mod plan;
pub mod reconciled;
pub mod types;
pub mod usage;
pub mod validation;

pub use metadata::{MethodCode, PartMetadata};
pub use plan::{PlanRecord, RawPlanRow};
pub use reconciled::{ReconciledRow, RECONCILED_COLUMNS};
pub use types::{TriggerType, UsageComponent, ValidationStatus, VarianceCategory};
pub use usage::{ActualUsage, RawUsageRow, UsageComponents, UsageRecord};
pub use validation::ValidationRun;
