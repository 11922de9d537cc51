// ==========================================
// IPO Validation - Engine Layer
// ==========================================
// Responsibilities: the reconciliation core. Normalization, exclusion,
// outer join, variance, categorization and their orchestration.
// Rule: no SQL and no storage access in this layer; sources are reached
// through importer::SourceConnector only.
// ==========================================

pub mod composite_key;
pub mod error;
pub mod exclusion;
pub mod normalizer;
pub mod orchestrator;
pub mod reconciler;
pub mod summary;
pub mod variance;

pub use composite_key::{CompositeKey, MalformedKey};
pub use error::{PipelineError, PipelineResult};
pub use exclusion::{build_exclusion_set, ExclusionStats};
pub use normalizer::{end_of_month, DataQualityReport, PlanNormalizer, UsageNormalizer};
pub use orchestrator::{PipelineOutput, ValidationPipeline};
pub use reconciler::{JoinKey, JoinStats, Reconciler};
pub use summary::ValidationSummary;
pub use variance::{categorize, variance_percent};
