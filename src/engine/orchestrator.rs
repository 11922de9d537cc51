// ==========================================
// IPO Validation - Pipeline Orchestrator
// ==========================================
// Fixed order:
//   1. validate configuration
//   2. extract usage ledger
//   3. extract planning feed
//   4. normalize both sources
//   5. exclusion filter (optional, fetches metadata)
//   6. outer join + variance + category
//   7. summary log
// The source connection is held by a SourceSession and released on every
// exit path. Nothing is persisted here.
// ==========================================

use crate::config::ValidationConfig;
use crate::domain::reconciled::ReconciledRow;
use crate::domain::types::VarianceCategory;
use crate::engine::error::PipelineResult;
use crate::engine::exclusion::{self, ExclusionStats};
use crate::engine::normalizer::{DataQualityReport, PlanNormalizer, UsageNormalizer};
use crate::engine::reconciler::{JoinStats, Reconciler};
use crate::importer::source::{SourceConnector, SourceSession};
use crate::perf::PerfGuard;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// PipelineOutput
// ==========================================
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub rows: Vec<ReconciledRow>,
    pub data_quality: DataQualityReport,
    pub exclusion_stats: ExclusionStats,
    pub join_stats: JoinStats,
    pub elapsed: Duration,
}

impl PipelineOutput {
    pub fn total_records(&self) -> usize {
        self.rows.len()
    }

    /// Rows missing from either system
    pub fn critical_issues(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.variance_category.is_critical())
            .count()
    }

    pub fn count(&self, category: VarianceCategory) -> usize {
        self.rows
            .iter()
            .filter(|r| r.variance_category == category)
            .count()
    }
}

// ==========================================
// ValidationPipeline
// ==========================================
/// Stateless; one `run` call per validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPipeline;

impl ValidationPipeline {
    pub fn new() -> Self {
        Self
    }

    pub fn run(
        &self,
        config: &ValidationConfig,
        connector: &dyn SourceConnector,
    ) -> PipelineResult<PipelineOutput> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let window = &config.validation;

        info!(
            run_id = %run_id,
            start_date = %window.start_date,
            end_date = %window.end_date,
            companies = %window.companies.join(", "),
            apply_exclusions = config.options.apply_exclusions,
            "validation pipeline started"
        );

        // ==========================================
        // Step 1: configuration
        // ==========================================
        config.validate()?;

        let mut session = SourceSession::open(connector)?;

        // ==========================================
        // Step 2: usage ledger
        // ==========================================
        debug!("step 2: extracting usage ledger");
        let raw_usage = {
            let mut perf = PerfGuard::new("extract_part_usage");
            let rows = session
                .source()
                .fetch_part_usage(window.start_date, window.end_date)?;
            perf.set_rows(rows.len());
            rows
        };

        // ==========================================
        // Step 3: planning feed
        // ==========================================
        debug!("step 3: extracting planning feed");
        let raw_plan = {
            let mut perf = PerfGuard::new("extract_ipo_validation");
            let rows = session
                .source()
                .fetch_ipo_validation(window.start_date, window.end_date)?;
            perf.set_rows(rows.len());
            rows
        };

        // ==========================================
        // Step 4: normalization
        // ==========================================
        debug!("step 4: normalizing sources");
        let mut data_quality = DataQualityReport::default();
        let usage = {
            let mut perf = PerfGuard::new("normalize_usage");
            let normalizer = UsageNormalizer::new(
                &config.mappings.locations,
                &config.rules.usage_calculation,
                window,
            );
            let rows = normalizer.normalize(raw_usage, &mut data_quality);
            perf.set_rows(rows.len());
            rows
        };
        let plan = {
            let mut perf = PerfGuard::new("normalize_plan");
            let rows = PlanNormalizer.normalize(raw_plan, &mut data_quality);
            perf.set_rows(rows.len());
            rows
        };

        // ==========================================
        // Step 5: exclusion filter
        // ==========================================
        let (actual, exclusion_stats) = if config.options.apply_exclusions {
            debug!("step 5: applying exclusion filter");
            let mut perf = PerfGuard::new("exclusion_filter");
            let metadata = session.source().fetch_part_metadata(&window.companies)?;
            let filtered = exclusion::apply(usage, &metadata);
            perf.set_rows(filtered.0.len());
            filtered
        } else {
            debug!("step 5: exclusion filter disabled");
            exclusion::drop_plant(usage)
        };

        // extraction is complete; release the connection before the join
        drop(session);

        // ==========================================
        // Step 6: reconciliation
        // ==========================================
        debug!("step 6: reconciling");
        let (rows, join_stats) = {
            let mut perf = PerfGuard::new("reconcile");
            let result = Reconciler.reconcile(actual, plan);
            perf.set_rows(result.0.len());
            result
        };

        // ==========================================
        // Step 7: summary
        // ==========================================
        let output = PipelineOutput {
            run_id,
            rows,
            data_quality,
            exclusion_stats,
            join_stats,
            elapsed: started.elapsed(),
        };

        if !output.data_quality.is_clean() {
            warn!(
                malformed_keys = output.data_quality.malformed_keys,
                unmapped_locations = output.data_quality.unmapped_locations,
                negative_usage_rows = output.data_quality.negative_usage_rows,
                negative_plan_rows = output.data_quality.negative_plan_rows,
                "data quality conditions present in output"
            );
        }
        info!(
            run_id = %run_id,
            total_records = output.total_records(),
            critical_issues = output.critical_issues(),
            elapsed_secs = output.elapsed.as_secs_f64(),
            "validation pipeline completed"
        );

        Ok(output)
    }
}
