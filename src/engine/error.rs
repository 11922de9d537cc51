// ==========================================
// IPO Validation - Pipeline Errors
// ==========================================
// Anything the pipeline cannot resolve with a sentinel. Nothing here is
// caught inside the pipeline; the job layer records it on the run.
// ==========================================

use crate::config::ConfigError;
use crate::importer::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
