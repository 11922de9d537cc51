// ==========================================
// IPO Validation - Core Library
// ==========================================
// Reconciles the part-usage ledger against the IP&O planning feed:
// normalize -> exclude -> outer join -> variance -> category
// Stack: Rust + SQLite (rusqlite) + CSV/Excel sources
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain - row types and enums
pub mod domain;

// Configuration - typed, validated at load
pub mod config;

// Source extraction - SQLite / file sources
pub mod importer;

// Engine - reconciliation core
pub mod engine;

// Repository - run metadata and result artifacts
pub mod repository;

// Application - job layer
pub mod app;

// SQLite connection setup
pub mod db;

// Logging
pub mod logging;

// Stage timing
pub mod perf;

// ==========================================
// Re-exports
// ==========================================

pub use domain::{
    ActualUsage, PartMetadata, PlanRecord, ReconciledRow, TriggerType, UsageRecord,
    ValidationRun, ValidationStatus, VarianceCategory,
};

pub use config::{ConfigError, ConfigManager, ValidationConfig};

pub use importer::{DataSource, SourceConnector, SourceError, SourceSession};

pub use engine::{
    categorize, variance_percent, PipelineError, PipelineOutput, ValidationPipeline,
    ValidationSummary,
};

pub use repository::{CsvResultStore, RepositoryError, ResultStore, ValidationRunRepository};

pub use app::{JobError, ValidationJobService};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "IPO Validation";
