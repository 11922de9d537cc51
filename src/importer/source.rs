// ==========================================
// IPO Validation - Source Extraction Interface
// ==========================================
// DataSource: one open connection returning typed source rows
// SourceConnector: opens DataSources
// SourceSession: scoped acquisition, closes the connection on drop
// ==========================================

use crate::config::validation_config::SourceConfig;
use crate::domain::metadata::PartMetadata;
use crate::domain::plan::RawPlanRow;
use crate::domain::usage::RawUsageRow;
use crate::importer::error::SourceResult;
use crate::importer::file_source::FileConnector;
use crate::importer::sqlite_source::SqliteConnector;
use chrono::NaiveDate;
use tracing::{debug, info};

// ==========================================
// DataSource Trait
// ==========================================
pub trait DataSource: Send {
    /// Human-readable name for logs
    fn describe(&self) -> String;

    /// PartUsage rows with `endOfMonth` in [start, end]
    fn fetch_part_usage(&mut self, start: NaiveDate, end: NaiveDate)
        -> SourceResult<Vec<RawUsageRow>>;

    /// IPOValidation rows with `Period` in [start, end]
    fn fetch_ipo_validation(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<Vec<RawPlanRow>>;

    /// Part metadata for the given companies
    fn fetch_part_metadata(&mut self, companies: &[String]) -> SourceResult<Vec<PartMetadata>>;

    /// Release the connection. Must tolerate being called more than once.
    fn close(&mut self);
}

// ==========================================
// SourceConnector Trait
// ==========================================
pub trait SourceConnector: Send + Sync {
    fn connect(&self) -> SourceResult<Box<dyn DataSource>>;
}

/// Connector for the configured source kind
pub fn connector_for(config: &SourceConfig) -> Box<dyn SourceConnector> {
    match config {
        SourceConfig::Sqlite { path } => Box::new(SqliteConnector::new(path.clone())),
        SourceConfig::Files {
            part_usage,
            ipo_validation,
            part_metadata,
        } => Box::new(FileConnector::new(
            part_usage.clone(),
            ipo_validation.clone(),
            part_metadata.clone(),
        )),
    }
}

// ==========================================
// SourceSession - scoped connection
// ==========================================
pub struct SourceSession {
    source: Box<dyn DataSource>,
    description: String,
}

impl SourceSession {
    pub fn open(connector: &dyn SourceConnector) -> SourceResult<Self> {
        let source = connector.connect()?;
        let description = source.describe();
        info!(source = %description, "source connection opened");
        Ok(Self {
            source,
            description,
        })
    }

    pub fn source(&mut self) -> &mut dyn DataSource {
        self.source.as_mut()
    }
}

impl Drop for SourceSession {
    fn drop(&mut self) {
        debug!(source = %self.description, "releasing source connection");
        self.source.close();
        info!(source = %self.description, "source connection closed");
    }
}
