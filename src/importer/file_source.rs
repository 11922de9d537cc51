// ==========================================
// IPO Validation - File Source
// ==========================================
// Dataset exports (.csv/.xlsx/.xls), one file per dataset.
// Date and company filters are applied in memory.
// ==========================================

use crate::domain::metadata::PartMetadata;
use crate::domain::plan::RawPlanRow;
use crate::domain::usage::RawUsageRow;
use crate::importer::error::{SourceError, SourceResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileParser, RawRecord, UniversalFileParser};
use crate::importer::source::{DataSource, SourceConnector};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileConnector {
    part_usage: PathBuf,
    ipo_validation: PathBuf,
    part_metadata: Option<PathBuf>,
}

impl FileConnector {
    pub fn new(part_usage: PathBuf, ipo_validation: PathBuf, part_metadata: Option<PathBuf>) -> Self {
        Self {
            part_usage,
            ipo_validation,
            part_metadata,
        }
    }
}

impl SourceConnector for FileConnector {
    fn connect(&self) -> SourceResult<Box<dyn DataSource>> {
        for path in [&self.part_usage, &self.ipo_validation] {
            if !path.exists() {
                return Err(SourceError::FileNotFound(path.display().to_string()));
            }
        }
        Ok(Box::new(FileDataSource {
            part_usage: self.part_usage.clone(),
            ipo_validation: self.ipo_validation.clone(),
            part_metadata: self.part_metadata.clone(),
            parser: Box::new(UniversalFileParser),
            mapper: FieldMapper,
        }))
    }
}

pub struct FileDataSource {
    part_usage: PathBuf,
    ipo_validation: PathBuf,
    part_metadata: Option<PathBuf>,
    parser: Box<dyn FileParser>,
    mapper: FieldMapper,
}

impl FileDataSource {
    /// Parse a dataset file and map each row; row numbers are 1-based data rows
    fn load<T>(
        &self,
        path: &Path,
        map: impl Fn(&FieldMapper, &RawRecord, usize) -> SourceResult<T>,
    ) -> SourceResult<Vec<T>> {
        let records = self.parser.parse_to_raw_records(path)?;
        debug!(file = %path.display(), rows = records.len(), "file parsed");
        records
            .iter()
            .enumerate()
            .map(|(idx, record)| map(&self.mapper, record, idx + 1))
            .collect()
    }
}

impl DataSource for FileDataSource {
    fn describe(&self) -> String {
        format!("files:{}", self.part_usage.parent().unwrap_or(Path::new(".")).display())
    }

    fn fetch_part_usage(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<Vec<RawUsageRow>> {
        let rows: Vec<RawUsageRow> = self
            .load(&self.part_usage, |m, r, n| m.map_usage_row(r, n))?
            .into_iter()
            .filter(|r| r.end_of_month >= start && r.end_of_month <= end)
            .collect();
        info!(rows = rows.len(), "PartUsage retrieved");
        Ok(rows)
    }

    fn fetch_ipo_validation(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<Vec<RawPlanRow>> {
        let rows: Vec<RawPlanRow> = self
            .load(&self.ipo_validation, |m, r, n| m.map_plan_row(r, n))?
            .into_iter()
            .filter(|r| r.period >= start && r.period <= end)
            .collect();
        info!(rows = rows.len(), "IPOValidation retrieved");
        Ok(rows)
    }

    fn fetch_part_metadata(&mut self, companies: &[String]) -> SourceResult<Vec<PartMetadata>> {
        let path = self
            .part_metadata
            .clone()
            .ok_or_else(|| SourceError::NotConfigured("part_metadata".to_string()))?;
        let rows: Vec<PartMetadata> = self
            .load(&path, |m, r, n| m.map_metadata_row(r, n))?
            .into_iter()
            .filter(|r| companies.iter().any(|c| c == &r.company))
            .collect();
        info!(rows = rows.len(), "part metadata retrieved");
        Ok(rows)
    }

    fn close(&mut self) {
        debug!("file source has no connection to release");
    }
}
