// ==========================================
// IPO Validation - Source Extraction Layer
// ==========================================
// Responsibilities: read PartUsage / IPOValidation / part metadata
// Supports: SQLite database, Excel / CSV exports
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod file_source;
pub mod source;
pub mod sqlite_source;

pub use error::{SourceError, SourceResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use file_source::{FileConnector, FileDataSource};
pub use source::{connector_for, DataSource, SourceConnector, SourceSession};
pub use sqlite_source::{create_source_schema, SqliteConnector, SqliteDataSource};
