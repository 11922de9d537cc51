// ==========================================
// IPO Validation - Source Extraction Errors
// ==========================================
// Source-unavailable and unreadable-row conditions. These propagate to the
// job layer; the source connection is still released by SourceSession.
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    // ===== files =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== row mapping =====
    #[error("missing column in {dataset} (row {row}): {column}")]
    MissingColumn {
        dataset: &'static str,
        row: usize,
        column: &'static str,
    },

    #[error("type conversion failed (row {row}, field {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("bad date (row {row}, field {field}): {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    // ===== database =====
    #[error("source connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("source query failed: {0}")]
    DatabaseQueryError(String),

    #[error("source already closed")]
    Closed,

    // ===== configuration of the source =====
    #[error("dataset not configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::FileReadError(err.to_string())
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("unable to open") => {
                SourceError::DatabaseConnectionError(msg)
            }
            rusqlite::Error::SqliteFailure(e, None)
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                SourceError::DatabaseConnectionError(e.to_string())
            }
            _ => SourceError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        SourceError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for SourceError {
    fn from(err: calamine::Error) -> Self {
        SourceError::ExcelParseError(err.to_string())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
