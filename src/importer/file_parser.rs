// ==========================================
// IPO Validation - File Parsers
// ==========================================
// Supports: Excel (.xlsx/.xls) / CSV (.csv)
// Output: one HashMap<column, value> per non-blank row, values trimmed
// ==========================================

use crate::importer::error::{SourceError, SourceResult};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

pub type RawRecord = HashMap<String, String>;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// Parse a file into raw row records
    fn parse_to_raw_records(&self, file_path: &Path) -> SourceResult<Vec<RawRecord>>;
}

fn check_exists(path: &Path) -> SourceResult<()> {
    if !path.exists() {
        return Err(SourceError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> SourceResult<Vec<RawRecord>> {
        check_exists(file_path)?;

        let ext = extension(file_path);
        if ext != "csv" {
            return Err(SourceError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // tolerate ragged rows
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// ExcelParser - first worksheet only
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// Cell to text; date cells become `YYYY-MM-DD`
    fn cell_text(cell: &Data) -> String {
        match cell {
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
            Data::DateTimeIso(s) => s.clone(),
            Data::Empty => String::new(),
            other => other.to_string(),
        }
        .trim()
        .to_string()
    }
}

/// Excel 1900 date system serial number to calendar date
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> SourceResult<Vec<RawRecord>> {
        check_exists(file_path)?;

        let ext = extension(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(SourceError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| SourceError::ExcelParseError("workbook has no sheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| SourceError::ExcelParseError("worksheet has no header row".to_string()))?;

        let headers: Vec<String> = header_row.iter().map(Self::cell_text).collect();

        let mut records = Vec::new();
        for data_row in rows {
            let mut row_map = HashMap::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), Self::cell_text(cell));
                }
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// UniversalFileParser - dispatch on extension
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> SourceResult<Vec<RawRecord>> {
        match extension(file_path).as_str() {
            "csv" => CsvParser.parse_to_raw_records(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(file_path),
            other => Err(SourceError::UnsupportedFormat(other.to_string())),
        }
    }
}
