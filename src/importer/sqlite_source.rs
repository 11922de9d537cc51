// ==========================================
// IPO Validation - SQLite Source
// ==========================================
// Tables: PartUsage / IPOValidation / PartMetadata
// All queries parameterized; dates compared on the date part only
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::metadata::{MethodCode, PartMetadata};
use crate::domain::plan::RawPlanRow;
use crate::domain::usage::{RawUsageRow, UsageComponents};
use crate::importer::error::{SourceError, SourceResult};
use crate::importer::field_mapper::{columns, parse_bool_value, parse_date_value};
use crate::importer::source::{DataSource, SourceConnector};
use crate::perf::install_sqlite_tracing;
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::PathBuf;
use tracing::{info, warn};

/// Source schema, used by the sample seeder and tests
pub const SOURCE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS PartUsage (
    company_plant_part TEXT NOT NULL,
    endOfMonth TEXT NOT NULL,
    ICUsage REAL,
    IndirectUsage REAL,
    DirectUsage REAL,
    RentUsage REAL,
    ICTranCount INTEGER,
    IndirectTranCount INTEGER,
    DirectTranCount INTEGER,
    RentTranCount INTEGER
);
CREATE TABLE IF NOT EXISTS IPOValidation (
    Company TEXT NOT NULL,
    Location TEXT NOT NULL,
    Product TEXT NOT NULL,
    Period TEXT NOT NULL,
    Qty REAL
);
CREATE TABLE IF NOT EXISTS PartMetadata (
    Company TEXT NOT NULL,
    PartNum TEXT NOT NULL,
    Plant TEXT NOT NULL,
    ClassID TEXT,
    InActive INTEGER,
    Runout INTEGER,
    NonStock INTEGER,
    ipo_method_code
);
"#;

pub fn create_source_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SOURCE_SCHEMA_SQL)
}

// ==========================================
// SqliteConnector
// ==========================================
pub struct SqliteConnector {
    db_path: PathBuf,
}

impl SqliteConnector {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl SourceConnector for SqliteConnector {
    fn connect(&self) -> SourceResult<Box<dyn DataSource>> {
        if !self.db_path.exists() {
            return Err(SourceError::DatabaseConnectionError(format!(
                "database file not found: {}",
                self.db_path.display()
            )));
        }
        let path = self.db_path.to_string_lossy();
        let mut conn = open_sqlite_connection(&path)
            .map_err(|e| SourceError::DatabaseConnectionError(e.to_string()))?;
        install_sqlite_tracing(&mut conn);

        Ok(Box::new(SqliteDataSource {
            conn: Some(conn),
            db_path: self.db_path.clone(),
        }))
    }
}

// ==========================================
// SqliteDataSource
// ==========================================
pub struct SqliteDataSource {
    conn: Option<Connection>,
    db_path: PathBuf,
}

impl SqliteDataSource {
    /// Wrap an already-open connection (tests, in-memory sources)
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Some(conn),
            db_path: PathBuf::from(":memory:"),
        }
    }

    fn conn(&self) -> SourceResult<&Connection> {
        self.conn.as_ref().ok_or(SourceError::Closed)
    }
}

fn date_column(row: &Row<'_>, idx: usize, field: &str, row_number: usize) -> SourceResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date_value(&raw).ok_or(SourceError::DateFormatError {
        row: row_number,
        field: field.to_string(),
        value: raw,
    })
}

fn flag_column(row: &Row<'_>, idx: usize, field: &str, row_number: usize) -> SourceResult<bool> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(false),
        ValueRef::Integer(v) => Ok(v != 0),
        ValueRef::Real(v) => Ok(v != 0.0),
        ValueRef::Text(t) => {
            let text = String::from_utf8_lossy(t);
            parse_bool_value(&text).ok_or_else(|| SourceError::TypeConversionError {
                row: row_number,
                field: field.to_string(),
                message: format!("not a boolean: {}", text),
            })
        }
        ValueRef::Blob(_) => Err(SourceError::TypeConversionError {
            row: row_number,
            field: field.to_string(),
            message: "blob value".to_string(),
        }),
    }
}

fn method_code_column(row: &Row<'_>, idx: usize) -> SourceResult<Option<MethodCode>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(v) => Some(MethodCode::Integer(v)),
        ValueRef::Real(v) => Some(MethodCode::Real(v)),
        ValueRef::Text(t) => {
            let text = String::from_utf8_lossy(t).trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(MethodCode::Text(text))
            }
        }
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

impl DataSource for SqliteDataSource {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }

    fn fetch_part_usage(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<Vec<RawUsageRow>> {
        info!(%start, %end, "querying PartUsage");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT company_plant_part, endOfMonth, ICUsage, IndirectUsage, DirectUsage, RentUsage
            FROM PartUsage
            WHERE date(endOfMonth) >= ?1 AND date(endOfMonth) <= ?2
            "#,
        )?;

        let mut rows = stmt.query(params![start.to_string(), end.to_string()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let row_number = out.len() + 1;
            let components = UsageComponents {
                ic: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                indirect: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                direct: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                rent: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
            };
            out.push(RawUsageRow {
                company_plant_part: row.get(0)?,
                end_of_month: date_column(row, 1, columns::END_OF_MONTH, row_number)?,
                components,
            });
        }

        info!(rows = out.len(), "PartUsage retrieved");
        Ok(out)
    }

    fn fetch_ipo_validation(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourceResult<Vec<RawPlanRow>> {
        info!(%start, %end, "querying IPOValidation");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT Company, Location, Product, Period, Qty
            FROM IPOValidation
            WHERE date(Period) >= ?1 AND date(Period) <= ?2
            "#,
        )?;

        let mut rows = stmt.query(params![start.to_string(), end.to_string()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let row_number = out.len() + 1;
            out.push(RawPlanRow {
                company: row.get(0)?,
                location: row.get(1)?,
                product: row.get(2)?,
                period: date_column(row, 3, columns::PERIOD, row_number)?,
                qty: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
            });
        }

        info!(rows = out.len(), "IPOValidation retrieved");
        Ok(out)
    }

    fn fetch_part_metadata(&mut self, companies: &[String]) -> SourceResult<Vec<PartMetadata>> {
        info!(companies = %companies.join(", "), "querying part metadata");
        if companies.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; companies.len()].join(", ");
        let sql = format!(
            r#"
            SELECT Company, PartNum, Plant, ClassID, InActive, Runout, NonStock, ipo_method_code
            FROM PartMetadata
            WHERE Company IN ({})
            "#,
            placeholders
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(companies.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let row_number = out.len() + 1;
            let class_id: Option<String> = row.get(3)?;
            out.push(PartMetadata {
                company: row.get(0)?,
                part_num: row.get(1)?,
                plant: row.get(2)?,
                class_id: class_id
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
                inactive: flag_column(row, 4, columns::INACTIVE, row_number)?,
                runout: flag_column(row, 5, columns::RUNOUT, row_number)?,
                nonstock: flag_column(row, 6, columns::NONSTOCK, row_number)?,
                ipo_method_code: method_code_column(row, 7)?,
            });
        }

        info!(rows = out.len(), "part metadata retrieved");
        Ok(out)
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, e)) = conn.close() {
                warn!(error = %e, "source connection close reported an error");
            }
        }
    }
}
