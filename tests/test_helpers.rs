// ==========================================
// Test Helpers
// ==========================================
// Temporary SQLite sources, sample configuration, and an in-memory
// source that counts connection opens/closes
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use ipo_validation::config::ValidationConfig;
use ipo_validation::domain::{MethodCode, PartMetadata, RawPlanRow, RawUsageRow, UsageComponents};
use ipo_validation::importer::{
    create_source_schema, DataSource, SourceConnector, SourceError, SourceResult,
};
use rusqlite::{params, Connection};
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ==========================================
// SQLite source
// ==========================================

/// Empty source database inside a temp dir
///
/// # Returns
/// - TempDir: keep alive for the test's duration
/// - PathBuf: database file path
pub fn create_source_db() -> Result<(TempDir, PathBuf), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("source.db");
    let conn = Connection::open(&db_path)?;
    create_source_schema(&conn)?;
    Ok((dir, db_path))
}

pub fn insert_usage(
    conn: &Connection,
    key: &str,
    end_of_month: &str,
    components: [f64; 4],
) -> rusqlite::Result<()> {
    let [ic, indirect, direct, rent] = components;
    conn.execute(
        r#"
        INSERT INTO PartUsage (company_plant_part, endOfMonth, ICUsage, IndirectUsage, DirectUsage, RentUsage)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![key, end_of_month, ic, indirect, direct, rent],
    )?;
    Ok(())
}

pub fn insert_plan(
    conn: &Connection,
    company: &str,
    location: &str,
    product: &str,
    period: &str,
    qty: f64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO IPOValidation (Company, Location, Product, Period, Qty) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![company, location, product, period, qty],
    )?;
    Ok(())
}

pub fn insert_inactive_part(
    conn: &Connection,
    company: &str,
    part_num: &str,
    plant: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO PartMetadata (Company, PartNum, Plant, ClassID, InActive, Runout, NonStock, ipo_method_code)
        VALUES (?1, ?2, ?3, 'FG', 1, 0, 0, NULL)
        "#,
        params![company, part_num, plant],
    )?;
    Ok(())
}

// ==========================================
// Configuration
// ==========================================

/// SAINC/SAUK config over a SQLite source for Jan..Aug 2025
pub fn sample_config(db_path: &Path, apply_exclusions: bool) -> ValidationConfig {
    let value = json!({
        "source": { "kind": "sqlite", "path": db_path },
        "validation": {
            "start_date": "2025-01-01",
            "end_date": "2025-08-31",
            "companies": ["SAINC", "SAUK"],
            "excluded_companies": ["TEST"]
        },
        "mappings": {
            "locations": {
                "SAINC": { "MfgSys": "StoneAge Durango", "SAILA": "StoneAge Louisiana" },
                "SAUK": { "UKP": "StoneAge UK" }
            }
        },
        "rules": {
            "usage_calculation": {
                "exception": {
                    "company": "SAINC",
                    "plant": "MfgSys",
                    "components": ["ICUsage", "IndirectUsage", "DirectUsage"]
                },
                "default_component": "DirectUsage"
            }
        },
        "options": { "apply_exclusions": apply_exclusions }
    });
    ValidationConfig::from_json_str(&value.to_string()).unwrap()
}

// ==========================================
// In-memory source
// ==========================================

#[derive(Clone, Default)]
pub struct ConnectionCounters {
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl ConnectionCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct MockConnector {
    pub usage: Vec<RawUsageRow>,
    pub plan: Vec<RawPlanRow>,
    pub metadata: Vec<PartMetadata>,
    /// "usage" | "plan" | "metadata": that fetch fails
    pub fail_on: Option<&'static str>,
    pub counters: ConnectionCounters,
}

impl MockConnector {
    pub fn usage_row(mut self, key: &str, end_of_month: NaiveDate, ic: f64, direct: f64) -> Self {
        self.usage.push(RawUsageRow {
            company_plant_part: key.to_string(),
            end_of_month,
            components: UsageComponents {
                ic,
                indirect: 0.0,
                direct,
                rent: 0.0,
            },
        });
        self
    }

    pub fn plan_row(mut self, company: &str, location: &str, product: &str, period: NaiveDate, qty: f64) -> Self {
        self.plan.push(RawPlanRow {
            company: company.to_string(),
            location: location.to_string(),
            product: product.to_string(),
            period,
            qty,
        });
        self
    }

    pub fn method_code(mut self, company: &str, plant: &str, part_num: &str, code: MethodCode) -> Self {
        let mut meta = PartMetadata::new(company, plant, part_num);
        meta.ipo_method_code = Some(code);
        self.metadata.push(meta);
        self
    }

    pub fn failing_on(mut self, stage: &'static str) -> Self {
        self.fail_on = Some(stage);
        self
    }
}

impl SourceConnector for MockConnector {
    fn connect(&self) -> SourceResult<Box<dyn DataSource>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSource {
            data: self.clone(),
            open: true,
        }))
    }
}

pub struct MockSource {
    data: MockConnector,
    open: bool,
}

impl MockSource {
    fn check(&self, stage: &str) -> SourceResult<()> {
        if !self.open {
            return Err(SourceError::Closed);
        }
        if self.data.fail_on == Some(stage) {
            return Err(SourceError::DatabaseQueryError(format!("{} query failed", stage)));
        }
        Ok(())
    }
}

impl DataSource for MockSource {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn fetch_part_usage(&mut self, start: NaiveDate, end: NaiveDate) -> SourceResult<Vec<RawUsageRow>> {
        self.check("usage")?;
        Ok(self
            .data
            .usage
            .iter()
            .filter(|r| r.end_of_month >= start && r.end_of_month <= end)
            .cloned()
            .collect())
    }

    fn fetch_ipo_validation(&mut self, start: NaiveDate, end: NaiveDate) -> SourceResult<Vec<RawPlanRow>> {
        self.check("plan")?;
        Ok(self
            .data
            .plan
            .iter()
            .filter(|r| r.period >= start && r.period <= end)
            .cloned()
            .collect())
    }

    fn fetch_part_metadata(&mut self, companies: &[String]) -> SourceResult<Vec<PartMetadata>> {
        self.check("metadata")?;
        Ok(self
            .data
            .metadata
            .iter()
            .filter(|m| companies.contains(&m.company))
            .cloned()
            .collect())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.data.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
