// ==========================================
// IPO Validation - Sample Source Seeder
// ==========================================
// Writes a small SQLite source (PartUsage / IPOValidation / PartMetadata)
// plus a matching config.json next to it.
// Usage: seed_sample_source [db_path]
// ==========================================

use chrono::Local;
use ipo_validation::db::open_sqlite_connection;
use ipo_validation::importer::create_source_schema;
use rusqlite::{params, Connection};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::Path;

const DEFAULT_DB_PATH: &str = "./sample_source.db";

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    create_source_schema(&conn)?;
    seed(&conn)?;
    write_config(&db_path)?;
    print_quick_counts(&conn)?;

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let tx = conn.unchecked_transaction()?;

    // (company_plant_part, endOfMonth, IC, Indirect, Direct, Rent)
    let usage: [(&str, &str, f64, f64, f64, f64); 8] = [
        ("SAINC_MfgSys_ABC123", "2025-08-31", 5.0, 0.0, 0.0, 0.0),
        ("SAINC_MfgSys_ABX 326", "2025-08-31", 2.0, 1.0, 3.0, 0.0),
        ("SAINC_SAILA_NZ_100", "2025-07-31", 0.0, 0.0, 12.0, 4.0),
        ("SAINC_SAILA_NZ_100", "2025-08-31", 0.0, 0.0, 9.0, 0.0),
        ("SAINC_SAILA_RAW-7", "2025-08-31", 0.0, 0.0, 40.0, 0.0),
        ("SAUK_UKP_HP-20", "2025-08-31", 0.0, 0.0, 6.0, 0.0),
        ("SAINC_NEWPLANT_X9", "2025-08-31", 0.0, 0.0, 1.0, 0.0),
        ("BROKENKEY", "2025-08-31", 0.0, 0.0, 1.0, 0.0),
    ];
    for (key, eom, ic, indirect, direct, rent) in usage {
        tx.execute(
            r#"
            INSERT INTO PartUsage (company_plant_part, endOfMonth, ICUsage, IndirectUsage, DirectUsage, RentUsage)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![key, eom, ic, indirect, direct, rent],
        )?;
    }

    // (Company, Location, Product, Period, Qty)
    let plan: [(&str, &str, &str, &str, f64); 5] = [
        ("SAINC", "StoneAge Durango", "ABX 326", "2025-08-01", 6.0),
        ("SAINC", "StoneAge Louisiana", "NZ_100", "2025-07-01", 12.0),
        ("SAINC", "StoneAge Louisiana", "NZ_100", "2025-08-01", 15.0),
        ("SAINC", "StoneAge Durango", "ONLY-PLAN", "2025-08-01", 3.0),
        ("SAUK", "StoneAge UK", "HP-20", "2025-08-01", 4.0),
    ];
    for (company, location, product, period, qty) in plan {
        tx.execute(
            "INSERT INTO IPOValidation (Company, Location, Product, Period, Qty) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![company, location, product, period, qty],
        )?;
    }

    tx.execute(
        r#"
        INSERT INTO PartMetadata (Company, PartNum, Plant, ClassID, InActive, Runout, NonStock, ipo_method_code)
        VALUES ('SAINC', 'RAW-7', 'SAILA', 'RAW', 0, 0, 0, NULL),
               ('SAINC', 'ABC123', 'MfgSys', 'FG', 0, 0, 0, 4),
               ('SAUK', 'HP-20', 'UKP', 'FG', 0, 0, 0, '5')
        "#,
        [],
    )?;

    tx.commit()?;
    Ok(())
}

fn write_config(db_path: &str) -> Result<(), Box<dyn Error>> {
    let db = Path::new(db_path);
    let dir = db.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = db
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    let config = json!({
        "source": { "kind": "sqlite", "path": file_name },
        "validation": {
            "start_date": "2025-01-01",
            "end_date": "2025-08-31",
            "companies": ["SAINC", "SAUK"],
            "excluded_companies": []
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
        "options": { "apply_exclusions": true, "output_format": "csv" }
    });

    let config_path = dir.join("config.json");
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    eprintln!("Wrote {}", config_path.display());
    Ok(())
}

fn print_quick_counts(conn: &Connection) -> Result<(), Box<dyn Error>> {
    for table in ["PartUsage", "IPOValidation", "PartMetadata"] {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        eprintln!("{:<14} {}", table, n);
    }
    Ok(())
}
