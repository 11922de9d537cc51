// ==========================================
// IPO Validation - Field Mapper
// ==========================================
// Responsibilities: raw file row -> typed source row, with column aliases
// and the value parsing rules shared by every source
// ==========================================

use crate::domain::metadata::{MethodCode, PartMetadata};
use crate::domain::plan::RawPlanRow;
use crate::domain::types::UsageComponent;
use crate::domain::usage::{RawUsageRow, UsageComponents};
use crate::importer::error::{SourceError, SourceResult};
use crate::importer::file_parser::RawRecord;
use chrono::{NaiveDate, NaiveDateTime};

// ==========================================
// Source column names
// ==========================================
pub mod columns {
    // PartUsage
    pub const COMPANY_PLANT_PART: &str = "company_plant_part";
    pub const END_OF_MONTH: &str = "endOfMonth";

    // IPOValidation
    pub const COMPANY: &str = "Company";
    pub const LOCATION: &str = "Location";
    pub const PRODUCT: &str = "Product";
    pub const PERIOD: &str = "Period";
    pub const QTY: &str = "Qty";

    // PartMetadata
    pub const PART_NUM: &str = "PartNum";
    pub const PLANT: &str = "Plant";
    pub const CLASS_ID: &str = "ClassID";
    pub const INACTIVE: &str = "InActive";
    pub const RUNOUT: &str = "Runout";
    pub const NONSTOCK: &str = "NonStock";
    pub const IPO_METHOD_CODE: &str = "ipo_method_code";
}

/// Parse a source date value; time-of-day parts are dropped
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
                .map(|dt| dt.date())
                .ok()
        })
}

/// Loose boolean: 1/0, true/false, y/n, yes/no; blank is false
pub fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "y" | "yes" | "t" | "1.0" => Some(true),
        "0" | "false" | "n" | "no" | "f" | "0.0" | "" => Some(false),
        _ => None,
    }
}

pub struct FieldMapper;

impl FieldMapper {
    // ==========================================
    // Row mapping
    // ==========================================

    /// PartUsage row. Blank usage components read as 0.
    pub fn map_usage_row(&self, row: &RawRecord, row_number: usize) -> SourceResult<RawUsageRow> {
        let company_plant_part = self
            .get_string(row, columns::COMPANY_PLANT_PART)
            .ok_or(SourceError::MissingColumn {
                dataset: "PartUsage",
                row: row_number,
                column: columns::COMPANY_PLANT_PART,
            })?;
        let end_of_month = self.parse_required_date(
            row,
            columns::END_OF_MONTH,
            "PartUsage",
            row_number,
        )?;

        let mut components = UsageComponents::default();
        for component in UsageComponent::ALL {
            let value = self
                .parse_f64(row, component.column(), row_number)?
                .unwrap_or(0.0);
            components.set(component, value);
        }

        Ok(RawUsageRow {
            company_plant_part,
            end_of_month,
            components,
        })
    }

    /// IPOValidation row. A blank Qty reads as 0.
    pub fn map_plan_row(&self, row: &RawRecord, row_number: usize) -> SourceResult<RawPlanRow> {
        Ok(RawPlanRow {
            company: self.required_string(row, columns::COMPANY, "IPOValidation", row_number)?,
            location: self.required_string(row, columns::LOCATION, "IPOValidation", row_number)?,
            product: self.required_string(row, columns::PRODUCT, "IPOValidation", row_number)?,
            period: self.parse_required_date(row, columns::PERIOD, "IPOValidation", row_number)?,
            qty: self.parse_f64(row, columns::QTY, row_number)?.unwrap_or(0.0),
        })
    }

    /// Part / PartPlant metadata row
    pub fn map_metadata_row(
        &self,
        row: &RawRecord,
        row_number: usize,
    ) -> SourceResult<PartMetadata> {
        Ok(PartMetadata {
            company: self.required_string(row, columns::COMPANY, "PartMetadata", row_number)?,
            part_num: self.required_string(row, columns::PART_NUM, "PartMetadata", row_number)?,
            plant: self.required_string(row, columns::PLANT, "PartMetadata", row_number)?,
            class_id: self.get_string(row, columns::CLASS_ID),
            inactive: self.parse_bool(row, columns::INACTIVE, row_number)?,
            runout: self.parse_bool(row, columns::RUNOUT, row_number)?,
            nonstock: self.parse_bool(row, columns::NONSTOCK, row_number)?,
            ipo_method_code: self
                .get_string(row, columns::IPO_METHOD_CODE)
                .map(MethodCode::Text),
        })
    }

    // ==========================================
    // Value helpers
    // ==========================================

    /// Trimmed non-empty value, trying the column's aliases in order
    fn get_string(&self, row: &RawRecord, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            columns::COMPANY_PLANT_PART => &["company_plant_part", "CompanyPlantPart"],
            columns::END_OF_MONTH => &["endOfMonth", "EndOfMonth", "end_of_month"],
            columns::PART_NUM => &["PartNum", "part_num"],
            columns::INACTIVE => &["InActive", "Inactive", "inactive"],
            columns::NONSTOCK => &["NonStock", "nonstock"],
            columns::IPO_METHOD_CODE => &["ipo_method_code", "Number02"],
            _ => std::slice::from_ref(&key),
        };

        aliases.iter().find_map(|alias| {
            row.get(*alias)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    fn required_string(
        &self,
        row: &RawRecord,
        key: &'static str,
        dataset: &'static str,
        row_number: usize,
    ) -> SourceResult<String> {
        self.get_string(row, key).ok_or(SourceError::MissingColumn {
            dataset,
            row: row_number,
            column: key,
        })
    }

    fn parse_f64(&self, row: &RawRecord, key: &str, row_number: usize) -> SourceResult<Option<f64>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| SourceError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("not a finite number: {}", value),
                }),
        }
    }

    fn parse_required_date(
        &self,
        row: &RawRecord,
        key: &'static str,
        dataset: &'static str,
        row_number: usize,
    ) -> SourceResult<NaiveDate> {
        let value = self.required_string(row, key, dataset, row_number)?;
        parse_date_value(&value).ok_or(SourceError::DateFormatError {
            row: row_number,
            field: key.to_string(),
            value,
        })
    }

    fn parse_bool(&self, row: &RawRecord, key: &str, row_number: usize) -> SourceResult<bool> {
        match self.get_string(row, key) {
            None => Ok(false),
            Some(value) => parse_bool_value(&value).ok_or_else(|| SourceError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("not a boolean: {}", value),
            }),
        }
    }
}
