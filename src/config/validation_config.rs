// ==========================================
// IPO Validation - Typed Configuration
// ==========================================
// JSON shape:
// {
//   "source":     { "kind": "sqlite", "path": "..." } | { "kind": "files", ... },
//   "validation": { "start_date", "end_date", "companies", "excluded_companies" },
//   "mappings":   { "locations": { COMPANY: { PLANT: "Location Name" } } },
//   "rules":      { "usage_calculation": { "exception": {...}, "default_component": "..." } },
//   "options":    { "apply_exclusions": true, "output_format": "csv" }
// }
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::UsageComponent;
use crate::domain::usage::UsageComponents;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ==========================================
// ValidationConfig - root
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub source: SourceConfig,
    pub validation: ValidationWindow,
    pub mappings: Mappings,
    pub rules: Rules,
    pub options: PipelineOptions,
}

// ==========================================
// SourceConfig - where the three datasets come from
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// SQLite database with PartUsage / IPOValidation / PartMetadata tables
    Sqlite { path: PathBuf },
    /// One CSV or XLSX file per dataset
    Files {
        part_usage: PathBuf,
        ipo_validation: PathBuf,
        #[serde(default)]
        part_metadata: Option<PathBuf>,
    },
}

impl SourceConfig {
    /// Resolve relative paths against `base` (the config file directory)
    pub fn resolve_relative(&mut self, base: &Path) {
        fn join(base: &Path, path: &mut PathBuf) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }

        match self {
            SourceConfig::Sqlite { path } => join(base, path),
            SourceConfig::Files {
                part_usage,
                ipo_validation,
                part_metadata,
            } => {
                join(base, part_usage);
                join(base, ipo_validation);
                if let Some(p) = part_metadata {
                    join(base, p);
                }
            }
        }
    }
}

// ==========================================
// ValidationWindow - date range and company scope
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Companies whose part metadata is fetched for exclusions
    pub companies: Vec<String>,
    /// Ledger companies dropped unconditionally during normalization
    #[serde(default)]
    pub excluded_companies: Vec<String>,
}

impl ValidationWindow {
    pub fn is_excluded_company(&self, company: &str) -> bool {
        self.excluded_companies.iter().any(|c| c == company)
    }
}

// ==========================================
// LocationMap - company -> plant -> location name
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationMap(BTreeMap<String, BTreeMap<String, String>>);

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, company: &str, plant: &str, location: &str) {
        self.0
            .entry(company.to_string())
            .or_default()
            .insert(plant.to_string(), location.to_string());
    }

    /// Mapped location name, if both levels are present
    pub fn resolve(&self, company: &str, plant: &str) -> Option<&str> {
        self.0
            .get(company)
            .and_then(|plants| plants.get(plant))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> impl Iterator<Item = (&String, &String, &String)> {
        self.0
            .iter()
            .flat_map(|(c, plants)| plants.iter().map(move |(p, l)| (c, p, l)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mappings {
    pub locations: LocationMap,
}

// ==========================================
// UsageRule - how actual usage is computed from ledger components
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub usage_calculation: UsageRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRule {
    /// The one company/plant pair whose usage is a sum of components
    pub exception: UsageException,
    /// Component used for every other company/plant pair
    pub default_component: UsageComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageException {
    pub company: String,
    pub plant: String,
    pub components: Vec<UsageComponent>,
}

impl UsageRule {
    pub fn applies_exception(&self, company: &str, plant: &str) -> bool {
        self.exception.company == company && self.exception.plant == plant
    }

    /// Actual usage for one ledger row
    pub fn calculate(&self, company: &str, plant: &str, components: &UsageComponents) -> f64 {
        if self.applies_exception(company, plant) {
            components.sum_of(&self.exception.components)
        } else {
            components.get(self.default_component)
        }
    }
}

// ==========================================
// PipelineOptions
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub apply_exclusions: bool,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
}

// ==========================================
// Load-time validation
// ==========================================
impl ValidationConfig {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: ValidationConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every business-rule value the pipeline relies on
    pub fn validate(&self) -> ConfigResult<()> {
        let window = &self.validation;
        if window.start_date > window.end_date {
            return Err(ConfigError::InvalidValue {
                key: "validation.start_date".to_string(),
                message: format!(
                    "start_date {} is after end_date {}",
                    window.start_date, window.end_date
                ),
            });
        }
        if window.companies.is_empty() {
            return Err(ConfigError::MissingValue("validation.companies".to_string()));
        }
        if let Some(blank) = window
            .companies
            .iter()
            .chain(window.excluded_companies.iter())
            .find(|c| c.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                key: "validation.companies".to_string(),
                message: format!("blank company code {:?}", blank),
            });
        }

        for (company, plant, location) in self.mappings.locations.entries() {
            if location.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("mappings.locations.{}.{}", company, plant),
                    message: "location name is empty".to_string(),
                });
            }
        }

        let exception = &self.rules.usage_calculation.exception;
        if exception.company.trim().is_empty() || exception.plant.trim().is_empty() {
            return Err(ConfigError::MissingValue(
                "rules.usage_calculation.exception.company/plant".to_string(),
            ));
        }
        if exception.components.is_empty() {
            return Err(ConfigError::MissingValue(
                "rules.usage_calculation.exception.components".to_string(),
            ));
        }

        match &self.source {
            SourceConfig::Sqlite { path } => check_path("source.path", path)?,
            SourceConfig::Files {
                part_usage,
                ipo_validation,
                part_metadata,
            } => {
                check_path("source.part_usage", part_usage)?;
                check_path("source.ipo_validation", ipo_validation)?;
                match part_metadata {
                    Some(p) => check_path("source.part_metadata", p)?,
                    None if self.options.apply_exclusions => {
                        return Err(ConfigError::MissingValue(
                            "source.part_metadata (required when apply_exclusions = true)"
                                .to_string(),
                        ));
                    }
                    None => {}
                }
            }
        }

        Ok(())
    }
}

fn check_path(key: &str, path: &Path) -> ConfigResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingValue(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "source": { "kind": "sqlite", "path": "source.db" },
        "validation": {
            "start_date": "2025-01-01",
            "end_date": "2025-08-31",
            "companies": ["SAINC", "SAUK"],
            "excluded_companies": ["TEST"]
        },
        "mappings": {
            "locations": {
                "SAINC": { "MfgSys": "StoneAge Durango", "SAILA": "StoneAge Louisiana" }
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
        "options": { "apply_exclusions": true }
    }"#;

    #[test]
    fn test_parse_sample_config() {
        let config = ValidationConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.validation.companies, vec!["SAINC", "SAUK"]);
        assert_eq!(
            config.mappings.locations.resolve("SAINC", "SAILA"),
            Some("StoneAge Louisiana")
        );
        assert_eq!(config.mappings.locations.resolve("SAINC", "Nope"), None);
        assert_eq!(config.mappings.locations.resolve("SAUK", "MfgSys"), None);
        assert_eq!(config.options.output_format, OutputFormat::Csv);
        assert_eq!(
            config.rules.usage_calculation.default_component,
            UsageComponent::Direct
        );
    }

    #[test]
    fn test_usage_rule_exception_vs_default() {
        let config = ValidationConfig::from_json_str(SAMPLE).unwrap();
        let rule = &config.rules.usage_calculation;
        let components = UsageComponents {
            ic: 5.0,
            indirect: 1.0,
            direct: 2.0,
            rent: 7.0,
        };

        assert_eq!(rule.calculate("SAINC", "MfgSys", &components), 8.0);
        assert_eq!(rule.calculate("SAINC", "SAILA", &components), 2.0);
        assert_eq!(rule.calculate("SAUK", "MfgSys", &components), 2.0);
    }

    #[test]
    fn test_start_after_end_rejected() {
        let raw = SAMPLE.replace("\"2025-01-01\"", "\"2025-09-30\"");
        let err = ValidationConfig::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_default_component_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        value["rules"]["usage_calculation"]
            .as_object_mut()
            .unwrap()
            .remove("default_component");
        let err = ValidationConfig::from_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_component_rejected() {
        let raw = SAMPLE.replace("\"IndirectUsage\"", "\"ScrapUsage\"");
        assert!(ValidationConfig::from_json_str(&raw).is_err());
    }

    #[test]
    fn test_empty_exception_components_rejected() {
        let raw = SAMPLE.replace(
            "[\"ICUsage\", \"IndirectUsage\", \"DirectUsage\"]",
            "[]",
        );
        let err = ValidationConfig::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue(_)));
    }

    #[test]
    fn test_files_source_requires_metadata_when_exclusions_enabled() {
        let raw = SAMPLE.replace(
            r#"{ "kind": "sqlite", "path": "source.db" }"#,
            r#"{ "kind": "files", "part_usage": "u.csv", "ipo_validation": "p.csv" }"#,
        );
        let err = ValidationConfig::from_json_str(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue(_)));

        let raw = raw.replace("\"apply_exclusions\": true", "\"apply_exclusions\": false");
        assert!(ValidationConfig::from_json_str(&raw).is_ok());
    }

    #[test]
    fn test_resolve_relative_source_path() {
        let mut source = SourceConfig::Sqlite {
            path: PathBuf::from("data/source.db"),
        };
        source.resolve_relative(Path::new("/etc/ipo"));
        assert_eq!(
            source,
            SourceConfig::Sqlite {
                path: PathBuf::from("/etc/ipo/data/source.db")
            }
        );
    }
}
