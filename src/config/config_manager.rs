// ==========================================
// IPO Validation - Configuration Manager
// ==========================================
// Responsibilities: read the JSON config file, validate it once, hand out
// the typed record, snapshot it for the run audit trail
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::validation_config::ValidationConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

// ==========================================
// ConfigManager
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: Option<PathBuf>,
    config: ValidationConfig,
}

impl ConfigManager {
    /// Load and validate a config file
    ///
    /// Relative source paths are resolved against the config file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config: ValidationConfig = serde_json::from_str(&raw)?;
        if let Some(dir) = path.parent() {
            config.source.resolve_relative(dir);
        }
        config.validate()?;

        info!(
            config_path = %path.display(),
            start_date = %config.validation.start_date,
            end_date = %config.validation.end_date,
            companies = %config.validation.companies.join(", "),
            apply_exclusions = config.options.apply_exclusions,
            "configuration loaded"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            config,
        })
    }

    /// Wrap an in-memory config (validated here)
    pub fn from_config(config: ValidationConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { path: None, config })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Toggle the metadata exclusion filter (CLI override)
    ///
    /// Re-validates: a file source without a metadata file cannot enable it.
    pub fn set_apply_exclusions(&mut self, enabled: bool) -> ConfigResult<()> {
        let previous = self.config.options.apply_exclusions;
        self.config.options.apply_exclusions = enabled;
        if let Err(e) = self.config.validate() {
            self.config.options.apply_exclusions = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Effective configuration as JSON, stored with each validation run
    pub fn snapshot_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(&self.config)?)
    }
}
