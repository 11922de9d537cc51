// ==========================================
// IPO Validation - Configuration Layer
// ==========================================
// Responsibilities: typed configuration records validated at load time
// Storage: JSON file
// ==========================================

pub mod config_manager;
pub mod error;
pub mod validation_config;

pub use config_manager::{ConfigManager, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, ConfigResult};
pub use validation_config::{
    LocationMap, Mappings, OutputFormat, PipelineOptions, Rules, SourceConfig, UsageException,
    UsageRule, ValidationConfig, ValidationWindow,
};
