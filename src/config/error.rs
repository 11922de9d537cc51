// ==========================================
// IPO Validation - Configuration Errors
// ==========================================
// Business-rule configuration is never defaulted: any of these stops the
// run before a source connection is opened
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("config read failed: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("missing required config value: {0}")]
    MissingValue(String),

    #[error("invalid config value (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
