//! Error types for calbuild.

use thiserror::Error;

/// Errors that can occur in calbuild operations.
#[derive(Error, Debug)]
pub enum CalBuildError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Invalid {field} date '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calbuild operations.
pub type CalBuildResult<T> = Result<T, CalBuildError>;
