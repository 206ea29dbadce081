//! Error types for env-check
//!
//! These are operation-fatal errors: the input could not be evaluated at all.
//! Rule violations found while validating are reported through
//! [`ValidationResult`](crate::validate::ValidationResult) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for env-check operations
pub type Result<T> = std::result::Result<T, EnvCheckError>;

/// Errors that abort an operation
#[derive(Error, Debug)]
pub enum EnvCheckError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid pattern for variable {key}: {pattern}")]
    InvalidPattern {
        key: String,
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },

    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("Failed to parse {format} input: {reason}")]
    Parse { format: &'static str, reason: String },

    #[error("Variable {key} has a nested value; only flat string values are supported")]
    NestedValue { key: String },

    #[error("Encryption key must be at least {min} characters long")]
    KeyTooShort { min: usize },

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl EnvCheckError {
    /// Shorthand for a parse failure in the given format
    pub fn parse(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            format,
            reason: reason.into(),
        }
    }
}
