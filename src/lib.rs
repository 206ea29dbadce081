//! env-check
//!
//! Schema inference, validation and diffing for environment configuration
//! files (dotenv, JSON and YAML).
//!
//! ## Features
//!
//! - **Inference**: Derive a typed schema from an existing `.env` file
//! - **Validation**: Check a configuration against a schema, collecting every violation
//! - **Diffing**: Compare two configurations key by key
//! - **Usage Scanning**: Find variables that are never referenced in source code
//! - **Encryption**: Password-protect configuration files for sharing
//!
//! ## Example
//!
//! ```
//! use env_check::{ConfigurationSet, SchemaInferencer, SchemaValidator};
//!
//! let mut config = ConfigurationSet::new();
//! config.insert("PORT".to_string(), "8080".to_string());
//!
//! let schema = SchemaInferencer::new().infer(&config);
//! config.insert("PORT".to_string(), "eighty".to_string());
//!
//! let result = SchemaValidator::new().validate(&config, &schema).unwrap();
//! assert!(!result.valid);
//! ```

pub mod config;
pub mod crypto;
pub mod diff;
pub mod error;
pub mod format;
pub mod heuristics;
pub mod infer;
pub mod report;
pub mod schema;
pub mod usage;
pub mod validate;

pub use config::EnvCheckConfig;
pub use diff::{diff, DiffResult, DiffSummary, ValuePair};
pub use error::{EnvCheckError, Result};
pub use format::EnvFormat;
pub use infer::SchemaInferencer;
pub use schema::{ConfigurationSet, FieldSpec, FieldType, SchemaDefinition};
pub use usage::{partition_usage, UsageMap, UsageReport, UsageScanner};
pub use validate::{SchemaValidator, ValidationError, ValidationResult, ValidationWarning, WarningSubject};
