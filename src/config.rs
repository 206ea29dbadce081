//! Configuration management for env-check
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (env-check.toml)
//! - Environment variables (ENV_CHECK__*)
//!
//! ## Example config file (env-check.toml):
//! ```toml
//! [files]
//! env_file = ".env"
//! schema_file = "config/env.schema.json"
//! example_file = ".env.example"
//!
//! [scan]
//! directory = "src"
//! extensions = ["rs", "ts"]
//!
//! [output]
//! format = "json"
//!
//! [validation]
//! strict = true
//!
//! [heuristics]
//! sensitive_keywords = ["PRIVATE", "CREDENTIAL"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::heuristics::KeywordMatcher;
use crate::infer::SchemaInferencer;
use crate::usage::{UsageScanner, DEFAULT_EXTENSIONS, DEFAULT_IGNORED_DIRS};

/// Main configuration for env-check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvCheckConfig {
    /// Default file locations
    #[serde(default)]
    pub files: FilesConfig,

    /// Source scanning settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Inference heuristics
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
}

/// Default file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    #[serde(default = "default_schema_file")]
    pub schema_file: PathBuf,

    #[serde(default = "default_example_file")]
    pub example_file: PathBuf,
}

/// Source scanning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory to scan for variable usage
    #[serde(default = "default_scan_directory")]
    pub directory: PathBuf,

    /// File extensions to scan
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names to skip
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Validation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat warnings as failures
    #[serde(default)]
    pub strict: bool,
}

/// Additions to the built-in inference heuristics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Extra key substrings that mark a variable sensitive
    #[serde(default)]
    pub sensitive_keywords: Vec<String>,
}

// Default value functions
fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_schema_file() -> PathBuf {
    PathBuf::from("env.schema.json")
}

fn default_example_file() -> PathBuf {
    PathBuf::from(".env.example")
}

fn default_scan_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_ignored_dirs() -> Vec<String> {
    DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
            schema_file: default_schema_file(),
            example_file: default_example_file(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            directory: default_scan_directory(),
            extensions: default_extensions(),
            ignored_dirs: default_ignored_dirs(),
        }
    }
}

impl EnvCheckConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "env-check.toml",
            ".env-check.toml",
            "config/env-check.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "env-check", "env-check") {
            let xdg_config = config_dir.config_dir().join("env-check.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ENV_CHECK")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Inferencer with the configured extra sensitive keywords
    pub fn inferencer(&self) -> SchemaInferencer {
        let mut sensitive = KeywordMatcher::sensitive();
        sensitive.extend(self.heuristics.sensitive_keywords.iter().cloned());
        SchemaInferencer::new().with_sensitive_keywords(sensitive)
    }

    /// Usage scanner with the configured extensions and ignored directories
    pub fn scanner(&self) -> UsageScanner {
        UsageScanner::new()
            .with_extensions(self.scan.extensions.iter().cloned())
            .with_ignored_dirs(self.scan.ignored_dirs.iter().cloned())
    }
}
