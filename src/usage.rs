//! Variable usage detection
//!
//! [`UsageScanner`] walks a source tree looking for common environment access
//! patterns and produces a usage map; [`partition_usage`] splits a
//! configuration set into used and unused variables from such a map.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{EnvCheckError, Result};
use crate::schema::ConfigurationSet;

/// Whether each variable was found in the scanned sources
pub type UsageMap = BTreeMap<String, bool>;

/// Source file extensions scanned by default
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "php", "py", "rb", "rs", "sh"];

/// Directories never descended into
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["node_modules", "vendor", ".git", "dist", "build", "target"];

/// Configuration split by whether each variable is referenced in code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub used: BTreeMap<String, String>,
    pub unused: BTreeMap<String, String>,
}

/// Partition `config` by a usage map.
///
/// Keys marked `true` go to `used`; every other config key, including keys
/// the map does not mention, goes to `unused`. Map entries for keys absent
/// from the configuration are ignored.
pub fn partition_usage(config: &ConfigurationSet, usage: &UsageMap) -> UsageReport {
    let mut report = UsageReport::default();
    for (key, value) in config {
        let bucket = if usage.get(key).copied().unwrap_or(false) {
            &mut report.used
        } else {
            &mut report.unused
        };
        bucket.insert(key.clone(), value.clone());
    }
    report
}

/// Access patterns that count as a use of `key`
pub fn access_patterns(key: &str) -> Vec<String> {
    vec![
        format!("process.env.{key}"),
        format!("process.env['{key}']"),
        format!("process.env[\"{key}\"]"),
        format!("env('{key}')"),
        format!("getenv('{key}')"),
        format!("os.getenv('{key}')"),
        format!("ENV['{key}']"),
        format!("$_ENV['{key}']"),
        format!("env::var(\"{key}\")"),
        format!("env!(\"{key}\")"),
        format!("${key}"),
    ]
}

/// Scans a source tree for references to configuration variables
#[derive(Debug, Clone)]
pub struct UsageScanner {
    extensions: BTreeSet<String>,
    ignored_dirs: BTreeSet<String>,
}

impl Default for UsageScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageScanner {
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the scanned file extensions (without leading dot)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Replace the ignored directory names
    pub fn with_ignored_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Build a usage map for every key of `config` from files under `root`
    pub fn scan(&self, config: &ConfigurationSet, root: impl AsRef<Path>) -> Result<UsageMap> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(EnvCheckError::NotFound {
                path: root.to_path_buf(),
            });
        }

        let patterns: Vec<(&String, Vec<String>)> = config
            .keys()
            .map(|key| (key, access_patterns(key)))
            .collect();
        let mut usage: UsageMap = config.keys().map(|key| (key.clone(), false)).collect();

        let ignored = self.ignored_dirs.clone();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir && ignored.contains(&*entry.file_name().to_string_lossy()))
            })
            .build();

        let mut scanned = 0usize;
        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || !self.is_source_file(path) {
                continue;
            }

            // Binary or non-UTF-8 files cannot hold the patterns we look for.
            let Ok(content) = fs::read_to_string(path) else {
                tracing::debug!(path = %path.display(), "skipping unreadable file");
                continue;
            };
            scanned += 1;

            for (key, key_patterns) in &patterns {
                if key_patterns.iter().any(|p| content.contains(p.as_str())) {
                    usage.insert((*key).clone(), true);
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            files = scanned,
            used = usage.values().filter(|u| **u).count(),
            "scanned sources for variable usage"
        );
        Ok(usage)
    }

    /// Scan `root` and partition `config` by the result
    pub fn report(&self, config: &ConfigurationSet, root: impl AsRef<Path>) -> Result<UsageReport> {
        let usage = self.scan(config, root)?;
        Ok(partition_usage(config, &usage))
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&*ext.to_string_lossy()))
            .unwrap_or(false)
    }
}
