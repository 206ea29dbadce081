//! Reading and writing configuration files
//!
//! Supports dotenv, JSON and YAML. Every format maps onto a flat
//! [`ConfigurationSet`]; scalar JSON/YAML values are converted to strings and
//! nested values are rejected.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EnvCheckError, Result};
use crate::heuristics::builtin_regex;
use crate::schema::ConfigurationSet;

/// On-disk configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvFormat {
    #[default]
    Dotenv,
    Json,
    Yaml,
}

impl EnvFormat {
    /// Detect the format from a file extension; anything unknown is dotenv
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            Some("json") => EnvFormat::Json,
            Some("yaml") | Some("yml") => EnvFormat::Yaml,
            _ => EnvFormat::Dotenv,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnvFormat::Dotenv => "dotenv",
            EnvFormat::Json => "json",
            EnvFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for EnvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvFormat {
    type Err = EnvCheckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "env" | "dotenv" => Ok(EnvFormat::Dotenv),
            "json" => Ok(EnvFormat::Json),
            "yaml" | "yml" => Ok(EnvFormat::Yaml),
            other => Err(EnvCheckError::parse("format", format!("unknown format '{other}'"))),
        }
    }
}

/// Parse configuration text in the given format
pub fn parse_str(content: &str, format: EnvFormat) -> Result<ConfigurationSet> {
    match format {
        EnvFormat::Dotenv => parse_dotenv(content),
        EnvFormat::Json => parse_json(content),
        EnvFormat::Yaml => parse_yaml(content),
    }
}

/// Load a configuration file, detecting the format from its extension
pub fn load(path: impl AsRef<Path>) -> Result<ConfigurationSet> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EnvCheckError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let format = EnvFormat::from_path(path);
    let content = fs::read_to_string(path)?;
    let config = parse_str(&content, format)?;
    tracing::debug!(path = %path.display(), %format, variables = config.len(), "loaded configuration");
    Ok(config)
}

/// Render a configuration set in the given format
pub fn render(config: &ConfigurationSet, format: EnvFormat) -> Result<String> {
    match format {
        EnvFormat::Dotenv => Ok(render_dotenv(config)),
        EnvFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        EnvFormat::Yaml => Ok(serde_yaml::to_string(config)?),
    }
}

/// Write a configuration file, creating parent directories as needed
pub fn save(config: &ConfigurationSet, path: impl AsRef<Path>, format: EnvFormat) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render(config, format)?)?;
    tracing::debug!(path = %path.display(), %format, variables = config.len(), "saved configuration");
    Ok(())
}

/// `KEY=value` with an optional `export ` prefix; keys may contain `.` and `-`
const DOTENV_LINE_PATTERN: &str = r"^\s*(?:export\s+)?([\w.-]+)\s*=\s*(.*?)\s*$";

/// Values are taken literally: `$VAR` and `${VAR}` are never expanded and
/// the process environment is not consulted. Lines that are not
/// `KEY=value` assignments are skipped.
fn parse_dotenv(content: &str) -> Result<ConfigurationSet> {
    let line_re = builtin_regex(DOTENV_LINE_PATTERN);
    let mut config = ConfigurationSet::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(caps) = line_re.captures(line) else {
            tracing::warn!(line = index + 1, "skipping dotenv line that is not a KEY=value assignment");
            continue;
        };
        config.insert(caps[1].to_string(), dotenv_value(&caps[2]));
    }

    Ok(config)
}

/// Unquote a raw dotenv value.
///
/// Single- and backtick-quoted values are literal. Double-quoted values
/// understand `\n`, `\r`, `\"` and `\\`; other backslashes are kept.
/// Unquoted values end at the first `#`. A quote that is never closed, or
/// is followed by anything but a comment, leaves the value unquoted.
fn dotenv_value(raw: &str) -> String {
    let quoted = match raw.chars().next() {
        Some(q @ ('\'' | '`')) => raw[1..].find(q).and_then(|end| {
            let rest = &raw[end + 2..];
            is_trailing_comment(rest).then(|| raw[1..end + 1].to_string())
        }),
        Some('"') => unescape_double_quoted(&raw[1..]),
        _ => None,
    };

    quoted.unwrap_or_else(|| match raw.find('#') {
        Some(hash) => raw[..hash].trim_end().to_string(),
        None => raw.to_string(),
    })
}

fn unescape_double_quoted(body: &str) -> Option<String> {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return is_trailing_comment(&body[i + 1..]).then_some(value),
            '\\' => match chars.next().map(|(_, next)| next) {
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some(next @ ('"' | '\\')) => value.push(next),
                Some(next) => {
                    value.push('\\');
                    value.push(next);
                }
                None => value.push('\\'),
            },
            _ => value.push(c),
        }
    }
    None
}

fn is_trailing_comment(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

fn parse_json(content: &str) -> Result<ConfigurationSet> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let serde_json::Value::Object(map) = value else {
        return Err(EnvCheckError::parse("json", "top-level value must be an object"));
    };

    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => String::new(),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(EnvCheckError::NestedValue { key });
                }
            };
            Ok((key, value))
        })
        .collect()
}

fn parse_yaml(content: &str) -> Result<ConfigurationSet> {
    if content.trim().is_empty() {
        return Ok(ConfigurationSet::new());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    let map = match value {
        serde_yaml::Value::Mapping(map) => map,
        serde_yaml::Value::Null => return Ok(ConfigurationSet::new()),
        _ => return Err(EnvCheckError::parse("yaml", "top-level value must be a mapping")),
    };

    map.into_iter()
        .map(|(key, value)| {
            let key = yaml_scalar(key)
                .ok_or_else(|| EnvCheckError::parse("yaml", "mapping keys must be scalars"))?;
            let value = yaml_scalar(value).ok_or_else(|| EnvCheckError::NestedValue { key: key.clone() })?;
            Ok((key, value))
        })
        .collect()
}

fn yaml_scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

fn render_dotenv(config: &ConfigurationSet) -> String {
    let mut out = String::new();
    for (key, value) in config {
        out.push_str(key);
        out.push('=');
        out.push_str(&format_env_value(value));
        out.push('\n');
    }
    out
}

/// Quote a value for a dotenv file when it would not survive unquoted.
///
/// Single quotes are literal, so they are preferred; values containing a
/// single quote or a line break fall back to escaped double quotes.
pub fn format_env_value(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '\\' | ',' | ';' | '$' | '#'));
    if !needs_quotes {
        return value.to_string();
    }

    if !value.contains(['\'', '\n', '\r']) {
        return format!("'{value}'");
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
