//! Human-readable and JSON rendering of results

use std::fmt::Write;

use serde::Serialize;

use crate::diff::DiffResult;
use crate::error::Result;
use crate::usage::UsageReport;
use crate::validate::ValidationResult;

/// Pretty-printed JSON for any result type
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn validation_text(result: &ValidationResult) -> String {
    let mut out = String::new();

    if result.valid {
        let _ = writeln!(out, "✅ All variables match schema requirements");
    } else {
        let _ = writeln!(out, "❌ Found {} validation errors", result.errors.len());
        for error in &result.errors {
            let _ = writeln!(out, "  - {}", error.message);
        }
    }

    if result.has_warnings() {
        let _ = writeln!(out, "⚠️  Found {} warnings:", result.warnings.len());
        for warning in &result.warnings {
            let _ = writeln!(out, "  - {}", warning.message);
        }
    }

    out
}

/// Table rendering of a diff, labelling each side with its file name
pub fn diff_text(result: &DiffResult, first: &str, second: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Comparing {first} and {second}:");

    if !result.only_in_first.is_empty() {
        let _ = writeln!(out, "\nVariables only in {first}:");
        for (key, value) in &result.only_in_first {
            let _ = writeln!(out, "  {key}={value}");
        }
    }

    if !result.only_in_second.is_empty() {
        let _ = writeln!(out, "\nVariables only in {second}:");
        for (key, value) in &result.only_in_second {
            let _ = writeln!(out, "  {key}={value}");
        }
    }

    if !result.different.is_empty() {
        let _ = writeln!(out, "\nVariables with different values:");
        for (key, pair) in &result.different {
            let _ = writeln!(out, "  {key}:");
            let _ = writeln!(out, "    {first}: {}", pair.first);
            let _ = writeln!(out, "    {second}: {}", pair.second);
        }
    }

    if !result.same.is_empty() {
        let _ = writeln!(out, "\nVariables with identical values: {}", result.same.len());
    }

    let summary = result.summary();
    let _ = writeln!(out, "\nSummary:");
    let _ = writeln!(out, "  Total unique variables: {}", summary.total);
    let _ = writeln!(out, "  Identical: {}", summary.identical);
    let _ = writeln!(out, "  Different: {}", summary.different);
    let _ = writeln!(out, "  Only in {first}: {}", summary.only_in_first);
    let _ = writeln!(out, "  Only in {second}: {}", summary.only_in_second);

    out
}

pub fn usage_text(report: &UsageReport) -> String {
    let mut out = String::new();

    if report.unused.is_empty() {
        let _ = writeln!(out, "✅ All variables are used in code");
    } else {
        let _ = writeln!(out, "⚠️  Found {} variables not used in code:", report.unused.len());
        for key in report.unused.keys() {
            let _ = writeln!(out, "  - {key}");
        }
    }
    let _ = writeln!(out, "✅ Found {} variables used in code", report.used.len());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::schema::ConfigurationSet;
    use crate::validate::ValidationError;

    fn config(pairs: &[(&str, &str)]) -> ConfigurationSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validation_text_lists_errors() {
        let result = ValidationResult {
            valid: false,
            errors: vec![ValidationError {
                key: "PORT".to_string(),
                message: "Required variable PORT is missing".to_string(),
            }],
            warnings: Vec::new(),
        };
        let text = validation_text(&result);
        assert!(text.contains("Found 1 validation errors"));
        assert!(text.contains("  - Required variable PORT is missing"));
        assert!(!text.contains("warnings"));
    }

    #[test]
    fn test_diff_text_uses_labels() {
        let a = config(&[("A", "1"), ("B", "2")]);
        let b = config(&[("B", "3"), ("C", "4")]);
        let text = diff_text(&diff(&a, &b), ".env", ".env.prod");

        assert!(text.starts_with("Comparing .env and .env.prod:"));
        assert!(text.contains("Variables only in .env:\n  A=1"));
        assert!(text.contains("Variables only in .env.prod:\n  C=4"));
        assert!(text.contains("  B:\n    .env: 2\n    .env.prod: 3"));
        assert!(text.contains("Total unique variables: 3"));
        assert!(!text.contains("identical values"));
    }

    #[test]
    fn test_usage_text() {
        let report = UsageReport {
            used: config(&[("PORT", "1")]),
            unused: config(&[("LEGACY", "x")]),
        };
        let text = usage_text(&report);
        assert!(text.contains("Found 1 variables not used in code:\n  - LEGACY"));
        assert!(text.contains("Found 1 variables used in code"));
    }

    #[test]
    fn test_json_uses_contract_field_names() {
        let json = to_json(&diff(&config(&[("A", "1")]), &ConfigurationSet::new())).unwrap();
        assert!(json.contains("\"onlyInFirst\""));
        assert!(json.contains("\"onlyInSecond\""));
    }
}
