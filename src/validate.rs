//! Schema validation
//!
//! [`SchemaValidator`] checks a [`ConfigurationSet`] against a
//! [`SchemaDefinition`]. Every rule runs for every key; violations are
//! collected into a [`ValidationResult`] instead of stopping at the first one.

use fancy_regex::Regex as PatternRegex;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EnvCheckError, Result};
use crate::heuristics::{builtin_regex, is_numeric, EMAIL_PATTERN, IPV4_PATTERN, VALIDATOR_BOOLEAN_LITERALS};
use crate::schema::{ConfigurationSet, FieldSpec, FieldType, SchemaDefinition};

/// Outcome of validating a configuration set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    fn from_findings(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Errors reported for one variable
    pub fn errors_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.key == key)
    }
}

/// A rule violation that invalidates the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

/// A finding that does not affect validity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    #[serde(flatten)]
    pub subject: WarningSubject,
    pub message: String,
}

/// What a warning is about: one variable or a group of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSubject {
    Key(String),
    Keys(Vec<String>),
}

impl ValidationWarning {
    /// Variables the warning refers to
    pub fn keys(&self) -> Vec<&str> {
        match &self.subject {
            WarningSubject::Key(key) => vec![key.as_str()],
            WarningSubject::Keys(keys) => keys.iter().map(String::as_str).collect(),
        }
    }
}

/// Validates configuration sets against schemas
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    boolean_literals: Vec<String>,
    email: Regex,
    ipv4: Regex,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            boolean_literals: VALIDATOR_BOOLEAN_LITERALS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            email: builtin_regex(EMAIL_PATTERN),
            ipv4: builtin_regex(IPV4_PATTERN),
        }
    }

    /// Replace the lower-cased literals accepted for `boolean`
    pub fn with_boolean_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boolean_literals = literals.into_iter().map(Into::into).collect();
        self
    }

    /// Validate `config` against `schema`.
    ///
    /// Fails only when the schema itself cannot be evaluated (a malformed
    /// `pattern`); all patterns are compiled before any value is checked.
    pub fn validate(
        &self,
        config: &ConfigurationSet,
        schema: &SchemaDefinition,
    ) -> Result<ValidationResult> {
        let patterns = compile_patterns(schema)?;

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for ((key, spec), pattern) in schema.iter().zip(&patterns) {
            let Some(value) = config.get(key) else {
                if spec.required {
                    errors.push(ValidationError {
                        key: key.to_string(),
                        message: format!("Required variable {key} is missing"),
                    });
                } else if let Some(default) = &spec.default {
                    warnings.push(ValidationWarning {
                        subject: WarningSubject::Key(key.to_string()),
                        message: format!("Variable {key} is using default value: {default}"),
                    });
                }
                continue;
            };

            self.check_value(key, value, spec, pattern.as_ref(), &mut errors);
        }

        let extra_keys: Vec<String> = config
            .keys()
            .filter(|key| !schema.contains_key(key))
            .cloned()
            .collect();
        if !extra_keys.is_empty() {
            warnings.push(ValidationWarning {
                message: format!(
                    "Found {} variables not in schema: {}",
                    extra_keys.len(),
                    extra_keys.join(", ")
                ),
                subject: WarningSubject::Keys(extra_keys),
            });
        }

        let result = ValidationResult::from_findings(errors, warnings);
        tracing::debug!(
            fields = schema.len(),
            variables = config.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated configuration"
        );
        Ok(result)
    }

    fn check_value(
        &self,
        key: &str,
        value: &str,
        spec: &FieldSpec,
        pattern: Option<&PatternRegex>,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(field_type) = spec.field_type {
            if !self.matches_type(value, field_type) {
                errors.push(ValidationError {
                    key: key.to_string(),
                    message: format!("Variable {key} should be of type {field_type}, got: {value}"),
                });
            }
        }

        if let (Some(re), Some(source)) = (pattern, spec.pattern.as_deref()) {
            let matched = re.is_match(value).unwrap_or_else(|e| {
                tracing::warn!(key, pattern = source, error = %e, "pattern evaluation failed");
                false
            });
            if !matched {
                errors.push(ValidationError {
                    key: key.to_string(),
                    message: format!("Variable {key} does not match required pattern: {source}"),
                });
            }
        }

        if let Some(allowed) = &spec.allowed {
            if !allowed.iter().any(|a| a == value) {
                errors.push(ValidationError {
                    key: key.to_string(),
                    message: format!(
                        "Variable {key} should be one of: {}, got: {value}",
                        allowed.join(", ")
                    ),
                });
            }
        }
    }

    /// Whether a raw value is acceptable for `field_type`
    pub fn matches_type(&self, value: &str, field_type: FieldType) -> bool {
        match field_type {
            FieldType::String => true,
            FieldType::Number => is_numeric(value),
            FieldType::Boolean => {
                let lower = value.to_lowercase();
                self.boolean_literals.iter().any(|l| *l == lower)
            }
            FieldType::Url => url::Url::parse(value).is_ok(),
            FieldType::Email => self.email.is_match(value),
            FieldType::IpAddress => self.ipv4.is_match(value),
        }
    }
}

/// Schema patterns follow JavaScript `RegExp` syntax, so lookaround and
/// backreferences are accepted.
fn compile_patterns(schema: &SchemaDefinition) -> Result<Vec<Option<PatternRegex>>> {
    schema
        .iter()
        .map(|(key, spec)| {
            spec.pattern
                .as_deref()
                .map(|pattern| {
                    PatternRegex::new(pattern).map_err(|source| EnvCheckError::InvalidPattern {
                        key: key.to_string(),
                        pattern: pattern.to_string(),
                        source,
                    })
                })
                .transpose()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> ConfigurationSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn schema(fields: Vec<(&str, FieldSpec)>) -> SchemaDefinition {
        fields
            .into_iter()
            .map(|(k, spec)| (k.to_string(), spec))
            .collect()
    }

    #[test]
    fn test_valid_configuration() {
        let cfg = config(&[("PORT", "8080"), ("DEBUG", "true"), ("API_URL", "http://x.com")]);
        let schema = schema(vec![
            ("PORT", FieldSpec::of_type(FieldType::Number)),
            ("DEBUG", FieldSpec::of_type(FieldType::Boolean)),
            ("API_URL", FieldSpec::of_type(FieldType::Url)),
        ]);

        let result = SchemaValidator::new().validate(&cfg, &schema).unwrap();
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_type_mismatch_names_key_and_value() {
        let cfg = config(&[("PORT", "abc")]);
        let schema = schema(vec![("PORT", FieldSpec::of_type(FieldType::Number))]);

        let result = SchemaValidator::new().validate(&cfg, &schema).unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].key, "PORT");
        assert_eq!(
            result.errors[0].message,
            "Variable PORT should be of type number, got: abc"
        );
    }

    #[test]
    fn test_all_violations_are_collected() {
        let cfg = config(&[("B", "abc")]);
        let schema = schema(vec![
            ("A", FieldSpec::default()),
            ("B", FieldSpec::default().with_pattern("^[0-9]+$")),
        ]);

        let result = SchemaValidator::new().validate(&cfg, &schema).unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].message, "Required variable A is missing");
        assert_eq!(
            result.errors[1].message,
            "Variable B does not match required pattern: ^[0-9]+$"
        );
    }

    #[test]
    fn test_one_value_can_fail_several_rules() {
        let cfg = config(&[("LEVEL", "loud")]);
        let schema = schema(vec![(
            "LEVEL",
            FieldSpec::of_type(FieldType::Number)
                .with_pattern("^[0-9]$")
                .with_allowed(["1", "2"]),
        )]);

        let result = SchemaValidator::new().validate(&cfg, &schema).unwrap();
        assert_eq!(result.errors_for("LEVEL").count(), 3);
        assert_eq!(
            result.errors[2].message,
            "Variable LEVEL should be one of: 1, 2, got: loud"
        );
    }

    #[test]
    fn test_optional_with_default_warns() {
        let schema = schema(vec![("A", FieldSpec::default().optional().with_default("x"))]);

        let result = SchemaValidator::new()
            .validate(&ConfigurationSet::new(), &schema)
            .unwrap();
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].subject, WarningSubject::Key("A".to_string()));
        assert!(result.warnings[0].message.contains("x"));
    }

    #[test]
    fn test_optional_without_default_is_silent() {
        let schema = schema(vec![("A", FieldSpec::default().optional())]);
        let result = SchemaValidator::new()
            .validate(&ConfigurationSet::new(), &schema)
            .unwrap();
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_required_with_default_still_errors() {
        let schema = schema(vec![("A", FieldSpec::default().with_default("x"))]);
        let result = SchemaValidator::new()
            .validate(&ConfigurationSet::new(), &schema)
            .unwrap();
        assert!(!result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_extra_keys_produce_single_warning() {
        let cfg = config(&[("KNOWN", "1"), ("EXTRA_B", "2"), ("EXTRA_A", "3")]);
        let schema = schema(vec![("KNOWN", FieldSpec::default())]);

        let result = SchemaValidator::new().validate(&cfg, &schema).unwrap();
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].keys(), vec!["EXTRA_A", "EXTRA_B"]);
        assert_eq!(
            result.warnings[0].message,
            "Found 2 variables not in schema: EXTRA_A, EXTRA_B"
        );
    }

    #[test]
    fn test_boolean_rejects_yes_and_no() {
        let validator = SchemaValidator::new();
        for value in ["true", "FALSE", "0", "1"] {
            assert!(validator.matches_type(value, FieldType::Boolean), "{value}");
        }
        for value in ["yes", "no", "on"] {
            assert!(!validator.matches_type(value, FieldType::Boolean), "{value}");
        }
    }

    #[test]
    fn test_custom_boolean_literals() {
        let validator = SchemaValidator::new().with_boolean_literals(["yes", "no"]);
        assert!(validator.matches_type("YES", FieldType::Boolean));
        assert!(!validator.matches_type("true", FieldType::Boolean));
    }

    #[test]
    fn test_type_checks() {
        let validator = SchemaValidator::new();
        assert!(validator.matches_type("", FieldType::String));
        assert!(validator.matches_type("postgres://user@db:5432/app", FieldType::Url));
        assert!(!validator.matches_type("not a url", FieldType::Url));
        assert!(validator.matches_type("a@b.co", FieldType::Email));
        assert!(!validator.matches_type("a b@c.d", FieldType::Email));
        assert!(validator.matches_type("300.1.1.1", FieldType::IpAddress));
        assert!(!validator.matches_type("::1", FieldType::IpAddress));
    }

    #[test]
    fn test_malformed_pattern_fails_operation() {
        let schema = schema(vec![
            ("ABSENT", FieldSpec::default().optional().with_pattern("([a-z")),
        ]);
        let err = SchemaValidator::new()
            .validate(&ConfigurationSet::new(), &schema)
            .unwrap_err();
        assert!(matches!(err, EnvCheckError::InvalidPattern { key, .. } if key == "ABSENT"));
    }

    #[test]
    fn test_lookaround_and_backreference_patterns() {
        let schema = schema(vec![
            ("PW", FieldSpec::default().with_pattern("^(?=.*[0-9]).{8,}$")),
            ("PAIR", FieldSpec::default().with_pattern(r"^(\w)\1$")),
        ]);
        let validator = SchemaValidator::new();

        let ok = validator
            .validate(&config(&[("PW", "abcdefg1"), ("PAIR", "aa")]), &schema)
            .unwrap();
        assert!(ok.valid, "{:?}", ok.errors);

        let bad = validator
            .validate(&config(&[("PW", "abcdefgh"), ("PAIR", "ab")]), &schema)
            .unwrap();
        assert_eq!(bad.errors.len(), 2);
        assert_eq!(
            bad.errors[0].message,
            "Variable PW does not match required pattern: ^(?=.*[0-9]).{8,}$"
        );
    }

    #[test]
    fn test_warning_serialization_shape() {
        let warning = ValidationWarning {
            subject: WarningSubject::Keys(vec!["A".to_string()]),
            message: "m".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&warning).unwrap(),
            serde_json::json!({"keys": ["A"], "message": "m"})
        );

        let warning = ValidationWarning {
            subject: WarningSubject::Key("A".to_string()),
            message: "m".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&warning).unwrap(),
            serde_json::json!({"key": "A", "message": "m"})
        );
    }
}
