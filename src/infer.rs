//! Schema inference from observed configuration
//!
//! [`SchemaInferencer`] derives a [`SchemaDefinition`] from a
//! [`ConfigurationSet`] by running every value through an ordered chain of
//! type rules, and derives `required`/`default`/`sensitive` from the key name.
//! It also produces example configuration sets for `.env.example` files.

use crate::heuristics::{KeywordMatcher, TypeRule, MASK};
use crate::schema::{ConfigurationSet, FieldSpec, FieldType, SchemaDefinition};

/// Infers field specs from raw string values
#[derive(Debug, Clone)]
pub struct SchemaInferencer {
    rules: Vec<TypeRule>,
    sensitive: KeywordMatcher,
    default_markers: KeywordMatcher,
}

impl Default for SchemaInferencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferencer {
    pub fn new() -> Self {
        Self {
            rules: TypeRule::default_chain(),
            sensitive: KeywordMatcher::sensitive(),
            default_markers: KeywordMatcher::default_markers(),
        }
    }

    /// Replace the type rule chain
    pub fn with_rules(mut self, rules: Vec<TypeRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the sensitive keyword matcher
    pub fn with_sensitive_keywords(mut self, matcher: KeywordMatcher) -> Self {
        self.sensitive = matcher;
        self
    }

    /// Replace the default marker matcher
    pub fn with_default_markers(mut self, matcher: KeywordMatcher) -> Self {
        self.default_markers = matcher;
        self
    }

    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    /// Infer a schema for every variable in the set
    pub fn infer(&self, config: &ConfigurationSet) -> SchemaDefinition {
        let schema: SchemaDefinition = config
            .iter()
            .map(|(key, value)| (key.clone(), self.infer_field(key, value)))
            .collect();
        tracing::debug!(fields = schema.len(), "inferred schema");
        schema
    }

    /// Infer the spec for a single variable
    pub fn infer_field(&self, key: &str, value: &str) -> FieldSpec {
        let rule = self.rules.iter().find(|rule| rule.matches(value));

        let mut spec = FieldSpec {
            field_type: Some(rule.map(|r| r.field_type).unwrap_or(FieldType::String)),
            allowed: rule.and_then(|r| r.allowed.clone()),
            description: Some(format!("Environment variable: {key}")),
            ..FieldSpec::default()
        };

        if self.default_markers.matches(key) {
            spec.required = false;
            spec.default = Some(value.to_string());
        }

        if self.is_sensitive_key(key) {
            spec.sensitive = true;
        }

        spec
    }

    /// Type of the first matching rule, or `string`
    pub fn detect_type(&self, value: &str) -> FieldType {
        self.rules
            .iter()
            .find(|rule| rule.matches(value))
            .map(|rule| rule.field_type)
            .unwrap_or(FieldType::String)
    }

    /// Whether the key name looks like it holds a secret
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        self.sensitive.matches(key)
    }

    /// Produce example values suitable for a checked-in sample file.
    ///
    /// With a schema, one entry is produced per schema field, preferring the
    /// default, then the first allowed value, then a mask for sensitive
    /// fields, then the observed value and finally a `YOUR_<KEY>_HERE`
    /// placeholder. Without a schema the observed values are copied, masking
    /// those whose key looks sensitive.
    pub fn generate_example(
        &self,
        config: &ConfigurationSet,
        schema: Option<&SchemaDefinition>,
    ) -> ConfigurationSet {
        let Some(schema) = schema else {
            return config
                .iter()
                .map(|(key, value)| (key.clone(), self.masked(key, value)))
                .collect();
        };

        schema
            .iter()
            .map(|(key, spec)| {
                let value = if let Some(default) = spec.default.as_deref().filter(|d| !d.is_empty()) {
                    default.to_string()
                } else if let Some(first) = spec.allowed.as_ref().and_then(|a| a.first()) {
                    first.clone()
                } else if spec.sensitive {
                    MASK.to_string()
                } else if let Some(observed) = config.get(key) {
                    self.masked(key, observed)
                } else {
                    format!("YOUR_{key}_HERE")
                };
                (key.to_string(), value)
            })
            .collect()
    }

    fn masked(&self, key: &str, value: &str) -> String {
        if self.is_sensitive_key(key) {
            MASK.to_string()
        } else {
            value.to_string()
        }
    }
}
