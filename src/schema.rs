//! Schema types and structures

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EnvCheckError, Result};

/// A flat set of configuration variables, keyed by name.
///
/// Iteration order is the sorted key order, which keeps every rendering of a
/// set deterministic regardless of where it was parsed from.
pub type ConfigurationSet = BTreeMap<String, String>;

/// Expected type of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Url,
    Email,
    IpAddress,
}

impl FieldType {
    /// Every supported type, in declaration order
    pub const ALL: [FieldType; 6] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Url,
        FieldType::Email,
        FieldType::IpAddress,
    ];

    /// Name used in schema files
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Url => "url",
            FieldType::Email => "email",
            FieldType::IpAddress => "ipaddress",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown type names are an error, so a schema naming one fails to load
/// rather than leaving that field unchecked.
impl FromStr for FieldType {
    type Err = EnvCheckError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| EnvCheckError::UnknownFieldType(s.to_string()))
    }
}

impl TryFrom<String> for FieldType {
    type Error = EnvCheckError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

/// Constraints for a single configuration variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Expected value type; `None` leaves the type unconstrained
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Whether the variable must be present
    #[serde(default = "default_true")]
    pub required: bool,

    /// Value assumed when the variable is absent
    #[serde(
        default,
        deserialize_with = "scalar::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,

    /// Regular expression the value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Literal values the variable may take
    #[serde(
        rename = "enum",
        default,
        deserialize_with = "scalar::optional_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed: Option<Vec<String>>,

    /// Whether the value should be masked when displayed
    #[serde(default, skip_serializing_if = "is_false")]
    pub sensitive: bool,

    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            field_type: None,
            required: true,
            default: None,
            pattern: None,
            allowed: None,
            sensitive: false,
            description: None,
        }
    }
}

impl FieldSpec {
    /// A required field of the given type
    pub fn of_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// Mark the field optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the allowed values
    pub fn with_allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Mark the field sensitive
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Schema defaults such as `"default": 3000` or `"enum": [1, 2]` are written
/// by hand often enough that scalar literals are accepted and kept as strings.
mod scalar {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    impl From<Scalar> for String {
        fn from(value: Scalar) -> Self {
            match value {
                Scalar::Str(s) => s,
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
    }

    pub fn optional_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<Scalar>>::deserialize(deserializer)?
            .map(|values| values.into_iter().map(String::from).collect()))
    }
}

/// Ordered mapping from variable name to its [`FieldSpec`].
///
/// Entries keep the order in which they were defined, both when loaded from a
/// schema file and when produced by inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition {
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaDefinition {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing an existing entry in place.
    ///
    /// Returns the previous spec for the key, if any.
    pub fn insert(&mut self, key: impl Into<String>, spec: FieldSpec) -> Option<FieldSpec> {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, spec)),
            None => {
                self.fields.push((key, spec));
                None
            }
        }
    }

    /// Get the spec for a variable
    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, spec)| spec)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate entries in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, spec)| (k.as_str(), spec))
    }

    /// Variable names in definition order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Append entries from `other` whose keys are not defined yet.
    ///
    /// Existing entries are left untouched. Returns the number of added keys.
    pub fn merge_missing(&mut self, other: SchemaDefinition) -> usize {
        let mut added = 0;
        for (key, spec) in other.fields {
            if !self.contains_key(&key) {
                self.fields.push((key, spec));
                added += 1;
            }
        }
        added
    }

    /// Parse a schema document from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            if e.is_data() {
                EnvCheckError::InvalidSchema(e.to_string())
            } else {
                EnvCheckError::Json(e)
            }
        })
    }

    /// Render the schema as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a schema file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EnvCheckError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let schema = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), fields = schema.len(), "loaded schema");
        Ok(schema)
    }

    /// Write the schema file, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        tracing::debug!(path = %path.display(), fields = self.len(), "saved schema");
        Ok(())
    }
}

impl FromIterator<(String, FieldSpec)> for SchemaDefinition {
    fn from_iter<I: IntoIterator<Item = (String, FieldSpec)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (key, spec) in iter {
            schema.insert(key, spec);
        }
        schema
    }
}

impl Serialize for SchemaDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, spec) in &self.fields {
            map.serialize_entry(key, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SchemaDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = SchemaDefinition;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping variable names to field specs")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut schema = SchemaDefinition::new();
                while let Some((key, spec)) = access.next_entry::<String, FieldSpec>()? {
                    schema.insert(key, spec);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parsing_is_case_insensitive() {
        assert_eq!("Number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert_eq!("IPADDRESS".parse::<FieldType>().unwrap(), FieldType::IpAddress);
        assert!(matches!(
            "uuid".parse::<FieldType>(),
            Err(EnvCheckError::UnknownFieldType(t)) if t == "uuid"
        ));
    }

    #[test]
    fn test_required_defaults_to_true() {
        let schema = SchemaDefinition::from_json_str(r#"{"PORT": {"type": "number"}}"#).unwrap();
        let spec = schema.get("PORT").unwrap();
        assert!(spec.required);
        assert_eq!(spec.field_type, Some(FieldType::Number));
        assert!(!spec.sensitive);
    }

    #[test]
    fn test_definition_order_preserved() {
        let json = r#"{"ZETA": {}, "ALPHA": {}, "MIDDLE": {}}"#;
        let schema = SchemaDefinition::from_json_str(json).unwrap();
        let keys: Vec<_> = schema.keys().collect();
        assert_eq!(keys, vec!["ZETA", "ALPHA", "MIDDLE"]);

        let rendered = schema.to_json_pretty().unwrap();
        let zeta = rendered.find("ZETA").unwrap();
        let alpha = rendered.find("ALPHA").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_scalar_defaults_and_enums_become_strings() {
        let json = r#"{"PORT": {"default": 3000, "enum": [1, true, "x"]}}"#;
        let schema = SchemaDefinition::from_json_str(json).unwrap();
        let spec = schema.get("PORT").unwrap();
        assert_eq!(spec.default.as_deref(), Some("3000"));
        assert_eq!(
            spec.allowed.as_deref(),
            Some(&["1".to_string(), "true".to_string(), "x".to_string()][..])
        );
    }

    #[test]
    fn test_non_object_schema_is_invalid() {
        let err = SchemaDefinition::from_json_str(r#"["PORT"]"#).unwrap_err();
        assert!(matches!(err, EnvCheckError::InvalidSchema(_)));

        let err = SchemaDefinition::from_json_str(r#"{"PORT": {"type": "uuid"}}"#).unwrap_err();
        assert!(matches!(err, EnvCheckError::InvalidSchema(msg) if msg.contains("uuid")));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut schema = SchemaDefinition::new();
        schema.insert("A", FieldSpec::of_type(FieldType::String));
        schema.insert("B", FieldSpec::of_type(FieldType::String));
        let previous = schema.insert("A", FieldSpec::of_type(FieldType::Number));

        assert_eq!(previous.unwrap().field_type, Some(FieldType::String));
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(schema.get("A").unwrap().field_type, Some(FieldType::Number));
    }

    #[test]
    fn test_merge_missing_keeps_existing_entries() {
        let mut existing: SchemaDefinition = [
            ("A".to_string(), FieldSpec::of_type(FieldType::Url)),
        ]
        .into_iter()
        .collect();
        let inferred: SchemaDefinition = [
            ("A".to_string(), FieldSpec::of_type(FieldType::String)),
            ("B".to_string(), FieldSpec::of_type(FieldType::Number)),
        ]
        .into_iter()
        .collect();

        assert_eq!(existing.merge_missing(inferred), 1);
        assert_eq!(existing.get("A").unwrap().field_type, Some(FieldType::Url));
        assert_eq!(existing.get("B").unwrap().field_type, Some(FieldType::Number));
    }

    #[test]
    fn test_serialization_skips_unset_fields() {
        let schema: SchemaDefinition =
            [("HOST".to_string(), FieldSpec::of_type(FieldType::String))]
                .into_iter()
                .collect();
        let value: serde_json::Value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"HOST": {"type": "string", "required": true}})
        );
    }
}
