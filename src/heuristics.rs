//! Heuristic tables shared by inference and validation
//!
//! Each table is a named constant so the inferencer and validator can own a
//! copy and callers can replace it. Type detection is an ordered chain of
//! [`TypeRule`]s: categories overlap (`"1"` is both numeric and boolean-like),
//! so the first matching rule wins.

use regex::Regex;

use crate::schema::FieldType;

/// Key substrings that mark a variable as sensitive (case-sensitive)
pub const SENSITIVE_KEYWORDS: &[&str] = &["SECRET", "PASSWORD", "KEY", "TOKEN", "AUTH"];

/// Key substrings that mark a variable as optional with a default
pub const DEFAULT_MARKERS: &[&str] = &["DEFAULT", "FALLBACK"];

/// Lower-cased literals that inference treats as booleans
pub const INFERRED_BOOLEAN_LITERALS: &[&str] = &["true", "false", "yes", "no", "0", "1"];

/// Enum attached to every inferred boolean field
pub const BOOLEAN_ENUM: &[&str] = &["true", "false", "0", "1", "yes", "no"];

/// Lower-cased literals the validator accepts for `boolean`
pub const VALIDATOR_BOOLEAN_LITERALS: &[&str] = &["true", "false", "0", "1"];

/// Replacement for sensitive values in generated examples
pub const MASK: &str = "********";

pub const URL_PREFIX_PATTERN: &str = r"^https?://";
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
/// Dotted quad; octets are not range checked
pub const IPV4_PATTERN: &str = r"^([0-9]{1,3}\.){3}[0-9]{1,3}$";

pub(crate) fn builtin_regex(pattern: &'static str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

/// Whether the whole value is a decimal, integer or float literal.
///
/// Literals too large for `f64` such as `1e400` still count; the spelled-out
/// `inf`, `infinity` and `nan` forms do not.
pub fn is_numeric(value: &str) -> bool {
    let unsigned = value.trim_start_matches(['+', '-']).to_ascii_lowercase();
    if unsigned.starts_with("inf") || unsigned.starts_with("nan") {
        return false;
    }
    value.parse::<f64>().is_ok()
}

/// Case-sensitive substring match of a variable name against keywords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Matcher over [`SENSITIVE_KEYWORDS`]
    pub fn sensitive() -> Self {
        Self::new(SENSITIVE_KEYWORDS.iter().copied())
    }

    /// Matcher over [`DEFAULT_MARKERS`]
    pub fn default_markers() -> Self {
        Self::new(DEFAULT_MARKERS.iter().copied())
    }

    /// Add keywords to the matcher
    pub fn extend<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for keyword in keywords {
            let keyword = keyword.into();
            if !keyword.is_empty() && !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn matches(&self, key: &str) -> bool {
        self.keywords.iter().any(|k| key.contains(k.as_str()))
    }
}

/// Predicate over a raw value
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// Finite numeric literal
    Numeric,
    /// Lower-cased value is one of the literals
    Literals(Vec<String>),
    /// Value matches the regular expression
    Pattern(Regex),
}

impl ValueMatcher {
    pub fn literals(values: &[&str]) -> Self {
        Self::Literals(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueMatcher::Numeric => is_numeric(value),
            ValueMatcher::Literals(literals) => {
                let lower = value.to_lowercase();
                literals.iter().any(|l| *l == lower)
            }
            ValueMatcher::Pattern(re) => re.is_match(value),
        }
    }
}

/// One step of the type inference chain
#[derive(Debug, Clone)]
pub struct TypeRule {
    pub field_type: FieldType,
    pub matcher: ValueMatcher,
    /// Enum attached to fields inferred by this rule
    pub allowed: Option<Vec<String>>,
}

impl TypeRule {
    pub fn new(field_type: FieldType, matcher: ValueMatcher) -> Self {
        Self {
            field_type,
            matcher,
            allowed: None,
        }
    }

    pub fn with_allowed(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn matches(&self, value: &str) -> bool {
        self.matcher.matches(value)
    }

    /// The default chain: number, boolean, url, email, ipaddress.
    ///
    /// Values matching none of the rules are strings.
    pub fn default_chain() -> Vec<TypeRule> {
        vec![
            TypeRule::new(FieldType::Number, ValueMatcher::Numeric),
            TypeRule::new(
                FieldType::Boolean,
                ValueMatcher::literals(INFERRED_BOOLEAN_LITERALS),
            )
            .with_allowed(BOOLEAN_ENUM),
            TypeRule::new(
                FieldType::Url,
                ValueMatcher::Pattern(builtin_regex(URL_PREFIX_PATTERN)),
            ),
            TypeRule::new(
                FieldType::Email,
                ValueMatcher::Pattern(builtin_regex(EMAIL_PATTERN)),
            ),
            TypeRule::new(
                FieldType::IpAddress,
                ValueMatcher::Pattern(builtin_regex(IPV4_PATTERN)),
            ),
        ]
    }
}
