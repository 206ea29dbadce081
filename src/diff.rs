//! Configuration set comparison

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::ConfigurationSet;

/// Values of a key present in both sets with different values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePair {
    pub first: String,
    pub second: String,
}

/// Keys of two configuration sets, partitioned into four buckets.
///
/// Every key present in either input lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub only_in_first: BTreeMap<String, String>,
    pub only_in_second: BTreeMap<String, String>,
    pub different: BTreeMap<String, ValuePair>,
    pub same: BTreeMap<String, String>,
}

/// Bucket sizes of a [`DiffResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total: usize,
    pub identical: usize,
    pub different: usize,
    pub only_in_first: usize,
    pub only_in_second: usize,
}

impl DiffResult {
    /// Whether the two sets differ at all
    pub fn has_differences(&self) -> bool {
        !(self.only_in_first.is_empty() && self.only_in_second.is_empty() && self.different.is_empty())
    }

    pub fn summary(&self) -> DiffSummary {
        let identical = self.same.len();
        let different = self.different.len();
        let only_in_first = self.only_in_first.len();
        let only_in_second = self.only_in_second.len();
        DiffSummary {
            total: identical + different + only_in_first + only_in_second,
            identical,
            different,
            only_in_first,
            only_in_second,
        }
    }
}

/// Compare two configuration sets by key and exact value
pub fn diff(first: &ConfigurationSet, second: &ConfigurationSet) -> DiffResult {
    let mut result = DiffResult::default();

    for (key, value) in first {
        match second.get(key) {
            None => {
                result.only_in_first.insert(key.clone(), value.clone());
            }
            Some(other) if other != value => {
                result.different.insert(
                    key.clone(),
                    ValuePair {
                        first: value.clone(),
                        second: other.clone(),
                    },
                );
            }
            Some(_) => {
                result.same.insert(key.clone(), value.clone());
            }
        }
    }

    for (key, value) in second {
        if !first.contains_key(key) {
            result.only_in_second.insert(key.clone(), value.clone());
        }
    }

    tracing::debug!(
        different = result.different.len(),
        only_in_first = result.only_in_first.len(),
        only_in_second = result.only_in_second.len(),
        "compared configuration sets"
    );
    result
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

    #[test]
    fn test_buckets() {
        let a = config(&[("HOST", "a"), ("PORT", "80"), ("ONLY_A", "1")]);
        let b = config(&[("HOST", "a"), ("PORT", "8080"), ("ONLY_B", "2")]);

        let result = diff(&a, &b);
        assert_eq!(result.same, config(&[("HOST", "a")]));
        assert_eq!(result.only_in_first, config(&[("ONLY_A", "1")]));
        assert_eq!(result.only_in_second, config(&[("ONLY_B", "2")]));
        assert_eq!(
            result.different["PORT"],
            ValuePair {
                first: "80".to_string(),
                second: "8080".to_string()
            }
        );
        assert!(result.has_differences());
    }

    #[test]
    fn test_comparison_is_exact() {
        let a = config(&[("FLAG", "true")]);
        let b = config(&[("FLAG", "TRUE")]);
        assert_eq!(diff(&a, &b).different.len(), 1);
    }

    #[test]
    fn test_identical_sets() {
        let a = config(&[("A", "1"), ("B", "2")]);
        let result = diff(&a, &a);
        assert!(!result.has_differences());
        assert_eq!(result.same, a);
    }

    #[test]
    fn test_summary_counts() {
        let a = config(&[("A", "1"), ("B", "2"), ("C", "3")]);
        let b = config(&[("A", "1"), ("B", "x"), ("D", "4")]);
        let summary = diff(&a, &b).summary();
        assert_eq!(
            summary,
            DiffSummary {
                total: 4,
                identical: 1,
                different: 1,
                only_in_first: 1,
                only_in_second: 1,
            }
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let a = config(&[("A", "1"), ("B", "2")]);
        let b = config(&[("B", "3")]);
        let value = serde_json::to_value(diff(&a, &b)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "onlyInFirst": {"A": "1"},
                "onlyInSecond": {},
                "different": {"B": {"first": "2", "second": "3"}},
                "same": {}
            })
        );
    }
}
