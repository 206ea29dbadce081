//! Property-based tests for diffing, inference and dotenv rendering.
//!
//! Test coverage:
//! - diff: every key lands in exactly one bucket with the right values
//! - diff: swapping the inputs swaps the one-sided buckets
//! - inference: a schema inferred from a set never reports missing variables for it
//! - dotenv: rendered values read back unchanged

use std::collections::BTreeSet;

use proptest::prelude::*;

use env_check::format::{self, EnvFormat};
use env_check::{diff, ConfigurationSet, SchemaInferencer, SchemaValidator};

/// Strategy for variable names in the usual SCREAMING_SNAKE_CASE form
fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,8}"
}

/// Strategy for values, mixing typed-looking literals with arbitrary text
fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("true".to_string()),
        Just("0".to_string()),
        Just("http://localhost:8080".to_string()),
        Just("ops@example.com".to_string()),
        (0u32..100_000).prop_map(|n| n.to_string()),
        "[a-zA-Z0-9 ._$#,;'\"-]{0,16}",
    ]
}

fn config_strategy() -> impl Strategy<Value = ConfigurationSet> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..12)
}

/// Two sets drawn from a shared key pool so overlaps are common
fn config_pair_strategy() -> impl Strategy<Value = (ConfigurationSet, ConfigurationSet)> {
    let pool = prop::collection::vec(key_strategy(), 1..8);
    pool.prop_flat_map(|keys| {
        let pick = prop::sample::subsequence(keys.clone(), 0..=keys.len());
        let side = (pick, prop::collection::vec(prop_oneof![Just("a"), Just("b")], keys.len()))
            .prop_map(|(chosen, values)| {
                chosen
                    .into_iter()
                    .zip(values)
                    .map(|(k, v)| (k, v.to_string()))
                    .collect::<ConfigurationSet>()
            });
        (side.clone(), side)
    })
}

proptest! {
    #[test]
    fn prop_diff_partitions_every_key((first, second) in config_pair_strategy()) {
        let result = diff(&first, &second);

        let all: BTreeSet<&String> = first.keys().chain(second.keys()).collect();
        prop_assert_eq!(result.summary().total, all.len());

        for key in all {
            let buckets = [
                result.only_in_first.contains_key(key),
                result.only_in_second.contains_key(key),
                result.different.contains_key(key),
                result.same.contains_key(key),
            ];
            prop_assert_eq!(buckets.iter().filter(|b| **b).count(), 1, "key {}", key);
        }

        for (key, value) in &result.same {
            prop_assert_eq!(&first[key], value);
            prop_assert_eq!(&second[key], value);
        }
        for (key, pair) in &result.different {
            prop_assert_eq!(&first[key], &pair.first);
            prop_assert_eq!(&second[key], &pair.second);
            prop_assert_ne!(&pair.first, &pair.second);
        }
        for key in result.only_in_first.keys() {
            prop_assert!(!second.contains_key(key));
        }
        for key in result.only_in_second.keys() {
            prop_assert!(!first.contains_key(key));
        }
    }

    #[test]
    fn prop_diff_swaps_with_arguments((first, second) in config_pair_strategy()) {
        let forward = diff(&first, &second);
        let backward = diff(&second, &first);

        prop_assert_eq!(&forward.only_in_first, &backward.only_in_second);
        prop_assert_eq!(&forward.only_in_second, &backward.only_in_first);
        prop_assert_eq!(&forward.same, &backward.same);
        prop_assert_eq!(
            forward.different.keys().collect::<Vec<_>>(),
            backward.different.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_diff_with_self_has_no_differences(config in config_strategy()) {
        let result = diff(&config, &config);
        prop_assert!(!result.has_differences());
        prop_assert_eq!(result.same, config);
    }

    #[test]
    fn prop_inferred_schema_covers_its_source(config in config_strategy()) {
        let schema = SchemaInferencer::new().infer(&config);
        prop_assert_eq!(schema.len(), config.len());

        let result = SchemaValidator::new().validate(&config, &schema).unwrap();
        prop_assert!(result.warnings.is_empty());
        for error in &result.errors {
            prop_assert!(!error.message.starts_with("Required variable"));
        }
    }

    #[test]
    fn prop_dotenv_render_reads_back(config in config_strategy()) {
        let rendered = format::render(&config, EnvFormat::Dotenv).unwrap();
        let parsed = format::parse_str(&rendered, EnvFormat::Dotenv).unwrap();
        prop_assert_eq!(parsed, config);
    }
}
