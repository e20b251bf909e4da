//! Property-based tests for topic filter validation.
//!
//! The broker owns topic matching; these properties pin down which filter
//! shapes the relay accepts before ever talking to a broker.

use proptest::prelude::*;

use mqtt_relay::topics::{validate_publish_topic, TopicFilter};

/// Strategy for generating plain topic levels (no wildcards)
fn plain_level_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,10}".prop_map(|s| s)
}

/// Strategy for generating plain multi-level topics
fn plain_topic_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(plain_level_strategy(), 1..5).prop_map(|levels| levels.join("/"))
}

/// Strategy for valid filters with `+` wildcards: each level is either plain
/// or exactly `+`
fn single_wildcard_filter_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![plain_level_strategy(), Just("+".to_string())],
        1..5,
    )
    .prop_map(|levels| levels.join("/"))
}

/// Strategy for valid filters ending in the multi-level wildcard
fn multi_wildcard_filter_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("#".to_string()),
        prop::collection::vec(plain_level_strategy(), 1..4)
            .prop_map(|levels| format!("{}/#", levels.join("/"))),
    ]
}

/// Strategy for filters where `#` is not the last level (always invalid)
fn hash_not_last_strategy() -> impl Strategy<Value = String> {
    (plain_level_strategy(), plain_level_strategy())
        .prop_map(|(a, b)| format!("{}/#/{}", a, b))
}

/// Strategy for levels that embed a wildcard in other characters (invalid)
fn embedded_wildcard_strategy() -> impl Strategy<Value = String> {
    (plain_level_strategy(), prop_oneof![Just('+'), Just('#')])
        .prop_map(|(level, wc)| format!("{}{}", level, wc))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any plain hierarchical topic is a valid filter and round-trips
    // through the constructor unchanged.
    #[test]
    fn prop_plain_topic_is_valid_filter(topic in plain_topic_strategy()) {
        let filter = TopicFilter::new(topic.clone());
        prop_assert!(filter.is_ok());
        let filter = filter.unwrap();
        prop_assert_eq!(filter.as_str(), topic.as_str());
        prop_assert!(!filter.is_wildcard());
    }

    // `+` occupying whole levels is always accepted and flagged as a
    // wildcard when present.
    #[test]
    fn prop_single_level_wildcards_are_valid(filter in single_wildcard_filter_strategy()) {
        let parsed = TopicFilter::new(filter.clone());
        prop_assert!(parsed.is_ok(), "filter {} should be valid", filter);
        let parsed = parsed.unwrap();
        prop_assert_eq!(
            parsed.is_wildcard(),
            filter.split('/').any(|l| l == "+"),
        );
    }

    // `#` as the final level is always accepted.
    #[test]
    fn prop_trailing_hash_is_valid(filter in multi_wildcard_filter_strategy()) {
        let parsed = TopicFilter::new(filter.clone());
        prop_assert!(parsed.is_ok(), "filter {} should be valid", filter);
        prop_assert!(parsed.unwrap().is_wildcard());
    }

    // `#` anywhere but the final level is always rejected.
    #[test]
    fn prop_hash_not_last_is_rejected(filter in hash_not_last_strategy()) {
        prop_assert!(TopicFilter::new(filter).is_err());
    }

    // A wildcard character glued to other characters in a level is rejected.
    #[test]
    fn prop_embedded_wildcard_is_rejected(level in embedded_wildcard_strategy()) {
        prop_assert!(TopicFilter::new(level).is_err());
    }

    // Every valid subscription filter without wildcards is also a valid
    // publish topic, and every wildcard filter is not.
    #[test]
    fn prop_publish_topic_accepts_exact_names_only(topic in plain_topic_strategy()) {
        let multi = format!("{}/#", topic);
        let single = format!("{}/+", topic);
        prop_assert!(validate_publish_topic(&topic).is_ok());
        prop_assert!(validate_publish_topic(&multi).is_err());
        prop_assert!(validate_publish_topic(&single).is_err());
    }
}
