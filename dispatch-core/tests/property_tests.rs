//! Property-based tests for dispatch invariants
//!
//! These tests use proptest to verify:
//! - String arguments pass through the marshaller unchanged and in order
//! - Non-string JSON arguments survive a marshal/parse round-trip
//! - Operation resolution is total and deterministic

use dispatch_core::{
    marshal_arguments, Operation, OperationResolver, Resolution, SUPPORTED_DATA_FORMAT,
};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for generating arbitrary JSON values (excluding top-level strings)
fn non_string_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON numbers are finite", |f| f.is_finite())
            .prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ];

    let nested = leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    });

    nested.prop_filter("top-level strings pass through verbatim", |v| !v.is_string())
}

/// Strategy for generating operation hints that are not recognised
fn unknown_hint_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_]{0,10}".prop_filter("must not be a known verb", |h| {
        !["POST", "PUT", "PATCH", "GET"]
            .iter()
            .any(|verb| verb.eq_ignore_ascii_case(h))
    })
}

proptest! {
    #[test]
    fn prop_strings_unchanged(strings in prop::collection::vec(".*", 0..16)) {
        let args: Vec<Value> = strings.iter().cloned().map(Value::String).collect();
        let marshalled = marshal_arguments(&args);

        prop_assert_eq!(marshalled, strings);
    }

    #[test]
    fn prop_non_strings_round_trip(values in prop::collection::vec(non_string_value_strategy(), 0..8)) {
        let marshalled = marshal_arguments(&values);
        prop_assert_eq!(marshalled.len(), values.len());

        for (text, original) in marshalled.iter().zip(values.iter()) {
            let parsed: Value = serde_json::from_str(text).unwrap();
            prop_assert_eq!(&parsed, original);
        }
    }

    #[test]
    fn prop_unknown_hint_resolves_to_add(hint in unknown_hint_strategy()) {
        let resolver = OperationResolver::default();

        prop_assert_eq!(resolver.resolve_hint(&hint), Some(Operation::Add));
        prop_assert_eq!(
            resolver.resolve_event(&hint, SUPPORTED_DATA_FORMAT),
            Resolution::Resolved(Operation::Add)
        );
    }

    #[test]
    fn prop_unsupported_format_never_resolves(
        hint in "[A-Z]{0,6}",
        format in "[A-Z0-9_-]{0,16}",
    ) {
        prop_assume!(format != SUPPORTED_DATA_FORMAT);
        let resolver = OperationResolver::default();

        prop_assert_eq!(
            resolver.resolve_event(&hint, &format),
            Resolution::UnsupportedFormat(format.clone())
        );
    }
}

#[test]
fn test_http_verbs_resolve_totally_and_deterministically() {
    let expected = [
        ("GET", Operation::Query),
        ("POST", Operation::Add),
        ("PUT", Operation::Replace),
        ("PATCH", Operation::Update),
    ];

    for (verb, op) in expected {
        for _ in 0..3 {
            assert_eq!(OperationResolver::resolve_method(verb), Some(op));
        }
        assert!(Operation::ALL.contains(&op));
    }
}

#[test]
fn test_mixed_arguments_keep_order() {
    let args = vec![json!("p-9"), json!({"id": "p-9"}), json!(3)];
    let marshalled = marshal_arguments(&args);

    assert_eq!(marshalled, vec!["p-9", r#"{"id":"p-9"}"#, "3"]);
}
