//! Property-based tests for keyword validation
//!
//! Leaf keywords are cross-checked against independent single-predicate
//! oracles, and terse evaluation is checked against verbose evaluation over
//! arbitrary instances.

use proptest::prelude::*;
use serde_json::{json, Value};
use tessera_schema::{is_valid, validate, JsonSchema, OutputFormat};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        (-1.0e6..1.0e6f64).prop_map(|f| json!(f)),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        3,  // max depth
        24, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map("[a-c]{1,2}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

fn composite_schema() -> Value {
    json!({
        "anyOf": [
            {"type": "string", "minLength": 3},
            {"type": "array", "items": {"type": "integer"}, "maxItems": 3},
            {
                "type": "object",
                "properties": {"a": {"minimum": 0}},
                "additionalProperties": {"type": ["string", "null"]},
                "dependentRequired": {"b": ["c"]}
            }
        ],
        "not": {"const": 0}
    })
}

proptest! {
    #[test]
    fn prop_minimum_matches_oracle(value in any::<i64>(), bound in any::<i64>()) {
        let verdict = is_valid(&json!({"minimum": bound}), &json!(value)).unwrap();
        prop_assert_eq!(verdict, value >= bound);
    }

    #[test]
    fn prop_exclusive_maximum_matches_oracle(value in -1.0e9..1.0e9f64, bound in -1.0e9..1.0e9f64) {
        let verdict = is_valid(&json!({"exclusiveMaximum": bound}), &json!(value)).unwrap();
        prop_assert_eq!(verdict, value < bound);
    }

    #[test]
    fn prop_integer_multiple_of_matches_remainder(value in -100_000i64..100_000, divisor in 1i64..1_000) {
        let verdict = is_valid(&json!({"multipleOf": divisor}), &json!(value)).unwrap();
        prop_assert_eq!(verdict, value % divisor == 0);
    }

    #[test]
    fn prop_float_multiple_of_matches_oracle(
        factor in -1_000_000_000i64..1_000_000_000,
        divisor in prop::sample::select(vec![0.25f64, 0.5, 1.5, 2.0, 12.5]),
        half_step in any::<bool>(),
    ) {
        // every value here is exactly representable, so the quotient is exact
        let quotient = factor as f64 + if half_step { 0.5 } else { 0.0 };
        let value = quotient * divisor;
        let verdict = is_valid(&json!({"multipleOf": divisor}), &json!(value)).unwrap();
        prop_assert_eq!(verdict, !half_step);
    }

    #[test]
    fn prop_max_length_counts_characters(text in "\\PC{0,12}", limit in 0u64..12) {
        let verdict = is_valid(&json!({"maxLength": limit}), &json!(text)).unwrap();
        prop_assert_eq!(verdict, text.chars().count() as u64 <= limit);
    }

    #[test]
    fn prop_required_matches_oracle(instance in json_value_strategy()) {
        let verdict = is_valid(&json!({"required": ["a", "b"]}), &instance).unwrap();
        let expected = match &instance {
            Value::Object(map) => map.contains_key("a") && map.contains_key("b"),
            _ => true,
        };
        prop_assert_eq!(verdict, expected);
    }

    #[test]
    fn prop_terse_and_verbose_agree(instance in json_value_strategy()) {
        let schema = composite_schema();
        let flag = validate(&schema, &instance, OutputFormat::Flag).unwrap();
        for format in [OutputFormat::Basic, OutputFormat::Detailed, OutputFormat::Verbose] {
            let full = validate(&schema, &instance, format).unwrap();
            prop_assert_eq!(flag.is_valid, full.is_valid);
        }
    }

    #[test]
    fn prop_instance_locations_resolve(instance in json_value_strategy()) {
        let results = validate(&composite_schema(), &instance, OutputFormat::Verbose).unwrap();
        let mut pending = vec![&results];
        while let Some(node) = pending.pop() {
            prop_assert!(node.instance_location.evaluate(&instance).is_some());
            pending.extend(node.nested_results.iter());
        }
    }

    #[test]
    fn prop_schema_round_trips(instance in json_value_strategy()) {
        let document = json!({"enum": [instance.clone()], "const": instance, "title": "generated"});
        let schema = JsonSchema::from_value(&document).unwrap();
        prop_assert_eq!(schema.to_json(), document);
    }
}
