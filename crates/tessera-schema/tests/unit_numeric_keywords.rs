//! Unit tests for numeric keywords across drafts
//!
//! Covers inclusive and exclusive bounds in both the Draft04 boolean shape and
//! the Draft06+ numeric shape, plus `multipleOf` tolerance.

use rstest::rstest;
use serde_json::{json, Value};
use tessera_schema::{is_valid, validate, OutputFormat};

const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";
const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

#[rstest]
#[case(json!(4), false)]
#[case(json!(5), true)]
#[case(json!(10), true)]
#[case(json!(4.999), false)]
#[case(json!("4"), true)]
fn test_minimum(#[case] instance: Value, #[case] expected: bool) {
    assert_eq!(is_valid(&json!({"minimum": 5}), &instance).unwrap(), expected);
}

#[test]
fn test_minimum_failure_reports_bound() {
    let results = validate(&json!({"minimum": 5}), &json!(4), OutputFormat::Detailed).unwrap();
    assert!(!results.is_valid);
    assert_eq!(results.keyword.as_deref(), Some("minimum"));
    assert_eq!(results.additional_info["actual"], json!(4));
    assert_eq!(results.additional_info["lowerBound"], json!(5));
    assert_eq!(
        results.error_message.as_deref(),
        Some("4 should be greater than or equal to 5.")
    );
}

#[test]
fn test_draft04_boolean_exclusive_minimum() {
    let schema = json!({"$schema": DRAFT_04, "minimum": 5, "exclusiveMinimum": true});
    assert!(!is_valid(&schema, &json!(5)).unwrap());
    assert!(is_valid(&schema, &json!(6)).unwrap());

    let results = validate(&schema, &json!(5), OutputFormat::Detailed).unwrap();
    assert_eq!(results.message_key.as_deref(), Some("minimum.exclusive"));
    assert_eq!(results.error_message.as_deref(), Some("5 should be greater than 5."));
}

#[test]
fn test_draft04_boolean_exclusive_false_keeps_inclusive_bound() {
    let schema = json!({"$schema": DRAFT_04, "maximum": 5, "exclusiveMaximum": false});
    assert!(is_valid(&schema, &json!(5)).unwrap());
    assert!(!is_valid(&schema, &json!(6)).unwrap());
}

#[test]
fn test_boolean_exclusive_shape_alone_infers_draft04() {
    let schema = json!({"maximum": 5, "exclusiveMaximum": true});
    assert!(!is_valid(&schema, &json!(5)).unwrap());
    assert!(is_valid(&schema, &json!(4)).unwrap());
}

#[rstest]
#[case(json!(5), false)]
#[case(json!(5.0001), true)]
#[case(json!(10), true)]
fn test_numeric_exclusive_minimum(#[case] instance: Value, #[case] expected: bool) {
    assert_eq!(is_valid(&json!({"exclusiveMinimum": 5}), &instance).unwrap(), expected);
}

#[test]
fn test_numeric_exclusive_maximum_under_draft07() {
    let schema = json!({"$schema": DRAFT_07, "exclusiveMaximum": 5});
    assert!(!is_valid(&schema, &json!(5)).unwrap());
    assert!(is_valid(&schema, &json!(4)).unwrap());
}

#[rstest]
#[case(json!(7.5), true)]
#[case(json!(15), true)]
#[case(json!(-22.5), true)]
#[case(json!(0), true)]
#[case(json!(16), false)]
#[case(json!(7.4), false)]
fn test_multiple_of_fraction(#[case] instance: Value, #[case] expected: bool) {
    assert_eq!(is_valid(&json!({"multipleOf": 7.5}), &instance).unwrap(), expected);
}

#[test]
fn test_multiple_of_absorbs_binary_rounding() {
    assert!(is_valid(&json!({"multipleOf": 0.01}), &json!(19.99)).unwrap());
    assert!(is_valid(&json!({"multipleOf": 0.1}), &json!(0.3)).unwrap());
}

#[rstest]
#[case(json!({"multipleOf": 1}), json!(1_000_000_000.5))]
#[case(json!({"multipleOf": 2}), json!(1_000_000_001.0))]
#[case(json!({"multipleOf": 0.5}), json!(750_000_000.25))]
#[case(json!({"multipleOf": 0.01}), json!(123_456_789.005))]
fn test_multiple_of_rejects_large_non_multiples(#[case] schema: Value, #[case] instance: Value) {
    assert!(!is_valid(&schema, &instance).unwrap());
}

#[test]
fn test_integer_type_depends_on_draft() {
    assert!(!is_valid(&json!({"$schema": DRAFT_04, "type": "integer"}), &json!(1.0)).unwrap());
    assert!(is_valid(&json!({"$schema": DRAFT_07, "type": "integer"}), &json!(1.0)).unwrap());
}
