//! Numeric keywords: bounds and `multipleOf`
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{describe, passed, Keyword, KeywordRegistry};
use crate::error::SchemaResult;
use crate::schema::SchemaBuilder;
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use serde_json::{Number, Value};
use std::any::Any;
use std::cmp::Ordering;

/// Absolute tolerance on the distance of a `multipleOf` quotient from an integer
pub const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("minimum", |value, builder| build_bound(BoundKind::Minimum, value, builder))
        .register("maximum", |value, builder| build_bound(BoundKind::Maximum, value, builder))
        .register("exclusiveMinimum", |value, builder| {
            decline_unless_number(BoundKind::ExclusiveMinimum, value, builder)
        })
        .register("exclusiveMinimum", |value, _| Ok(build_legacy("exclusiveMinimum", value)))
        .register("exclusiveMaximum", |value, builder| {
            decline_unless_number(BoundKind::ExclusiveMaximum, value, builder)
        })
        .register("exclusiveMaximum", |value, _| Ok(build_legacy("exclusiveMaximum", value)))
        .register("multipleOf", build_multiple_of);
}

/// Compare two JSON numbers, exactly when both are integers
pub fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (left.as_u64(), right.as_u64()) {
        return a.cmp(&b);
    }
    let a = left.as_f64().unwrap_or(f64::NAN);
    let b = right.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Whether `value` is an integral multiple of `divisor` (`divisor > 0`)
///
/// Zero is a multiple of everything. Integer pairs use exact remainders;
/// otherwise the quotient may deviate from the nearest integer by
/// [`MULTIPLE_OF_TOLERANCE`], or by a few ulps of the quotient when that is
/// larger.
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        return d != 0 && v % d == 0;
    }
    if let (Some(v), Some(d)) = (value.as_u64(), divisor.as_u64()) {
        return d != 0 && v % d == 0;
    }
    let (Some(v), Some(d)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if v == 0.0 {
        return true;
    }
    let quotient = v.abs() / d;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= MULTIPLE_OF_TOLERANCE.max(4.0 * f64::EPSILON * quotient)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundKind {
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
}

impl BoundKind {
    fn name(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
        }
    }

    fn parameter(self) -> &'static str {
        match self {
            Self::Minimum | Self::ExclusiveMinimum => "lowerBound",
            Self::Maximum | Self::ExclusiveMaximum => "upperBound",
        }
    }
}

fn build_bound(kind: BoundKind, value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    match value {
        Value::Number(bound) => Ok(Some(Box::new(BoundKeyword {
            kind,
            bound: bound.clone(),
        }))),
        other => Err(builder.invalid(kind.name(), format!("expected a number, found {}", describe(other)))),
    }
}

// booleans belong to the Draft04 variant registered after this one
fn decline_unless_number(
    kind: BoundKind,
    value: &Value,
    builder: &SchemaBuilder<'_>,
) -> SchemaResult<Option<Box<dyn Keyword>>> {
    if value.is_number() {
        build_bound(kind, value, builder)
    } else {
        Ok(None)
    }
}

fn build_legacy(name: &'static str, value: &Value) -> Option<Box<dyn Keyword>> {
    let flag = value.as_bool()?;
    Some(Box::new(LegacyExclusiveKeyword { name, value: flag }))
}

/// `minimum`, `maximum` and the Draft06+ numeric `exclusiveMinimum`/`exclusiveMaximum`
#[derive(Debug, Clone)]
pub struct BoundKeyword {
    kind: BoundKind,
    bound: Number,
}

impl BoundKeyword {
    pub fn bound(&self) -> &Number {
        &self.bound
    }

    /// Draft04 boolean sibling that turns `minimum`/`maximum` strict
    fn is_strict(&self, context: &ValidationContext<'_>) -> bool {
        let sibling = match self.kind {
            BoundKind::Minimum => "exclusiveMinimum",
            BoundKind::Maximum => "exclusiveMaximum",
            BoundKind::ExclusiveMinimum | BoundKind::ExclusiveMaximum => return true,
        };
        context
            .local_schema()
            .and_then(|schema| schema.keyword(sibling))
            .and_then(|keyword| keyword.as_any().downcast_ref::<LegacyExclusiveKeyword>())
            .is_some_and(|legacy| legacy.value && legacy.supported_drafts().contains(context.draft()))
    }
}

impl Keyword for BoundKeyword {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn supported_drafts(&self) -> DraftSet {
        match self.kind {
            BoundKind::Minimum | BoundKind::Maximum => DraftSet::ALL,
            BoundKind::ExclusiveMinimum | BoundKind::ExclusiveMaximum => DraftSet::since(Draft::Draft06),
        }
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let name = self.kind.name();
        let keyword_context = context.push_keyword(name);
        let results = ValidationResults::new(Some(name), &keyword_context);
        let Value::Number(actual) = context.instance() else {
            return results;
        };

        let strict = self.is_strict(context);
        let ordering = compare_numbers(actual, &self.bound);
        let valid = match (self.kind, strict) {
            (BoundKind::Minimum | BoundKind::ExclusiveMinimum, false) => ordering != Ordering::Less,
            (BoundKind::Minimum | BoundKind::ExclusiveMinimum, true) => ordering == Ordering::Greater,
            (BoundKind::Maximum | BoundKind::ExclusiveMaximum, false) => ordering != Ordering::Greater,
            (BoundKind::Maximum | BoundKind::ExclusiveMaximum, true) => ordering == Ordering::Less,
        };
        if valid {
            return results;
        }

        let key = match self.kind {
            BoundKind::Minimum if strict => "minimum.exclusive",
            BoundKind::Maximum if strict => "maximum.exclusive",
            other => other.name(),
        };
        results
            .invalid(key)
            .with_info("actual", Value::Number(actual.clone()))
            .with_info(self.kind.parameter(), Value::Number(self.bound.clone()))
    }

    fn to_json(&self) -> Value {
        Value::Number(self.bound.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Draft04 boolean `exclusiveMinimum`/`exclusiveMaximum`; read by its numeric sibling
#[derive(Debug, Clone)]
pub struct LegacyExclusiveKeyword {
    name: &'static str,
    value: bool,
}

impl Keyword for LegacyExclusiveKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::only(Draft::Draft04)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name, context)
    }

    fn to_json(&self) -> Value {
        Value::Bool(self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `multipleOf`
#[derive(Debug, Clone)]
pub struct MultipleOfKeyword {
    divisor: Number,
}

fn build_multiple_of(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    match value {
        Value::Number(divisor) if divisor.as_f64().is_some_and(|d| d > 0.0) => {
            Ok(Some(Box::new(MultipleOfKeyword {
                divisor: divisor.clone(),
            })))
        }
        other => Err(builder.invalid(
            "multipleOf",
            format!("expected a number greater than zero, found {other}"),
        )),
    }
}

impl Keyword for MultipleOfKeyword {
    fn name(&self) -> &str {
        "multipleOf"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("multipleOf");
        let results = ValidationResults::new(Some("multipleOf"), &keyword_context);
        match context.instance() {
            Value::Number(actual) if !is_multiple_of(actual, &self.divisor) => results
                .invalid("multipleOf")
                .with_info("actual", Value::Number(actual.clone()))
                .with_info("divisor", Value::Number(self.divisor.clone())),
            _ => results,
        }
    }

    fn to_json(&self) -> Value {
        Value::Number(self.divisor.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn number(value: Value) -> Number {
        match value {
            Value::Number(number) => number,
            other => panic!("not a number: {other}"),
        }
    }

    #[rstest]
    #[case(json!(7.5), json!(7.5), true)]
    #[case(json!(-7.5), json!(7.5), true)]
    #[case(json!(0), json!(7.5), true)]
    #[case(json!(16), json!(7.5), false)]
    #[case(json!(0.3), json!(0.1), true)]
    #[case(json!(10), json!(3), false)]
    #[case(json!(-12), json!(4), true)]
    #[case(json!(4.5), json!(2), false)]
    #[case(json!(1_000_000_000.5), json!(1), false)]
    #[case(json!(1_000_000_001.0), json!(2), false)]
    #[case(json!(750_000_000.25), json!(0.5), false)]
    #[case(json!(750_000_000.5), json!(0.5), true)]
    fn test_multiple_of(#[case] value: Value, #[case] divisor: Value, #[case] expected: bool) {
        assert_eq!(is_multiple_of(&number(value), &number(divisor)), expected);
    }

    #[test]
    fn test_compare_large_integers_exactly() {
        let a = number(json!(9_007_199_254_740_993_i64));
        let b = number(json!(9_007_199_254_740_992_i64));
        assert_eq!(compare_numbers(&a, &b), Ordering::Greater);
        assert_eq!(compare_numbers(&number(json!(1)), &number(json!(1.0))), Ordering::Equal);
    }

    #[test]
    fn test_exclusive_minimum_shapes() {
        let modern = crate::JsonSchema::from_value(&json!({"exclusiveMinimum": 5})).unwrap();
        assert!(modern.keyword_as::<BoundKeyword>().is_some());

        let legacy = crate::JsonSchema::from_value(&json!({"exclusiveMinimum": true})).unwrap();
        assert!(legacy.keyword_as::<LegacyExclusiveKeyword>().is_some());

        assert!(crate::JsonSchema::from_value(&json!({"exclusiveMinimum": "5"})).is_err());
        assert!(crate::JsonSchema::from_value(&json!({"multipleOf": 0})).is_err());
    }
}
