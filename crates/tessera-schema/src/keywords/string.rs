//! String keywords: `minLength`, `maxLength`, `pattern`
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{describe, expect_count, Keyword, KeywordRegistry};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::SchemaBuilder;
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{DraftSet, Vocabulary};
use regex::Regex;
use serde_json::Value;
use std::any::Any;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("minLength", |value, builder| {
            Ok(Some(Box::new(LengthKeyword {
                name: "minLength",
                limit: expect_count("minLength", value, builder)?,
            })))
        })
        .register("maxLength", |value, builder| {
            Ok(Some(Box::new(LengthKeyword {
                name: "maxLength",
                limit: expect_count("maxLength", value, builder)?,
            })))
        })
        .register("pattern", build_pattern);
}

/// Length is counted in Unicode scalar values
#[derive(Debug, Clone)]
pub struct LengthKeyword {
    name: &'static str,
    limit: u64,
}

impl Keyword for LengthKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let results = ValidationResults::new(Some(self.name), &context.push_keyword(self.name));
        let Value::String(text) = context.instance() else {
            return results;
        };
        let length = text.chars().count() as u64;
        let (valid, parameter) = if self.name == "minLength" {
            (length >= self.limit, "lowerBound")
        } else {
            (length <= self.limit, "upperBound")
        };
        if valid {
            results
        } else {
            results
                .invalid(self.name)
                .with_info("actual", length)
                .with_info(parameter, self.limit)
        }
    }

    fn to_json(&self) -> Value {
        Value::from(self.limit)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Compile a schema regex, reporting failures at the builder's location
pub(crate) fn compile_pattern(pattern: &str, builder: &SchemaBuilder<'_>) -> SchemaResult<Regex> {
    Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
        pattern: pattern.to_string(),
        location: builder.location().to_string(),
        source,
    })
}

/// `pattern`; matches anywhere in the string
#[derive(Debug, Clone)]
pub struct PatternKeyword {
    regex: Regex,
}

fn build_pattern(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let pattern = value
        .as_str()
        .ok_or_else(|| builder.invalid("pattern", format!("expected a string, found {}", describe(value))))?;
    Ok(Some(Box::new(PatternKeyword {
        regex: compile_pattern(pattern, builder)?,
    })))
}

impl Keyword for PatternKeyword {
    fn name(&self) -> &str {
        "pattern"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let results = ValidationResults::new(Some("pattern"), &context.push_keyword("pattern"));
        match context.instance() {
            Value::String(text) if !self.regex.is_match(text) => results
                .invalid("pattern")
                .with_info("actual", text.as_str())
                .with_info("pattern", self.regex.as_str()),
            _ => results,
        }
    }

    fn to_json(&self) -> Value {
        Value::from(self.regex.as_str())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SchemaError;
    use crate::JsonSchema;
    use serde_json::json;

    #[test]
    fn test_invalid_pattern_reports_location() {
        let error = JsonSchema::from_value(&json!({"properties": {"code": {"pattern": "(unclosed"}}})).unwrap_err();
        match error {
            SchemaError::InvalidPattern { location, pattern, .. } => {
                assert_eq!(location, "/properties/code/pattern");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_lengths_must_be_counts() {
        assert!(JsonSchema::from_value(&json!({"minLength": 2})).is_ok());
        assert!(JsonSchema::from_value(&json!({"minLength": 2.0})).is_ok());
        assert!(JsonSchema::from_value(&json!({"maxLength": -1})).is_err());
        assert!(JsonSchema::from_value(&json!({"maxLength": 1.5})).is_err());
    }
}
