//! Annotation keywords and inert unknown keys
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{describe, passed, Keyword, KeywordRegistry};
use crate::error::SchemaResult;
use crate::schema::SchemaBuilder;
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use serde_json::Value;
use std::any::Any;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("title", |value, builder| {
            annotation("title", value, builder, Shape::String, DraftSet::ALL, Vocabulary::META_DATA)
        })
        .register("description", |value, builder| {
            annotation("description", value, builder, Shape::String, DraftSet::ALL, Vocabulary::META_DATA)
        })
        .register("default", |value, builder| {
            annotation("default", value, builder, Shape::Any, DraftSet::ALL, Vocabulary::META_DATA)
        })
        .register("examples", |value, builder| {
            annotation(
                "examples",
                value,
                builder,
                Shape::Array,
                DraftSet::since(Draft::Draft06),
                Vocabulary::META_DATA,
            )
        })
        .register("readOnly", |value, builder| {
            annotation(
                "readOnly",
                value,
                builder,
                Shape::Boolean,
                DraftSet::since(Draft::Draft07),
                Vocabulary::META_DATA,
            )
        })
        .register("writeOnly", |value, builder| {
            annotation(
                "writeOnly",
                value,
                builder,
                Shape::Boolean,
                DraftSet::since(Draft::Draft07),
                Vocabulary::META_DATA,
            )
        })
        .register("deprecated", |value, builder| {
            annotation(
                "deprecated",
                value,
                builder,
                Shape::Boolean,
                DraftSet::since(Draft::Draft2019_09),
                Vocabulary::META_DATA,
            )
        })
        .register("format", |value, builder| {
            annotation("format", value, builder, Shape::String, DraftSet::ALL, Vocabulary::FORMAT)
        })
        .register("contentMediaType", |value, builder| {
            annotation(
                "contentMediaType",
                value,
                builder,
                Shape::String,
                DraftSet::since(Draft::Draft07),
                Vocabulary::CONTENT,
            )
        })
        .register("contentEncoding", |value, builder| {
            annotation(
                "contentEncoding",
                value,
                builder,
                Shape::String,
                DraftSet::since(Draft::Draft07),
                Vocabulary::CONTENT,
            )
        });
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Any,
    String,
    Boolean,
    Array,
}

fn annotation(
    name: &'static str,
    value: &Value,
    builder: &SchemaBuilder<'_>,
    shape: Shape,
    drafts: DraftSet,
    vocabulary: Vocabulary,
) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let accepted = match shape {
        Shape::Any => true,
        Shape::String => value.is_string(),
        Shape::Boolean => value.is_boolean(),
        Shape::Array => value.is_array(),
    };
    if !accepted {
        return Err(builder.invalid(name, format!("unexpected value {}", describe(value))));
    }
    Ok(Some(Box::new(AnnotationKeyword {
        name,
        value: value.clone(),
        drafts,
        vocabulary,
    })))
}

/// Keywords that describe the instance without constraining it
#[derive(Debug, Clone)]
pub struct AnnotationKeyword {
    name: &'static str,
    value: Value,
    drafts: DraftSet,
    vocabulary: Vocabulary,
}

impl AnnotationKeyword {
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Keyword for AnnotationKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        self.drafts
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(self.vocabulary.clone())
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name, context)
    }

    fn to_json(&self) -> Value {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A key no factory is registered for; kept so the schema round-trips
#[derive(Debug, Clone)]
pub struct UnknownKeyword {
    name: String,
    value: Value,
}

impl UnknownKeyword {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Keyword for UnknownKeyword {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        None
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(&self.name, context)
    }

    fn to_json(&self) -> Value {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::JsonSchema;
    use crate::versioning::{Draft, DraftSet};
    use serde_json::json;

    #[test]
    fn test_annotation_shapes() {
        assert!(JsonSchema::from_value(&json!({"title": "Person", "default": {"a": 1}})).is_ok());
        assert!(JsonSchema::from_value(&json!({"title": 3})).is_err());
        assert!(JsonSchema::from_value(&json!({"readOnly": "yes"})).is_err());
    }

    #[test]
    fn test_annotations_narrow_inferred_drafts() {
        let schema = JsonSchema::from_value(&json!({"deprecated": true, "title": "x"})).unwrap();
        assert_eq!(schema.supported_drafts(), DraftSet::only(Draft::Draft2019_09));

        let schema = JsonSchema::from_value(&json!({"x-vendor": [1, 2]})).unwrap();
        assert_eq!(schema.supported_drafts(), DraftSet::ALL);
    }
}
