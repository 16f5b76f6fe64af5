//! Array keywords: `items`, `additionalItems`, `minItems`, `maxItems`, `uniqueItems`
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{descend, describe, expect_count, json_equal, Keyword, KeywordRegistry, Tally};
use crate::error::SchemaResult;
use crate::registry::RegistrationScope;
use crate::schema::{JsonSchema, SchemaBuilder};
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{DraftSet, Vocabulary};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("items", build_items)
        .register("additionalItems", |value, builder| {
            Ok(Some(Box::new(AdditionalItemsKeyword {
                schema: builder.subschema(value, &[])?,
            })))
        })
        .register("minItems", |value, builder| {
            Ok(Some(Box::new(ItemCountKeyword {
                name: "minItems",
                limit: expect_count("minItems", value, builder)?,
            })))
        })
        .register("maxItems", |value, builder| {
            Ok(Some(Box::new(ItemCountKeyword {
                name: "maxItems",
                limit: expect_count("maxItems", value, builder)?,
            })))
        })
        .register("uniqueItems", |value, builder| {
            let unique = value.as_bool().ok_or_else(|| {
                builder.invalid("uniqueItems", format!("expected a boolean, found {}", describe(value)))
            })?;
            Ok(Some(Box::new(UniqueItemsKeyword { unique })))
        });
}

/// `items` in its single-schema or tuple form
#[derive(Debug)]
pub enum ItemsKeyword {
    Single(Arc<JsonSchema>),
    Tuple(Vec<Arc<JsonSchema>>),
}

fn build_items(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let keyword = match value {
        Value::Array(schemas) => ItemsKeyword::Tuple(
            schemas
                .iter()
                .enumerate()
                .map(|(index, schema)| builder.subschema(schema, &[index.to_string().as_str()]))
                .collect::<SchemaResult<Vec<_>>>()?,
        ),
        other => ItemsKeyword::Single(builder.subschema(other, &[])?),
    };
    Ok(Some(Box::new(keyword)))
}

impl ItemsKeyword {
    /// Number of leading items covered by a tuple form
    pub fn tuple_len(&self) -> Option<usize> {
        match self {
            ItemsKeyword::Single(_) => None,
            ItemsKeyword::Tuple(schemas) => Some(schemas.len()),
        }
    }
}

impl Keyword for ItemsKeyword {
    fn name(&self) -> &str {
        "items"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("items");
        let results = ValidationResults::new(Some("items"), &keyword_context);
        let Value::Array(items) = context.instance() else {
            return results;
        };

        let mut tally = Tally::new(context);
        match self {
            ItemsKeyword::Single(schema) => {
                for (index, item) in items.iter().enumerate() {
                    let child = keyword_context.push_instance(item, index.to_string());
                    if !tally.record(schema.validate(&child)) {
                        break;
                    }
                }
            }
            ItemsKeyword::Tuple(schemas) => {
                for (index, (schema, item)) in schemas.iter().zip(items).enumerate() {
                    let segment = index.to_string();
                    let child = keyword_context
                        .push_schema(&[segment.as_str()])
                        .push_instance(item, segment.clone());
                    if !tally.record(schema.validate(&child)) {
                        break;
                    }
                }
            }
        }

        let results = results.with_nested(std::mem::take(&mut tally.nested));
        if tally.failed == 0 {
            return results;
        }
        results
            .invalid("items")
            .with_info("failed", tally.failed)
            .with_info("total", tally.total)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        match self {
            ItemsKeyword::Single(schema) => scope.register_subschema(schema, &["items"]),
            ItemsKeyword::Tuple(schemas) => {
                for (index, schema) in schemas.iter().enumerate() {
                    scope.register_subschema(schema, &["items", index.to_string().as_str()])?;
                }
                Ok(())
            }
        }
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        match self {
            ItemsKeyword::Single(schema) => descend(schema, pointer),
            ItemsKeyword::Tuple(schemas) => {
                let (first, rest) = pointer.split_first()?;
                let index: usize = first.parse().ok()?;
                descend(schemas.get(index)?, rest)
            }
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ItemsKeyword::Single(schema) => schema.to_json(),
            ItemsKeyword::Tuple(schemas) => Value::Array(schemas.iter().map(|schema| schema.to_json()).collect()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `additionalItems`: applies to items beyond a tuple-form `items`
#[derive(Debug)]
pub struct AdditionalItemsKeyword {
    schema: Arc<JsonSchema>,
}

impl Keyword for AdditionalItemsKeyword {
    fn name(&self) -> &str {
        "additionalItems"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn sequence(&self) -> i32 {
        2
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("additionalItems");
        let results = ValidationResults::new(Some("additionalItems"), &keyword_context);
        let Value::Array(items) = context.instance() else {
            return results;
        };
        let Some(covered) = context
            .local_schema()
            .and_then(|schema| schema.keyword_as::<ItemsKeyword>())
            .and_then(ItemsKeyword::tuple_len)
        else {
            return results;
        };

        let mut tally = Tally::new(context);
        for (index, item) in items.iter().enumerate().skip(covered) {
            let child = keyword_context.push_instance(item, index.to_string());
            if !tally.record(self.schema.validate(&child)) {
                break;
            }
        }
        let results = results.with_nested(std::mem::take(&mut tally.nested));
        if tally.failed == 0 {
            return results;
        }
        results
            .invalid("additionalItems")
            .with_info("failed", tally.failed)
            .with_info("total", tally.total)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        scope.register_subschema(&self.schema, &["additionalItems"])
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        descend(&self.schema, pointer)
    }

    fn to_json(&self) -> Value {
        self.schema.to_json()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `minItems` / `maxItems`
#[derive(Debug, Clone)]
pub struct ItemCountKeyword {
    name: &'static str,
    limit: u64,
}

impl Keyword for ItemCountKeyword {
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
        let Value::Array(items) = context.instance() else {
            return results;
        };
        let count = items.len() as u64;
        let (valid, parameter) = if self.name == "minItems" {
            (count >= self.limit, "lowerBound")
        } else {
            (count <= self.limit, "upperBound")
        };
        if valid {
            results
        } else {
            results
                .invalid(self.name)
                .with_info("actual", count)
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

/// `uniqueItems`
#[derive(Debug, Clone)]
pub struct UniqueItemsKeyword {
    unique: bool,
}

impl Keyword for UniqueItemsKeyword {
    fn name(&self) -> &str {
        "uniqueItems"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let results = ValidationResults::new(Some("uniqueItems"), &context.push_keyword("uniqueItems"));
        let (true, Value::Array(items)) = (self.unique, context.instance()) else {
            return results;
        };
        for (first, left) in items.iter().enumerate() {
            if let Some(offset) = items[first + 1..].iter().position(|right| json_equal(left, right)) {
                return results
                    .invalid("uniqueItems")
                    .with_info("duplicates", vec![first, first + 1 + offset]);
            }
        }
        results
    }

    fn to_json(&self) -> Value {
        Value::Bool(self.unique)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
