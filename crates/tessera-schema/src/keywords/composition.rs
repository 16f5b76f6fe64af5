//! Composition keywords: `allOf`, `anyOf`, `oneOf`, `not`, `if`/`then`/`else`
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{descend, describe, passed, Keyword, KeywordRegistry};
use crate::error::SchemaResult;
use crate::registry::RegistrationScope;
use crate::schema::{JsonSchema, SchemaBuilder};
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("allOf", |value, builder| build_combinator(Combinator::AllOf, value, builder))
        .register("anyOf", |value, builder| build_combinator(Combinator::AnyOf, value, builder))
        .register("oneOf", |value, builder| build_combinator(Combinator::OneOf, value, builder))
        .register("not", |value, builder| {
            Ok(Some(Box::new(NotKeyword {
                schema: builder.subschema(value, &[])?,
            })))
        })
        .register("if", |value, builder| {
            Ok(Some(Box::new(IfKeyword {
                schema: builder.subschema(value, &[])?,
            })))
        })
        .register("then", |value, builder| build_branch("then", value, builder))
        .register("else", |value, builder| build_branch("else", value, builder));
}

/// How a list of subschema verdicts combines into one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
}

impl Combinator {
    pub fn name(self) -> &'static str {
        match self {
            Self::AllOf => "allOf",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
        }
    }
}

fn build_combinator(
    combinator: Combinator,
    value: &Value,
    builder: &SchemaBuilder<'_>,
) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let name = combinator.name();
    let schemas = match value {
        Value::Array(schemas) if !schemas.is_empty() => schemas
            .iter()
            .enumerate()
            .map(|(index, schema)| builder.subschema(schema, &[index.to_string().as_str()]))
            .collect::<SchemaResult<Vec<_>>>()?,
        other => {
            return Err(builder.invalid(
                name,
                format!("expected a non-empty array of schemas, found {}", describe(other)),
            ))
        }
    };
    Ok(Some(Box::new(CombinatorKeyword { combinator, schemas })))
}

/// `allOf`, `anyOf` and `oneOf`
#[derive(Debug)]
pub struct CombinatorKeyword {
    combinator: Combinator,
    schemas: Vec<Arc<JsonSchema>>,
}

impl CombinatorKeyword {
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }
}

impl Keyword for CombinatorKeyword {
    fn name(&self) -> &str {
        self.combinator.name()
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let name = self.combinator.name();
        let keyword_context = context.push_keyword(name);
        let results = ValidationResults::new(Some(name), &keyword_context);
        let terse = context.is_terse();

        let mut nested = Vec::new();
        let (mut passed, mut failed) = (0usize, 0usize);
        for (index, schema) in self.schemas.iter().enumerate() {
            let result = schema.validate(&keyword_context.push_schema(&[index.to_string().as_str()]));
            if result.is_valid {
                passed += 1;
            } else {
                failed += 1;
            }
            if !terse {
                nested.push(result);
                continue;
            }
            // the verdict is settled once these hold
            let settled = match self.combinator {
                Combinator::AllOf => failed > 0,
                Combinator::AnyOf => passed > 0,
                Combinator::OneOf => passed > 1,
            };
            if settled {
                break;
            }
        }

        let total = self.schemas.len();
        let valid = match self.combinator {
            Combinator::AllOf => failed == 0,
            Combinator::AnyOf => passed > 0,
            Combinator::OneOf => passed == 1,
        };
        let results = results.with_nested(nested);
        if valid {
            return results;
        }
        let results = results.invalid(name).with_info("total", total);
        match self.combinator {
            Combinator::AllOf => results.with_info("failed", failed),
            Combinator::AnyOf => results,
            Combinator::OneOf => results.with_info("passed", passed),
        }
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        let name = self.combinator.name();
        for (index, schema) in self.schemas.iter().enumerate() {
            scope.register_subschema(schema, &[name, index.to_string().as_str()])?;
        }
        Ok(())
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        let (first, rest) = pointer.split_first()?;
        let index: usize = first.parse().ok()?;
        descend(self.schemas.get(index)?, rest)
    }

    fn to_json(&self) -> Value {
        Value::Array(self.schemas.iter().map(|schema| schema.to_json()).collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `not`
#[derive(Debug)]
pub struct NotKeyword {
    schema: Arc<JsonSchema>,
}

impl Keyword for NotKeyword {
    fn name(&self) -> &str {
        "not"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("not");
        let results = ValidationResults::new(Some("not"), &keyword_context);
        let inner = self.schema.validate(&keyword_context);
        if inner.is_valid {
            let results = results.invalid("not");
            if context.is_terse() {
                results
            } else {
                results.with_nested(vec![inner])
            }
        } else {
            results
        }
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        scope.register_subschema(&self.schema, &["not"])
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

/// `if`; picks the sibling `then` or `else` by its own verdict
#[derive(Debug)]
pub struct IfKeyword {
    schema: Arc<JsonSchema>,
}

impl Keyword for IfKeyword {
    fn name(&self) -> &str {
        "if"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft07)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("if");
        let results = ValidationResults::new(Some("if"), &keyword_context);

        let condition = self.schema.validate(&keyword_context);
        let branch_name = if condition.is_valid { "then" } else { "else" };
        let Some(branch) = context
            .local_schema()
            .and_then(|schema| schema.keyword(branch_name))
            .and_then(|keyword| keyword.as_any().downcast_ref::<BranchKeyword>())
        else {
            return results;
        };

        // the branch reports at its own location, not below `if`
        let outcome = branch.schema.validate(&context.push_keyword(branch_name));
        if outcome.is_valid {
            return results;
        }
        let results = results.invalid("if").with_info("branch", branch_name);
        if context.is_terse() {
            results
        } else {
            results.with_nested(vec![condition, outcome])
        }
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        scope.register_subschema(&self.schema, &["if"])
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

fn build_branch(
    name: &'static str,
    value: &Value,
    builder: &SchemaBuilder<'_>,
) -> SchemaResult<Option<Box<dyn Keyword>>> {
    Ok(Some(Box::new(BranchKeyword {
        name,
        schema: builder.subschema(value, &[])?,
    })))
}

/// `then` / `else`; inert on their own, evaluated through `if`
#[derive(Debug)]
pub struct BranchKeyword {
    name: &'static str,
    schema: Arc<JsonSchema>,
}

impl Keyword for BranchKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft07)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name, context)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        scope.register_subschema(&self.schema, &[self.name])
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_combinators_require_non_empty_arrays() {
        assert!(JsonSchema::from_value(&json!({"allOf": []})).is_err());
        assert!(JsonSchema::from_value(&json!({"anyOf": {}})).is_err());
        let schema = JsonSchema::from_value(&json!({"oneOf": [true, false]})).unwrap();
        let keyword = schema.keyword_as::<CombinatorKeyword>().unwrap();
        assert_eq!(keyword.combinator(), Combinator::OneOf);
    }

    #[test]
    fn test_conditional_round_trip() {
        let document = json!({"if": {"minimum": 0}, "then": {"multipleOf": 2}, "else": false});
        let schema = Arc::new(JsonSchema::from_value(&document).unwrap());
        assert_eq!(schema.to_json(), document);
        assert!(schema.resolve_pointer(&["else".to_string()]).is_some());
    }
}
