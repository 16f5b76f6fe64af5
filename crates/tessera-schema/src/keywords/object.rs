//! Object keywords
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license
//!
//! `properties`, `patternProperties`, `additionalProperties`, `required`,
//! `minProperties`, `maxProperties`, and the dependency family: `dependencies`
//! (up to Draft07) with its 2019-09 successors `dependentRequired` and
//! `dependentSchemas`.

use super::string::compile_pattern;
use super::{descend, describe, expect_count, expect_string_list, Keyword, KeywordRegistry, Tally};
use crate::error::SchemaResult;
use crate::registry::RegistrationScope;
use crate::schema::{JsonSchema, SchemaBuilder};
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use regex::Regex;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("properties", |value, builder| {
            Ok(Some(Box::new(PropertiesKeyword {
                properties: schema_map("properties", value, builder)?,
            })))
        })
        .register("patternProperties", build_pattern_properties)
        .register("additionalProperties", |value, builder| {
            Ok(Some(Box::new(AdditionalPropertiesKeyword {
                schema: builder.subschema(value, &[])?,
            })))
        })
        .register("required", build_required)
        .register("minProperties", |value, builder| {
            Ok(Some(Box::new(PropertyCountKeyword {
                name: "minProperties",
                limit: expect_count("minProperties", value, builder)?,
            })))
        })
        .register("maxProperties", |value, builder| {
            Ok(Some(Box::new(PropertyCountKeyword {
                name: "maxProperties",
                limit: expect_count("maxProperties", value, builder)?,
            })))
        })
        .register("dependencies", build_dependencies)
        .register("dependentRequired", build_dependent_required)
        .register("dependentSchemas", |value, builder| {
            Ok(Some(Box::new(DependentSchemasKeyword {
                schemas: schema_map("dependentSchemas", value, builder)?,
            })))
        });
}

fn expect_object<'v>(keyword: &str, value: &'v Value, builder: &SchemaBuilder<'_>) -> SchemaResult<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| builder.invalid(keyword, format!("expected an object, found {}", describe(value))))
}

fn schema_map(keyword: &str, value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Vec<(String, Arc<JsonSchema>)>> {
    expect_object(keyword, value, builder)?
        .iter()
        .map(|(name, schema)| Ok((name.clone(), builder.subschema(schema, &[name.as_str()])?)))
        .collect()
}

fn schema_map_json(schemas: &[(String, Arc<JsonSchema>)]) -> Value {
    Value::Object(
        schemas
            .iter()
            .map(|(name, schema)| (name.clone(), schema.to_json()))
            .collect(),
    )
}

fn register_schema_map(
    keyword: &str,
    schemas: &[(String, Arc<JsonSchema>)],
    scope: &mut RegistrationScope<'_>,
) -> SchemaResult<()> {
    for (name, schema) in schemas {
        scope.register_subschema(schema, &[keyword, name.as_str()])?;
    }
    Ok(())
}

fn resolve_schema_map(schemas: &[(String, Arc<JsonSchema>)], pointer: &[String]) -> Option<Arc<JsonSchema>> {
    let (first, rest) = pointer.split_first()?;
    let (_, schema) = schemas.iter().find(|(name, _)| name == first)?;
    descend(schema, rest)
}

/// Result for keywords reporting failing property names
fn property_failures(results: ValidationResults, key: &str, tally: &mut Tally, failing: Vec<String>) -> ValidationResults {
    let results = results.with_nested(std::mem::take(&mut tally.nested));
    if tally.failed == 0 {
        results
    } else {
        results.invalid(key).with_info("properties", failing)
    }
}

/// `properties`
#[derive(Debug)]
pub struct PropertiesKeyword {
    properties: Vec<(String, Arc<JsonSchema>)>,
}

impl PropertiesKeyword {
    pub fn covers(&self, name: &str) -> bool {
        self.properties.iter().any(|(property, _)| property == name)
    }
}

impl Keyword for PropertiesKeyword {
    fn name(&self) -> &str {
        "properties"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("properties");
        let results = ValidationResults::new(Some("properties"), &keyword_context);
        let Value::Object(object) = context.instance() else {
            return results;
        };

        let mut tally = Tally::new(context);
        let mut failing = Vec::new();
        for (name, schema) in &self.properties {
            let Some(value) = object.get(name) else {
                continue;
            };
            let child = keyword_context
                .push_schema(&[name.as_str()])
                .push_instance(value, name.as_str());
            let result = schema.validate(&child);
            if !result.is_valid {
                failing.push(name.clone());
            }
            if !tally.record(result) {
                break;
            }
        }
        property_failures(results, "properties", &mut tally, failing)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        register_schema_map("properties", &self.properties, scope)
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        resolve_schema_map(&self.properties, pointer)
    }

    fn to_json(&self) -> Value {
        schema_map_json(&self.properties)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `patternProperties`
#[derive(Debug)]
pub struct PatternPropertiesKeyword {
    patterns: Vec<(Regex, Arc<JsonSchema>)>,
}

fn build_pattern_properties(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let patterns = expect_object("patternProperties", value, builder)?
        .iter()
        .map(|(pattern, schema)| {
            let regex = compile_pattern(pattern, &builder.child(&[pattern.as_str()]))?;
            Ok((regex, builder.subschema(schema, &[pattern.as_str()])?))
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(Some(Box::new(PatternPropertiesKeyword { patterns })))
}

impl PatternPropertiesKeyword {
    pub fn covers(&self, name: &str) -> bool {
        self.patterns.iter().any(|(regex, _)| regex.is_match(name))
    }
}

impl Keyword for PatternPropertiesKeyword {
    fn name(&self) -> &str {
        "patternProperties"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("patternProperties");
        let results = ValidationResults::new(Some("patternProperties"), &keyword_context);
        let Value::Object(object) = context.instance() else {
            return results;
        };

        let mut tally = Tally::new(context);
        let mut failing: Vec<String> = Vec::new();
        'patterns: for (regex, schema) in &self.patterns {
            let pattern_context = keyword_context.push_schema(&[regex.as_str()]);
            for (name, value) in object.iter().filter(|(name, _)| regex.is_match(name)) {
                let result = schema.validate(&pattern_context.push_instance(value, name.as_str()));
                if !result.is_valid && !failing.contains(name) {
                    failing.push(name.clone());
                }
                if !tally.record(result) {
                    break 'patterns;
                }
            }
        }
        property_failures(results, "patternProperties", &mut tally, failing)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        for (regex, schema) in &self.patterns {
            scope.register_subschema(schema, &["patternProperties", regex.as_str()])?;
        }
        Ok(())
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        let (first, rest) = pointer.split_first()?;
        let (_, schema) = self.patterns.iter().find(|(regex, _)| regex.as_str() == first)?;
        descend(schema, rest)
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.patterns
                .iter()
                .map(|(regex, schema)| (regex.as_str().to_string(), schema.to_json()))
                .collect(),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `additionalProperties`: applies to properties matched by neither
/// `properties` nor `patternProperties` of the same schema
#[derive(Debug)]
pub struct AdditionalPropertiesKeyword {
    schema: Arc<JsonSchema>,
}

impl Keyword for AdditionalPropertiesKeyword {
    fn name(&self) -> &str {
        "additionalProperties"
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
        let keyword_context = context.push_keyword("additionalProperties");
        let results = ValidationResults::new(Some("additionalProperties"), &keyword_context);
        let Value::Object(object) = context.instance() else {
            return results;
        };

        let local = context.local_schema();
        let properties = local.and_then(|schema| schema.keyword_as::<PropertiesKeyword>());
        let patterns = local.and_then(|schema| schema.keyword_as::<PatternPropertiesKeyword>());
        let additional = object.iter().filter(|(name, _)| {
            !properties.is_some_and(|keyword| keyword.covers(name))
                && !patterns.is_some_and(|keyword| keyword.covers(name))
        });

        let mut tally = Tally::new(context);
        let mut failing = Vec::new();
        for (name, value) in additional {
            let result = self.schema.validate(&keyword_context.push_instance(value, name.as_str()));
            if !result.is_valid {
                failing.push(name.clone());
            }
            if !tally.record(result) {
                break;
            }
        }
        property_failures(results, "additionalProperties", &mut tally, failing)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        scope.register_subschema(&self.schema, &["additionalProperties"])
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

/// `required`
#[derive(Debug, Clone)]
pub struct RequiredKeyword {
    properties: Vec<String>,
}

fn build_required(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    Ok(Some(Box::new(RequiredKeyword {
        properties: expect_string_list("required", value, builder)?,
    })))
}

impl Keyword for RequiredKeyword {
    fn name(&self) -> &str {
        "required"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let results = ValidationResults::new(Some("required"), &context.push_keyword("required"));
        let Value::Object(object) = context.instance() else {
            return results;
        };
        let missing: Vec<&str> = self
            .properties
            .iter()
            .filter(|name| !object.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            results
        } else {
            results.invalid("required").with_info("missing", missing)
        }
    }

    fn to_json(&self) -> Value {
        Value::from(self.properties.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `minProperties` / `maxProperties`
#[derive(Debug, Clone)]
pub struct PropertyCountKeyword {
    name: &'static str,
    limit: u64,
}

impl Keyword for PropertyCountKeyword {
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
        let Value::Object(object) = context.instance() else {
            return results;
        };
        let count = object.len() as u64;
        let (valid, parameter) = if self.name == "minProperties" {
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

/// Evaluate a property list dependency: `property` present implies every entry of `required`
fn required_dependency(
    keyword_context: &ValidationContext<'_>,
    object: &Map<String, Value>,
    property: &str,
    required: &[String],
    message_key: &str,
) -> ValidationResults {
    let context = keyword_context.push_schema(&[property]);
    let results = ValidationResults::new(None, &context);
    if !object.contains_key(property) {
        return results;
    }
    let missing: Vec<&str> = required
        .iter()
        .filter(|name| !object.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        results
    } else {
        results
            .invalid(message_key)
            .with_info("property", property)
            .with_info("missing", missing)
    }
}

/// Evaluate a schema dependency: `property` present implies the instance matches `schema`
fn schema_dependency(
    keyword_context: &ValidationContext<'_>,
    object: &Map<String, Value>,
    property: &str,
    schema: &JsonSchema,
) -> ValidationResults {
    let context = keyword_context.push_schema(&[property]);
    if object.contains_key(property) {
        schema.validate(&context)
    } else {
        ValidationResults::new(None, &context)
    }
}

/// Fold per-dependency results; every dependency counts towards `total`
fn dependency_results(
    name: &str,
    keyword_context: &ValidationContext<'_>,
    total: usize,
    evaluate: impl Iterator<Item = ValidationResults>,
) -> ValidationResults {
    let results = ValidationResults::new(Some(name), keyword_context);
    let mut tally = Tally::new(keyword_context);
    for result in evaluate {
        if !tally.record(result) {
            break;
        }
    }
    let results = results.with_nested(std::mem::take(&mut tally.nested));
    if tally.failed == 0 {
        return results;
    }
    results
        .invalid(name)
        .with_info("failed", tally.failed)
        .with_info("total", total)
}

/// One entry of the Draft04-07 `dependencies` keyword
#[derive(Debug)]
pub enum Dependency {
    Properties(Vec<String>),
    Schema(Arc<JsonSchema>),
}

/// `dependencies` (up to Draft07)
#[derive(Debug)]
pub struct DependenciesKeyword {
    dependencies: Vec<(String, Dependency)>,
}

fn build_dependencies(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let dependencies = expect_object("dependencies", value, builder)?
        .iter()
        .map(|(property, dependency)| {
            let dependency = match dependency {
                Value::Array(_) => Dependency::Properties(expect_string_list(
                    "dependencies",
                    dependency,
                    &builder.child(&[property.as_str()]),
                )?),
                schema => Dependency::Schema(builder.subschema(schema, &[property.as_str()])?),
            };
            Ok((property.clone(), dependency))
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(Some(Box::new(DependenciesKeyword { dependencies })))
}

impl Keyword for DependenciesKeyword {
    fn name(&self) -> &str {
        "dependencies"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::up_to(Draft::Draft07)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        None
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("dependencies");
        let Value::Object(object) = context.instance() else {
            return ValidationResults::new(Some("dependencies"), &keyword_context);
        };
        let evaluate = self.dependencies.iter().map(|(property, dependency)| match dependency {
            Dependency::Properties(required) => {
                required_dependency(&keyword_context, object, property, required, "dependencies.missing")
            }
            Dependency::Schema(schema) => schema_dependency(&keyword_context, object, property, schema),
        });
        dependency_results("dependencies", &keyword_context, self.dependencies.len(), evaluate)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        for (property, dependency) in &self.dependencies {
            if let Dependency::Schema(schema) = dependency {
                scope.register_subschema(schema, &["dependencies", property.as_str()])?;
            }
        }
        Ok(())
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        let (first, rest) = pointer.split_first()?;
        match self.dependencies.iter().find(|(property, _)| property == first)? {
            (_, Dependency::Schema(schema)) => descend(schema, rest),
            (_, Dependency::Properties(_)) => None,
        }
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.dependencies
                .iter()
                .map(|(property, dependency)| {
                    let value = match dependency {
                        Dependency::Properties(required) => Value::from(required.clone()),
                        Dependency::Schema(schema) => schema.to_json(),
                    };
                    (property.clone(), value)
                })
                .collect(),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `dependentRequired` (2019-09)
#[derive(Debug, Clone)]
pub struct DependentRequiredKeyword {
    dependencies: Vec<(String, Vec<String>)>,
}

fn build_dependent_required(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let dependencies = expect_object("dependentRequired", value, builder)?
        .iter()
        .map(|(property, required)| {
            let required = expect_string_list("dependentRequired", required, &builder.child(&[property.as_str()]))?;
            Ok((property.clone(), required))
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(Some(Box::new(DependentRequiredKeyword { dependencies })))
}

impl Keyword for DependentRequiredKeyword {
    fn name(&self) -> &str {
        "dependentRequired"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft2019_09)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("dependentRequired");
        let Value::Object(object) = context.instance() else {
            return ValidationResults::new(Some("dependentRequired"), &keyword_context);
        };
        let evaluate = self.dependencies.iter().map(|(property, required)| {
            required_dependency(&keyword_context, object, property, required, "dependentRequired.missing")
        });
        dependency_results("dependentRequired", &keyword_context, self.dependencies.len(), evaluate)
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.dependencies
                .iter()
                .map(|(property, required)| (property.clone(), Value::from(required.clone())))
                .collect(),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `dependentSchemas` (2019-09)
#[derive(Debug)]
pub struct DependentSchemasKeyword {
    schemas: Vec<(String, Arc<JsonSchema>)>,
}

impl Keyword for DependentSchemasKeyword {
    fn name(&self) -> &str {
        "dependentSchemas"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft2019_09)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::APPLICATOR)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keyword_context = context.push_keyword("dependentSchemas");
        let Value::Object(object) = context.instance() else {
            return ValidationResults::new(Some("dependentSchemas"), &keyword_context);
        };
        let evaluate = self
            .schemas
            .iter()
            .map(|(property, schema)| schema_dependency(&keyword_context, object, property, schema));
        dependency_results("dependentSchemas", &keyword_context, self.schemas.len(), evaluate)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        register_schema_map("dependentSchemas", &self.schemas, scope)
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        resolve_schema_map(&self.schemas, pointer)
    }

    fn to_json(&self) -> Value {
        schema_map_json(&self.schemas)
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
    fn test_object_keywords_round_trip() {
        let document = json!({
            "properties": {"a": {"type": "string"}},
            "patternProperties": {"^x-": true},
            "additionalProperties": false,
            "required": ["a"],
            "dependencies": {"a": ["b"], "c": {"minProperties": 2}}
        });
        assert_eq!(JsonSchema::from_value(&document).unwrap().to_json(), document);
    }

    #[test]
    fn test_dependency_schemas_resolve_by_property() {
        let schema = Arc::new(
            JsonSchema::from_value(&json!({"dependencies": {"a": ["b"], "c": {"minimum": 1}}})).unwrap(),
        );
        let segments = |path: &[&str]| path.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(schema.resolve_pointer(&segments(&["dependencies", "c"])).is_some());
        assert!(schema.resolve_pointer(&segments(&["dependencies", "a"])).is_none());
    }

    #[test]
    fn test_invalid_pattern_property_location() {
        let error = JsonSchema::from_value(&json!({"patternProperties": {"(": true}})).unwrap_err();
        assert_eq!(error.location(), Some("/patternProperties/("));
    }
}
