//! Core vocabulary keywords: identification, anchors and definitions
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{describe, passed, Keyword, KeywordRegistry};
use crate::error::SchemaResult;
use crate::keywords::descend;
use crate::keywords::metadata::UnknownKeyword;
use crate::registry::RegistrationScope;
use crate::schema::{JsonSchema, SchemaBuilder};
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("$schema", build_schema)
        .register("$id", build_id)
        .register("id", build_legacy_id)
        .register("$anchor", build_anchor)
        .register("$recursiveAnchor", build_recursive_anchor)
        .register("$vocabulary", build_vocabulary)
        .register("$comment", build_comment)
        .register("definitions", build_definitions)
        .register("$defs", build_defs);
}

fn expect_str<'v>(keyword: &str, value: &'v Value, builder: &SchemaBuilder<'_>) -> SchemaResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| builder.invalid(keyword, format!("expected a string, found {}", describe(value))))
}

/// `$schema`: the meta-schema the document is written against
#[derive(Debug, Clone)]
pub struct SchemaKeyword {
    uri: String,
}

impl SchemaKeyword {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

fn build_schema(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let uri = expect_str("$schema", value, builder)?;
    Ok(Some(Box::new(SchemaKeyword { uri: uri.to_string() })))
}

impl Keyword for SchemaKeyword {
    fn name(&self) -> &str {
        "$schema"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn sequence(&self) -> i32 {
        0
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name(), context)
    }

    fn to_json(&self) -> Value {
        Value::String(self.uri.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$id` (or `id` in Draft04): the base URI of a resource, or a plain-name anchor
#[derive(Debug, Clone)]
pub struct IdKeyword {
    name: &'static str,
    value: String,
}

impl IdKeyword {
    pub fn value(&self) -> &str {
        &self.value
    }
}

fn build_id(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let id = expect_str("$id", value, builder)?;
    Ok(Some(Box::new(IdKeyword {
        name: "$id",
        value: id.to_string(),
    })))
}

// `id` is an ordinary property name outside Draft04, so odd values stay inert
fn build_legacy_id(value: &Value, _builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let keyword: Box<dyn Keyword> = match value.as_str() {
        Some(id) => Box::new(IdKeyword {
            name: "id",
            value: id.to_string(),
        }),
        None => Box::new(UnknownKeyword::new("id", value.clone())),
    };
    Ok(Some(keyword))
}

impl Keyword for IdKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        if self.name == "id" {
            DraftSet::only(Draft::Draft04)
        } else {
            DraftSet::since(Draft::Draft06)
        }
    }

    fn sequence(&self) -> i32 {
        0
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name, context)
    }

    fn to_json(&self) -> Value {
        Value::String(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$anchor`: a plain-name fragment for the enclosing schema
#[derive(Debug, Clone)]
pub struct AnchorKeyword {
    value: String,
}

impl AnchorKeyword {
    pub fn value(&self) -> &str {
        &self.value
    }
}

fn build_anchor(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let anchor = expect_str("$anchor", value, builder)?;
    let valid = anchor
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && anchor
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if !valid {
        return Err(builder.invalid("$anchor", format!("'{anchor}' is not a valid anchor name")));
    }
    Ok(Some(Box::new(AnchorKeyword {
        value: anchor.to_string(),
    })))
}

impl Keyword for AnchorKeyword {
    fn name(&self) -> &str {
        "$anchor"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft2019_09)
    }

    fn sequence(&self) -> i32 {
        0
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name(), context)
    }

    fn to_json(&self) -> Value {
        Value::String(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$recursiveAnchor`: marks a resource root as a dynamic `$recursiveRef` target
#[derive(Debug, Clone)]
pub struct RecursiveAnchorKeyword {
    value: bool,
}

impl RecursiveAnchorKeyword {
    pub fn value(&self) -> bool {
        self.value
    }
}

fn build_recursive_anchor(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let flag = value.as_bool().ok_or_else(|| {
        builder.invalid("$recursiveAnchor", format!("expected a boolean, found {}", describe(value)))
    })?;
    Ok(Some(Box::new(RecursiveAnchorKeyword { value: flag })))
}

impl Keyword for RecursiveAnchorKeyword {
    fn name(&self) -> &str {
        "$recursiveAnchor"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft2019_09)
    }

    fn sequence(&self) -> i32 {
        0
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name(), context)
    }

    fn to_json(&self) -> Value {
        Value::Bool(self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$vocabulary`: vocabularies a meta-schema enables, and whether each is required
#[derive(Debug, Clone)]
pub struct VocabularyKeyword {
    entries: Vec<(String, bool)>,
}

impl VocabularyKeyword {
    pub fn entries(&self) -> &[(String, bool)] {
        &self.entries
    }
}

fn build_vocabulary(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let map = value.as_object().ok_or_else(|| {
        builder.invalid("$vocabulary", format!("expected an object, found {}", describe(value)))
    })?;
    let entries = map
        .iter()
        .map(|(id, required)| {
            required
                .as_bool()
                .map(|required| (id.clone(), required))
                .ok_or_else(|| builder.invalid("$vocabulary", format!("entry '{id}' must be a boolean")))
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(Some(Box::new(VocabularyKeyword { entries })))
}

impl Keyword for VocabularyKeyword {
    fn name(&self) -> &str {
        "$vocabulary"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft2019_09)
    }

    fn sequence(&self) -> i32 {
        0
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name(), context)
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(id, required)| (id.clone(), Value::Bool(*required)))
            .collect();
        Value::Object(map)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$comment`
#[derive(Debug, Clone)]
pub struct CommentKeyword {
    value: String,
}

fn build_comment(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let comment = expect_str("$comment", value, builder)?;
    Ok(Some(Box::new(CommentKeyword {
        value: comment.to_string(),
    })))
}

impl Keyword for CommentKeyword {
    fn name(&self) -> &str {
        "$comment"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft07)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name(), context)
    }

    fn to_json(&self) -> Value {
        Value::String(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `definitions` / `$defs`: named subschemas kept for reference targets
#[derive(Debug)]
pub struct DefinitionsKeyword {
    name: &'static str,
    definitions: Vec<(String, Arc<JsonSchema>)>,
}

impl DefinitionsKeyword {
    pub fn get(&self, name: &str) -> Option<&Arc<JsonSchema>> {
        self.definitions
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }
}

fn build_definitions_named(
    name: &'static str,
    value: &Value,
    builder: &SchemaBuilder<'_>,
) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let map = value
        .as_object()
        .ok_or_else(|| builder.invalid(name, format!("expected an object, found {}", describe(value))))?;
    let definitions = map
        .iter()
        .map(|(key, schema)| Ok((key.clone(), builder.subschema(schema, &[key.as_str()])?)))
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(Some(Box::new(DefinitionsKeyword { name, definitions })))
}

fn build_definitions(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    build_definitions_named("definitions", value, builder)
}

fn build_defs(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    build_definitions_named("$defs", value, builder)
}

impl Keyword for DefinitionsKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_drafts(&self) -> DraftSet {
        if self.name == "$defs" {
            DraftSet::since(Draft::Draft2019_09)
        } else {
            DraftSet::ALL
        }
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        passed(self.name, context)
    }

    fn register_subschemas(&self, scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        for (key, schema) in &self.definitions {
            scope.register_subschema(schema, &[self.name, key.as_str()])?;
        }
        Ok(())
    }

    fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        let (first, rest) = pointer.split_first()?;
        descend(self.get(first)?, rest)
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .definitions
            .iter()
            .map(|(key, schema)| (key.clone(), schema.to_json()))
            .collect();
        Value::Object(map)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use serde_json::json;

    #[test]
    fn test_legacy_id_tolerates_non_strings() {
        let schema = JsonSchema::from_value(&json!({"id": 7})).unwrap();
        assert!(schema.identifier(true).is_none());
        assert_eq!(schema.to_json(), json!({"id": 7}));
    }

    #[test]
    fn test_anchor_names_are_checked() {
        assert!(JsonSchema::from_value(&json!({"$anchor": "node_1"})).is_ok());
        assert!(matches!(
            JsonSchema::from_value(&json!({"$anchor": "1node"})),
            Err(SchemaError::InvalidKeyword { .. })
        ));
    }

    #[test]
    fn test_definitions_lookup() {
        let schema = JsonSchema::from_value(&json!({"$defs": {"a": true, "b": {"type": "null"}}})).unwrap();
        let defs = schema.keyword_as::<DefinitionsKeyword>().unwrap();
        assert_eq!(defs.get("b").unwrap().to_json(), json!({"type": "null"}));
        assert!(defs.get("c").is_none());
    }

    #[test]
    fn test_vocabulary_entries_must_be_booleans() {
        assert!(JsonSchema::from_value(&json!({"$vocabulary": {"https://x": "yes"}})).is_err());
        let schema = JsonSchema::from_value(&json!({"$vocabulary": {"https://x": false}})).unwrap();
        let vocab = schema.keyword_as::<VocabularyKeyword>().unwrap();
        assert_eq!(vocab.entries(), &[("https://x".to_string(), false)]);
    }
}
