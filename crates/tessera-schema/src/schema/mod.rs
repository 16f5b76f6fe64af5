//! Schema documents
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license
//!
//! A [`JsonSchema`] is either a boolean schema or an ordered set of keywords.
//! Schemas are logically immutable once built: registration only fills the
//! write-once base URI cell.

mod builder;

pub use builder::SchemaBuilder;

use crate::error::{SchemaError, SchemaResult};
use crate::keywords::identifiers::{AnchorKeyword, IdKeyword, RecursiveAnchorKeyword, SchemaKeyword, VocabularyKeyword};
use crate::keywords::{Keyword, KeywordRegistry};
use crate::registry::SchemaRegistry;
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{select_draft, Draft, DraftSet, Vocabulary, VocabularySet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use url::Url;

enum SchemaKind {
    Boolean(bool),
    Keywords(Vec<Box<dyn Keyword>>),
}

/// A JSON Schema node
pub struct JsonSchema {
    kind: SchemaKind,
    base_uri: OnceLock<Url>,
}

impl JsonSchema {
    /// Build a schema with the built-in keyword set
    pub fn from_value(value: &Value) -> SchemaResult<Self> {
        Self::from_value_with(value, KeywordRegistry::standard())
    }

    /// Build a schema with a custom keyword registry
    pub fn from_value_with(value: &Value, registry: &KeywordRegistry) -> SchemaResult<Self> {
        SchemaBuilder::new(registry).build(value)
    }

    /// Parse JSON text and build a schema with the built-in keyword set
    pub fn from_json_str(text: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// `true` accepts every instance, `false` rejects every instance
    pub fn boolean(value: bool) -> Self {
        Self {
            kind: SchemaKind::Boolean(value),
            base_uri: OnceLock::new(),
        }
    }

    /// Assemble a schema from keyword objects
    pub fn from_keywords(keywords: Vec<Box<dyn Keyword>>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        for keyword in &keywords {
            if !seen.insert(keyword.name().to_string()) {
                return Err(SchemaError::DuplicateKeyword {
                    keyword: keyword.name().to_string(),
                });
            }
        }
        Ok(Self::with_keywords(keywords))
    }

    // JSON objects cannot carry duplicate keys, so the builder skips the check
    pub(crate) fn with_keywords(keywords: Vec<Box<dyn Keyword>>) -> Self {
        Self {
            kind: SchemaKind::Keywords(keywords),
            base_uri: OnceLock::new(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            SchemaKind::Boolean(value) => Some(value),
            SchemaKind::Keywords(_) => None,
        }
    }

    /// Keywords in declaration order; empty for boolean schemas
    pub fn keywords(&self) -> &[Box<dyn Keyword>] {
        match &self.kind {
            SchemaKind::Boolean(_) => &[],
            SchemaKind::Keywords(keywords) => keywords,
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&dyn Keyword> {
        self.keywords()
            .iter()
            .find(|keyword| keyword.name() == name)
            .map(Box::as_ref)
    }

    /// Find the first keyword of a concrete type
    pub fn keyword_as<K: Keyword>(&self) -> Option<&K> {
        self.keywords()
            .iter()
            .find_map(|keyword| keyword.as_any().downcast_ref::<K>())
    }

    /// Base URI assigned at registration
    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.get()
    }

    /// Fill the base URI cell; the first registration wins
    pub(crate) fn assign_base_uri(&self, uri: Url) -> &Url {
        self.base_uri.get_or_init(|| uri)
    }

    /// The `$id` value (or `id` when `legacy` is set)
    pub fn identifier(&self, legacy: bool) -> Option<&str> {
        let name = if legacy { "id" } else { "$id" };
        self.keywords()
            .iter()
            .filter(|keyword| keyword.name() == name)
            .find_map(|keyword| keyword.as_any().downcast_ref::<IdKeyword>())
            .map(IdKeyword::value)
    }

    /// The `$anchor` value
    pub fn anchor(&self) -> Option<&str> {
        self.keyword_as::<AnchorKeyword>().map(AnchorKeyword::value)
    }

    /// Whether the node declares `$recursiveAnchor: true`
    pub fn has_recursive_anchor(&self) -> bool {
        self.keyword_as::<RecursiveAnchorKeyword>()
            .is_some_and(RecursiveAnchorKeyword::value)
    }

    /// The raw `$schema` value
    pub fn meta_schema_uri(&self) -> Option<&str> {
        self.keyword_as::<SchemaKeyword>().map(SchemaKeyword::uri)
    }

    /// Draft named directly by `$schema`
    pub fn declared_draft(&self) -> Option<Draft> {
        self.meta_schema_uri().and_then(Draft::from_meta_schema_uri)
    }

    /// Draft named by `$schema`, following one custom meta-schema when it is registered
    pub fn declared_draft_in(&self, registry: &SchemaRegistry) -> Option<Draft> {
        let uri = self.meta_schema_uri()?;
        Draft::from_meta_schema_uri(uri).or_else(|| {
            let meta = registry.lookup(&Url::parse(uri).ok()?)?;
            meta.declared_draft()
        })
    }

    /// Drafts every keyword of the node is defined in
    pub fn supported_drafts(&self) -> DraftSet {
        self.keywords()
            .iter()
            .fold(DraftSet::ALL, |drafts, keyword| drafts & keyword.supported_drafts())
    }

    /// Render the schema back to JSON
    pub fn to_json(&self) -> Value {
        match &self.kind {
            SchemaKind::Boolean(value) => Value::Bool(*value),
            SchemaKind::Keywords(keywords) => {
                let map: Map<String, Value> = keywords
                    .iter()
                    .map(|keyword| (keyword.name().to_string(), keyword.to_json()))
                    .collect();
                Value::Object(map)
            }
        }
    }

    /// Find a nested schema by pointer segments relative to this node
    pub fn resolve_subschema(&self, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        let (first, rest) = pointer.split_first()?;
        self.keyword(first)?.resolve_subschema(rest)
    }

    /// Like [`JsonSchema::resolve_subschema`], returning this node for the empty pointer
    pub fn resolve_pointer(self: &Arc<Self>, pointer: &[String]) -> Option<Arc<JsonSchema>> {
        crate::keywords::descend(self, pointer)
    }

    /// Evaluate the instance of `context` against this node
    pub fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let keywords = match &self.kind {
            SchemaKind::Boolean(true) => return ValidationResults::new(None, context),
            SchemaKind::Boolean(false) => return ValidationResults::new(None, context).invalid("false"),
            SchemaKind::Keywords(keywords) => keywords,
        };

        if let Some(limit) = context.options().max_depth {
            if context.depth() >= limit {
                tracing::debug!(limit, location = %context.instance_location(), "evaluation depth exceeded");
                return ValidationResults::new(None, context)
                    .invalid("depth")
                    .with_info("maxDepth", limit as u64);
            }
        }

        let registry = context.registry();
        let declared = self.declared_draft_in(registry);
        let draft = select_draft(
            declared,
            context.declared_draft(),
            self.supported_drafts(),
            context.options().default_draft,
        );
        tracing::trace!(draft = %draft, declared = ?declared, location = %context.relative_location(), "selected draft");

        let (vocabularies, unknown) = if draft.uses_vocabularies() {
            self.declared_vocabularies(context)
        } else {
            (None, Vec::new())
        };
        let scope = context.enter_schema(self, draft, declared, vocabularies);

        if !unknown.is_empty() {
            let detail = ValidationResults::new(Some("$schema"), &scope.push_keyword("$schema"))
                .invalid("$schema.vocabulary")
                .with_info("vocabularies", json!(unknown));
            return ValidationResults::new(None, &scope)
                .invalid("schema")
                .with_nested(vec![detail]);
        }

        let mut active: Vec<&dyn Keyword> = keywords
            .iter()
            .map(Box::as_ref)
            .filter(|keyword| keyword.supported_drafts().contains(draft))
            .filter(|keyword| {
                !draft.uses_vocabularies()
                    || keyword
                        .vocabulary()
                        .map_or(true, |vocabulary| scope.vocabularies().contains(&vocabulary))
            })
            .collect();
        if draft.ref_overrides_siblings() && active.iter().any(|keyword| keyword.name() == "$ref") {
            active.retain(|keyword| keyword.name() == "$ref");
        }
        active.sort_by_key(|keyword| keyword.sequence());

        let terse = scope.is_terse();
        let mut results = ValidationResults::new(None, &scope);
        for keyword in active {
            let outcome = keyword.validate(&scope);
            if !outcome.is_valid {
                results.is_valid = false;
            }
            if terse {
                if !results.is_valid {
                    break;
                }
            } else {
                results.nested_results.push(outcome);
            }
        }
        if !results.is_valid {
            results.message_key = Some("schema".to_string());
        }
        results
    }

    /// Vocabularies declared by the registered meta-schema, plus required ids the engine does not know
    fn declared_vocabularies(&self, context: &ValidationContext<'_>) -> (Option<Arc<VocabularySet>>, Vec<String>) {
        let Some(meta) = self
            .meta_schema_uri()
            .and_then(|uri| Url::parse(uri).ok())
            .and_then(|uri| context.registry().lookup(&uri))
        else {
            return (None, Vec::new());
        };
        let Some(declaration) = meta.keyword_as::<VocabularyKeyword>() else {
            return (None, Vec::new());
        };

        let mut active = VocabularySet::core_only();
        let mut unknown = Vec::new();
        for (id, required) in declaration.entries() {
            let vocabulary = Vocabulary::new(id.as_str());
            if context.options().knows_vocabulary(&vocabulary) {
                active.insert(vocabulary);
            } else if *required {
                unknown.push(id.clone());
            }
        }
        tracing::debug!(vocabularies = active.len(), unknown = unknown.len(), "applied meta-schema vocabularies");
        (Some(Arc::new(active)), unknown)
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("JsonSchema");
        match &self.kind {
            SchemaKind::Boolean(value) => debug.field("boolean", value),
            SchemaKind::Keywords(keywords) => debug.field("keywords", keywords),
        };
        debug.field("base_uri", &self.base_uri.get()).finish()
    }
}

/// Structural equality: same keyword names with equal JSON values, in any order
impl PartialEq for JsonSchema {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (SchemaKind::Boolean(a), SchemaKind::Boolean(b)) => a == b,
            (SchemaKind::Keywords(a), SchemaKind::Keywords(b)) => {
                a.len() == b.len()
                    && a.iter().all(|keyword| {
                        other
                            .keyword(keyword.name())
                            .is_some_and(|candidate| candidate.to_json() == keyword.to_json())
                    })
            }
            _ => false,
        }
    }
}

impl Serialize for JsonSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JsonSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        JsonSchema::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_preserves_unknown_keys() {
        let document = json!({
            "type": "object",
            "x-internal": {"owner": "billing"},
            "properties": {"id": {"type": "integer", "minimum": 1}}
        });
        let schema = JsonSchema::from_value(&document).unwrap();
        assert_eq!(schema.to_json(), document);
    }

    #[test]
    fn test_structural_equality_ignores_key_order() {
        let left = JsonSchema::from_value(&json!({"minimum": 1, "maximum": 5})).unwrap();
        let right = JsonSchema::from_value(&json!({"maximum": 5, "minimum": 1})).unwrap();
        let other = JsonSchema::from_value(&json!({"maximum": 6, "minimum": 1})).unwrap();
        assert_eq!(left, right);
        assert_ne!(left, other);
        assert_ne!(JsonSchema::boolean(true), JsonSchema::from_value(&json!({})).unwrap());
    }

    #[test]
    fn test_deserialize_through_serde() {
        let schema: JsonSchema = serde_json::from_str(r#"{"type": "string", "minLength": 2}"#).unwrap();
        assert!(schema.keyword("minLength").is_some());

        let error = serde_json::from_str::<JsonSchema>(r#"{"minLength": -1}"#).unwrap_err();
        assert!(error.to_string().contains("minLength"));
    }

    #[test]
    fn test_duplicate_keywords_rejected() {
        let first = JsonSchema::from_value(&json!({"title": "a"})).unwrap();
        let second = JsonSchema::from_value(&json!({"title": "b"})).unwrap();
        let keywords: Vec<Box<dyn Keyword>> = match (first.kind, second.kind) {
            (SchemaKind::Keywords(mut a), SchemaKind::Keywords(b)) => {
                a.extend(b);
                a
            }
            _ => unreachable!(),
        };
        assert!(matches!(
            JsonSchema::from_keywords(keywords),
            Err(SchemaError::DuplicateKeyword { .. })
        ));
    }

    #[test]
    fn test_resolve_subschema_by_pointer() {
        let schema = Arc::new(
            JsonSchema::from_value(&json!({
                "definitions": {"positive": {"minimum": 0}},
                "properties": {"a": {"items": [{"type": "string"}]}}
            }))
            .unwrap(),
        );
        let found = schema
            .resolve_pointer(&["definitions".to_string(), "positive".to_string()])
            .unwrap();
        assert_eq!(found.to_json(), json!({"minimum": 0}));

        let pointer = crate::pointer::JsonPointer::parse("/properties/a/items/0").unwrap();
        let found = schema.resolve_pointer(pointer.segments()).unwrap();
        assert_eq!(found.to_json(), json!({"type": "string"}));

        assert!(schema.resolve_pointer(&["missing".to_string()]).is_none());
        assert!(Arc::ptr_eq(&schema.resolve_pointer(&[]).unwrap(), &schema));
    }
}
