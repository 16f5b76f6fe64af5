//! The reference index filled by the registration pass
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::resolver::DocumentResolver;
use crate::error::{SchemaError, SchemaResult};
use crate::pointer::JsonPointer;
use crate::schema::JsonSchema;
use crate::versioning::Draft;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Scheme used for documents registered without an identifier
pub const ANONYMOUS_SCHEME: &str = "tessera";

/// A schema found by URI, together with where it lives
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: Arc<JsonSchema>,
    /// Resource URI (no fragment) the node belongs to
    pub resource: Url,
    /// Pointer from the resource root to the node, when known
    pub location: JsonPointer,
}

/// Index of schema resources, structural pointers and anchors
///
/// Append-only while registering, read-only afterwards. Lookups never mutate.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    resources: HashMap<Url, Arc<JsonSchema>>,
    nodes: HashMap<(Url, JsonPointer), Arc<JsonSchema>>,
    anchors: HashMap<Url, ResolvedSchema>,
    anonymous: usize,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document, assigning a synthetic URI when it has no `$id`
    pub fn register(&mut self, schema: JsonSchema) -> SchemaResult<Arc<JsonSchema>> {
        let schema = Arc::new(schema);
        self.register_arc(&schema)?;
        Ok(schema)
    }

    /// Register a document retrieved from `uri`; an `$id` inside still takes precedence
    pub fn register_with_uri(&mut self, schema: JsonSchema, uri: &str) -> SchemaResult<Arc<JsonSchema>> {
        let mut retrieval = Url::parse(uri).map_err(|source| SchemaError::invalid_uri(uri, "", source))?;
        retrieval.set_fragment(None);
        let schema = Arc::new(schema);
        self.register_at(&schema, retrieval)?;
        Ok(schema)
    }

    /// Register a shared document; registering the same document again changes nothing
    pub fn register_arc(&mut self, schema: &Arc<JsonSchema>) -> SchemaResult<()> {
        let retrieval = match schema.base_uri() {
            Some(base) => base.clone(),
            None => self.next_anonymous_uri()?,
        };
        self.register_at(schema, retrieval)
    }

    fn register_at(&mut self, schema: &Arc<JsonSchema>, retrieval: Url) -> SchemaResult<()> {
        tracing::debug!(uri = %retrieval, "registering schema document");
        let legacy_ids = schema.declared_draft() == Some(Draft::Draft04);
        self.resources
            .entry(retrieval.clone())
            .or_insert_with(|| Arc::clone(schema));
        let mut scope = RegistrationScope {
            registry: self,
            base_uri: retrieval.clone(),
            locations: vec![(retrieval, JsonPointer::root())],
            legacy_ids,
        };
        scope.register_node(schema)
    }

    fn next_anonymous_uri(&mut self) -> SchemaResult<Url> {
        let text = format!("{ANONYMOUS_SCHEME}://schema/{}", self.anonymous);
        self.anonymous += 1;
        Url::parse(&text).map_err(|source| SchemaError::invalid_uri(text, "", source))
    }

    /// Whether a resource with this URI (fragment ignored) is registered
    pub fn contains_resource(&self, uri: &Url) -> bool {
        self.resources.contains_key(&without_fragment(uri))
    }

    /// Registered resource URIs
    pub fn resource_uris(&self) -> impl Iterator<Item = &Url> {
        self.resources.keys()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up a schema by absolute URI without consulting a resolver
    pub fn lookup(&self, uri: &Url) -> Option<Arc<JsonSchema>> {
        self.resolve(uri, None).map(|resolved| resolved.schema)
    }

    /// Resolve an absolute URI to a schema node
    ///
    /// Plain-name fragments go through the anchor index, pointer fragments through
    /// the pointer index with a fallback walk from the resource root. Resources
    /// that are not registered are requested from `resolver`.
    pub fn resolve(&self, uri: &Url, resolver: Option<&dyn DocumentResolver>) -> Option<ResolvedSchema> {
        let fragment = uri.fragment().unwrap_or("");
        if !fragment.is_empty() && !fragment.starts_with('/') && !fragment.starts_with("%2F") {
            return self.anchors.get(uri).cloned();
        }

        let resource = without_fragment(uri);
        let location = JsonPointer::from_fragment(fragment).ok()?;
        if let Some(schema) = self.nodes.get(&(resource.clone(), location.clone())) {
            return Some(ResolvedSchema {
                schema: Arc::clone(schema),
                resource,
                location,
            });
        }

        let root = match self.resources.get(&resource) {
            Some(root) => Arc::clone(root),
            None => {
                let fetched = resolver?.resolve(&resource)?;
                tracing::debug!(uri = %resource, "retrieved schema document from resolver");
                fetched
            }
        };
        let schema = root.resolve_pointer(location.segments())?;
        Some(ResolvedSchema {
            schema,
            resource,
            location,
        })
    }
}

/// Registration state threaded through keywords that own subschemas
///
/// Tracks the base URI in effect and every `(resource, pointer)` pair under
/// which the current node is reachable.
pub struct RegistrationScope<'r> {
    registry: &'r mut SchemaRegistry,
    base_uri: Url,
    locations: Vec<(Url, JsonPointer)>,
    legacy_ids: bool,
}

impl RegistrationScope<'_> {
    /// Base URI in effect for the node being registered
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Register a subschema found at `segments` below the current node
    pub fn register_subschema(&mut self, schema: &Arc<JsonSchema>, segments: &[&str]) -> SchemaResult<()> {
        let saved_base = self.base_uri.clone();
        let saved_len = self.locations.len();
        let saved_legacy = self.legacy_ids;
        for (_, pointer) in &mut self.locations {
            for segment in segments {
                pointer.push(*segment);
            }
        }

        let outcome = self.register_node(schema);

        self.locations.truncate(saved_len);
        for (_, pointer) in &mut self.locations {
            for _ in segments {
                pointer.pop();
            }
        }
        self.base_uri = saved_base;
        self.legacy_ids = saved_legacy;
        outcome
    }

    fn register_node(&mut self, schema: &Arc<JsonSchema>) -> SchemaResult<()> {
        if let Some(draft) = schema.declared_draft() {
            self.legacy_ids = draft == Draft::Draft04;
        }

        if let Some(id) = schema.identifier(self.legacy_ids) {
            let resolved = self
                .base_uri
                .join(id)
                .map_err(|source| SchemaError::invalid_uri(id, self.current_location(), source))?;
            let resource = without_fragment(&resolved);
            if resource != self.base_uri {
                self.enter_resource(resource, schema);
            }
            match resolved.fragment() {
                Some(name) if !name.is_empty() && !name.starts_with('/') => self.add_anchor(resolved.clone(), schema),
                _ => {}
            }
        }

        schema.assign_base_uri(self.base_uri.clone());

        if let Some(name) = schema.anchor() {
            let mut anchor = self.base_uri.clone();
            anchor.set_fragment(Some(name));
            self.add_anchor(anchor, schema);
        }

        for (resource, pointer) in &self.locations {
            self.registry
                .nodes
                .entry((resource.clone(), pointer.clone()))
                .or_insert_with(|| Arc::clone(schema));
        }

        for keyword in schema.keywords() {
            keyword.register_subschemas(self)?;
        }
        Ok(())
    }

    fn enter_resource(&mut self, resource: Url, schema: &Arc<JsonSchema>) {
        tracing::debug!(uri = %resource, location = %self.current_location(), "registering embedded resource");
        self.registry
            .resources
            .entry(resource.clone())
            .or_insert_with(|| Arc::clone(schema));
        self.locations.push((resource.clone(), JsonPointer::root()));
        self.base_uri = resource;
    }

    fn add_anchor(&mut self, anchor: Url, schema: &Arc<JsonSchema>) {
        tracing::trace!(anchor = %anchor, "registering anchor");
        let (resource, location) = self
            .locations
            .iter()
            .rev()
            .find(|(resource, _)| *resource == self.base_uri)
            .cloned()
            .unwrap_or_else(|| (self.base_uri.clone(), JsonPointer::root()));
        self.registry.anchors.entry(anchor).or_insert_with(|| ResolvedSchema {
            schema: Arc::clone(schema),
            resource,
            location,
        });
    }

    fn current_location(&self) -> String {
        self.locations
            .first()
            .map(|(_, pointer)| pointer.to_string())
            .unwrap_or_default()
    }
}

/// Copy of `uri` with the fragment removed
pub(crate) fn without_fragment(uri: &Url) -> Url {
    let mut resource = uri.clone();
    resource.set_fragment(None);
    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(text: &str) -> Url {
        Url::parse(text).unwrap()
    }

    #[test]
    fn test_anonymous_documents_get_synthetic_uris() {
        let mut registry = SchemaRegistry::new();
        let first = registry.register(JsonSchema::boolean(true)).unwrap();
        let second = registry.register(JsonSchema::boolean(false)).unwrap();
        assert_eq!(first.base_uri().unwrap().as_str(), "tessera://schema/0");
        assert_eq!(second.base_uri().unwrap().as_str(), "tessera://schema/1");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut registry = SchemaRegistry::new();
        let schema = registry
            .register(JsonSchema::from_value(&json!({"definitions": {"a": {"type": "string"}}})).unwrap())
            .unwrap();
        let before = schema.base_uri().cloned();
        registry.register_arc(&schema).unwrap();
        registry.register_arc(&schema).unwrap();
        assert_eq!(schema.base_uri().cloned(), before);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_anchors_and_pointers_are_indexed() {
        let mut registry = SchemaRegistry::new();
        let document = json!({
            "$id": "https://example.com/root.json",
            "$defs": {
                "item": {"$anchor": "item", "type": "integer"},
                "nested": {
                    "$id": "nested/schema.json",
                    "properties": {"x": {"type": "boolean"}}
                }
            }
        });
        registry.register(JsonSchema::from_value(&document).unwrap()).unwrap();

        let by_anchor = registry.lookup(&url("https://example.com/root.json#item")).unwrap();
        assert_eq!(by_anchor.to_json(), json!({"$anchor": "item", "type": "integer"}));

        let by_pointer = registry.lookup(&url("https://example.com/root.json#/$defs/item")).unwrap();
        assert!(Arc::ptr_eq(&by_anchor, &by_pointer));

        let nested = registry.lookup(&url("https://example.com/nested/schema.json")).unwrap();
        assert_eq!(nested.base_uri().unwrap().as_str(), "https://example.com/nested/schema.json");

        let inner = registry
            .lookup(&url("https://example.com/nested/schema.json#/properties/x"))
            .unwrap();
        assert_eq!(inner.to_json(), json!({"type": "boolean"}));

        // the embedded resource is also reachable through the enclosing document
        let through_root = registry
            .lookup(&url("https://example.com/root.json#/$defs/nested/properties/x"))
            .unwrap();
        assert!(Arc::ptr_eq(&inner, &through_root));
    }

    #[test]
    fn test_draft04_ids() {
        let mut registry = SchemaRegistry::new();
        let document = json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "id": "http://example.com/legacy.json",
            "definitions": {"name": {"id": "#name", "type": "string"}}
        });
        registry.register(JsonSchema::from_value(&document).unwrap()).unwrap();
        assert!(registry.contains_resource(&url("http://example.com/legacy.json")));
        assert!(registry.lookup(&url("http://example.com/legacy.json#name")).is_some());
    }

    #[test]
    fn test_invalid_id_is_an_error() {
        let mut registry = SchemaRegistry::new();
        let schema = JsonSchema::from_value(&json!({"$id": "http://[invalid"})).unwrap();
        assert!(matches!(registry.register(schema), Err(SchemaError::InvalidUri { .. })));
    }

    #[test]
    fn test_unknown_resources_go_to_resolver() {
        let registry = SchemaRegistry::new();
        let resolver = |uri: &Url| {
            (uri.as_str() == "https://example.com/remote.json").then(|| {
                Arc::new(JsonSchema::from_value(&json!({"definitions": {"n": {"type": "null"}}})).unwrap())
            })
        };
        let target = url("https://example.com/remote.json#/definitions/n");
        let resolved = registry.resolve(&target, Some(&resolver)).unwrap();
        assert_eq!(resolved.schema.to_json(), json!({"type": "null"}));
        assert_eq!(resolved.location.to_string(), "/definitions/n");
        assert!(registry.resolve(&target, None).is_none());
    }
}
