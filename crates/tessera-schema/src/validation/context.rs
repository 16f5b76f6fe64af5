//! Per-step evaluation state
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::output::OutputFormat;
use super::{ValidationOptions, Validator};
use crate::pointer::JsonPointer;
use crate::registry::{ResolvedSchema, SchemaRegistry};
use crate::schema::JsonSchema;
use crate::versioning::{Draft, VocabularySet};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// One reference hop taken during the current evaluation path
#[derive(Debug)]
struct ReferenceFrame {
    target: Url,
    instance_location: JsonPointer,
    parent: Option<Arc<ReferenceFrame>>,
}

/// State of one evaluation step
///
/// Contexts are never mutated once handed to a keyword; every descent derives a
/// new child by value so sibling branches cannot observe each other.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    instance: &'a Value,
    root: &'a Value,
    local_schema: Option<&'a JsonSchema>,
    base_uri: Arc<Url>,
    recursive_anchor: Option<Arc<Url>>,
    base_relative_location: JsonPointer,
    relative_location: JsonPointer,
    instance_location: JsonPointer,
    draft: Draft,
    declared_draft: Option<Draft>,
    vocabularies: Arc<VocabularySet>,
    references: Option<Arc<ReferenceFrame>>,
    depth: usize,
    format: OutputFormat,
    validator: &'a Validator,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(validator: &'a Validator, base_uri: Url, instance: &'a Value, format: OutputFormat) -> Self {
        let options = validator.options();
        Self {
            instance,
            root: instance,
            local_schema: None,
            base_uri: Arc::new(base_uri),
            recursive_anchor: None,
            base_relative_location: JsonPointer::root(),
            relative_location: JsonPointer::root(),
            instance_location: JsonPointer::root(),
            draft: options.draft.unwrap_or(options.default_draft),
            declared_draft: options.draft,
            vocabularies: Arc::new(VocabularySet::standard()),
            references: None,
            depth: 0,
            format,
            validator,
        }
    }

    /// The value being validated at this step
    pub fn instance(&self) -> &'a Value {
        self.instance
    }

    /// The whole instance document
    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// The schema node whose keywords are being evaluated
    pub fn local_schema(&self) -> Option<&'a JsonSchema> {
        self.local_schema
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn recursive_anchor(&self) -> Option<&Url> {
        self.recursive_anchor.as_deref()
    }

    /// Path through the schema from the evaluation root, following references
    pub fn relative_location(&self) -> &JsonPointer {
        &self.relative_location
    }

    /// Path from the root of the current schema resource
    pub fn base_relative_location(&self) -> &JsonPointer {
        &self.base_relative_location
    }

    pub fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }

    /// Draft governing the current schema node
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Draft fixed by an enclosing `$schema` or by the engine options
    pub fn declared_draft(&self) -> Option<Draft> {
        self.declared_draft
    }

    pub fn vocabularies(&self) -> &VocabularySet {
        &self.vocabularies
    }

    /// Number of schema nodes entered on the path to this step
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Terse evaluation: only the verdict matters, composites may short-circuit
    pub fn is_terse(&self) -> bool {
        self.format == OutputFormat::Flag
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.validator.registry()
    }

    pub fn options(&self) -> &'a ValidationOptions {
        self.validator.options()
    }

    /// Absolute keyword location, present once it no longer mirrors the relative one
    pub fn absolute_location(&self) -> Option<Url> {
        if self.is_terse() || self.base_relative_location == self.relative_location {
            return None;
        }
        let mut location = (*self.base_uri).clone();
        location.set_fragment(Some(&self.base_relative_location.to_string()));
        Some(location)
    }

    /// Child context for a keyword of the current schema
    pub fn push_keyword(&self, name: &str) -> Self {
        self.push_schema(&[name])
    }

    /// Child context for a location below the current schema node
    pub fn push_schema(&self, segments: &[&str]) -> Self {
        let mut child = self.clone();
        for segment in segments {
            child.relative_location.push(*segment);
            child.base_relative_location.push(*segment);
        }
        child
    }

    /// Child context for a value inside the current instance
    pub fn push_instance<'b>(&self, instance: &'b Value, segment: impl Into<String>) -> ValidationContext<'b>
    where
        'a: 'b,
    {
        let mut child: ValidationContext<'b> = self.clone();
        child.instance = instance;
        child.instance_location.push(segment);
        child
    }

    /// Scope for evaluating `schema`'s keywords
    pub(crate) fn enter_schema<'b>(
        &self,
        schema: &'b JsonSchema,
        draft: Draft,
        declared: Option<Draft>,
        vocabularies: Option<Arc<VocabularySet>>,
    ) -> ValidationContext<'b>
    where
        'a: 'b,
    {
        let mut scope: ValidationContext<'b> = self.clone();
        scope.local_schema = Some(schema);
        scope.depth += 1;
        scope.draft = draft;
        if declared.is_some() {
            scope.declared_draft = declared;
        }
        if let Some(vocabularies) = vocabularies {
            scope.vocabularies = vocabularies;
        }
        if let Some(base) = schema.base_uri() {
            if base != &*scope.base_uri {
                scope.base_uri = Arc::new(base.clone());
                scope.base_relative_location = JsonPointer::root();
            }
        }
        if scope.recursive_anchor.is_none() && schema.has_recursive_anchor() {
            scope.recursive_anchor = Some(Arc::clone(&scope.base_uri));
        }
        scope
    }

    /// Whether following `target` now would revisit it without consuming any instance
    pub(crate) fn is_reference_cycle(&self, target: &Url) -> bool {
        let mut frame = self.references.as_deref();
        while let Some(current) = frame {
            if current.instance_location != self.instance_location {
                return false;
            }
            if &current.target == target {
                return true;
            }
            frame = current.parent.as_deref();
        }
        false
    }

    /// Context for evaluating the target of a reference
    pub(crate) fn follow_reference<'b>(&self, target: &Url, resolved: &'b ResolvedSchema) -> ValidationContext<'b>
    where
        'a: 'b,
    {
        let mut child: ValidationContext<'b> = self.clone();
        child.references = Some(Arc::new(ReferenceFrame {
            target: target.clone(),
            instance_location: self.instance_location.clone(),
            parent: self.references.clone(),
        }));
        let base = resolved.schema.base_uri().unwrap_or(&resolved.resource);
        if base != &resolved.resource {
            // the node declares its own resource
            child.base_uri = Arc::new(base.clone());
            child.base_relative_location = JsonPointer::root();
        } else {
            child.base_uri = Arc::new(resolved.resource.clone());
            child.base_relative_location = resolved.location.clone();
        }
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationOptions;
    use serde_json::json;

    fn validator() -> Validator {
        Validator::new(SchemaRegistry::new(), ValidationOptions::default())
    }

    #[test]
    fn test_children_do_not_touch_parent() {
        let validator = validator();
        let instance = json!({"a": [1, 2]});
        let base = Url::parse("tessera://schema/0").unwrap();
        let root = ValidationContext::new(&validator, base, &instance, OutputFormat::Verbose);

        let property = root.push_keyword("properties").push_schema(&["a"]);
        let element = property.push_instance(&instance["a"], "a").push_instance(&instance["a"][1], "1");

        assert!(root.relative_location().is_root());
        assert_eq!(property.relative_location().to_string(), "/properties/a");
        assert_eq!(element.instance_location().to_string(), "/a/1");
        assert_eq!(element.instance(), &json!(2));
        assert_eq!(element.root(), &instance);
        assert_eq!(element.instance_location().evaluate(element.root()), Some(&json!(2)));
    }

    #[test]
    fn test_reference_cycle_requires_same_instance_location() {
        let validator = validator();
        let instance = json!({"next": {}});
        let base = Url::parse("tessera://schema/0").unwrap();
        let target = Url::parse("tessera://schema/0#").unwrap();
        let resolved = ResolvedSchema {
            schema: Arc::new(JsonSchema::boolean(true)),
            resource: base.clone(),
            location: JsonPointer::root(),
        };
        let root = ValidationContext::new(&validator, base, &instance, OutputFormat::Flag);

        let followed = root.follow_reference(&target, &resolved);
        assert!(followed.is_reference_cycle(&target));

        let deeper = followed.push_instance(&instance["next"], "next");
        assert!(!deeper.is_reference_cycle(&target));
    }

    #[test]
    fn test_entering_a_schema_increments_depth() {
        let validator = validator();
        let instance = json!({});
        let base = Url::parse("tessera://schema/0").unwrap();
        let root = ValidationContext::new(&validator, base, &instance, OutputFormat::Flag);
        let schema = JsonSchema::boolean(true);

        let outer = root.enter_schema(&schema, Draft::Draft07, None, None);
        let inner = outer.push_keyword("not").enter_schema(&schema, Draft::Draft07, None, None);
        assert_eq!(root.depth(), 0);
        assert_eq!(outer.depth(), 1);
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn test_absolute_location_only_when_diverged() {
        let validator = validator();
        let instance = json!(null);
        let base = Url::parse("https://example.com/s.json").unwrap();
        let root = ValidationContext::new(&validator, base.clone(), &instance, OutputFormat::Verbose);
        assert!(root.push_keyword("type").absolute_location().is_none());

        let resolved = ResolvedSchema {
            schema: Arc::new(JsonSchema::boolean(true)),
            resource: base,
            location: JsonPointer::parse("/definitions/a").unwrap(),
        };
        let target = Url::parse("https://example.com/s.json#/definitions/a").unwrap();
        let hop = root.push_keyword("$ref");
        let followed = hop.follow_reference(&target, &resolved).push_keyword("type");
        assert_eq!(followed.relative_location().to_string(), "/$ref/type");
        assert_eq!(
            followed.absolute_location().unwrap().as_str(),
            "https://example.com/s.json#/definitions/a/type"
        );
    }
}
