//! Evaluation of instances against registered schemas
//!
//! The [`Validator`] pairs a frozen [`SchemaRegistry`] with [`ValidationOptions`].
//! Each call builds a root [`ValidationContext`], evaluates the schema, shapes the
//! result tree for the configured [`OutputFormat`] and renders messages.
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

pub mod context;
pub mod output;
pub mod results;
pub mod templates;

pub use context::ValidationContext;
pub use output::{shape, OutputFormat};
pub use results::ValidationResults;
pub use templates::{resolve_tokens, ErrorTemplates};

use crate::error::ValidationError;
use crate::registry::{DocumentResolver, SchemaRegistry};
use crate::schema::JsonSchema;
use crate::versioning::{Draft, Vocabulary};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Engine configuration
#[derive(Clone)]
pub struct ValidationOptions {
    /// Result shape produced by [`Validator::validate`]
    pub output_format: OutputFormat,
    /// Draft used when a schema neither declares nor implies one
    pub default_draft: Draft,
    /// Draft forced for every schema without its own `$schema`
    pub draft: Option<Draft>,
    pub templates: ErrorTemplates,
    /// Retrieval of documents missing from the registry
    pub resolver: Option<Arc<dyn DocumentResolver>>,
    /// Vocabularies beyond the standard ones that custom keywords implement
    pub vocabularies: Vec<Vocabulary>,
    /// Deepest chain of nested schema nodes evaluated before failing the instance
    pub max_depth: Option<usize>,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Override one message template
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.set(key, template);
        self
    }

    pub fn with_templates(mut self, templates: ErrorTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_resolver(mut self, resolver: impl DocumentResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Fail instead of descending past `depth` nested schema nodes
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabularies.push(vocabulary);
        self
    }

    /// Whether keywords of `vocabulary` can be evaluated by this engine
    pub fn knows_vocabulary(&self, vocabulary: &Vocabulary) -> bool {
        Vocabulary::standard().contains(vocabulary) || self.vocabularies.contains(vocabulary)
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            default_draft: Draft::LATEST,
            draft: None,
            templates: ErrorTemplates::standard(),
            resolver: None,
            vocabularies: Vec::new(),
            max_depth: None,
        }
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("output_format", &self.output_format)
            .field("default_draft", &self.default_draft)
            .field("draft", &self.draft)
            .field("templates", &self.templates)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .field("vocabularies", &self.vocabularies)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// A frozen registry plus options; validates any number of instances concurrently
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<SchemaRegistry>,
    options: ValidationOptions,
}

impl Validator {
    pub fn new(registry: SchemaRegistry, options: ValidationOptions) -> Self {
        Self::from_shared(Arc::new(registry), options)
    }

    pub fn from_shared(registry: Arc<SchemaRegistry>, options: ValidationOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate with the configured output format
    pub fn validate(&self, schema: &JsonSchema, instance: &Value) -> Result<ValidationResults, ValidationError> {
        self.validate_as(schema, instance, self.options.output_format)
    }

    /// Validate with an explicit output format for this call
    pub fn validate_as(
        &self,
        schema: &JsonSchema,
        instance: &Value,
        format: OutputFormat,
    ) -> Result<ValidationResults, ValidationError> {
        let base = schema.base_uri().ok_or(ValidationError::Unregistered)?;
        if !self.registry.contains_resource(base) {
            return Err(ValidationError::ForeignSchema { uri: base.to_string() });
        }

        let span = tracing::debug_span!("validate", schema = %base, format = %format);
        let _guard = span.enter();

        let context = ValidationContext::new(self, base.clone(), instance, format);
        let results = schema.validate(&context);
        let mut results = shape(results, format);
        if format != OutputFormat::Flag {
            self.options.templates.apply(&mut results);
        }
        tracing::debug!(valid = results.is_valid, "validation finished");
        Ok(results)
    }

    /// Terse check: only the verdict, composites short-circuit
    pub fn is_valid(&self, schema: &JsonSchema, instance: &Value) -> Result<bool, ValidationError> {
        self.validate_as(schema, instance, OutputFormat::Flag)
            .map(|results| results.is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unregistered_schema_is_rejected() {
        let validator = Validator::new(SchemaRegistry::new(), ValidationOptions::default());
        let schema = JsonSchema::from_value(&json!({"type": "string"})).unwrap();
        assert_eq!(
            validator.validate(&schema, &json!("x")).unwrap_err(),
            ValidationError::Unregistered
        );
    }

    #[test]
    fn test_schema_from_other_registry_is_rejected() {
        let mut other = SchemaRegistry::new();
        let schema = other
            .register(JsonSchema::from_value(&json!({"$id": "https://example.com/s"})).unwrap())
            .unwrap();
        let validator = Validator::new(SchemaRegistry::new(), ValidationOptions::default());
        assert!(matches!(
            validator.is_valid(&schema, &json!(1)),
            Err(ValidationError::ForeignSchema { .. })
        ));
    }

    #[test]
    fn test_validator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
        assert_send_sync::<Arc<JsonSchema>>();

        let mut registry = SchemaRegistry::new();
        let schema = registry
            .register(
                JsonSchema::from_value(&json!({
                    "definitions": {"positive": {"type": "integer", "minimum": 1}},
                    "type": "array",
                    "items": {"$ref": "#/definitions/positive"}
                }))
                .unwrap(),
            )
            .unwrap();
        let validator = Validator::new(registry, ValidationOptions::default().with_output_format(OutputFormat::Verbose));
        let instances: Vec<Value> = (0..8).map(|n| json!([n, n + 1, "x"])).collect();
        let sequential: Vec<ValidationResults> = instances
            .iter()
            .map(|instance| validator.validate(&schema, instance).unwrap())
            .collect();

        let (validator, schema) = (&validator, &schema);
        let concurrent: Vec<ValidationResults> = std::thread::scope(|scope| {
            let handles: Vec<_> = instances
                .iter()
                .map(|instance| scope.spawn(move || validator.validate(schema, instance).unwrap()))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(concurrent, sequential);
        assert!(concurrent.iter().all(|results| !results.is_valid));
    }

    #[test]
    fn test_custom_vocabulary_is_known_once_declared() {
        let custom = Vocabulary::new("https://example.com/vocab/units");
        let options = ValidationOptions::default();
        assert!(options.knows_vocabulary(&Vocabulary::VALIDATION));
        assert!(!options.knows_vocabulary(&custom));
        assert!(options.with_vocabulary(custom.clone()).knows_vocabulary(&custom));
    }
}
