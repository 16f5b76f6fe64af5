//! Construction of schemas from JSON documents
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::JsonSchema;
use crate::error::{SchemaError, SchemaResult};
use crate::keywords::{describe, KeywordRegistry};
use crate::pointer::JsonPointer;
use serde_json::Value;
use std::sync::Arc;

/// Builds schema nodes while tracking their location in the source document
///
/// Keyword factories receive a builder positioned at their own keyword and use
/// [`SchemaBuilder::subschema`] for nested schemas, so construction errors carry
/// the full pointer to the offending node.
#[derive(Debug, Clone)]
pub struct SchemaBuilder<'r> {
    registry: &'r KeywordRegistry,
    location: JsonPointer,
}

impl<'r> SchemaBuilder<'r> {
    pub fn new(registry: &'r KeywordRegistry) -> Self {
        Self {
            registry,
            location: JsonPointer::root(),
        }
    }

    pub fn registry(&self) -> &'r KeywordRegistry {
        self.registry
    }

    /// Location of the value being built
    pub fn location(&self) -> &JsonPointer {
        &self.location
    }

    /// Build the schema node at the current location
    pub fn build(&self, value: &Value) -> SchemaResult<JsonSchema> {
        match value {
            Value::Bool(flag) => Ok(JsonSchema::boolean(*flag)),
            Value::Object(map) => {
                let mut keywords = Vec::with_capacity(map.len());
                for (name, keyword_value) in map {
                    let keyword_builder = self.child(&[name.as_str()]);
                    keywords.push(self.registry.build(name, keyword_value, &keyword_builder)?);
                }
                Ok(JsonSchema::with_keywords(keywords))
            }
            other => Err(SchemaError::InvalidSchemaType {
                location: self.location.to_string(),
                found: describe(other),
            }),
        }
    }

    /// A builder positioned below the current location
    pub fn child(&self, segments: &[&str]) -> SchemaBuilder<'r> {
        Self {
            registry: self.registry,
            location: self.location.join_all(segments.iter().copied()),
        }
    }

    /// Build a nested schema found at `segments` below the current location
    pub fn subschema(&self, value: &Value, segments: &[&str]) -> SchemaResult<Arc<JsonSchema>> {
        self.child(segments).build(value).map(Arc::new)
    }

    /// Error for a keyword value at the current location
    pub fn invalid(&self, keyword: &str, reason: impl Into<String>) -> SchemaError {
        SchemaError::invalid_keyword(keyword, self.location.to_string(), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_schema_values() {
        let builder = SchemaBuilder::new(KeywordRegistry::standard());
        let error = builder.build(&json!(42)).unwrap_err();
        assert!(matches!(error, SchemaError::InvalidSchemaType { found: "a number", .. }));
    }

    #[test]
    fn test_nested_errors_carry_location() {
        let builder = SchemaBuilder::new(KeywordRegistry::standard());
        let error = builder
            .build(&json!({"items": [{"type": "string"}, {"allOf": [null]}]}))
            .unwrap_err();
        assert_eq!(error.location(), Some("/items/1/allOf/0"));
    }
}
