//! Tessera Schema - JSON Schema validation engine
//!
//! This crate validates JSON instances against JSON Schema documents written for
//! Draft 04, Draft 06, Draft 07 and 2019-09:
//! - **Keyword dispatch**: every constraint is a [`Keyword`] built through a
//!   [`KeywordRegistry`], filtered per draft and vocabulary
//! - **Reference resolution**: `$ref` and `$recursiveRef` resolve lazily against a
//!   [`SchemaRegistry`], with optional retrieval through a [`DocumentResolver`]
//! - **Explainable output**: results mirror the schema structure and render
//!   messages from replaceable templates in four [`OutputFormat`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera_schema::{JsonSchema, SchemaRegistry, ValidationOptions, Validator};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! let schema = registry
//!     .register(JsonSchema::from_value(&json!({
//!         "type": "object",
//!         "properties": {"age": {"type": "integer", "minimum": 0}},
//!         "required": ["age"]
//!     }))?)?;
//!
//! let validator = Validator::new(registry, ValidationOptions::default());
//! assert!(validator.is_valid(&schema, &json!({"age": 42}))?);
//!
//! let results = validator.validate(&schema, &json!({"age": -1}))?;
//! assert!(!results.is_valid);
//! # Ok::<(), tessera_schema::Error>(())
//! ```
//!
//! ## Lifecycle
//!
//! Schemas are built once, registered once (registration is idempotent), then
//! validated any number of times. A [`Validator`] is `Send + Sync` and can be
//! shared between threads.
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod keywords;
pub mod pointer;
pub mod registry;
pub mod schema;
pub mod validation;
pub mod versioning;

// Re-export commonly used types for convenience
pub use error::{Error, SchemaError, SchemaResult, ValidationError};
pub use keywords::{Keyword, KeywordFactory, KeywordRegistry};
pub use pointer::{JsonPointer, PointerError};
pub use registry::{DocumentResolver, RegistrationScope, ResolvedSchema, SchemaRegistry, StaticResolver};
pub use schema::{JsonSchema, SchemaBuilder};
pub use validation::{
    ErrorTemplates, OutputFormat, ValidationContext, ValidationOptions, ValidationResults, Validator,
};
pub use versioning::{Draft, DraftSet, Vocabulary, VocabularySet};

use serde_json::Value;

/// Build, register and validate in one call
///
/// Convenient for single documents; hosts validating repeatedly should keep a
/// [`Validator`] around instead.
pub fn validate(schema: &Value, instance: &Value, format: OutputFormat) -> Result<ValidationResults, Error> {
    let mut registry = SchemaRegistry::new();
    let schema = registry.register(JsonSchema::from_value(schema)?)?;
    let validator = Validator::new(registry, ValidationOptions::default());
    Ok(validator.validate_as(&schema, instance, format)?)
}

/// Build, register and check an instance, returning only the verdict
pub fn is_valid(schema: &Value, instance: &Value) -> Result<bool, Error> {
    validate(schema, instance, OutputFormat::Flag).map(|results| results.is_valid)
}
