//! Keyword dispatch: the [`Keyword`] trait and the [`KeywordRegistry`]
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license
//!
//! Every constraint of a schema is a keyword object. A registry maps a keyword
//! name to one or more factories; each factory inspects the JSON value and either
//! builds its variant or declines so that another variant of the same name can
//! claim the value.

pub mod array;
pub mod composition;
pub mod identifiers;
pub mod generic;
pub mod metadata;
pub mod numeric;
pub mod object;
pub mod reference;
pub mod string;

use crate::error::{SchemaError, SchemaResult};
use crate::registry::RegistrationScope;
use crate::schema::{JsonSchema, SchemaBuilder};
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{DraftSet, Vocabulary};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A single constraint or annotation of a schema
pub trait Keyword: fmt::Debug + Send + Sync + Any {
    /// The JSON property name of the keyword
    fn name(&self) -> &str;

    /// Drafts in which the keyword takes part in validation
    fn supported_drafts(&self) -> DraftSet;

    /// Evaluation rank; lower runs first, ties keep declaration order
    fn sequence(&self) -> i32 {
        1
    }

    /// Vocabulary the keyword belongs to, if any
    fn vocabulary(&self) -> Option<Vocabulary>;

    /// Evaluate the keyword against the instance of `context`
    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults;

    /// Record owned subschemas in the registry
    fn register_subschemas(&self, _scope: &mut RegistrationScope<'_>) -> SchemaResult<()> {
        Ok(())
    }

    /// Find an owned subschema by the pointer segments that follow the keyword name
    fn resolve_subschema(&self, _pointer: &[String]) -> Option<Arc<JsonSchema>> {
        None
    }

    /// The keyword's value as JSON
    fn to_json(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
}

/// Builds a keyword from its JSON value, or declines with `Ok(None)`
pub type KeywordFactory = fn(&Value, &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>>;

/// Maps keyword names to factories
#[derive(Clone, Default)]
pub struct KeywordRegistry {
    factories: HashMap<String, Vec<KeywordFactory>>,
}

impl KeywordRegistry {
    /// A registry without any keywords; every key becomes an inert unknown keyword
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shared registry holding every built-in keyword
    pub fn standard() -> &'static KeywordRegistry {
        static STANDARD: OnceLock<KeywordRegistry> = OnceLock::new();
        STANDARD.get_or_init(Self::with_standard_keywords)
    }

    /// An owned registry with every built-in keyword, ready to be extended
    pub fn with_standard_keywords() -> Self {
        let mut registry = Self::empty();
        identifiers::register(&mut registry);
        reference::register(&mut registry);
        generic::register(&mut registry);
        numeric::register(&mut registry);
        string::register(&mut registry);
        array::register(&mut registry);
        object::register(&mut registry);
        composition::register(&mut registry);
        metadata::register(&mut registry);
        registry
    }

    /// Add a factory for `name`; factories are tried in registration order
    pub fn register(&mut self, name: impl Into<String>, factory: KeywordFactory) -> &mut Self {
        self.factories.entry(name.into()).or_default().push(factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub(crate) fn build(&self, name: &str, value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Box<dyn Keyword>> {
        let Some(factories) = self.factories.get(name) else {
            return Ok(Box::new(metadata::UnknownKeyword::new(name, value.clone())));
        };
        for factory in factories {
            if let Some(keyword) = factory(value, builder)? {
                return Ok(keyword);
            }
        }
        Err(SchemaError::invalid_keyword(
            name,
            builder.location().to_string(),
            format!("unsupported value {}", describe(value)),
        ))
    }
}

impl fmt::Debug for KeywordRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("KeywordRegistry").field("keywords", &names).finish()
    }
}

/// Short JSON type description for error messages
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// JSON equality where numbers compare by value (`1 == 1.0`)
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Result for keywords that never fail (annotations, identifiers)
pub(crate) fn passed(name: &str, context: &ValidationContext<'_>) -> ValidationResults {
    ValidationResults::new(Some(name), &context.push_keyword(name))
}

/// Collects child results of an applicator keyword
pub(crate) struct Tally {
    terse: bool,
    pub failed: usize,
    pub total: usize,
    pub nested: Vec<ValidationResults>,
}

impl Tally {
    pub fn new(context: &ValidationContext<'_>) -> Self {
        Self {
            terse: context.is_terse(),
            failed: 0,
            total: 0,
            nested: Vec::new(),
        }
    }

    /// Record a child result; `false` means a terse evaluation may stop here
    pub fn record(&mut self, result: ValidationResults) -> bool {
        self.total += 1;
        let failed = !result.is_valid;
        if failed {
            self.failed += 1;
        }
        if !self.terse {
            self.nested.push(result);
        }
        !(self.terse && failed)
    }
}

/// Descend into an owned subschema, continuing with the remaining segments
pub(crate) fn descend(schema: &Arc<JsonSchema>, rest: &[String]) -> Option<Arc<JsonSchema>> {
    if rest.is_empty() {
        Some(Arc::clone(schema))
    } else {
        schema.resolve_subschema(rest)
    }
}

/// Non-negative integer keyword values (`minLength`, `maxItems`, ...)
pub(crate) fn expect_count(keyword: &str, value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<u64> {
    if let Some(count) = value.as_u64() {
        return Ok(count);
    }
    // 2.0 is an acceptable count from Draft06 on
    if let Some(float) = value.as_f64() {
        if float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
            return Ok(float as u64);
        }
    }
    Err(builder.invalid(keyword, format!("expected a non-negative integer, found {}", describe(value))))
}

/// Keyword values that are arrays of strings (`required`, `dependentRequired` entries)
pub(crate) fn expect_string_list(keyword: &str, value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| builder.invalid(keyword, format!("expected an array of strings, found {}", describe(value))))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| builder.invalid(keyword, format!("expected a string entry, found {}", describe(item))))
        })
        .collect()
}
