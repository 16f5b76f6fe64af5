//! Reference keywords: `$ref` and `$recursiveRef`
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license
//!
//! Both keywords resolve against the registry at validation time. A reference
//! that re-enters a target already on the current trail without the instance
//! having moved is reported as a cycle instead of being followed again.

use super::{describe, Keyword, KeywordRegistry};
use crate::error::{SchemaError, SchemaResult};
use crate::registry::ANONYMOUS_SCHEME;
use crate::schema::SchemaBuilder;
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use serde_json::Value;
use std::any::Any;
use url::Url;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("$ref", build_ref)
        .register("$recursiveRef", build_recursive_ref);
}

fn expect_reference(keyword: &str, value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<String> {
    let reference = value
        .as_str()
        .ok_or_else(|| builder.invalid(keyword, format!("expected a string, found {}", describe(value))))?;
    let joined = Url::parse(&format!("{ANONYMOUS_SCHEME}://schema/0"))
        .and_then(|base| base.join(reference));
    match joined {
        Ok(_) => Ok(reference.to_string()),
        Err(source) => Err(SchemaError::invalid_uri(reference, builder.location().to_string(), source)),
    }
}

fn build_ref(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    Ok(Some(Box::new(RefKeyword {
        reference: expect_reference("$ref", value, builder)?,
    })))
}

fn build_recursive_ref(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    Ok(Some(Box::new(RecursiveRefKeyword {
        reference: expect_reference("$recursiveRef", value, builder)?,
    })))
}

/// Resolve `target` and evaluate the instance against it
fn follow(name: &str, reference: &str, target: Url, context: &ValidationContext<'_>) -> ValidationResults {
    let keyword_context = context.push_keyword(name);
    let results = ValidationResults::new(Some(name), &keyword_context);

    if keyword_context.is_reference_cycle(&target) {
        tracing::debug!(uri = %target, instance = %context.instance_location(), "reference cycle");
        return results
            .invalid("$ref.cycle")
            .with_info("reference", target.as_str());
    }

    let resolver = context.options().resolver.as_deref();
    let Some(resolved) = context.registry().resolve(&target, resolver) else {
        tracing::warn!(reference, uri = %target, "unresolved schema reference");
        return results
            .invalid("$ref.unresolved")
            .with_info("reference", target.as_str());
    };

    let outcome = resolved
        .schema
        .validate(&keyword_context.follow_reference(&target, &resolved));
    if outcome.is_valid {
        return results;
    }
    let results = results.invalid(name).with_info("reference", reference);
    if context.is_terse() {
        results
    } else {
        results.with_nested(vec![outcome])
    }
}

/// `$ref`
#[derive(Debug, Clone)]
pub struct RefKeyword {
    reference: String,
}

impl RefKeyword {
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl Keyword for RefKeyword {
    fn name(&self) -> &str {
        "$ref"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        match context.base_uri().join(&self.reference) {
            Ok(target) => follow("$ref", &self.reference, target, context),
            Err(error) => {
                tracing::warn!(reference = %self.reference, %error, "reference does not form a URI");
                ValidationResults::new(Some("$ref"), &context.push_keyword("$ref"))
                    .invalid("$ref.unresolved")
                    .with_info("reference", self.reference.as_str())
            }
        }
    }

    fn to_json(&self) -> Value {
        Value::from(self.reference.as_str())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$recursiveRef` (2019-09)
///
/// Resolves lexically like `$ref`. When the lexical target declares
/// `$recursiveAnchor: true`, the outermost recursive anchor recorded on the
/// evaluation path takes its place, which is how extended meta-schemas redirect
/// recursion into themselves.
#[derive(Debug, Clone)]
pub struct RecursiveRefKeyword {
    reference: String,
}

impl RecursiveRefKeyword {
    fn target(&self, context: &ValidationContext<'_>) -> Option<Url> {
        let lexical = context.base_uri().join(&self.reference).ok()?;
        let Some(anchor) = context.recursive_anchor() else {
            return Some(lexical);
        };
        let redirect = context
            .registry()
            .resolve(&lexical, context.options().resolver.as_deref())
            .is_some_and(|resolved| resolved.schema.has_recursive_anchor());
        if redirect {
            anchor.join(&self.reference).ok()
        } else {
            Some(lexical)
        }
    }
}

impl Keyword for RecursiveRefKeyword {
    fn name(&self) -> &str {
        "$recursiveRef"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft2019_09)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::CORE)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        match self.target(context) {
            Some(target) => follow("$recursiveRef", &self.reference, target, context),
            None => ValidationResults::new(Some("$recursiveRef"), &context.push_keyword("$recursiveRef"))
                .invalid("$ref.unresolved")
                .with_info("reference", self.reference.as_str()),
        }
    }

    fn to_json(&self) -> Value {
        Value::from(self.reference.as_str())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
