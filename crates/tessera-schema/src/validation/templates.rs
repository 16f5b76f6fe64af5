//! Error message templates
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license
//!
//! Messages are rendered after evaluation from each failing node's message key
//! and its `additional_info` parameters. `{{token}}` placeholders without a
//! matching parameter are left as they are.

use super::results::ValidationResults;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("false", "All values fail against the false schema."),
    ("schema", "The value failed validation against the schema."),
    ("depth", "Evaluation exceeded the maximum depth of {{maxDepth}} nested schemas."),
    ("$schema.vocabulary", "The meta-schema requires unknown vocabularies {{vocabularies}}."),
    ("$ref", "The value failed validation against the referenced schema '{{reference}}'."),
    ("$ref.unresolved", "Could not resolve reference '{{reference}}'."),
    ("$ref.cycle", "Reference '{{reference}}' re-enters itself without consuming the instance."),
    ("$recursiveRef", "The value failed validation against the recursive reference '{{reference}}'."),
    ("type", "Value is {{actual}} but should be {{expected}}."),
    ("enum", "The value should match one of the values specified by the enum."),
    ("const", "The value should equal {{expected}}."),
    ("minimum", "{{actual}} should be greater than or equal to {{lowerBound}}."),
    ("minimum.exclusive", "{{actual}} should be greater than {{lowerBound}}."),
    ("maximum", "{{actual}} should be less than or equal to {{upperBound}}."),
    ("maximum.exclusive", "{{actual}} should be less than {{upperBound}}."),
    ("exclusiveMinimum", "{{actual}} should be greater than {{lowerBound}}."),
    ("exclusiveMaximum", "{{actual}} should be less than {{upperBound}}."),
    ("multipleOf", "{{actual}} should be a multiple of {{divisor}}."),
    ("minLength", "The value should be at least {{lowerBound}} characters long, found {{actual}}."),
    ("maxLength", "The value should be at most {{upperBound}} characters long, found {{actual}}."),
    ("pattern", "The value should match the regular expression {{pattern}}."),
    ("items", "{{failed}} of {{total}} items failed validation."),
    ("additionalItems", "{{failed}} of {{total}} additional items failed validation."),
    ("minItems", "The array should contain at least {{lowerBound}} items, found {{actual}}."),
    ("maxItems", "The array should contain at most {{upperBound}} items, found {{actual}}."),
    ("uniqueItems", "Items at {{duplicates}} are equal; all items should be unique."),
    ("properties", "Properties {{properties}} failed validation."),
    ("patternProperties", "Properties {{properties}} failed validation."),
    ("additionalProperties", "Additional properties {{properties}} failed validation."),
    ("required", "The properties {{missing}} are required."),
    ("minProperties", "The object should have at least {{lowerBound}} properties, found {{actual}}."),
    ("maxProperties", "The object should have at most {{upperBound}} properties, found {{actual}}."),
    ("dependencies", "{{failed}} of {{total}} dependencies failed validation."),
    ("dependencies.missing", "When {{property}} is present, {{missing}} are required."),
    ("dependentRequired", "{{failed}} of {{total}} dependencies failed validation."),
    ("dependentRequired.missing", "When {{property}} is present, {{missing}} are required."),
    ("dependentSchemas", "{{failed}} of {{total}} dependencies failed validation."),
    ("allOf", "{{failed}} of {{total}} subschemas failed validation."),
    ("anyOf", "None of the {{total}} subschemas passed validation."),
    ("oneOf", "Exactly one subschema should pass validation, but {{passed}} of {{total}} passed."),
    ("not", "The value should not validate against the schema."),
    ("if", "The value failed validation against the {{branch}} subschema."),
];

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("Valid regex pattern"))
}

/// Replace `{{token}}` placeholders with parameters; strings are inserted without quotes
pub fn resolve_tokens(template: &str, info: &Map<String, Value>) -> String {
    token_pattern()
        .replace_all(template, |captures: &Captures<'_>| match info.get(&captures[1]) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => captures[0].to_string(),
        })
        .into_owned()
}

/// Message templates owned by one engine
#[derive(Debug, Clone)]
pub struct ErrorTemplates {
    templates: HashMap<String, String>,
}

impl ErrorTemplates {
    /// The built-in English templates
    pub fn standard() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(key, template)| (key.to_string(), template.to_string()))
                .collect(),
        }
    }

    /// No templates at all; failing nodes keep an empty message
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Override or add a template, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, template: impl Into<String>) -> Option<String> {
        self.templates.insert(key.into(), template.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    pub fn render(&self, key: &str, info: &Map<String, Value>) -> Option<String> {
        self.get(key).map(|template| resolve_tokens(template, info))
    }

    /// Fill messages of failing nodes that do not carry one yet
    pub fn apply(&self, results: &mut ValidationResults) {
        if !results.is_valid && results.error_message.is_none() {
            if let Some(key) = &results.message_key {
                results.error_message = self.render(key, &results.additional_info);
            }
        }
        for nested in &mut results.nested_results {
            self.apply(nested);
        }
    }
}

impl Default for ErrorTemplates {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_tokens_are_substituted() {
        let params = info(json!({"failed": 1, "total": 3, "name": "age"}));
        assert_eq!(
            resolve_tokens("{{failed}} of {{total}} for {{name}}", &params),
            "1 of 3 for age"
        );
    }

    #[test]
    fn test_missing_tokens_stay_verbatim() {
        let params = info(json!({"failed": 1}));
        assert_eq!(
            resolve_tokens("{{failed}} of {{total}}", &params),
            "1 of {{total}}"
        );
    }

    #[test]
    fn test_overrides_are_per_instance() {
        let mut custom = ErrorTemplates::standard();
        custom.set("minimum", "too small: {{actual}}");
        let standard = ErrorTemplates::standard();

        let params = info(json!({"actual": 4, "lowerBound": 5}));
        assert_eq!(custom.render("minimum", &params).unwrap(), "too small: 4");
        assert_eq!(
            standard.render("minimum", &params).unwrap(),
            "4 should be greater than or equal to 5."
        );
        assert!(ErrorTemplates::empty().render("minimum", &params).is_none());
    }
}
