//! The result tree produced by an evaluation
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::context::ValidationContext;
use crate::pointer::JsonPointer;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

/// Outcome of evaluating one schema node or keyword
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResults {
    /// Keyword that produced the node; `None` for schema-level nodes
    pub keyword: Option<String>,
    pub is_valid: bool,
    /// Path through the schema from the evaluation root
    pub relative_location: JsonPointer,
    /// Base URI plus resource-relative pointer, when it differs from the relative path
    pub absolute_location: Option<Url>,
    pub instance_location: JsonPointer,
    pub error_message: Option<String>,
    /// Template key used to render `error_message`
    pub message_key: Option<String>,
    pub nested_results: Vec<ValidationResults>,
    /// Template parameters
    pub additional_info: Map<String, Value>,
}

impl ValidationResults {
    /// A passing node located at `context`
    pub fn new(keyword: Option<&str>, context: &ValidationContext<'_>) -> Self {
        Self {
            keyword: keyword.map(str::to_string),
            is_valid: true,
            relative_location: context.relative_location().clone(),
            absolute_location: context.absolute_location(),
            instance_location: context.instance_location().clone(),
            error_message: None,
            message_key: None,
            nested_results: Vec::new(),
            additional_info: Map::new(),
        }
    }

    /// Mark the node as failing with the template key `message_key`
    pub fn invalid(mut self, message_key: impl Into<String>) -> Self {
        self.is_valid = false;
        self.message_key = Some(message_key.into());
        self
    }

    /// Add a template parameter
    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.additional_info.insert(key.to_string(), value.into());
        self
    }

    pub fn with_nested(mut self, nested: Vec<ValidationResults>) -> Self {
        self.nested_results = nested;
        self
    }

    /// Set a literal message; templating leaves it untouched
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Failing nodes without failing children, depth first
    pub fn failing_leaves(&self) -> Vec<&ValidationResults> {
        let mut leaves = Vec::new();
        collect_failing_leaves(self, &mut leaves);
        leaves
    }

    /// Render in the standard output shape
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("valid".into(), Value::Bool(self.is_valid));
        map.insert("keywordLocation".into(), Value::String(self.relative_location.to_string()));
        if let Some(absolute) = &self.absolute_location {
            map.insert("absoluteKeywordLocation".into(), Value::String(absolute.to_string()));
        }
        map.insert("instanceLocation".into(), Value::String(self.instance_location.to_string()));
        if let Some(message) = &self.error_message {
            map.insert("error".into(), Value::String(message.clone()));
        }
        if !self.nested_results.is_empty() {
            let errors = self.nested_results.iter().map(ValidationResults::to_json).collect();
            map.insert("errors".into(), Value::Array(errors));
        }
        if !self.additional_info.is_empty() {
            map.insert("additionalInfo".into(), Value::Object(self.additional_info.clone()));
        }
        Value::Object(map)
    }
}

fn collect_failing_leaves<'r>(node: &'r ValidationResults, leaves: &mut Vec<&'r ValidationResults>) {
    if node.is_valid {
        return;
    }
    let failing_children: Vec<&ValidationResults> = node.nested_results.iter().filter(|child| !child.is_valid).collect();
    if failing_children.is_empty() {
        leaves.push(node);
    } else {
        for child in failing_children {
            collect_failing_leaves(child, leaves);
        }
    }
}

impl Serialize for ValidationResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.is_valid)?;
        map.serialize_entry("keywordLocation", &self.relative_location)?;
        if let Some(absolute) = &self.absolute_location {
            map.serialize_entry("absoluteKeywordLocation", absolute.as_str())?;
        }
        map.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(message) = &self.error_message {
            map.serialize_entry("error", message)?;
        }
        if !self.nested_results.is_empty() {
            map.serialize_entry("errors", &self.nested_results)?;
        }
        if !self.additional_info.is_empty() {
            map.serialize_entry("additionalInfo", &self.additional_info)?;
        }
        map.end()
    }
}
