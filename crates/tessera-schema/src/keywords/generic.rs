//! Keywords applying to any instance type: `type`, `enum`, `const`
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::{describe, json_equal, Keyword, KeywordRegistry};
use crate::error::SchemaResult;
use crate::schema::SchemaBuilder;
use crate::validation::{ValidationContext, ValidationResults};
use crate::versioning::{Draft, DraftSet, Vocabulary};
use serde_json::Value;
use std::any::Any;
use std::fmt;

pub(crate) fn register(registry: &mut KeywordRegistry) {
    registry
        .register("type", build_type)
        .register("enum", build_enum)
        .register("const", build_const);
}

/// JSON Schema instance types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl InstanceType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "number" => Self::Number,
            "string" => Self::String,
            "integer" => Self::Integer,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::String => "string",
            Self::Integer => "integer",
        }
    }

    /// Most specific type of `value` under `draft`
    pub fn of(value: &Value, draft: Draft) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) if is_integer(value, draft) => Self::Integer,
            Value::Number(_) => Self::Number,
        }
    }

    pub fn matches(self, value: &Value, draft: Draft) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Integer => is_integer(value, draft),
            other => Self::of(value, draft) == other,
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draft04 only counts integer literals; later drafts accept `1.0`
fn is_integer(value: &Value, draft: Draft) -> bool {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => true,
        Value::Number(number) => {
            draft.integers_by_value() && number.as_f64().is_some_and(|float| float.fract() == 0.0)
        }
        _ => false,
    }
}

/// `type`
#[derive(Debug, Clone)]
pub struct TypeKeyword {
    types: Vec<InstanceType>,
    array_form: bool,
}

fn build_type(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let parse = |name: &Value| {
        name.as_str()
            .and_then(InstanceType::parse)
            .ok_or_else(|| builder.invalid("type", format!("{name} is not a valid type name")))
    };
    let (types, array_form) = match value {
        Value::String(_) => (vec![parse(value)?], false),
        Value::Array(names) => (names.iter().map(parse).collect::<SchemaResult<Vec<_>>>()?, true),
        other => {
            return Err(builder.invalid(
                "type",
                format!("expected a string or an array of strings, found {}", describe(other)),
            ))
        }
    };
    Ok(Some(Box::new(TypeKeyword { types, array_form })))
}

impl Keyword for TypeKeyword {
    fn name(&self) -> &str {
        "type"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn sequence(&self) -> i32 {
        0
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let context = context.push_keyword("type");
        let results = ValidationResults::new(Some("type"), &context);
        let draft = context.draft();
        if self.types.iter().any(|kind| kind.matches(context.instance(), draft)) {
            return results;
        }
        let expected: Vec<&str> = self.types.iter().map(|kind| kind.as_str()).collect();
        results
            .invalid("type")
            .with_info("actual", InstanceType::of(context.instance(), draft).as_str())
            .with_info("expected", expected.join(", "))
    }

    fn to_json(&self) -> Value {
        if self.array_form {
            Value::Array(self.types.iter().map(|kind| Value::from(kind.as_str())).collect())
        } else {
            self.types
                .first()
                .map(|kind| Value::from(kind.as_str()))
                .unwrap_or(Value::Null)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `enum`
#[derive(Debug, Clone)]
pub struct EnumKeyword {
    values: Vec<Value>,
}

fn build_enum(value: &Value, builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    let values = value
        .as_array()
        .ok_or_else(|| builder.invalid("enum", format!("expected an array, found {}", describe(value))))?;
    Ok(Some(Box::new(EnumKeyword { values: values.clone() })))
}

impl Keyword for EnumKeyword {
    fn name(&self) -> &str {
        "enum"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::ALL
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let context = context.push_keyword("enum");
        let results = ValidationResults::new(Some("enum"), &context);
        if self.values.iter().any(|candidate| json_equal(candidate, context.instance())) {
            results
        } else {
            results.invalid("enum").with_info("actual", context.instance().clone())
        }
    }

    fn to_json(&self) -> Value {
        Value::Array(self.values.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `const`
#[derive(Debug, Clone)]
pub struct ConstKeyword {
    value: Value,
}

fn build_const(value: &Value, _builder: &SchemaBuilder<'_>) -> SchemaResult<Option<Box<dyn Keyword>>> {
    Ok(Some(Box::new(ConstKeyword { value: value.clone() })))
}

impl Keyword for ConstKeyword {
    fn name(&self) -> &str {
        "const"
    }

    fn supported_drafts(&self) -> DraftSet {
        DraftSet::since(Draft::Draft06)
    }

    fn vocabulary(&self) -> Option<Vocabulary> {
        Some(Vocabulary::VALIDATION)
    }

    fn validate(&self, context: &ValidationContext<'_>) -> ValidationResults {
        let context = context.push_keyword("const");
        let results = ValidationResults::new(Some("const"), &context);
        if json_equal(&self.value, context.instance()) {
            results
        } else {
            results.invalid("const").with_info("expected", self.value.clone())
        }
    }

    fn to_json(&self) -> Value {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
