//! Error types for schema construction, registration and engine misuse
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license
//!
//! Validation failures of an instance are never errors: they are reported as
//! [`ValidationResults`](crate::ValidationResults). The types here cover
//! schema documents that cannot be built and calls that break the engine's
//! usage contract.

use crate::pointer::PointerError;
use thiserror::Error;

/// Result type for schema construction and registration
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while turning a JSON document into a schema
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema node that is neither an object nor a boolean
    #[error("Schema at '{location}' must be an object or a boolean, found {found}")]
    InvalidSchemaType {
        location: String,
        found: &'static str,
    },

    /// A recognized keyword whose value no variant accepts
    #[error("Invalid value for keyword '{keyword}' at '{location}': {reason}")]
    InvalidKeyword {
        keyword: String,
        location: String,
        reason: String,
    },

    /// `$id`, `$schema` or a base URI that does not parse
    #[error("Invalid URI '{uri}' at '{location}': {source}")]
    InvalidUri {
        uri: String,
        location: String,
        source: url::ParseError,
    },

    /// `pattern` or `patternProperties` with a regex that does not compile
    #[error("Invalid regular expression '{pattern}' at '{location}': {source}")]
    InvalidPattern {
        pattern: String,
        location: String,
        source: regex::Error,
    },

    /// A JSON pointer that does not parse
    #[error("Invalid JSON pointer: {0}")]
    InvalidPointer(#[from] PointerError),

    /// Two keywords with the same name assembled into one schema
    #[error("Keyword '{keyword}' appears more than once")]
    DuplicateKeyword { keyword: String },

    /// JSON parsing errors for documents handed over as text
    #[error("Failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create an invalid keyword error
    pub fn invalid_keyword(
        keyword: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidKeyword {
            keyword: keyword.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid URI error
    pub fn invalid_uri(uri: impl Into<String>, location: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            location: location.into(),
            source,
        }
    }

    /// Location of the offending node inside the schema document, when known
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::InvalidSchemaType { location, .. }
            | Self::InvalidKeyword { location, .. }
            | Self::InvalidUri { location, .. }
            | Self::InvalidPattern { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Contract violations when calling the validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The schema was never registered, so its base URI is unknown
    #[error("Schema has not been registered; register it with the validator's registry first")]
    Unregistered,

    /// The schema was registered, but with another registry
    #[error("Schema '{uri}' is not known to this validator's registry")]
    ForeignSchema { uri: String },
}

/// Any error raised by the one-shot helpers [`crate::validate`] and [`crate::is_valid`]
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_keyword_message() {
        let error = SchemaError::invalid_keyword("minimum", "/properties/age", "expected a number");
        assert_eq!(
            error.to_string(),
            "Invalid value for keyword 'minimum' at '/properties/age': expected a number"
        );
        assert_eq!(error.location(), Some("/properties/age"));
    }

    #[test]
    fn test_pointer_error_conversion() {
        let error: SchemaError = PointerError::InvalidEscape("/a~2".into()).into();
        assert!(matches!(error, SchemaError::InvalidPointer(_)));
        assert_eq!(error.location(), None);
    }
}
