//! JSON Pointer (RFC 6901) values used for schema and instance locations
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use percent_encoding::percent_decode_str;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a pointer string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// Non-empty pointers must start with `/`
    #[error("JSON pointer '{0}' must be empty or start with '/'")]
    MissingLeadingSlash(String),

    /// `~` must be followed by `0` or `1`
    #[error("JSON pointer '{0}' contains an invalid escape sequence")]
    InvalidEscape(String),
}

/// A parsed JSON Pointer
///
/// Segments are stored unescaped. The empty pointer addresses the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The pointer to the document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a pointer in its string form (`""`, `"/a/b"`)
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingLeadingSlash(pointer.to_string()))?;

        let segments = rest
            .split('/')
            .map(|raw| unescape(raw).ok_or_else(|| PointerError::InvalidEscape(pointer.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Parse the fragment part of a URI (without the `#`), percent-decoding it first
    pub fn from_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode_str(fragment).decode_utf8_lossy();
        Self::parse(&decoded)
    }

    /// Build a pointer from already unescaped segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment in place
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Remove the last segment
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Clone and append a single segment
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut pointer = self.clone();
        pointer.push(segment);
        pointer
    }

    /// Clone and append several segments
    pub fn join_all<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pointer = self.clone();
        for segment in segments {
            pointer.push(segment);
        }
        pointer
    }

    /// Check whether `other` starts with every segment of this pointer
    pub fn is_prefix_of(&self, other: &JsonPointer) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Evaluate the pointer against a JSON document
    pub fn evaluate<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments.iter().try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => parse_index(segment).and_then(|index| items.get(index)),
            _ => None,
        })
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Array indices must be plain decimal without leading zeros
fn parse_index(segment: &str) -> Option<usize> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn escape(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display() {
        let pointer = JsonPointer::parse("/definitions/a~1b/m~0n").unwrap();
        assert_eq!(pointer.segments(), &["definitions", "a/b", "m~n"]);
        assert_eq!(pointer.to_string(), "/definitions/a~1b/m~0n");
        assert!(JsonPointer::parse("").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            JsonPointer::parse("definitions"),
            Err(PointerError::MissingLeadingSlash(_))
        ));
        assert!(matches!(JsonPointer::parse("/a~2"), Err(PointerError::InvalidEscape(_))));
    }

    #[test]
    fn test_fragment_is_percent_decoded() {
        let pointer = JsonPointer::from_fragment("/definitions/with%20space").unwrap();
        assert_eq!(pointer.segments(), &["definitions", "with space"]);

        let malformed = JsonPointer::from_fragment("/100%/%zz").unwrap();
        assert_eq!(malformed.segments(), &["100%", "%zz"]);
    }

    #[test]
    fn test_evaluate() {
        let doc = json!({"a": [10, {"b": true}]});
        assert_eq!(JsonPointer::parse("/a/1/b").unwrap().evaluate(&doc), Some(&json!(true)));
        assert_eq!(JsonPointer::parse("/a/01").unwrap().evaluate(&doc), None);
        assert_eq!(JsonPointer::parse("/missing").unwrap().evaluate(&doc), None);
        assert_eq!(JsonPointer::root().evaluate(&doc), Some(&doc));
    }

    #[test]
    fn test_join_does_not_mutate_parent() {
        let parent = JsonPointer::root().join("properties");
        let child = parent.join("name");
        assert_eq!(parent.to_string(), "/properties");
        assert_eq!(child.to_string(), "/properties/name");
        assert!(parent.is_prefix_of(&child));
    }
}
