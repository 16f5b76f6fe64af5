//! Vocabulary identifiers and active vocabulary sets
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// A named group of keywords, identified by URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vocabulary {
    id: Cow<'static, str>,
}

impl Vocabulary {
    pub const CORE: Vocabulary = Vocabulary::from_static("https://json-schema.org/draft/2019-09/vocab/core");
    pub const APPLICATOR: Vocabulary =
        Vocabulary::from_static("https://json-schema.org/draft/2019-09/vocab/applicator");
    pub const VALIDATION: Vocabulary =
        Vocabulary::from_static("https://json-schema.org/draft/2019-09/vocab/validation");
    pub const META_DATA: Vocabulary =
        Vocabulary::from_static("https://json-schema.org/draft/2019-09/vocab/meta-data");
    pub const FORMAT: Vocabulary = Vocabulary::from_static("https://json-schema.org/draft/2019-09/vocab/format");
    pub const CONTENT: Vocabulary = Vocabulary::from_static("https://json-schema.org/draft/2019-09/vocab/content");

    pub const fn from_static(id: &'static str) -> Self {
        Self { id: Cow::Borrowed(id) }
    }

    /// A vocabulary defined outside the standard set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Cow::Owned(id.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The vocabularies published with 2019-09
    pub fn standard() -> [Vocabulary; 6] {
        [
            Self::CORE,
            Self::APPLICATOR,
            Self::VALIDATION,
            Self::META_DATA,
            Self::FORMAT,
            Self::CONTENT,
        ]
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Vocabularies active while evaluating one schema resource
///
/// Core is always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularySet {
    members: BTreeSet<Vocabulary>,
}

impl VocabularySet {
    /// Only the core vocabulary
    pub fn core_only() -> Self {
        Self {
            members: BTreeSet::from([Vocabulary::CORE]),
        }
    }

    /// Every standard vocabulary
    pub fn standard() -> Self {
        Self {
            members: Vocabulary::standard().into_iter().collect(),
        }
    }

    pub fn insert(&mut self, vocabulary: Vocabulary) {
        self.members.insert(vocabulary);
    }

    pub fn contains(&self, vocabulary: &Vocabulary) -> bool {
        self.members.contains(vocabulary)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vocabulary> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for VocabularySet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_is_always_present() {
        let set = VocabularySet::core_only();
        assert!(set.contains(&Vocabulary::CORE));
        assert!(!set.contains(&Vocabulary::VALIDATION));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_custom_vocabulary_equality() {
        let custom = Vocabulary::new("https://json-schema.org/draft/2019-09/vocab/core");
        assert_eq!(custom, Vocabulary::CORE);
        assert_eq!(VocabularySet::standard().len(), 6);
    }
}
