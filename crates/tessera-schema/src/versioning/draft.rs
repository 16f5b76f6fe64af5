//! JSON Schema draft identification
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;
use thiserror::Error;

/// A published JSON Schema draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Draft {
    #[serde(rename = "draft-04")]
    Draft04,
    #[serde(rename = "draft-06")]
    Draft06,
    #[serde(rename = "draft-07")]
    Draft07,
    #[serde(rename = "2019-09")]
    Draft2019_09,
}

impl Draft {
    /// Every supported draft, oldest first
    pub const ALL: [Draft; 4] = [
        Draft::Draft04,
        Draft::Draft06,
        Draft::Draft07,
        Draft::Draft2019_09,
    ];

    /// The newest supported draft
    pub const LATEST: Draft = Draft::Draft2019_09;

    /// Canonical `$schema` URI of the draft's meta-schema
    pub fn meta_schema_uri(self) -> &'static str {
        match self {
            Draft::Draft04 => "http://json-schema.org/draft-04/schema#",
            Draft::Draft06 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft07 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
        }
    }

    /// Recognize a draft from a `$schema` value
    ///
    /// Scheme and a trailing empty fragment are ignored.
    pub fn from_meta_schema_uri(uri: &str) -> Option<Self> {
        let trimmed = uri.trim_end_matches('#');
        let trimmed = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        Self::ALL.into_iter().find(|draft| {
            let canonical = draft.meta_schema_uri().trim_end_matches('#');
            let canonical = canonical
                .strip_prefix("https://")
                .or_else(|| canonical.strip_prefix("http://"))
                .unwrap_or(canonical);
            canonical == trimmed
        })
    }

    /// Drafts that gate keywords through `$vocabulary`
    pub fn uses_vocabularies(self) -> bool {
        self >= Draft::Draft2019_09
    }

    /// Before 2019-09 a `$ref` makes its sibling keywords inert
    pub fn ref_overrides_siblings(self) -> bool {
        self < Draft::Draft2019_09
    }

    /// Drafts that treat a number with a zero fractional part as an integer
    pub fn integers_by_value(self) -> bool {
        self >= Draft::Draft06
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Draft::Draft04 => "draft-04",
            Draft::Draft06 => "draft-06",
            Draft::Draft07 => "draft-07",
            Draft::Draft2019_09 => "2019-09",
        };
        f.write_str(name)
    }
}

/// Error for draft names that cannot be recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown JSON Schema draft '{0}'. Expected one of: draft-04, draft-06, draft-07, 2019-09")]
pub struct UnknownDraft(pub String);

impl FromStr for Draft {
    type Err = UnknownDraft;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "4" | "04" | "draft4" | "draft04" => Ok(Draft::Draft04),
            "6" | "06" | "draft6" | "draft06" => Ok(Draft::Draft06),
            "7" | "07" | "draft7" | "draft07" => Ok(Draft::Draft07),
            "201909" | "draft201909" => Ok(Draft::Draft2019_09),
            _ => Draft::from_meta_schema_uri(s).ok_or_else(|| UnknownDraft(s.to_string())),
        }
    }
}

/// A set of drafts a keyword or schema is defined in
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DraftSet(u8);

impl DraftSet {
    pub const EMPTY: DraftSet = DraftSet(0);
    pub const ALL: DraftSet = DraftSet(0b1111);

    /// Exactly one draft
    pub const fn only(draft: Draft) -> Self {
        DraftSet(draft.bit())
    }

    /// The given draft and every later one
    pub const fn since(draft: Draft) -> Self {
        DraftSet(!(draft.bit() - 1) & Self::ALL.0)
    }

    /// The given draft and every earlier one
    pub const fn up_to(draft: Draft) -> Self {
        DraftSet(((draft.bit() << 1) - 1) & Self::ALL.0)
    }

    pub fn contains(self, draft: Draft) -> bool {
        self.0 & draft.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Newest draft in the set
    pub fn latest(self) -> Option<Draft> {
        self.iter().last()
    }

    pub fn iter(self) -> impl Iterator<Item = Draft> {
        Draft::ALL.into_iter().filter(move |draft| self.contains(*draft))
    }
}

impl From<Draft> for DraftSet {
    fn from(draft: Draft) -> Self {
        DraftSet::only(draft)
    }
}

impl BitOr for DraftSet {
    type Output = DraftSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        DraftSet(self.0 | rhs.0)
    }
}

impl BitAnd for DraftSet {
    type Output = DraftSet;

    fn bitand(self, rhs: Self) -> Self::Output {
        DraftSet(self.0 & rhs.0)
    }
}

impl fmt::Debug for DraftSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
