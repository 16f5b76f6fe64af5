//! Draft and vocabulary policy
//!
//! This module decides which keywords take part in an evaluation:
//! - Draft identification from `$schema` values
//! - Draft inference from the keywords a schema uses
//! - Vocabulary sets declared by meta-schemas
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

pub mod draft;
pub mod vocabulary;

pub use draft::{Draft, DraftSet, UnknownDraft};
pub use vocabulary::{Vocabulary, VocabularySet};

/// Pick the draft governing one schema node
///
/// Precedence: the node's own `$schema`, then a draft already in effect for the
/// evaluation, then the newest draft every keyword of the node supports, then
/// the configured default.
pub fn select_draft(
    declared: Option<Draft>,
    inherited: Option<Draft>,
    supported: DraftSet,
    default: Draft,
) -> Draft {
    declared
        .or(inherited)
        .or_else(|| if supported == DraftSet::ALL { None } else { supported.latest() })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_draft_wins() {
        let draft = select_draft(
            Some(Draft::Draft04),
            Some(Draft::Draft07),
            DraftSet::ALL,
            Draft::Draft2019_09,
        );
        assert_eq!(draft, Draft::Draft04);
    }

    #[test]
    fn test_inherited_before_inference() {
        let draft = select_draft(None, Some(Draft::Draft06), DraftSet::only(Draft::Draft04), Draft::LATEST);
        assert_eq!(draft, Draft::Draft06);
    }

    #[test]
    fn test_inference_from_keywords() {
        let draft = select_draft(None, None, DraftSet::up_to(Draft::Draft07), Draft::LATEST);
        assert_eq!(draft, Draft::Draft07);

        let draft = select_draft(None, None, DraftSet::ALL, Draft::Draft06);
        assert_eq!(draft, Draft::Draft06);

        // keywords with no common draft fall back to the default
        let draft = select_draft(None, None, DraftSet::EMPTY, Draft::Draft07);
        assert_eq!(draft, Draft::Draft07);
    }
}
