//! Application of automatic fixes.
//!
//! A file's fixes are collected into one batch of [`FixEdit`]s, validated
//! together and applied in a single pass from the highest offset down. A
//! batch is applied entirely or not at all.

use crate::types::Violation;
use cxxlint_syntax::{extract, tokenize, EntityKind};
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

/// A single text edit: replace `range` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixEdit {
    /// Byte range to replace. An empty range is an insertion.
    pub range: Range<usize>,
    /// Replacement text.
    pub replacement: String,
}

impl FixEdit {
    /// Creates a new edit.
    #[must_use]
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }
}

/// Reasons a fix batch is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    /// Two edits touch the same text.
    #[error("edits at {first:?} and {second:?} overlap")]
    Overlap {
        /// Earlier edit range.
        first: Range<usize>,
        /// Later edit range.
        second: Range<usize>,
    },

    /// An edit lies outside the file.
    #[error("edit {range:?} is outside the file ({len} bytes)")]
    OutOfBounds {
        /// Offending range.
        range: Range<usize>,
        /// File length.
        len: usize,
    },

    /// An edit boundary splits a UTF-8 character.
    #[error("edit boundary {offset} is not on a character boundary")]
    CharBoundary {
        /// Offending offset.
        offset: usize,
    },

    /// The fixed text no longer declares the same kinds of entities.
    #[error("fixed text changes the declaration structure ({before} entities before, {after} after)")]
    Reparse {
        /// Entity count before the fix.
        before: usize,
        /// Entity count after the fix.
        after: usize,
    },
}

/// Collects the edits of every automatically fixable violation.
///
/// Identical edits coming from different violations are kept once.
#[must_use]
pub fn collect_edits<'v>(violations: impl IntoIterator<Item = &'v Violation>) -> Vec<FixEdit> {
    let mut edits: Vec<FixEdit> = violations
        .into_iter()
        .filter(|v| v.is_fixable() && !v.is_engine_note())
        .filter_map(|v| v.suggestion.as_ref())
        .flat_map(|s| s.replacements.iter())
        .map(|r| FixEdit::new(r.location.offset..r.location.end(), r.new_text.clone()))
        .collect();
    edits.sort_by(|a, b| {
        (a.range.start, a.range.end, &a.replacement).cmp(&(b.range.start, b.range.end, &b.replacement))
    });
    edits.dedup();
    edits
}

/// Checks that a batch fits `source` and that no two edits overlap.
///
/// Two insertions at the same offset count as overlapping since their
/// relative order would be arbitrary.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate(source: &str, edits: &[FixEdit]) -> Result<(), FixError> {
    for edit in edits {
        if edit.range.start > edit.range.end || edit.range.end > source.len() {
            return Err(FixError::OutOfBounds {
                range: edit.range.clone(),
                len: source.len(),
            });
        }
        for offset in [edit.range.start, edit.range.end] {
            if !source.is_char_boundary(offset) {
                return Err(FixError::CharBoundary { offset });
            }
        }
    }

    let mut sorted: Vec<&FixEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.range.start, e.range.end));
    for pair in sorted.windows(2) {
        let (a, b) = (&pair[0].range, &pair[1].range);
        let both_insert_here = a.is_empty() && b.is_empty() && a.start == b.start;
        if b.start < a.end || both_insert_here {
            return Err(FixError::Overlap {
                first: a.clone(),
                second: b.clone(),
            });
        }
    }
    Ok(())
}

/// Applies a validated batch, highest offset first.
///
/// # Errors
///
/// Returns an error if the batch does not pass [`validate`].
pub fn apply_edits(source: &str, edits: &[FixEdit]) -> Result<String, FixError> {
    validate(source, edits)?;
    let mut ordered: Vec<&FixEdit> = edits.iter().collect();
    ordered.sort_by(|a, b| {
        b.range
            .start
            .cmp(&a.range.start)
            .then(b.range.end.cmp(&a.range.end))
    });
    let mut out = source.to_string();
    for edit in ordered {
        out.replace_range(edit.range.clone(), &edit.replacement);
    }
    Ok(out)
}

fn entity_kinds(source: &str) -> Vec<EntityKind> {
    let tokens: Vec<_> = tokenize(source).collect();
    extract(&tokens).entities().iter().map(|e| e.kind).collect()
}

/// Applies the fixable violations of one file to its source.
///
/// The result is re-extracted and must declare the same sequence of entity
/// kinds as the original.
///
/// # Errors
///
/// Returns an error if the batch is invalid or the re-extraction differs.
pub fn fix_source<'v>(
    source: &str,
    violations: impl IntoIterator<Item = &'v Violation>,
) -> Result<Option<String>, FixError> {
    let edits = collect_edits(violations);
    if edits.is_empty() {
        return Ok(None);
    }
    let fixed = apply_edits(source, &edits)?;
    let before = entity_kinds(source);
    let after = entity_kinds(&fixed);
    if before != after {
        return Err(FixError::Reparse {
            before: before.len(),
            after: after.len(),
        });
    }
    debug!("Applied {} edit(s)", edits.len());
    Ok(Some(fixed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Replacement, Severity, Suggestion};
    use std::path::PathBuf;

    fn fixable(offset: usize, length: usize, text: &str) -> Violation {
        let loc = Location::new(PathBuf::from("a.cpp"), 1, offset + 1).with_span(offset, length);
        Violation::new("CX004", "unscoped-enum", Severity::Warning, loc.clone(), "m")
            .with_suggestion(Suggestion::with_fix("fix", Replacement::new(loc, text)))
    }

    #[test]
    fn test_apply_descending() {
        let src = "enum Color { Red };";
        let edits = vec![FixEdit::new(4..4, " class"), FixEdit::new(5..10, "Colour")];
        assert_eq!(
            apply_edits(src, &edits).as_deref(),
            Ok("enum class Colour { Red };")
        );
    }

    #[test]
    fn test_overlap_rejected() {
        let edits = vec![FixEdit::new(0..4, "a"), FixEdit::new(2..6, "b")];
        assert!(matches!(
            apply_edits("0123456789", &edits),
            Err(FixError::Overlap { .. })
        ));
    }

    #[test]
    fn test_same_offset_insertions_rejected() {
        let edits = vec![FixEdit::new(3..3, "a"), FixEdit::new(3..3, "b")];
        assert!(validate("0123456789", &edits).is_err());
    }

    #[test]
    fn test_adjacent_edits_allowed() {
        let edits = vec![FixEdit::new(0..2, "x"), FixEdit::new(2..4, "y")];
        assert_eq!(apply_edits("abcd", &edits).as_deref(), Ok("xy"));
    }

    #[test]
    fn test_bounds_and_char_boundaries() {
        assert!(matches!(
            validate("abc", &[FixEdit::new(2..9, "")]),
            Err(FixError::OutOfBounds { .. })
        ));
        assert!(matches!(
            validate("é", &[FixEdit::new(1..1, "x")]),
            Err(FixError::CharBoundary { offset: 1 })
        ));
    }

    #[test]
    fn test_collect_skips_advisory_and_duplicates() {
        let advisory = {
            let mut v = fixable(0, 1, "x");
            v.suggestion = v.suggestion.map(Suggestion::advisory);
            v
        };
        let edits = collect_edits(&[fixable(4, 0, " class"), fixable(4, 0, " class"), advisory]);
        assert_eq!(edits, vec![FixEdit::new(4..4, " class")]);
    }

    #[test]
    fn test_fix_source_enum() {
        let src = "enum Color { Red, Green };\n";
        let fixed = fix_source(src, &[fixable(4, 0, " class")]).expect("fix applies");
        assert_eq!(fixed.as_deref(), Some("enum class Color { Red, Green };\n"));
    }

    #[test]
    fn test_fix_source_without_edits() {
        assert_eq!(fix_source("int x;", std::iter::empty()), Ok(None));
    }

    #[test]
    fn test_reparse_mismatch_rejected() {
        // Turning a variable into a function declaration changes the entity kinds.
        let src = "int value;\n";
        let err = fix_source(src, &[fixable(9, 0, "()")]).expect_err("structure changes");
        assert!(matches!(err, FixError::Reparse { .. }));
    }
}
