//! Comment-based suppression markers.
//!
//! Supports markers like:
//! ```text
//! // cxxlint: allow-next-line(naming-casing) reason="matches the C API"
//! int HRESULT_Callback();
//!
//! /* cxxlint: allow-begin(CX003, no-owning-raw-pointer) */
//! ...
//! /* cxxlint: allow-end(CX003, no-owning-raw-pointer) */
//! ```
//!
//! Rules are named by name or code; an omitted list or `all` matches every
//! rule. Engine notes are never suppressed.

use crate::context::FileContext;
use crate::note::EngineNote;
use crate::types::{Severity, Violation};
use cxxlint_syntax::Token;
use std::collections::BTreeSet;

const MARKER_PREFIX: &str = "cxxlint:";

/// Kind of suppression marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `allow-line`: the line the marker starts on.
    Line,
    /// `allow-next-line`: the line after the marker ends.
    NextLine,
    /// `allow-begin`: opens a region.
    Begin,
    /// `allow-end`: closes the region opened with the same rule list.
    End,
}

impl MarkerKind {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "allow-line" => Some(Self::Line),
            "allow-next-line" => Some(Self::NextLine),
            "allow-begin" => Some(Self::Begin),
            "allow-end" => Some(Self::End),
            _ => None,
        }
    }
}

/// Which rules a marker applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleFilter {
    /// Every rule.
    All,
    /// Rules listed by name or code, lower-cased.
    Only(BTreeSet<String>),
}

impl RuleFilter {
    fn from_list(list: Option<&str>) -> Self {
        let Some(list) = list else {
            return Self::All;
        };
        let rules: BTreeSet<String> = list
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if rules.is_empty() || rules.contains("all") {
            Self::All
        } else {
            Self::Only(rules)
        }
    }

    /// Returns true if the filter covers the rule.
    #[must_use]
    pub fn matches(&self, rule: &str, code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(rules) => {
                rules.contains(&rule.to_ascii_lowercase())
                    || rules.contains(&code.to_ascii_lowercase())
            }
        }
    }
}

/// A parsed suppression marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Marker kind.
    pub kind: MarkerKind,
    /// Rules it applies to.
    pub filter: RuleFilter,
    /// Optional reason for the suppression.
    pub reason: Option<String>,
}

/// Outcome of parsing a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parsed {
    Marker(Marker),
    Malformed(String),
}

/// Parses a marker from the text of a `//` or `/* */` comment.
fn parse_marker(comment: &str) -> Option<Parsed> {
    let body = if let Some(rest) = comment.strip_prefix("//") {
        rest.trim_start_matches('/')
    } else {
        let rest = comment.strip_prefix("/*")?;
        rest.strip_suffix("*/").unwrap_or(rest).trim_start_matches('*')
    };

    let directive = body.trim().strip_prefix(MARKER_PREFIX)?.trim();

    let word_end = directive
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(directive.len());
    let word = &directive[..word_end];
    let Some(kind) = MarkerKind::parse(word) else {
        return Some(Parsed::Malformed(format!(
            "unknown suppression marker `{word}`"
        )));
    };

    let mut rest = directive[word_end..].trim_start();
    let mut list = None;
    if let Some(after) = rest.strip_prefix('(') {
        let Some(close) = after.find(')') else {
            return Some(Parsed::Malformed(format!(
                "unclosed rule list in `{word}` marker"
            )));
        };
        list = Some(&after[..close]);
        rest = after[close + 1..].trim_start();
    }

    let reason = rest.strip_prefix("reason=").and_then(|r| {
        let r = r.trim_start().strip_prefix('"')?;
        r.find('"').map(|end| r[..end].to_string())
    });

    Some(Parsed::Marker(Marker {
        kind,
        filter: RuleFilter::from_list(list),
        reason,
    }))
}

#[derive(Debug, Clone)]
struct Region {
    filter: RuleFilter,
    start: usize,
    end: usize,
}

/// Per-file map of suppressed lines and regions.
#[derive(Debug, Clone, Default)]
pub struct SuppressionMap {
    lines: Vec<(usize, RuleFilter)>,
    regions: Vec<Region>,
}

impl SuppressionMap {
    /// Builds the map from the comments of a file.
    ///
    /// Returns the map and `suppression-marker` notes for malformed markers,
    /// unmatched ends and unterminated regions.
    #[must_use]
    pub fn build(ctx: &FileContext) -> (Self, Vec<Violation>) {
        let mut map = Self::default();
        let mut notes = Vec::new();
        let mut open: Vec<(RuleFilter, usize, &Token)> = Vec::new();

        for token in ctx.tokens.iter().filter(|t| t.kind.is_comment()) {
            let marker = match parse_marker(&token.text) {
                None => continue,
                Some(Parsed::Malformed(message)) => {
                    notes.push(note(ctx, token, message));
                    continue;
                }
                Some(Parsed::Marker(marker)) => marker,
            };
            let start_line = token.span.start_pos.line;
            match marker.kind {
                MarkerKind::Line => map.lines.push((start_line, marker.filter)),
                MarkerKind::NextLine => {
                    map.lines.push((token.span.end_pos.line + 1, marker.filter));
                }
                MarkerKind::Begin => {
                    if !open.iter().any(|(f, _, _)| *f == marker.filter) {
                        open.push((marker.filter, start_line, token));
                    }
                }
                MarkerKind::End => {
                    match open.iter().position(|(f, _, _)| *f == marker.filter) {
                        Some(i) => {
                            let (filter, start, _) = open.remove(i);
                            map.regions.push(Region {
                                filter,
                                start,
                                end: token.span.end_pos.line,
                            });
                        }
                        None => notes.push(note(
                            ctx,
                            token,
                            "`allow-end` has no matching `allow-begin`",
                        )),
                    }
                }
            }
        }

        for (filter, start, token) in open {
            notes.push(note(
                ctx,
                token,
                "`allow-begin` is never closed; suppressing to end of file",
            ));
            map.regions.push(Region {
                filter,
                start,
                end: usize::MAX,
            });
        }

        (map, notes)
    }

    /// Returns true if a violation of `rule`/`code` at `line` is suppressed.
    #[must_use]
    pub fn is_suppressed(&self, line: usize, rule: &str, code: &str) -> bool {
        self.lines
            .iter()
            .any(|(l, f)| *l == line && f.matches(rule, code))
            || self
                .regions
                .iter()
                .any(|r| r.start <= line && line <= r.end && r.filter.matches(rule, code))
    }

    /// Removes suppressed violations, returning how many were removed.
    pub fn apply(&self, violations: &mut Vec<Violation>) -> usize {
        let before = violations.len();
        violations.retain(|v| {
            v.is_engine_note() || !self.is_suppressed(v.location.line, &v.rule, &v.code)
        });
        before - violations.len()
    }

    /// Returns true if no markers were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.regions.is_empty()
    }
}

fn note(ctx: &FileContext, token: &Token, message: impl Into<String>) -> Violation {
    EngineNote::SuppressionMarker.violation(Severity::Info, ctx.location(&token.span), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;
    use cxxlint_syntax::{extract, tokenize};
    use std::path::{Path, PathBuf};

    fn build(src: &str) -> (SuppressionMap, Vec<Violation>) {
        let tokens: Vec<Token> = tokenize(src).collect();
        let model = extract(&tokens);
        let ctx = FileContext::new(Path::new("a.cpp"), src, &tokens, &model, Path::new(""));
        SuppressionMap::build(&ctx)
    }

    fn marker(text: &str) -> Marker {
        match parse_marker(text) {
            Some(Parsed::Marker(m)) => m,
            other => panic!("expected marker, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_marker() {
        let m = marker("// cxxlint: allow-next-line(naming-casing)");
        assert_eq!(m.kind, MarkerKind::NextLine);
        assert!(m.filter.matches("naming-casing", "CX001"));
        assert!(!m.filter.matches("unscoped-enum", "CX004"));
        assert_eq!(m.reason, None);
    }

    #[test]
    fn test_parse_marker_with_reason() {
        let m = marker("/* cxxlint: allow-line(CX003) reason=\"legacy C API\" */");
        assert_eq!(m.kind, MarkerKind::Line);
        assert!(m.filter.matches("no-c-style-cast", "CX003"));
        assert_eq!(m.reason.as_deref(), Some("legacy C API"));
    }

    #[test]
    fn test_parse_marker_all_rules() {
        assert_eq!(marker("// cxxlint: allow-begin").filter, RuleFilter::All);
        assert_eq!(marker("// cxxlint: allow-begin(all)").filter, RuleFilter::All);
        assert_eq!(marker("/// cxxlint: allow-end ()").filter, RuleFilter::All);
    }

    #[test]
    fn test_ordinary_comments_are_ignored() {
        assert_eq!(parse_marker("// just a comment"), None);
        assert_eq!(parse_marker("// see cxxlint: allow-line"), None);
    }

    #[test]
    fn test_unknown_marker_is_malformed() {
        assert!(matches!(
            parse_marker("// cxxlint: allow(naming-casing)"),
            Some(Parsed::Malformed(_))
        ));
    }

    #[test]
    fn test_next_line_names_rule() {
        let (map, notes) = build("// cxxlint: allow-next-line(naming-casing)\nint MAX_count = 5;\n");
        assert!(notes.is_empty());
        assert!(map.is_suppressed(2, "naming-casing", "CX001"));
        assert!(!map.is_suppressed(2, "no-c-style-cast", "CX003"));
        assert!(!map.is_suppressed(3, "naming-casing", "CX001"));
    }

    #[test]
    fn test_same_line_marker() {
        let (map, _) = build("int *p = (int *)q; // cxxlint: allow-line\n");
        assert!(map.is_suppressed(1, "no-c-style-cast", "CX003"));
        assert!(!map.is_suppressed(2, "no-c-style-cast", "CX003"));
    }

    #[test]
    fn test_next_line_after_block_comment_end() {
        let (map, _) = build("/* cxxlint: allow-next-line\n   spans lines */\nint Bad;\n");
        assert!(map.is_suppressed(3, "naming-casing", "CX001"));
        assert!(!map.is_suppressed(2, "naming-casing", "CX001"));
    }

    #[test]
    fn test_region() {
        let src = "int a;\n// cxxlint: allow-begin(CX001)\nint B;\n// cxxlint: allow-begin(CX001)\n// cxxlint: allow-end(CX001)\nint C;\n";
        let (map, notes) = build(src);
        assert!(notes.is_empty());
        assert!(!map.is_suppressed(1, "naming-casing", "CX001"));
        assert!(map.is_suppressed(3, "naming-casing", "CX001"));
        assert!(!map.is_suppressed(6, "naming-casing", "CX001"));
    }

    #[test]
    fn test_unterminated_region_extends_to_eof() {
        let (map, notes) = build("// cxxlint: allow-begin\nint A;\n\n\nint B;\n");
        assert!(map.is_suppressed(5, "naming-casing", "CX001"));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, "CX901");
        assert_eq!(notes[0].severity, Severity::Info);
    }

    #[test]
    fn test_unmatched_end_is_noted() {
        let (map, notes) = build("int a;\n// cxxlint: allow-end(naming-casing)\n");
        assert!(map.is_empty());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].location.line, 2);
    }

    #[test]
    fn test_markers_inside_strings_are_ignored() {
        let (map, _) = build("const char* s = \"// cxxlint: allow-line\";\n");
        assert!(map.is_empty());
    }

    #[test]
    fn test_apply_keeps_engine_notes() {
        let (map, _) = build("// cxxlint: allow-next-line\nint X;\n");
        let loc = Location::new(PathBuf::from("a.cpp"), 2, 5);
        let mut violations = vec![
            Violation::new("CX001", "naming-casing", Severity::Error, loc.clone(), "bad"),
            EngineNote::RuleError.violation(Severity::Warning, loc, "panicked"),
        ];
        assert_eq!(map.apply(&mut violations), 1);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "CX902");
    }
}
