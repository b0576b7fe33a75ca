//! Merging of per-file violation lists into one deterministic report.

use crate::types::Violation;
use std::cmp::Ordering;

/// Total order used for reports: file, line, column, rule, then the span
/// and message so that equal positions still sort the same way every run.
#[must_use]
pub fn report_order(a: &Violation, b: &Violation) -> Ordering {
    a.location
        .file
        .cmp(&b.location.file)
        .then(a.location.line.cmp(&b.location.line))
        .then(a.location.column.cmp(&b.location.column))
        .then_with(|| a.rule.cmp(&b.rule))
        .then(a.location.offset.cmp(&b.location.offset))
        .then(a.location.length.cmp(&b.location.length))
        .then_with(|| a.message.cmp(&b.message))
}

fn same_finding(a: &Violation, b: &Violation) -> bool {
    let same = a.location.file == b.location.file
        && a.location.offset == b.location.offset
        && a.location.length == b.location.length
        && a.rule == b.rule;
    // Engine notes without a span share offset zero; keep distinct messages.
    if a.is_engine_note() {
        same && a.message == b.message
    } else {
        same
    }
}

/// Sorts and deduplicates violations.
///
/// Input order does not matter: any permutation of the same violations
/// produces the same output.
#[must_use]
pub fn aggregate(mut violations: Vec<Violation>) -> Vec<Violation> {
    violations.sort_by(report_order);
    violations.dedup_by(|later, earlier| same_finding(earlier, later));
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::EngineNote;
    use crate::types::{Location, Severity};
    use std::path::PathBuf;

    fn v(file: &str, line: usize, col: usize, rule: &str, offset: usize) -> Violation {
        Violation::new(
            "CX000",
            rule,
            Severity::Warning,
            Location::new(PathBuf::from(file), line, col).with_span(offset, 3),
            format!("{rule} at {line}:{col}"),
        )
    }

    #[test]
    fn test_sort_order() {
        let out = aggregate(vec![
            v("b.cpp", 1, 1, "naming-casing", 0),
            v("a.cpp", 2, 1, "naming-casing", 10),
            v("a.cpp", 1, 5, "unscoped-enum", 4),
            v("a.cpp", 1, 5, "naming-casing", 4),
        ]);
        let keys: Vec<_> = out
            .iter()
            .map(|v| (v.location.file.display().to_string(), v.location.line, v.rule.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.cpp".to_string(), 1, "naming-casing".to_string()),
                ("a.cpp".to_string(), 1, "unscoped-enum".to_string()),
                ("a.cpp".to_string(), 2, "naming-casing".to_string()),
                ("b.cpp".to_string(), 1, "naming-casing".to_string()),
            ]
        );
    }

    #[test]
    fn test_dedup_same_span_and_rule() {
        let out = aggregate(vec![
            v("a.cpp", 1, 5, "naming-casing", 4),
            v("a.cpp", 1, 5, "naming-casing", 4),
            v("a.cpp", 1, 5, "no-c-style-cast", 4),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_order_independent() {
        let items = vec![
            v("z.h", 3, 1, "header-guard", 0),
            v("a.cpp", 9, 2, "naming-casing", 80),
            v("a.cpp", 9, 2, "long-parameter-list", 80),
            v("m.cpp", 1, 1, "unscoped-enum", 0),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(aggregate(items), aggregate(reversed));
    }

    #[test]
    fn test_engine_notes_with_distinct_messages_survive() {
        let loc = Location::new(PathBuf::from("cxxlint.toml"), 1, 1);
        let out = aggregate(vec![
            EngineNote::Config.violation(Severity::Warning, loc.clone(), "unknown rule `foo`"),
            EngineNote::Config.violation(Severity::Warning, loc, "unknown rule `bar`"),
        ]);
        assert_eq!(out.len(), 2);
    }
}
