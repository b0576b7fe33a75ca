//! Report rendering: text, JSON and miette graphical output.

use crate::types::{Applicability, LintResult, Severity, Violation, ViolationDiagnostic};
use miette::{GraphicalReportHandler, GraphicalTheme};
use serde::Serialize;
use std::path::Path;

/// One suggested edit in a JSON record.
#[derive(Debug, Serialize)]
pub struct EditRecord<'a> {
    /// Byte offset of the replaced range.
    pub offset: usize,
    /// Length of the replaced range in bytes.
    pub length: usize,
    /// Replacement text.
    pub replacement: &'a str,
}

/// A violation as written in JSON output.
#[derive(Debug, Serialize)]
pub struct ViolationRecord<'a> {
    /// File path relative to the project root.
    pub path: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset of the primary span.
    pub offset: usize,
    /// Length of the primary span.
    pub length: usize,
    /// Severity.
    pub severity: Severity,
    /// Rule name.
    pub rule_id: &'a str,
    /// Rule code.
    pub code: &'a str,
    /// Message.
    pub message: &'a str,
    /// Suggestion text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'a str>,
    /// Whether the fixer may apply `edits`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicability: Option<Applicability>,
    /// Suggested edits.
    pub edits: Vec<EditRecord<'a>>,
}

impl<'a> From<&'a Violation> for ViolationRecord<'a> {
    fn from(v: &'a Violation) -> Self {
        let suggestion = v.suggestion.as_ref();
        Self {
            path: v.location.file.display().to_string(),
            line: v.location.line,
            column: v.location.column,
            offset: v.location.offset,
            length: v.location.length,
            severity: v.severity,
            rule_id: &v.rule,
            code: &v.code,
            message: &v.message,
            suggestion: suggestion.map(|s| s.message.as_str()),
            applicability: suggestion.map(|s| s.applicability),
            edits: suggestion
                .map(|s| {
                    s.replacements
                        .iter()
                        .map(|r| EditRecord {
                            offset: r.location.offset,
                            length: r.location.length,
                            replacement: &r.new_text,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Renders one `path:line:col: [severity] rule_id: message` line per violation.
#[must_use]
pub fn render_text(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("{v}\n")).collect()
}

/// Renders a JSON array of violation records.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(violations: &[Violation]) -> serde_json::Result<String> {
    let records: Vec<ViolationRecord<'_>> = violations.iter().map(ViolationRecord::from).collect();
    serde_json::to_string_pretty(&records)
}

/// Renders violations with source snippets.
///
/// `read_source` maps a report path to the file text; violations whose
/// source is unavailable fall back to the multi-line text form.
#[must_use]
pub fn render_pretty(
    violations: &[Violation],
    mut read_source: impl FnMut(&Path) -> Option<String>,
) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut out = String::new();
    for v in violations {
        let rendered = read_source(&v.location.file).and_then(|source| {
            let diagnostic = ViolationDiagnostic::new(v, &source);
            let mut buf = String::new();
            handler.render_report(&mut buf, &diagnostic).ok()?;
            Some(buf)
        });
        match rendered {
            Some(text) => out.push_str(&text),
            None => out.push_str(&v.format()),
        }
        out.push('\n');
    }
    out
}

/// One-line summary of a run.
#[must_use]
pub fn summary(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let mut line = format!(
        "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
        result.files_checked
    );
    if result.suppressed > 0 {
        line.push_str(&format!("; {} suppressed", result.suppressed));
    }
    if result.fixes_applied > 0 {
        line.push_str(&format!("; {} fixed", result.fixes_applied));
    }
    if result.incomplete {
        line.push_str("; incomplete (timed out)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Replacement, Suggestion};
    use std::path::PathBuf;

    fn sample() -> Vec<Violation> {
        let loc = Location::new(PathBuf::from("src/a.cpp"), 1, 5).with_span(4, 9);
        vec![
            Violation::new(
                "CX001",
                "naming-casing",
                Severity::Error,
                loc.clone(),
                "variable `MAX_count` should be lower_snake_case",
            )
            .with_suggestion(Suggestion::with_fix(
                "rename to `max_count`",
                Replacement::new(loc, "max_count"),
            )),
            Violation::new(
                "CX005",
                "long-parameter-list",
                Severity::Warning,
                Location::new(PathBuf::from("src/b.cpp"), 3, 6).with_span(30, 1),
                "function `f` has 5 parameters (threshold 4)",
            ),
        ]
    }

    #[test]
    fn test_render_text() {
        insta::assert_snapshot!(render_text(&sample()), @r"
        src/a.cpp:1:5: [error] naming-casing: variable `MAX_count` should be lower_snake_case
        src/b.cpp:3:6: [warning] long-parameter-list: function `f` has 5 parameters (threshold 4)
        ");
    }

    #[test]
    fn test_render_json_records() {
        let json = render_json(&sample()).expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let first = &value[0];
        assert_eq!(first["path"], "src/a.cpp");
        assert_eq!(first["rule_id"], "naming-casing");
        assert_eq!(first["severity"], "error");
        assert_eq!(first["applicability"], "automatic");
        assert_eq!(first["edits"][0]["offset"], 4);
        assert_eq!(first["edits"][0]["replacement"], "max_count");
        assert!(value[1].get("suggestion").is_none());
        assert_eq!(value[1]["edits"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_render_pretty_falls_back_without_source() {
        let out = render_pretty(&sample(), |_| None);
        assert!(out.contains("CX001 naming-casing at src/a.cpp:1:5"));
    }

    #[test]
    fn test_render_pretty_with_source() {
        let out = render_pretty(&sample()[..1], |_| Some("int MAX_count = 5;\n".to_string()));
        assert!(out.contains("MAX_count"));
        assert!(out.contains("rename to `max_count`"));
    }

    #[test]
    fn test_summary() {
        let mut result = LintResult::new();
        result.violations = sample();
        result.files_checked = 2;
        result.suppressed = 1;
        assert_eq!(
            summary(&result),
            "Found 1 error(s), 1 warning(s), 0 info(s) in 2 file(s); 1 suppressed"
        );
    }
}
