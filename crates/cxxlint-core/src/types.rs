//! Core types for lint violations and results.

use cxxlint_syntax::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for lint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
    /// Byte offset in file.
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location from a token span.
    #[must_use]
    pub fn from_span(file: PathBuf, span: &Span) -> Self {
        Self {
            file,
            line: span.start_pos.line,
            column: span.start_pos.column,
            offset: span.start,
            length: span.len(),
        }
    }

    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    /// Byte offset one past the end of the span.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// A labeled span for additional context in violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Location of the label.
    pub location: Location,
    /// Message for this label.
    pub message: String,
}

impl Label {
    /// Creates a new label.
    #[must_use]
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// Whether a suggestion's edits may be applied without review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
    /// Safe to apply in fix mode.
    Automatic,
    /// Shown to the user only.
    Advisory,
}

/// A suggested fix for a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
    /// Text edits implementing the fix. May be empty.
    pub replacements: Vec<Replacement>,
    /// Whether the fixer may apply the edits.
    pub applicability: Applicability,
}

impl Suggestion {
    /// Creates a new suggestion without automatic fix.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            replacements: Vec::new(),
            applicability: Applicability::Advisory,
        }
    }

    /// Creates a new suggestion with an automatic fix.
    #[must_use]
    pub fn with_fix(message: impl Into<String>, replacement: Replacement) -> Self {
        Self::with_edits(message, vec![replacement], Applicability::Automatic)
    }

    /// Creates a suggestion carrying several edits.
    #[must_use]
    pub fn with_edits(
        message: impl Into<String>,
        replacements: Vec<Replacement>,
        applicability: Applicability,
    ) -> Self {
        Self {
            message: message.into(),
            replacements,
            applicability,
        }
    }

    /// Returns a copy downgraded to advisory, keeping its edits for display.
    #[must_use]
    pub fn advisory(mut self) -> Self {
        self.applicability = Applicability::Advisory;
        self
    }

    /// Returns true if the fixer may apply this suggestion.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.applicability == Applicability::Automatic && !self.replacements.is_empty()
    }
}

/// A single text edit: replace `location.length` bytes at `location.offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Replacement {
    /// Location to replace. A zero length means insertion.
    pub location: Location,
    /// New text to insert.
    pub new_text: String,
}

impl Replacement {
    /// Creates a new replacement.
    #[must_use]
    pub fn new(location: Location, new_text: impl Into<String>) -> Self {
        Self {
            location,
            new_text: new_text.into(),
        }
    }
}

/// A lint violation found during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "CX001").
    pub code: String,
    /// Rule name (e.g., "naming-casing").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Primary location of the violation.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Optional suggestion for fixing.
    pub suggestion: Option<Suggestion>,
    /// Additional labels for context.
    pub labels: Vec<Label>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            suggestion: None,
            labels: Vec::new(),
        }
    }

    /// Adds a suggestion to this violation.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Adds a label to this violation.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Returns true if the fixer may apply this violation's suggestion.
    #[must_use]
    pub fn is_fixable(&self) -> bool {
        self.suggestion.as_ref().is_some_and(Suggestion::is_automatic)
    }

    /// Returns true for notes produced by the engine rather than a rule.
    #[must_use]
    pub fn is_engine_note(&self) -> bool {
        crate::note::EngineNote::from_code(&self.code).is_some()
    }

    /// Formats the violation for multi-line terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(output, "  = help: {}", suggestion.message);
        }
        for label in &self.labels {
            let _ = writeln!(
                output,
                "  = note: {}:{}: {}",
                label.location.line, label.location.column, label.message
            );
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: [{}] {}: {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.rule,
            self.message
        )
    }
}

/// A violation paired with its source for rich `miette` rendering.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl ViolationDiagnostic {
    /// Builds a diagnostic for `v` over the file text `source`.
    #[must_use]
    pub fn new(v: &Violation, source: &str) -> Self {
        let offset = v.location.offset.min(source.len());
        let length = v.location.length.min(source.len() - offset);
        Self {
            message: format!("[{}] {}: {}", v.code, v.rule, v.message),
            src: NamedSource::new(v.location.file.display().to_string(), source.to_string()),
            help: v.suggestion.as_ref().map(|s| s.message.clone()),
            span: SourceSpan::from((offset, length)),
            label_message: v.severity.to_string(),
        }
    }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// No warnings or errors.
    Pass,
    /// Warnings (or non-failing errors) present.
    PassWithWarnings,
    /// Error-severity violations present and failing on errors.
    Fail,
    /// The run timed out before every file was checked.
    Incomplete,
}

impl RunStatus {
    /// Process exit code for this status.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Pass | Self::PassWithWarnings => 0,
            Self::Fail => 1,
            Self::Incomplete => 2,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::PassWithWarnings => write!(f, "pass with warnings"),
            Self::Fail => write!(f, "fail"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// Result of running lint analysis.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LintResult {
    /// All reported violations, sorted and deduplicated.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Number of violations masked by suppression markers.
    pub suppressed: usize,
    /// Number of violations whose fixes were applied.
    pub fixes_applied: usize,
    /// True if a timeout stopped scheduling before all files were checked.
    pub incomplete: bool,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_violations_at(Severity::Error)
    }

    /// Returns true if there are any warnings or errors.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.has_violations_at(Severity::Warning)
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Counts violations by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.violations
            .iter()
            .fold((0, 0, 0), |(e, w, i), v| match v.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warning => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }

    /// Computes the overall status.
    ///
    /// A failing result wins over an incomplete one.
    #[must_use]
    pub fn status(&self, fail_on_error: bool) -> RunStatus {
        if fail_on_error && self.has_errors() {
            RunStatus::Fail
        } else if self.incomplete {
            RunStatus::Incomplete
        } else if self.has_warnings() {
            RunStatus::PassWithWarnings
        } else {
            RunStatus::Pass
        }
    }

    /// Adds violations and counters from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.files_checked += other.files_checked;
        self.suppressed += other.suppressed;
        self.fixes_applied += other.fixes_applied;
        self.incomplete |= other.incomplete;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "CX001",
            "naming-casing",
            severity,
            Location::new(PathBuf::from("src/main.cpp"), 42, 10),
            "variable `MAX_count` should be lower_snake_case",
        )
    }

    #[test]
    fn violation_display_matches_text_format() {
        let v = make_violation(Severity::Error);
        assert_eq!(
            v.to_string(),
            "src/main.cpp:42:10: [error] naming-casing: variable `MAX_count` should be lower_snake_case"
        );
    }

    #[test]
    fn violation_format_includes_help_and_labels() {
        let v = make_violation(Severity::Warning)
            .with_suggestion(Suggestion::new("rename to `max_count`"))
            .with_label(Label::new(
                Location::new(PathBuf::from("src/main.cpp"), 40, 1),
                "previous declaration",
            ));
        let formatted = v.format();
        assert!(formatted.contains("= help: rename to `max_count`"));
        assert!(formatted.contains("= note: 40:1: previous declaration"));
    }

    #[test]
    fn advisory_suggestions_are_not_fixable() {
        let loc = Location::new(PathBuf::from("a.cpp"), 1, 1).with_span(0, 3);
        let fix = Suggestion::with_fix("rename", Replacement::new(loc, "abc"));
        let v = make_violation(Severity::Error).with_suggestion(fix.clone());
        assert!(v.is_fixable());
        let v = make_violation(Severity::Error).with_suggestion(fix.advisory());
        assert!(!v.is_fixable());
        let v = make_violation(Severity::Error).with_suggestion(Suggestion::new("think"));
        assert!(!v.is_fixable());
    }

    #[test]
    fn status_prefers_fail_over_incomplete() {
        let mut result = LintResult::new();
        result.violations.push(make_violation(Severity::Error));
        result.incomplete = true;
        assert_eq!(result.status(true), RunStatus::Fail);
        assert_eq!(result.status(false), RunStatus::Incomplete);
    }

    #[test]
    fn status_without_fail_on_error_passes_with_warnings() {
        let mut result = LintResult::new();
        assert_eq!(result.status(true), RunStatus::Pass);
        result.violations.push(make_violation(Severity::Info));
        assert_eq!(result.status(true), RunStatus::Pass);
        result.violations.push(make_violation(Severity::Error));
        assert_eq!(result.status(false), RunStatus::PassWithWarnings);
        assert_eq!(result.status(false).exit_code(), 0);
        assert_eq!(result.status(true).exit_code(), 1);
    }

    #[test]
    fn count_by_severity_counts_each_level() {
        let mut result = LintResult::new();
        result.violations.push(make_violation(Severity::Error));
        result.violations.push(make_violation(Severity::Warning));
        result.violations.push(make_violation(Severity::Warning));
        result.violations.push(make_violation(Severity::Info));
        assert_eq!(result.count_by_severity(), (1, 2, 1));
    }

    #[test]
    fn diagnostic_clamps_span_to_source() {
        let v = make_violation(Severity::Error);
        let mut v = v;
        v.location = v.location.with_span(100, 5);
        let diag = ViolationDiagnostic::new(&v, "int x;");
        assert_eq!(diag.span.offset(), 6);
        assert_eq!(diag.span.len(), 0);
    }
}
