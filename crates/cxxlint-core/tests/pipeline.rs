//! Integration test: a custom rule through the whole analyzer pipeline.
//!
//! Covers suppression, the fix batch, and the formatter collaborator with
//! files written to a temporary directory.

use cxxlint_core::{
    Analyzer, Category, Config, FileContext, Formatter, FormatterError, LintResult, Replacement,
    Rule, RunStatus, Severity, Suggestion, Violation,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Flags every `goto`; optionally adds a second, overlapping fix.
struct NoGoto {
    overlapping: bool,
}

impl Rule for NoGoto {
    fn name(&self) -> &'static str {
        "no-goto"
    }

    fn code(&self) -> &'static str {
        "CX100"
    }

    fn category(&self) -> Category {
        Category::ErrorHandling
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn fixable(&self) -> bool {
        true
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        let mut found = Vec::new();
        for t in ctx.tokens.iter().filter(|t| t.is_keyword("goto")) {
            let loc = ctx.location(&t.span);
            found.push(
                Violation::new(self.code(), self.name(), Severity::Error, loc.clone(), "`goto`")
                    .with_suggestion(Suggestion::with_fix(
                        "use a loop",
                        Replacement::new(loc, "goto /*loop*/"),
                    )),
            );
            if self.overlapping {
                let inner = ctx.location_at(t.span.start + 1, 2);
                found.push(
                    Violation::new(self.code(), self.name(), Severity::Error, inner.clone(), "`oto`")
                        .with_suggestion(Suggestion::with_fix(
                            "rename",
                            Replacement::new(inner, "xx"),
                        )),
                );
            }
        }
        found
    }
}

/// Formatter that appends a blank line to every file.
struct Padding;

impl Formatter for Padding {
    fn name(&self) -> &str {
        "padding"
    }

    fn format(&self, path: &Path) -> Result<String, FormatterError> {
        let content = fs::read_to_string(path).map_err(|e| FormatterError::Spawn {
            command: "padding".to_string(),
            source: e,
        })?;
        Ok(format!("{content}\n"))
    }
}

const LOOP: &str = "void f() {\nretry:\n    goto retry;\n}\n";

fn project(content: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("loop.cpp"), content).expect("write fixture");
    dir
}

fn analyze(root: &Path, rule: NoGoto, config: Config, fix: bool) -> LintResult {
    Analyzer::builder()
        .root(root)
        .rule(rule)
        .config(config)
        .fix(fix)
        .parallelism(1)
        .build()
        .expect("analyzer")
        .analyze()
        .expect("analysis")
}

fn codes(result: &LintResult) -> Vec<&str> {
    result.violations.iter().map(|v| v.code.as_str()).collect()
}

#[test]
fn custom_rule_reports_and_fails() {
    let dir = project(LOOP);
    let result = analyze(dir.path(), NoGoto { overlapping: false }, Config::default(), false);

    assert_eq!(codes(&result), vec!["CX100"]);
    let v = &result.violations[0];
    assert_eq!((v.location.line, v.location.column), (3, 5));
    assert_eq!(v.location.file, Path::new("loop.cpp"));
    assert_eq!(result.files_checked, 1);
    assert_eq!(result.status(true), RunStatus::Fail);
}

#[test]
fn region_suppression_by_code() {
    let dir = project(
        "void f() {\n// cxxlint: allow-begin(cx100) reason=\"state machine\"\nretry:\n    goto retry;\n// cxxlint: allow-end\n}\n",
    );
    let result = analyze(dir.path(), NoGoto { overlapping: false }, Config::default(), false);

    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.suppressed, 1);
}

#[test]
fn stray_end_marker_is_noted() {
    let dir = project("// cxxlint: allow-end\nint x = 0;\n");
    let result = analyze(dir.path(), NoGoto { overlapping: false }, Config::default(), false);

    assert_eq!(codes(&result), vec!["CX901"]);
    assert_eq!(result.violations[0].severity, Severity::Info);
}

#[test]
fn fix_is_applied_and_removed_from_report() {
    let dir = project(LOOP);
    let result = analyze(dir.path(), NoGoto { overlapping: false }, Config::default(), true);

    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.fixes_applied, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("loop.cpp")).expect("read"),
        "void f() {\nretry:\n    goto /*loop*/ retry;\n}\n"
    );
}

#[test]
fn overlapping_fixes_leave_file_untouched() {
    let dir = project(LOOP);
    let result = analyze(dir.path(), NoGoto { overlapping: true }, Config::default(), true);

    assert_eq!(result.fixes_applied, 0);
    assert_eq!(codes(&result), vec!["CX906", "CX100", "CX100"]);
    assert_eq!(
        fs::read_to_string(dir.path().join("loop.cpp")).expect("read"),
        LOOP
    );
}

#[test]
fn formatter_difference_severity() {
    let dir = project("int x = 0;\n");
    let run = |required: bool| {
        let mut config = Config::default();
        config.formatter.required = required;
        Analyzer::builder()
            .root(dir.path())
            .rule(NoGoto { overlapping: false })
            .formatter(Padding)
            .config(config)
            .build()
            .expect("analyzer")
            .analyze()
            .expect("analysis")
    };

    let advisory = run(false);
    assert_eq!(codes(&advisory), vec!["CX903"]);
    assert_eq!(advisory.violations[0].severity, Severity::Info);
    assert_eq!(advisory.status(true), RunStatus::Pass);

    let required = run(true);
    assert_eq!(required.violations[0].severity, Severity::Error);
    assert_eq!(required.status(true), RunStatus::Fail);
}

#[test]
fn latin1_file_is_checked_but_not_fixed() {
    let bytes = b"// caf\xe9\nvoid f() {\nretry:\n    goto retry;\n}\n";
    let dir = TempDir::new().expect("tempdir");
    let file = dir.path().join("loop.cpp");
    fs::write(&file, bytes).expect("write fixture");

    let result = analyze(dir.path(), NoGoto { overlapping: false }, Config::default(), false);
    assert_eq!(result.files_checked, 1);
    assert_eq!(codes(&result), vec!["CX100"]);
    assert_eq!(result.violations[0].location.line, 4);

    let fixed = analyze(dir.path(), NoGoto { overlapping: false }, Config::default(), true);
    assert_eq!(fixed.fixes_applied, 0);
    assert_eq!(codes(&fixed), vec!["CX906", "CX100"]);
    assert_eq!(fs::read(&file).expect("read"), bytes.to_vec());
}
