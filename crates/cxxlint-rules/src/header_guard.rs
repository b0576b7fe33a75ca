//! Rule requiring an include guard in header files.
//!
//! # Rationale
//!
//! A header without a guard breaks the build as soon as it is included
//! twice in one translation unit.
//!
//! # Detected Patterns
//!
//! The first preprocessor directive of a header, before any code, must be
//! one of:
//!
//! ```cpp
//! #pragma once
//!
//! #ifndef FOO_H_
//! #define FOO_H_
//!
//! #if !defined(FOO_H_)
//! #define FOO_H_
//! ```
//!
//! Headers containing nothing but comments are ignored.
//!
//! # Fix
//!
//! Inserts `#pragma once` after the leading comment block.

use cxxlint_core::{Category, FileContext, Replacement, Rule, Severity, Suggestion, Violation};
use cxxlint_syntax::{Token, TokenKind};

/// Rule code for header-guard.
pub const CODE: &str = "CX007";

/// Rule name for header-guard.
pub const NAME: &str = "header-guard";

/// Outcome of inspecting a header's opening directives.
#[derive(Debug, PartialEq, Eq)]
enum Guard {
    Present,
    Missing,
    /// `#ifndef X` without the matching `#define X`.
    Unmatched(String),
}

/// Requires `#pragma once` or an include guard in headers.
#[derive(Debug, Clone)]
pub struct HeaderGuard {
    severity: Severity,
}

impl Default for HeaderGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderGuard {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Directive words after `#`, e.g. `["ifndef", "FOO_H"]`.
fn directive_words(token: &Token) -> Vec<&str> {
    token
        .text
        .trim_start_matches('#')
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '!')
        .filter(|w| !w.is_empty())
        .collect()
}

/// Macro name tested by an opening guard directive.
fn guarded_name(words: &[&str], text: &str) -> Option<String> {
    match words {
        ["ifndef", name, ..] => Some((*name).to_string()),
        ["if", "defined", name, ..] if text.contains('!') => Some((*name).to_string()),
        _ => None,
    }
}

fn inspect(tokens: &[Token]) -> Guard {
    let mut directives = tokens.iter().filter(|t| !t.kind.is_comment());
    let Some(first) = directives.next() else {
        return Guard::Present;
    };
    if first.kind != TokenKind::Directive {
        return Guard::Missing;
    }
    let words = directive_words(first);
    if words == ["pragma", "once"] {
        return Guard::Present;
    }
    let Some(name) = guarded_name(&words, &first.text) else {
        return Guard::Missing;
    };
    match directives.next() {
        Some(t) if defines(t, &name) => Guard::Present,
        _ => Guard::Unmatched(name),
    }
}

fn defines(token: &Token, name: &str) -> bool {
    token.kind == TokenKind::Directive
        && matches!(directive_words(token).as_slice(), ["define", defined, ..] if *defined == name)
}

/// Byte offset of the line following the leading comment block.
fn insertion_offset(ctx: &FileContext) -> usize {
    let Some(last_comment) = ctx
        .tokens
        .iter()
        .take_while(|t| t.kind.is_comment())
        .last()
    else {
        return 0;
    };
    let end = last_comment.span.end;
    ctx.content[end..]
        .find('\n')
        .map_or(ctx.content.len(), |i| end + i + 1)
}

impl Rule for HeaderGuard {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires #pragma once or an include guard in headers"
    }

    fn category(&self) -> Category {
        Category::Formatting
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        if !ctx.is_header {
            return Vec::new();
        }
        match inspect(ctx.tokens) {
            Guard::Present => Vec::new(),
            Guard::Missing => {
                let offset = insertion_offset(ctx);
                let text = if offset == ctx.content.len() && !ctx.content.ends_with('\n') {
                    "\n#pragma once\n"
                } else {
                    "#pragma once\n"
                };
                vec![Violation::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.location_at(offset, 0),
                    "header has no include guard or `#pragma once`",
                )
                .with_suggestion(Suggestion::with_fix(
                    "add `#pragma once`",
                    Replacement::new(ctx.location_at(offset, 0), text),
                ))]
            }
            Guard::Unmatched(name) => {
                let first = ctx
                    .tokens
                    .iter()
                    .find(|t| t.kind == TokenKind::Directive)
                    .map_or_else(|| ctx.location_at(0, 0), |t| ctx.location(&t.span));
                vec![Violation::new(
                    CODE,
                    NAME,
                    self.severity,
                    first,
                    format!("include guard `{name}` is not followed by `#define {name}`"),
                )
                .with_suggestion(Suggestion::new(format!(
                    "add `#define {name}` right after the check"
                )))]
            }
        }
    }
}
