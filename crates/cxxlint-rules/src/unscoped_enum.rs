//! Rule requiring scoped enumerations.
//!
//! # Rationale
//!
//! Enumerators of a plain `enum` leak into the enclosing scope and convert
//! to `int` implicitly. `enum class` keeps both in check.
//!
//! # Detected Patterns
//!
//! ```cpp
//! enum Color { Red, Green };          // reported
//! enum class Color { Red, Green };    // ok
//! enum { kBufferSize = 64 };          // ok: anonymous enums are constants
//! ```
//!
//! # Fix
//!
//! Inserts `class` after `enum`. The fix is automatic only when every use of
//! an enumerator in the file is already qualified and no other file is in
//! the check set; otherwise it is shown as a suggestion.

use cxxlint_core::{
    Applicability, Category, FileContext, Replacement, Rule, Severity, Suggestion, Violation,
};
use cxxlint_syntax::{Entity, EntityKind};

/// Rule code for unscoped-enum.
pub const CODE: &str = "CX004";

/// Rule name for unscoped-enum.
pub const NAME: &str = "unscoped-enum";

/// Requires `enum class` over plain `enum`.
#[derive(Debug, Clone)]
pub struct UnscopedEnum {
    severity: Severity,
}

impl Default for UnscopedEnum {
    fn default() -> Self {
        Self::new()
    }
}

impl UnscopedEnum {
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

    /// Returns true if some enumerator is named without qualification
    /// outside the enum body.
    fn has_unqualified_use(ctx: &FileContext, entity: &Entity) -> bool {
        let Some(body) = entity.body else {
            return false;
        };
        let body_span = ctx.model.scope(body).span;
        ctx.model.entities_in(body).any(|variant| {
            ctx.identifier_tokens(&variant.name, (0, ctx.content.len()))
                .filter(|&i| !body_span.contains(ctx.tokens[i].span.start))
                .any(|i| !ctx.prev_code_token(i).is_some_and(|(_, t)| t.is_punct("::")))
        })
    }
}

impl Rule for UnscopedEnum {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires scoped enumerations (enum class)"
    }

    fn category(&self) -> Category {
        Category::TypeSafety
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn fixable(&self) -> bool {
        true
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        ctx.model
            .entities()
            .iter()
            .filter(|e| {
                e.kind == EntityKind::Enum && !e.flags.is_scoped_enum && e.flags.is_definition
            })
            .filter_map(|entity| {
                let keyword = &ctx.tokens[entity.keyword?];
                let insert_at = ctx.location_at(keyword.span.end, 0);
                let applicability =
                    if ctx.check_set_size == 1 && !Self::has_unqualified_use(ctx, entity) {
                        Applicability::Automatic
                    } else {
                        Applicability::Advisory
                    };
                Some(
                    Violation::new(
                        CODE,
                        NAME,
                        self.severity,
                        ctx.entity_location(entity),
                        format!("enum `{}` is unscoped", entity.name),
                    )
                    .with_suggestion(Suggestion::with_edits(
                        format!("use `enum class {}`", entity.name),
                        vec![Replacement::new(insert_at, " class")],
                        applicability,
                    )),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_code, check_set};

    fn check(code: &str) -> Vec<Violation> {
        check_code(&UnscopedEnum::new(), code, "src/a.cpp")
    }

    #[test]
    fn test_plain_enum_is_reported() {
        let violations = check("enum Color { Red, Green };\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "enum `Color` is unscoped");
        assert_eq!(violations[0].location.column, 6);
        let suggestion = violations[0].suggestion.as_ref().expect("suggestion");
        assert!(suggestion.is_automatic());
        assert_eq!(suggestion.replacements[0].location.offset, 4);
        assert_eq!(suggestion.replacements[0].location.length, 0);
        assert_eq!(suggestion.replacements[0].new_text, " class");
    }

    #[test]
    fn test_scoped_and_anonymous_enums_are_ok() {
        let code = "enum class Mode { Fast };\nenum struct Level : int { Low };\nenum { kBufferSize = 64 };\n";
        assert!(check(code).is_empty());
    }

    #[test]
    fn test_unqualified_use_makes_fix_advisory() {
        let code = "enum Color { Red, Green };\nColor pick() { return Red; }\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].is_fixable());
    }

    #[test]
    fn test_qualified_use_keeps_fix_automatic() {
        let code = "enum Color { Red, Green };\nColor pick() { return Color::Red; }\n";
        assert!(check(code)[0].is_fixable());
    }

    #[test]
    fn test_multi_file_set_is_advisory() {
        let violations = check_set(&UnscopedEnum::new(), "enum Color { Red };\n", "a.h", 2);
        assert!(!violations[0].is_fixable());
    }
}
