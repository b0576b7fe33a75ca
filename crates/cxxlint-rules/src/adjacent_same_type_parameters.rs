//! Rule detecting runs of adjacent parameters with the same type.
//!
//! # Rationale
//!
//! `void resize(int width, int height)` compiles just as well when called
//! as `resize(h, w)`. Consecutive parameters of one type are easy to swap at
//! the call site; distinct types (or a struct) make the mistake impossible.
//!
//! # Detected Patterns
//!
//! One finding per run of two or more consecutive parameters whose written
//! types are identical, reported at the first parameter of the run.

use cxxlint_core::{Category, FileContext, Label, Rule, Severity, Suggestion, Violation};
use cxxlint_syntax::{Entity, Param};

/// Rule code for adjacent-same-type-parameters.
pub const CODE: &str = "CX006";

/// Rule name for adjacent-same-type-parameters.
pub const NAME: &str = "adjacent-same-type-parameters";

/// Detects easily swapped adjacent parameters.
#[derive(Debug, Clone)]
pub struct AdjacentSameTypeParameters {
    severity: Severity,
}

impl Default for AdjacentSameTypeParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjacentSameTypeParameters {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Info,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn report(&self, ctx: &FileContext, function: &Entity, run: &[Param]) -> Violation {
        let names: Vec<&str> = run
            .iter()
            .map(|p| p.name.as_deref().unwrap_or("_"))
            .collect();
        let mut violation = Violation::new(
            CODE,
            NAME,
            self.severity,
            ctx.location(&run[0].span),
            format!(
                "{} adjacent `{}` parameters of `{}` ({}) are easy to swap",
                run.len(),
                run[0].type_text,
                function.name,
                names.join(", ")
            ),
        )
        .with_suggestion(Suggestion::new(
            "use distinct types or group the values into a struct",
        ));
        for param in &run[1..] {
            violation = violation.with_label(Label::new(ctx.location(&param.span), "same type"));
        }
        violation
    }
}

impl Rule for AdjacentSameTypeParameters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Detects adjacent parameters of the same type"
    }

    fn category(&self) -> Category {
        Category::Interface
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for function in ctx.model.entities().iter().filter(|e| e.kind.is_callable()) {
            let Some(signature) = &function.signature else {
                continue;
            };
            let params = &signature.params;
            let mut start = 0;
            while start < params.len() {
                let ty = &params[start].type_text;
                let len = params[start..]
                    .iter()
                    .take_while(|p| !ty.is_empty() && p.type_text == *ty)
                    .count()
                    .max(1);
                if len >= 2 {
                    violations.push(self.report(ctx, function, &params[start..start + len]));
                }
                start += len;
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check_code;

    fn check(code: &str) -> Vec<Violation> {
        check_code(&AdjacentSameTypeParameters::new(), code, "src/a.cpp")
    }

    #[test]
    fn test_pair_of_ints() {
        let violations = check("void resize(int width, int height);\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Info);
        assert_eq!(
            violations[0].message,
            "2 adjacent `int` parameters of `resize` (width, height) are easy to swap"
        );
        assert_eq!(violations[0].location.column, 13);
        assert_eq!(violations[0].labels.len(), 1);
    }

    #[test]
    fn test_one_finding_per_run() {
        let code = "void draw(int x, int y, int z, const std::string& a, const std::string& b);\n";
        let violations = check(code);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.starts_with("3 adjacent `int`"));
        assert!(violations[1].message.starts_with("2 adjacent `const std::string&`"));
    }

    #[test]
    fn test_distinct_types_are_ok() {
        assert!(check("void put(int key, const char* value, int flags);\n").is_empty());
        assert!(check("void f(int* p, int q);\n").is_empty());
    }

    #[test]
    fn test_unnamed_parameters() {
        let violations = check("void f(double, double);\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("(_, _)"));
    }
}
