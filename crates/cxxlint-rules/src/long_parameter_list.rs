//! Rule detecting functions with too many parameters.
//!
//! # Rationale
//!
//! Long parameter lists are hard to call correctly and usually hide a
//! missing type. Grouping related arguments into a struct names the concept
//! and lets call sites use designated initializers.
//!
//! # Configuration
//!
//! - `threshold`: maximum number of parameters (default: 4). The top-level
//!   `parameter_count_threshold` setting provides the default.

use cxxlint_core::{
    Category, FileContext, Rule, Severity, Suggestion, Violation, DEFAULT_PARAMETER_COUNT_THRESHOLD,
};

/// Rule code for long-parameter-list.
pub const CODE: &str = "CX005";

/// Rule name for long-parameter-list.
pub const NAME: &str = "long-parameter-list";

/// Detects functions declaring more parameters than a threshold.
#[derive(Debug, Clone)]
pub struct LongParameterList {
    threshold: usize,
    severity: Severity,
}

impl Default for LongParameterList {
    fn default() -> Self {
        Self::new()
    }
}

impl LongParameterList {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_PARAMETER_COUNT_THRESHOLD,
            severity: Severity::Warning,
        }
    }

    /// Sets the maximum number of parameters.
    #[must_use]
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for LongParameterList {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Detects functions with too many parameters"
    }

    fn category(&self) -> Category {
        Category::Interface
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        for entity in ctx.model.entities() {
            if !entity.kind.is_callable() {
                continue;
            }
            let Some(signature) = &entity.signature else {
                continue;
            };
            let count = signature.params.len();
            if count <= self.threshold {
                continue;
            }
            violations.push(
                Violation::new(
                    CODE,
                    NAME,
                    self.severity,
                    ctx.entity_location(entity),
                    format!(
                        "{} `{}` has {count} parameters (max {})",
                        entity.kind, entity.name, self.threshold
                    ),
                )
                .with_suggestion(Suggestion::new("group related parameters into a struct")),
            );
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check_code;

    fn check(rule: &LongParameterList, code: &str) -> Vec<Violation> {
        check_code(rule, code, "src/a.cpp")
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let rule = LongParameterList::new();
        assert!(check(&rule, "void f(int a, int b, int c, int d);\n").is_empty());
        let violations = check(&rule, "void f(int a, int b, int c, int d, int e);\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "function `f` has 5 parameters (max 4)");
    }

    #[test]
    fn test_unnamed_parameters_count() {
        let rule = LongParameterList::new().threshold(2);
        assert_eq!(check(&rule, "void f(int, char, double);\n").len(), 1);
    }

    #[test]
    fn test_methods_and_constructors() {
        let code = r"
class Window {
public:
    Window(int x, int y, int w, int h, bool visible);
    void move(int dx, int dy);
};
";
        let violations = check(&LongParameterList::new(), code);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.starts_with("method `Window`"));
    }

    #[test]
    fn test_void_and_variadic() {
        let rule = LongParameterList::new().threshold(0);
        assert!(check(&rule, "int get(void);\n").is_empty());
        assert_eq!(check(&rule, "int log(const char* fmt, ...);\n").len(), 1);
    }
}
