//! Rule trait for defining lint rules.

use crate::context::FileContext;
use crate::types::{Severity, Violation};
use serde::{Deserialize, Serialize};

/// Broad grouping of conventions a rule enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Identifier casing.
    Naming,
    /// Layout and file structure.
    Formatting,
    /// Ownership and lifetime of resources.
    Resource,
    /// Type conversions and enum scoping.
    TypeSafety,
    /// Function signatures.
    Interface,
    /// Error reporting and propagation.
    ErrorHandling,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Naming => "naming",
            Self::Formatting => "formatting",
            Self::Resource => "resource",
            Self::TypeSafety => "type-safety",
            Self::Interface => "interface",
            Self::ErrorHandling => "error-handling",
        };
        f.write_str(s)
    }
}

/// A per-file lint rule.
///
/// Rules receive one file's token stream and declaration model through
/// [`FileContext`] and must not depend on any other file. Evaluation order
/// between rules does not matter.
///
/// # Example
///
/// ```
/// use cxxlint_core::{Category, FileContext, Location, Rule, Severity, Violation};
///
/// pub struct NoGoto;
///
/// impl Rule for NoGoto {
///     fn name(&self) -> &'static str { "no-goto" }
///     fn code(&self) -> &'static str { "CX100" }
///     fn category(&self) -> Category { Category::ErrorHandling }
///
///     fn check(&self, ctx: &FileContext) -> Vec<Violation> {
///         ctx.tokens
///             .iter()
///             .filter(|t| t.is_keyword("goto"))
///             .map(|t| {
///                 Violation::new(
///                     self.code(),
///                     self.name(),
///                     self.default_severity(),
///                     ctx.location(&t.span),
///                     "`goto` is not allowed",
///                 )
///             })
///             .collect()
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "naming-casing").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "CX001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the convention category.
    fn category(&self) -> Category;

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Whether violations may carry automatically applicable edits.
    fn fixable(&self) -> bool {
        false
    }

    /// Checks a single file and returns any violations found.
    fn check(&self, ctx: &FileContext) -> Vec<Violation>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;
    use cxxlint_syntax::{extract, tokenize};
    use std::path::Path;

    struct TestRule;

    impl Rule for TestRule {
        fn name(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn description(&self) -> &'static str {
            "A test rule"
        }
        fn category(&self) -> Category {
            Category::Interface
        }

        fn check(&self, ctx: &FileContext) -> Vec<Violation> {
            vec![Violation::new(
                self.code(),
                self.name(),
                self.default_severity(),
                Location::new(ctx.relative_path.clone(), 1, 1),
                "Test violation",
            )]
        }
    }

    #[test]
    fn test_rule_trait() {
        let rule = TestRule;
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.code(), "TEST001");
        assert_eq!(rule.default_severity(), Severity::Warning);
        assert!(!rule.fixable());
        assert_eq!(rule.category().to_string(), "interface");
    }

    #[test]
    fn test_rule_check_uses_context_path() {
        let tokens: Vec<_> = tokenize("int x;").collect();
        let model = extract(&tokens);
        let ctx = FileContext::new(Path::new("/p/a.cpp"), "int x;", &tokens, &model, Path::new("/p"));
        let violations = TestRule.check(&ctx);
        assert_eq!(violations[0].location.file, Path::new("a.cpp"));
    }
}
