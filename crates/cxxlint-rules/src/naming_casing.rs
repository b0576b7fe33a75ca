//! Rule enforcing identifier casing by declaration role.
//!
//! # Rationale
//!
//! A reader should be able to tell a type from a function from a constant by
//! its spelling alone. Casing is chosen from the role the extractor assigns
//! to each declaration.
//!
//! # Detected Patterns
//!
//! | Role | Expected casing |
//! |------|-----------------|
//! | class, struct, enum, type alias, template parameter, enumerator | `UpperCamelCase` |
//! | function, method, variable, parameter, namespace | `lower_snake_case` |
//! | constant, macro | `UPPER_SNAKE_CASE` |
//!
//! Acronyms are ordinary words: `HttpServer` is accepted, `HTTPServer` is
//! not. Constructors, destructors, operators, `override` methods, qualified
//! out-of-line definitions and low-confidence declarations are skipped.
//!
//! # Fix
//!
//! The suggested rename touches every occurrence of the name in the scope
//! the entity is visible in (the enclosing function for locals and
//! parameters, otherwise the file). It is applied automatically only when
//! the new name is unused there, the old name has a single declaration, and
//! the check set is a single file for entities visible outside a function.
//!
//! # Configuration
//!
//! - `allow_names`: names never reported

use cxxlint_core::casing::{self, Casing};
use cxxlint_core::{
    Applicability, Category, FileContext, Replacement, Rule, Severity, Suggestion,
    Violation,
};
use cxxlint_syntax::{Confidence, Entity, EntityKind, TokenKind};

/// Rule code for naming-casing.
pub const CODE: &str = "CX001";

/// Rule name for naming-casing.
pub const NAME: &str = "naming-casing";

/// Expected casing for a declaration role.
#[must_use]
pub fn expected_casing(kind: EntityKind) -> Casing {
    match kind {
        EntityKind::Class
        | EntityKind::Struct
        | EntityKind::Enum
        | EntityKind::TypeAlias
        | EntityKind::TemplateParameter
        | EntityKind::EnumVariant => Casing::UpperCamel,
        EntityKind::Function
        | EntityKind::Method
        | EntityKind::Variable
        | EntityKind::Parameter
        | EntityKind::Namespace => Casing::LowerSnake,
        EntityKind::Constant | EntityKind::Macro => Casing::UpperSnake,
    }
}

/// Enforces role-based identifier casing.
#[derive(Debug, Clone)]
pub struct NamingCasing {
    allow_names: Vec<String>,
    severity: Severity,
}

impl Default for NamingCasing {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingCasing {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_names: Vec::new(),
            severity: Severity::Error,
        }
    }

    /// Adds names that are never reported.
    #[must_use]
    pub fn allow_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn is_exempt(&self, entity: &Entity) -> bool {
        entity.confidence == Confidence::Low
            || entity.flags.is_special
            || entity.flags.is_override
            || entity.flags.is_qualified
            || self.allow_names.iter().any(|n| *n == entity.name)
    }

    fn check_entity(&self, ctx: &FileContext, entity: &Entity) -> Option<Violation> {
        if self.is_exempt(entity) {
            return None;
        }
        let casing = expected_casing(entity.kind);
        if casing.is_valid(&entity.name) {
            return None;
        }

        let violation = Violation::new(
            CODE,
            NAME,
            self.severity,
            ctx.entity_location(entity),
            format!("{} `{}` should be {}", entity.kind, entity.name, casing),
        );

        let Some(new_name) = casing::suggest(&entity.name, casing) else {
            return Some(violation.with_suggestion(Suggestion::new(format!(
                "rename to a {casing} name"
            ))));
        };

        let range = ctx.rename_range(entity);
        let edits: Vec<Replacement> = if entity.kind == EntityKind::Macro {
            vec![Replacement::new(ctx.entity_location(entity), new_name.clone())]
        } else {
            ctx.identifier_tokens(&entity.name, range)
                .map(|i| Replacement::new(ctx.location(&ctx.tokens[i].span), new_name.clone()))
                .collect()
        };
        let applicability = if self.rename_is_safe(ctx, entity, &new_name, range) {
            Applicability::Automatic
        } else {
            Applicability::Advisory
        };

        Some(violation.with_suggestion(Suggestion::with_edits(
            format!("rename to `{new_name}`"),
            edits,
            applicability,
        )))
    }

    fn rename_is_safe(
        &self,
        ctx: &FileContext,
        entity: &Entity,
        new_name: &str,
        range: (usize, usize),
    ) -> bool {
        // Macro uses inside other directives are not tokenized.
        if entity.kind == EntityKind::Macro {
            return false;
        }
        let local = ctx.local_scope(entity).is_some();
        if !local && ctx.check_set_size > 1 {
            return false;
        }
        // Directive bodies are single tokens, so their uses cannot be renamed.
        if mentioned_in_directives(ctx, &[entity.name.as_str(), new_name]) {
            return false;
        }
        if ctx.identifier_tokens(new_name, range).next().is_some() {
            return false;
        }
        if ctx.model.lookup(entity.scope, new_name).next().is_some() {
            return false;
        }
        let declarations = ctx
            .model
            .entities()
            .iter()
            .filter(|e| e.name == entity.name && range.0 <= e.span.start && e.span.start < range.1)
            .count();
        if declarations != 1 {
            return false;
        }
        // Member access on some other object could name a different entity.
        ctx.identifier_tokens(&entity.name, range).all(|i| {
            match ctx.prev_code_token(i) {
                Some((p, t)) if t.is_punct(".") || t.is_punct("->") => {
                    entity.flags.is_member
                        && t.is_punct("->")
                        && ctx.prev_code_token(p).is_some_and(|(_, q)| q.is_keyword("this"))
                }
                Some((_, t)) if t.is_punct("::") => entity.flags.is_member,
                _ => true,
            }
        })
    }
}

/// Returns true if any preprocessor directive of the file spells one of
/// `names` as a whole word.
fn mentioned_in_directives(ctx: &FileContext, names: &[&str]) -> bool {
    ctx.tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Directive)
        .any(|t| {
            t.text
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .any(|word| names.contains(&word))
        })
}

impl Rule for NamingCasing {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Enforces identifier casing by declaration role"
    }

    fn category(&self) -> Category {
        Category::Naming
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
            .filter_map(|e| self.check_entity(ctx, e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_code, check_set};

    fn check(code: &str) -> Vec<Violation> {
        check_code(&NamingCasing::new(), code, "src/a.cpp")
    }

    #[test]
    fn test_mutable_variable_must_be_snake_case() {
        let violations = check("int MAX_count = 5;\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE);
        assert_eq!(violations[0].severity, Severity::Error);
        assert_eq!(
            violations[0].message,
            "variable `MAX_count` should be lower_snake_case"
        );
        let suggestion = violations[0].suggestion.as_ref().expect("suggestion");
        assert_eq!(suggestion.message, "rename to `max_count`");
        assert!(violations[0].is_fixable());
    }

    #[test]
    fn test_constexpr_constant_is_upper_snake() {
        assert!(check("constexpr int MAX_COUNT = 5;\n").is_empty());
        let violations = check("constexpr int maxCount = 5;\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.starts_with("constant `maxCount`"));
    }

    #[test]
    fn test_types_and_functions() {
        let code = r"
class HttpServer {
public:
    HttpServer();
    ~HttpServer();
    void handle_request(int request_id);
    bool operator==(const HttpServer& other) const;
};
struct parse_result { int value; };
void ProcessAll(int Count);
";
        let names: Vec<String> = check(code)
            .iter()
            .map(|v| v.message.clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "struct `parse_result` should be UpperCamelCase",
                "function `ProcessAll` should be lower_snake_case",
                "parameter `Count` should be lower_snake_case",
            ]
        );
    }

    #[test]
    fn test_acronyms_are_words() {
        assert!(check("class HttpServer {};\n").is_empty());
        let violations = check("class HTTPServer {};\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].suggestion.as_ref().map(|s| s.message.as_str()),
            Some("rename to `HttpServer`")
        );
    }

    #[test]
    fn test_enumerators_and_template_parameters() {
        let code = "enum class Color { Red, GREEN };\ntemplate <typename T, int N> struct Array {};\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("`GREEN`"));
    }

    #[test]
    fn test_override_and_allow_names_are_skipped() {
        let code = "struct Derived : Base {\n    void OnEvent() override;\n};\nint HRESULT_Value;\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("HRESULT_Value"));
        let rule = NamingCasing::new().allow_names(["HRESULT_Value"]);
        assert!(check_code(&rule, code, "a.cpp").is_empty());
    }

    #[test]
    fn test_function_pointer_is_low_confidence() {
        assert!(check("void (*OnDone)(int);\n").is_empty());
    }

    #[test]
    fn test_rename_edits_cover_uses() {
        let code = "int compute(int Value) {\n    return Value * 2;\n}\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        let suggestion = violations[0].suggestion.as_ref().expect("suggestion");
        assert_eq!(suggestion.replacements.len(), 2);
        assert!(suggestion.replacements.iter().all(|r| r.new_text == "value"));
        assert!(suggestion.is_automatic());
    }

    #[test]
    fn test_conflicting_rename_is_advisory() {
        let code = "void f() {\n    int max_count = 1;\n    int MAX_count = 2;\n}\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].is_fixable());
    }

    #[test]
    fn test_names_used_in_macros_are_advisory() {
        let code = "int GlobalCount = 0;\n#define BUMP() (GlobalCount++)\nvoid f() { BUMP(); }\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("GlobalCount"));
        assert!(!violations[0].is_fixable());

        let shadowed = check("#define max_count 3\nint MAX_count = 5;\n");
        let variable = shadowed
            .iter()
            .find(|v| v.message.contains("MAX_count"))
            .expect("variable finding");
        assert!(!variable.is_fixable());
    }

    #[test]
    fn test_unrelated_macros_keep_rename_automatic() {
        let violations = check("#define LIMIT 3\nint GlobalCount = LIMIT;\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].is_fixable());
    }

    #[test]
    fn test_shared_names_are_advisory_in_multi_file_sets() {
        let code = "int GlobalCount = 0;\n";
        let single = check_set(&NamingCasing::new(), code, "a.cpp", 1);
        assert!(single[0].is_fixable());
        let multi = check_set(&NamingCasing::new(), code, "a.cpp", 2);
        assert!(!multi[0].is_fixable());
    }

    #[test]
    fn test_locals_stay_fixable_in_multi_file_sets() {
        let code = "void f() {\n    int LocalCount = 0;\n    ++LocalCount;\n}\n";
        let violations = check_set(&NamingCasing::new(), code, "a.cpp", 3);
        assert!(violations[0].is_fixable());
    }

    #[test]
    fn test_macro_rename_is_advisory() {
        let violations = check("#define max_size 10\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.starts_with("macro `max_size`"));
        assert!(!violations[0].is_fixable());
    }

    #[test]
    fn test_keyword_result_has_no_edit() {
        let violations = check("int New = 1;\n");
        assert_eq!(violations.len(), 1);
        let suggestion = violations[0].suggestion.as_ref().expect("suggestion");
        assert!(suggestion.replacements.is_empty());
    }
}
