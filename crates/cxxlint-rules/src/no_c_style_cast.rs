//! Rule detecting C-style casts.
//!
//! # Rationale
//!
//! A C-style cast silently picks whichever of `static_cast`, `const_cast`
//! and `reinterpret_cast` makes the code compile. Named casts state the
//! intent and are easy to search for.
//!
//! # Detected Patterns
//!
//! A parenthesized type followed by an operand:
//!
//! ```cpp
//! int n = (int)ratio;             // reported: static_cast<int>
//! char* raw = (char*)buffer;      // reported: reinterpret_cast<char*>
//! (void)unused;                   // ok: discard idiom
//! int m = static_cast<int>(r);    // ok
//! ```
//!
//! A parenthesized plain name such as `(Widget)w` is reported only when an
//! identifier or literal follows, so `(a) * b` is never mistaken for a cast.
//!
//! # Configuration
//!
//! - `allow_void_discard`: accept `(void)expr` (default: true)

use cxxlint_core::{Category, FileContext, Rule, Severity, Suggestion, Violation};
use cxxlint_syntax::{is_type_keyword, Token, TokenKind};

/// Rule code for no-c-style-cast.
pub const CODE: &str = "CX003";

/// Rule name for no-c-style-cast.
pub const NAME: &str = "no-c-style-cast";

/// Keywords whose parentheses never hold a cast.
const NON_CAST_KEYWORDS: &[&str] = &[
    "alignas",
    "alignof",
    "catch",
    "decltype",
    "for",
    "if",
    "new",
    "noexcept",
    "operator",
    "sizeof",
    "static_assert",
    "switch",
    "typeid",
    "while",
];

/// Keywords that may appear inside a cast's type.
const TYPE_QUALIFIERS: &[&str] = &["const", "volatile", "struct", "class", "enum", "typename"];

/// Keywords that may start a cast operand.
const OPERAND_KEYWORDS: &[&str] = &[
    "this",
    "nullptr",
    "true",
    "false",
    "sizeof",
    "new",
    "static_cast",
    "const_cast",
    "reinterpret_cast",
    "dynamic_cast",
];

/// Parsed contents of a parenthesized type.
struct CastTarget {
    text: String,
    builtin: bool,
    pointer: bool,
}

/// Detects C-style casts.
#[derive(Debug, Clone)]
pub struct NoCStyleCast {
    allow_void_discard: bool,
    severity: Severity,
}

impl Default for NoCStyleCast {
    fn default() -> Self {
        Self::new()
    }
}

impl NoCStyleCast {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_void_discard: true,
            severity: Severity::Warning,
        }
    }

    /// Sets whether `(void)expr` is accepted.
    #[must_use]
    pub fn allow_void_discard(mut self, allow: bool) -> Self {
        self.allow_void_discard = allow;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn check_paren(&self, ctx: &FileContext, code: &[usize], at: usize) -> Option<Violation> {
        let tokens = ctx.tokens;
        if at > 0 {
            let prev = &tokens[code[at - 1]];
            let opens_call = prev.is_ident()
                || prev.is_punct(")")
                || prev.is_punct("]")
                || prev.is_punct(">")
                || (prev.kind == TokenKind::Keyword
                    && (is_type_keyword(&prev.text) || NON_CAST_KEYWORDS.contains(&prev.text.as_str())));
            if opens_call {
                return None;
            }
        }

        let close = matching_paren(tokens, code, at)?;
        let target = parse_target(tokens, &code[at + 1..close])?;
        let next = code.get(close + 1).map(|&i| &tokens[i])?;
        let is_cast = if target.builtin || target.pointer {
            starts_expression(next)
        } else {
            starts_operand(next)
        };
        if !is_cast {
            return None;
        }
        if self.allow_void_discard && target.text == "void" {
            return None;
        }

        let cast = suggested_cast(ctx, &target, next);
        let span = tokens[code[at]].span.to(&tokens[code[close]].span);
        Some(
            Violation::new(
                CODE,
                NAME,
                self.severity,
                ctx.location(&span),
                format!("C-style cast to `{}`", target.text),
            )
            .with_suggestion(Suggestion::new(format!(
                "use `{cast}<{}>(...)` instead",
                target.text
            ))),
        )
    }
}

/// Position in `code` of the `)` matching the `(` at `open`.
fn matching_paren(tokens: &[Token], code: &[usize], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, &i) in code.iter().enumerate().skip(open) {
        let t = &tokens[i];
        if t.is_punct("(") {
            depth += 1;
        } else if t.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                return Some(pos);
            }
        } else if t.is_punct(";") || t.is_punct("{") || t.is_punct("}") {
            return None;
        }
    }
    None
}

/// Interprets the tokens between parentheses as a type, if they can be one.
fn parse_target(tokens: &[Token], inner: &[usize]) -> Option<CastTarget> {
    if inner.is_empty() {
        return None;
    }
    let mut angle = 0usize;
    let mut builtin = false;
    let mut has_name = false;
    let mut text = String::new();
    let mut prev_word = false;
    for &i in inner {
        let t = &tokens[i];
        let word = t.kind.is_word();
        let ok = match t.kind {
            TokenKind::Identifier => {
                has_name = true;
                true
            }
            TokenKind::Keyword if is_type_keyword(&t.text) => {
                builtin |= angle == 0;
                has_name = true;
                true
            }
            TokenKind::Keyword => TYPE_QUALIFIERS.contains(&t.text.as_str()),
            TokenKind::Number => angle > 0,
            TokenKind::Punct => match t.text.as_str() {
                "::" | "*" | "&" | "&&" => true,
                "<" => {
                    angle += 1;
                    true
                }
                ">" if angle > 0 => {
                    angle -= 1;
                    true
                }
                "," => angle > 0,
                _ => false,
            },
            _ => false,
        };
        if !ok {
            return None;
        }
        if word && prev_word {
            text.push(' ');
        }
        text.push_str(&t.text);
        prev_word = word;
    }
    if angle != 0 || !has_name {
        return None;
    }
    let last = &tokens[inner[inner.len() - 1]];
    let pointer = last.is_punct("*") || last.is_punct("&") || last.is_punct("&&");
    Some(CastTarget {
        text,
        builtin,
        pointer,
    })
}

/// Returns true if `t` can begin the operand of a builtin or pointer cast.
fn starts_expression(t: &Token) -> bool {
    if starts_operand(t) || t.is_punct("(") {
        return true;
    }
    t.kind == TokenKind::Punct
        && matches!(t.text.as_str(), "-" | "+" | "!" | "~" | "*" | "&" | "++" | "--")
}

/// Returns true if `t` is a primary expression start that cannot continue a
/// parenthesized expression.
fn starts_operand(t: &Token) -> bool {
    match t.kind {
        TokenKind::Identifier | TokenKind::Number | TokenKind::String | TokenKind::Char => true,
        TokenKind::Keyword => OPERAND_KEYWORDS.contains(&t.text.as_str()),
        _ => false,
    }
}

/// Type with cv-qualifiers and pointer or reference declarators removed.
fn base_type(text: &str) -> String {
    text.replace(['*', '&'], " ")
        .split_whitespace()
        .filter(|w| *w != "const" && *w != "volatile")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Chooses the named cast that matches what the C-style cast does.
fn suggested_cast(ctx: &FileContext, target: &CastTarget, operand: &Token) -> &'static str {
    if !target.pointer || !operand.is_ident() {
        return "static_cast";
    }
    let source = ctx
        .model
        .entities()
        .iter()
        .find(|e| e.name == operand.text && e.flags.is_pointer)
        .and_then(|e| e.type_text.as_deref());
    let Some(source) = source else {
        return "static_cast";
    };
    let (from, to) = (base_type(source), base_type(&target.text));
    if to == "void" || from == "void" {
        "static_cast"
    } else if from != to {
        "reinterpret_cast"
    } else if source.starts_with("const") && !target.text.starts_with("const") {
        "const_cast"
    } else {
        "static_cast"
    }
}

impl Rule for NoCStyleCast {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Detects C-style casts"
    }

    fn category(&self) -> Category {
        Category::TypeSafety
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        let code: Vec<usize> = ctx
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_comment() && t.kind != TokenKind::Directive)
            .map(|(i, _)| i)
            .collect();
        (0..code.len())
            .filter(|&at| ctx.tokens[code[at]].is_punct("("))
            .filter_map(|at| self.check_paren(ctx, &code, at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check_code;

    fn check(code: &str) -> Vec<Violation> {
        check_code(&NoCStyleCast::new(), code, "src/a.cpp")
    }

    fn suggestion(v: &Violation) -> &str {
        v.suggestion.as_ref().map_or("", |s| s.message.as_str())
    }

    #[test]
    fn test_builtin_cast() {
        let violations = check("int n = (int)ratio;\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "C-style cast to `int`");
        assert_eq!(suggestion(&violations[0]), "use `static_cast<int>(...)` instead");
        assert_eq!(violations[0].location.column, 9);
        assert_eq!(violations[0].location.length, 5);
        assert!(!violations[0].is_fixable());
    }

    #[test]
    fn test_pointer_cast_between_unrelated_types() {
        let code = "int* values = nullptr;\nchar* raw = (char*)values;\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            suggestion(&violations[0]),
            "use `reinterpret_cast<char*>(...)` instead"
        );
    }

    #[test]
    fn test_casting_away_const() {
        let code = "const char* name = \"x\";\nchar* p = (char*)name;\n";
        let violations = check(code);
        assert_eq!(violations.len(), 1);
        assert_eq!(suggestion(&violations[0]), "use `const_cast<char*>(...)` instead");
    }

    #[test]
    fn test_named_type_cast() {
        let violations = check("auto w = (Widget)other;\nauto n = (std::size_t)count;\n");
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].message, "C-style cast to `std::size_t`");
    }

    #[test]
    fn test_void_discard() {
        assert!(check("void f(int unused) {\n    (void)unused;\n}\n").is_empty());
        let strict = NoCStyleCast::new().allow_void_discard(false);
        assert_eq!(
            check_code(&strict, "void f(int unused) {\n    (void)unused;\n}\n", "a.cpp").len(),
            1
        );
    }

    #[test]
    fn test_not_casts() {
        let code = r"
int f(int x);
int g(int a, int b) {
    if (a) return (a) * b;
    int total = sizeof(int) + static_cast<int>(b);
    for (int i = 0; i < b; ++i) { total += f(i); }
    auto cb = std::function<void(int)>();
    return (a + b);
}
";
        assert!(check(code).is_empty());
    }

    #[test]
    fn test_cast_inside_call_and_return() {
        let code = "double half(int n) {\n    return (double)n / 2;\n}\nvoid g() { use((unsigned char)c); }\n";
        let violations = check(code);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].message, "C-style cast to `unsigned char`");
    }

    #[test]
    fn test_directives_and_comments_are_ignored() {
        let code = "#define AS_INT(x) ((int)(x))\n// (int)value\n/* (char*)p */\n";
        assert!(check(code).is_empty());
    }
}
