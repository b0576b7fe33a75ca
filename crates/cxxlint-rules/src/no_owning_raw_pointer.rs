//! Rule detecting raw pointers that own their pointee.
//!
//! # Rationale
//!
//! Ownership held in a raw pointer is invisible to the type system. Every
//! early return or exception between allocation and release is a leak, and
//! nothing stops a second `delete`. Smart pointers make ownership explicit.
//!
//! # Detected Patterns
//!
//! A pointer variable, member or parameter is reported when the file shows
//! it owning memory:
//!
//! - initialized from `new` or `malloc`/`calloc`/`realloc`/`strdup`
//! - assigned from one of those later on
//! - passed to `delete`, `delete[]` or `free`
//!
//! Uses are searched in the enclosing function for locals and parameters,
//! and in the whole file otherwise. Pointers used only for observation are
//! never reported.
//!
//! ```cpp
//! Widget* w = new Widget(3);                  // reported
//! auto w = std::make_unique<Widget>(3);       // ok
//! void draw(const Widget* w);                 // ok
//! ```

use cxxlint_core::{Category, FileContext, Label, Rule, Severity, Suggestion, Violation};
use cxxlint_syntax::{Confidence, Entity, EntityKind, TokenKind};

/// Rule code for no-owning-raw-pointer.
pub const CODE: &str = "CX002";

/// Rule name for no-owning-raw-pointer.
pub const NAME: &str = "no-owning-raw-pointer";

const ALLOCATORS: &[&str] = &["malloc", "calloc", "realloc", "strdup"];
const DEALLOCATORS: &[&str] = &["free"];

/// How the file shows a pointer owning memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evidence {
    Allocated(usize),
    Released(usize),
}

impl Evidence {
    fn token(self) -> usize {
        match self {
            Self::Allocated(i) | Self::Released(i) => i,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Allocated(_) => "allocated here",
            Self::Released(_) => "released here",
        }
    }
}

/// Detects raw pointers that own memory.
#[derive(Debug, Clone)]
pub struct NoOwningRawPointer {
    severity: Severity,
}

impl Default for NoOwningRawPointer {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOwningRawPointer {
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

    fn is_candidate(entity: &Entity) -> bool {
        matches!(
            entity.kind,
            EntityKind::Variable | EntityKind::Parameter | EntityKind::Constant
        ) && entity.flags.is_pointer
            && !entity.flags.is_function_pointer
            && entity.confidence == Confidence::High
    }

    fn find_evidence(ctx: &FileContext, entity: &Entity) -> Option<Evidence> {
        if let Some(init) = &entity.initializer {
            if let Some(i) = init.clone().find(|&i| is_allocation(ctx, i)) {
                return Some(Evidence::Allocated(i));
            }
        }

        let range = ctx.rename_range(entity);
        for i in ctx.identifier_tokens(&entity.name, range) {
            if i == entity.token {
                continue;
            }
            let Some(head) = access_head(ctx, i) else {
                continue;
            };
            if let Some((eq, t)) = ctx.next_code_token(i) {
                if t.is_punct("=") {
                    if let Some((rhs, _)) = ctx.next_code_token(eq) {
                        if is_allocation(ctx, rhs) {
                            return Some(Evidence::Allocated(rhs));
                        }
                    }
                }
            }
            if let Some(at) = release_before(ctx, head) {
                return Some(Evidence::Released(at));
            }
        }
        None
    }
}

/// Returns true if token `i` starts an allocation.
fn is_allocation(ctx: &FileContext, i: usize) -> bool {
    let Some(token) = ctx.tokens.get(i) else {
        return false;
    };
    if token.is_keyword("new") {
        return true;
    }
    token.kind == TokenKind::Identifier
        && ALLOCATORS.contains(&token.text.as_str())
        && ctx.next_code_token(i).is_some_and(|(_, t)| t.is_punct("("))
}

/// First token of the expression naming the pointer at `i`.
///
/// Returns `None` for member access through some other object.
fn access_head(ctx: &FileContext, i: usize) -> Option<usize> {
    match ctx.prev_code_token(i) {
        Some((_, t)) if t.is_punct(".") => None,
        Some((arrow, t)) if t.is_punct("->") => match ctx.prev_code_token(arrow) {
            Some((this, q)) if q.is_keyword("this") => Some(this),
            _ => None,
        },
        _ => Some(i),
    }
}

/// Index of a `delete`, `delete[]` or `free(` right before `head`.
fn release_before(ctx: &FileContext, head: usize) -> Option<usize> {
    let (p, prev) = ctx.prev_code_token(head)?;
    if prev.is_keyword("delete") {
        return Some(p);
    }
    if prev.is_punct("]") {
        let (q, open) = ctx.prev_code_token(p)?;
        let (r, kw) = ctx.prev_code_token(q)?;
        return (open.is_punct("[") && kw.is_keyword("delete")).then_some(r);
    }
    if prev.is_punct("(") {
        let (q, callee) = ctx.prev_code_token(p)?;
        let closes = ctx
            .next_code_token(head)
            .is_some_and(|(_, t)| t.is_punct(")"));
        return (callee.kind == TokenKind::Identifier
            && DEALLOCATORS.contains(&callee.text.as_str())
            && closes)
            .then_some(q);
    }
    None
}

impl Rule for NoOwningRawPointer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Detects raw pointers that own the memory they point to"
    }

    fn category(&self) -> Category {
        Category::Resource
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &FileContext) -> Vec<Violation> {
        ctx.model
            .entities()
            .iter()
            .filter(|e| Self::is_candidate(e))
            .filter_map(|entity| {
                let evidence = Self::find_evidence(ctx, entity)?;
                let at = &ctx.tokens[evidence.token()];
                Some(
                    Violation::new(
                        CODE,
                        NAME,
                        self.severity,
                        ctx.entity_location(entity),
                        format!("raw pointer `{}` owns the memory it points to", entity.name),
                    )
                    .with_label(Label::new(ctx.location(&at.span), evidence.label()))
                    .with_suggestion(Suggestion::new(
                        "use `std::unique_ptr` or `std::shared_ptr` to express ownership",
                    )),
                )
            })
            .collect()
    }
}
