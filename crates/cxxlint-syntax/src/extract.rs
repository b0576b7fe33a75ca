//! Shallow, error-tolerant declaration extractor.
//!
//! The extractor walks the token stream with a scope stack and recognizes
//! declaration shapes from small token windows. It never resolves types or
//! overloads. Anything it cannot recognize is skipped to the next
//! statement-like boundary and, at namespace or class scope, recorded as a
//! [`ParseNote`].
//!
//! Classification heuristics:
//!
//! - `name (` with a return-type-like run before it is a function, or a
//!   method when the enclosing scope is a class.
//! - Names inside an enum body are enumerators.
//! - `constexpr` objects, top-level `const` objects at namespace scope that
//!   are never assigned afterwards, and `static const` members are constants.
//! - Other named declarations are variables, or parameters inside a
//!   parameter list.
//! - Ambiguous shapes (function pointers, `T x(y)` with unknown `y`) become
//!   variables with [`Confidence::Low`].

use crate::lexer::{is_type_keyword, Position, Span, Token, TokenKind};
use crate::model::{
    Confidence, DeclarationModel, Entity, EntityFlags, EntityId, EntityKind, Param, ParseNote,
    ScopeId, ScopeKind, Signature, StorageClass,
};

/// Builds the declaration model for one file's token stream.
#[must_use]
pub fn extract(tokens: &[Token]) -> DeclarationModel {
    Extractor::new(tokens).run()
}

/// Keywords that qualify a declaration without being part of its type.
const SPECIFIERS: &[&str] = &[
    "static",
    "extern",
    "inline",
    "virtual",
    "explicit",
    "friend",
    "constexpr",
    "consteval",
    "constinit",
    "mutable",
    "thread_local",
    "register",
];

/// Keywords that may appear inside a type.
const TYPE_PART_KEYWORDS: &[&str] = &[
    "const", "volatile", "typename", "class", "struct", "union", "enum",
];

/// Attribute-like annotations followed by a parenthesized argument list.
const ANNOTATIONS: &[&str] = &["alignas", "__attribute__", "__declspec"];

const ASSIGNMENT_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", "++", "--",
];

/// Where a statement ends, as found by [`Extractor::statement_end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementEnd {
    /// `;` at depth 0.
    Semi(usize),
    /// Closing `}` of a brace group opened inside the statement.
    Group(usize),
    /// Unbalanced closer belonging to the enclosing construct.
    Closer(usize),
    /// End of input (or of the current limit).
    Eof,
}

/// Specifiers seen while scanning a declaration head.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
struct Specifiers {
    is_static: bool,
    is_extern: bool,
    is_constexpr: bool,
    is_thread_local: bool,
}

impl Specifiers {
    fn storage(self) -> StorageClass {
        if self.is_thread_local {
            StorageClass::ThreadLocal
        } else if self.is_static {
            StorageClass::Static
        } else if self.is_extern {
            StorageClass::Extern
        } else {
            StorageClass::Automatic
        }
    }
}

/// Result of scanning a declaration head.
#[derive(Debug, Clone, Default)]
struct Head {
    specs: Specifiers,
    /// Significant-token indices of the type and declarator, specifiers removed.
    parts: Vec<usize>,
    /// Index of the first token not absorbed into the head.
    stop: usize,
}

/// A declarator name split off the end of a head.
#[derive(Debug, Clone)]
struct Declarator {
    /// Number of leading `parts` that form the type.
    type_len: usize,
    qualified: bool,
    /// Last identifier of the qualifier (`Foo` in `Foo::bar`).
    qualifier_last: Option<String>,
}

struct Extractor<'t> {
    tokens: &'t [Token],
    /// Indices into `tokens` of everything except comments and directives.
    sig: Vec<usize>,
    pos: usize,
    /// Scanning never looks at or beyond this significant index.
    limit: usize,
    model: DeclarationModel,
}

impl<'t> Extractor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let sig: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_comment() && t.kind != TokenKind::Directive)
            .map(|(i, _)| i)
            .collect();
        let file_span = tokens.last().map_or_else(Span::default, |last| Span {
            start: 0,
            end: last.span.end,
            start_pos: Position::default(),
            end_pos: last.span.end_pos,
        });
        let limit = sig.len();
        Self {
            tokens,
            sig,
            pos: 0,
            limit,
            model: DeclarationModel::new(file_span),
        }
    }

    fn run(mut self) -> DeclarationModel {
        let root = self.model.root();
        self.parse_items(root, false);
        self.extract_macros();
        self.model
    }

    // ── Token access ──

    fn at(&self, i: usize) -> Option<&'t Token> {
        if i >= self.limit {
            return None;
        }
        let tokens = self.tokens;
        self.sig.get(i).map(|&raw| &tokens[raw])
    }

    fn peek(&self) -> Option<&'t Token> {
        self.at(self.pos)
    }

    fn punct_at(&self, i: usize, p: &str) -> bool {
        self.at(i).is_some_and(|t| t.is_punct(p))
    }

    fn keyword_at(&self, i: usize, kw: &str) -> bool {
        self.at(i).is_some_and(|t| t.is_keyword(kw))
    }

    fn ident_at(&self, i: usize) -> bool {
        self.at(i).is_some_and(Token::is_ident)
    }

    fn raw(&self, i: usize) -> usize {
        self.sig[i]
    }

    fn span_at(&self, i: usize) -> Span {
        self.sig
            .get(i)
            .map(|&raw| self.tokens[raw].span)
            .unwrap_or_default()
    }

    fn prev_span(&self) -> Span {
        self.span_at(self.pos.saturating_sub(1))
    }

    fn note(&mut self, i: usize, message: &str) {
        tracing::debug!("unparsed region at token {}: {}", i, message);
        let span = self.span_at(i);
        self.model.notes.push(ParseNote {
            span,
            message: message.to_string(),
        });
    }

    /// Index of the bracket closing the one at `open`, same bracket type.
    fn matching(&self, open: usize) -> Option<usize> {
        let open_text = self.at(open)?.text.as_str();
        let close_text = match open_text {
            "(" => ")",
            "[" => "]",
            "{" => "}",
            _ => return None,
        };
        let mut depth = 0usize;
        let mut i = open;
        while let Some(t) = self.at(i) {
            if t.is_punct(open_text) {
                depth += 1;
            } else if t.is_punct(close_text) {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            i += 1;
        }
        None
    }

    /// Index of the `>` closing the template argument list opened at `open`.
    fn matching_angle(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        while let Some(t) = self.at(i) {
            if t.kind == TokenKind::Punct {
                match t.text.as_str() {
                    "<" => depth += 1,
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i);
                        }
                    }
                    "(" | "[" => {
                        i = self.matching(i)?;
                    }
                    ";" | "{" | "}" | ")" | "]" | "&&" | "||" => return None,
                    _ => {}
                }
            }
            i += 1;
        }
        None
    }

    fn statement_end(&self, from: usize) -> StatementEnd {
        let mut depth = 0usize;
        let mut i = from;
        while let Some(t) = self.at(i) {
            if t.kind == TokenKind::Punct {
                match t.text.as_str() {
                    "(" | "[" => depth += 1,
                    ")" | "]" => {
                        if depth == 0 {
                            return StatementEnd::Closer(i);
                        }
                        depth -= 1;
                    }
                    "{" if depth == 0 => {
                        return match self.matching(i) {
                            Some(close) => StatementEnd::Group(close),
                            None => StatementEnd::Eof,
                        };
                    }
                    "{" => depth += 1,
                    "}" => {
                        if depth == 0 {
                            return StatementEnd::Closer(i);
                        }
                        depth -= 1;
                    }
                    ";" if depth == 0 => return StatementEnd::Semi(i),
                    _ => {}
                }
            }
            i += 1;
        }
        StatementEnd::Eof
    }

    fn skip_statement(&mut self) {
        let start = self.pos;
        self.pos = match self.statement_end(self.pos) {
            StatementEnd::Semi(i) | StatementEnd::Group(i) => i + 1,
            StatementEnd::Closer(i) => i,
            StatementEnd::Eof => self.limit,
        };
        if self.pos == start && start < self.limit {
            self.pos += 1;
        }
    }

    /// Skips `[[...]]` at the cursor. Returns true if something was skipped.
    fn skip_attribute(&mut self) -> bool {
        if self.punct_at(self.pos, "[") && self.punct_at(self.pos + 1, "[") {
            if let Some(close) = self.matching(self.pos) {
                self.pos = close + 1;
                return true;
            }
        }
        if let Some(t) = self.peek() {
            if ANNOTATIONS.contains(&t.text.as_str()) && self.punct_at(self.pos + 1, "(") {
                if let Some(close) = self.matching(self.pos + 1) {
                    self.pos = close + 1;
                    return true;
                }
            }
        }
        false
    }

    fn skip_attributes(&mut self) {
        while self.skip_attribute() {}
    }

    fn in_block(&self, scope: ScopeId) -> bool {
        matches!(
            self.model.semantic_scope(scope).kind,
            ScopeKind::Function | ScopeKind::Block
        )
    }

    fn close_scope(&mut self, scope: ScopeId, start: Span) {
        let end = self.prev_span();
        self.model.scope_mut(scope).span = start.to(&end);
    }

    fn render(&self, indices: impl IntoIterator<Item = usize>) -> String {
        let mut out = String::new();
        let mut prev_word = false;
        for i in indices {
            let Some(t) = self.at(i).or_else(|| self.sig.get(i).map(|&r| &self.tokens[r])) else {
                continue;
            };
            let word = t.kind.is_word();
            if word && prev_word {
                out.push(' ');
            }
            out.push_str(&t.text);
            prev_word = word;
        }
        out
    }

    fn new_entity(&self, kind: EntityKind, name_idx: usize, scope: ScopeId) -> Entity {
        let raw = self.raw(name_idx);
        let tok = &self.tokens[raw];
        Entity {
            id: EntityId(0),
            kind,
            name: tok.text.clone(),
            scope,
            span: tok.span,
            token: raw,
            keyword: None,
            type_text: None,
            initializer: None,
            body: None,
            signature: None,
            flags: EntityFlags {
                is_member: self.model.semantic_scope(scope).kind == ScopeKind::Class,
                ..EntityFlags::default()
            },
            confidence: Confidence::High,
        }
    }

    // ── Namespace / class level ──

    fn parse_items(&mut self, scope: ScopeId, nested: bool) {
        loop {
            let Some(tok) = self.peek() else {
                if nested {
                    self.note(self.pos.saturating_sub(1), "unterminated block");
                }
                return;
            };
            if tok.is_punct("}") {
                self.pos += 1;
                if nested {
                    return;
                }
                self.note(self.pos - 1, "unmatched '}'");
                continue;
            }
            self.parse_item(scope);
        }
    }

    fn parse_item(&mut self, scope: ScopeId) {
        let Some(tok) = self.peek() else {
            return;
        };
        let start = self.pos;
        match (tok.kind, tok.text.as_str()) {
            (TokenKind::Punct, ";") => self.pos += 1,
            (TokenKind::Punct, "[") if self.punct_at(self.pos + 1, "[") => {
                self.skip_attribute();
            }
            (TokenKind::Keyword, "namespace") => self.parse_namespace(scope),
            (TokenKind::Keyword, "inline") if self.keyword_at(self.pos + 1, "namespace") => {
                self.pos += 1;
                self.parse_namespace(scope);
            }
            (TokenKind::Keyword, "template") => self.parse_template(scope),
            (TokenKind::Keyword, "class" | "struct" | "union") => {
                if self.parse_class(scope) {
                    self.finish_after_body();
                }
            }
            (TokenKind::Keyword, "enum") => {
                if self.parse_enum(scope) {
                    self.finish_after_body();
                }
            }
            (TokenKind::Keyword, "using") => self.parse_using(scope),
            (TokenKind::Keyword, "typedef") => self.parse_typedef(scope),
            (TokenKind::Keyword, "public" | "private" | "protected") => {
                self.pos += 1;
                if self.ident_at(self.pos) && self.punct_at(self.pos + 1, ":") {
                    self.pos += 1;
                }
                if self.punct_at(self.pos, ":") {
                    self.pos += 1;
                }
            }
            (TokenKind::Identifier, _) if self.punct_at(self.pos + 1, ":") => {
                // Qt-style `signals:` sections and labels.
                self.pos += 2;
            }
            (TokenKind::Keyword, "extern") if self.at(self.pos + 1).is_some_and(|t| t.kind == TokenKind::String) => {
                self.pos += 2;
                if self.punct_at(self.pos, "{") {
                    self.pos += 1;
                    self.parse_items(scope, true);
                }
            }
            (TokenKind::Keyword, "export") => self.pos += 1,
            (TokenKind::Keyword, "static_assert" | "friend" | "asm" | "concept") => {
                self.skip_statement();
            }
            _ => self.parse_declaration(scope),
        }
        if self.pos == start {
            self.pos += 1;
        }
    }

    /// After a class or enum body: skips trailing declarators up to `;`.
    fn finish_after_body(&mut self) {
        if self.punct_at(self.pos, ";") {
            self.pos += 1;
        } else if self.peek().is_some_and(|t| !t.is_punct("}")) {
            self.skip_statement();
        }
    }

    fn parse_namespace(&mut self, scope: ScopeId) {
        let kw = self.pos;
        self.pos += 1;
        self.skip_attributes();

        let mut names = Vec::new();
        while self.ident_at(self.pos) {
            names.push(self.pos);
            self.pos += 1;
            if self.punct_at(self.pos, "::") {
                self.pos += 1;
                if self.keyword_at(self.pos, "inline") {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }

        if self.punct_at(self.pos, "=") {
            if let [name] = names[..] {
                let mut entity = self.new_entity(EntityKind::Namespace, name, scope);
                entity.keyword = Some(self.raw(kw));
                entity.flags.is_definition = true;
                self.model.push_entity(entity);
            }
            self.skip_statement();
            return;
        }

        if !self.punct_at(self.pos, "{") {
            self.note(kw, "malformed namespace");
            self.skip_statement();
            return;
        }

        let open_span = self.span_at(self.pos);
        let mut current = scope;
        let mut opened = Vec::new();
        for name in names {
            let mut entity = self.new_entity(EntityKind::Namespace, name, current);
            entity.keyword = Some(self.raw(kw));
            entity.flags.is_definition = true;
            let id = self.model.push_entity(entity);
            let inner = self
                .model
                .push_scope(ScopeKind::Namespace, current, Some(id), open_span);
            self.model.entity_mut(id).body = Some(inner);
            opened.push(inner);
            current = inner;
        }
        if opened.is_empty() {
            current = self
                .model
                .push_scope(ScopeKind::Namespace, scope, None, open_span);
            opened.push(current);
        }

        self.pos += 1;
        self.parse_items(current, true);
        for s in opened {
            self.close_scope(s, open_span);
        }
    }

    fn parse_template(&mut self, scope: ScopeId) {
        let kw = self.pos;
        self.pos += 1;
        if !self.punct_at(self.pos, "<") {
            // Explicit instantiation.
            self.skip_statement();
            return;
        }
        let open = self.pos;
        let Some(close) = self.matching_angle(open) else {
            self.note(kw, "unbalanced template parameter list");
            self.skip_statement();
            return;
        };

        let kw_span = self.span_at(kw);
        let tscope = self
            .model
            .push_scope(ScopeKind::Template, scope, None, kw_span);
        for (a, b) in self.split_top_level(open + 1, close) {
            let end = self.first_top_level(a, b, "=").unwrap_or(b);
            if end >= a + 2 && self.ident_at(end - 1) {
                let mut entity = self.new_entity(EntityKind::TemplateParameter, end - 1, tscope);
                entity.keyword = Some(self.raw(a));
                entity.type_text = Some(self.render(a..end - 1));
                entity.flags.is_member = false;
                if end + 1 < b {
                    entity.initializer = Some(self.raw(end + 1)..self.raw(b - 1) + 1);
                }
                self.model.push_entity(entity);
            }
        }
        self.pos = close + 1;
        if self.peek().is_some() {
            self.parse_item(tscope);
        }
        self.close_scope(tscope, kw_span);
    }

    /// Parses `class|struct|union ...`. Returns true when a body was consumed
    /// and the cursor sits right after its closing brace.
    fn parse_class(&mut self, scope: ScopeId) -> bool {
        let kw = self.pos;
        let is_class = self.keyword_at(kw, "class");
        self.pos += 1;
        self.skip_attributes();

        let mut name_idx = None;
        let mut qualified = false;
        let mut specialization = false;
        while let Some(t) = self.peek() {
            if !t.is_ident() {
                break;
            }
            if t.text == "final" && name_idx.is_some() {
                self.pos += 1;
                break;
            }
            // `class EXPORT_MACRO Name {` versus `struct tag object;`
            if name_idx.is_some()
                && !self.at(self.pos + 1).is_some_and(|n| {
                    n.is_punct("{")
                        || n.is_punct(":")
                        || n.is_punct("::")
                        || n.is_punct("<")
                        || n.is_ident_named("final")
                })
            {
                break;
            }
            name_idx = Some(self.pos);
            self.pos += 1;
            if self.punct_at(self.pos, "<") {
                match self.matching_angle(self.pos) {
                    Some(close) => {
                        specialization = true;
                        self.pos = close + 1;
                    }
                    None => break,
                }
            }
            if self.punct_at(self.pos, "::") {
                qualified = true;
                self.pos += 1;
            }
            self.skip_attributes();
        }

        let is_definition = self.punct_at(self.pos, "{") || self.punct_at(self.pos, ":");
        if !is_definition {
            if let Some(name) = name_idx {
                if self.punct_at(self.pos, ";") && name + 1 == self.pos && !specialization {
                    let kind = if is_class {
                        EntityKind::Class
                    } else {
                        EntityKind::Struct
                    };
                    let mut entity = self.new_entity(kind, name, scope);
                    entity.keyword = Some(self.raw(kw));
                    entity.flags.is_forward_decl = true;
                    entity.flags.is_qualified = qualified;
                    self.model.push_entity(entity);
                    self.pos += 1;
                    return false;
                }
            }
            // Elaborated type specifier in an ordinary declaration.
            self.pos = kw;
            self.parse_declaration(scope);
            return false;
        }

        if self.punct_at(self.pos, ":") {
            while let Some(t) = self.peek() {
                if t.is_punct("{") {
                    break;
                }
                if t.is_punct(";") || t.is_punct("}") {
                    self.note(kw, "malformed base clause");
                    self.skip_statement();
                    return false;
                }
                if t.is_punct("<") {
                    match self.matching_angle(self.pos) {
                        Some(close) => self.pos = close,
                        None => {
                            self.skip_statement();
                            return false;
                        }
                    }
                } else if t.is_punct("(") {
                    match self.matching(self.pos) {
                        Some(close) => self.pos = close,
                        None => {
                            self.skip_statement();
                            return false;
                        }
                    }
                }
                self.pos += 1;
            }
            if self.peek().is_none() {
                return false;
            }
        }

        let open_span = self.span_at(self.pos);
        let owner = match name_idx {
            Some(name) if !specialization => {
                let kind = if is_class {
                    EntityKind::Class
                } else {
                    EntityKind::Struct
                };
                let mut entity = self.new_entity(kind, name, scope);
                entity.keyword = Some(self.raw(kw));
                entity.flags.is_definition = true;
                entity.flags.is_qualified = qualified;
                Some(self.model.push_entity(entity))
            }
            _ => None,
        };
        let body = self
            .model
            .push_scope(ScopeKind::Class, scope, owner, open_span);
        if let Some(id) = owner {
            self.model.entity_mut(id).body = Some(body);
        }
        self.pos += 1;
        self.parse_items(body, true);
        self.close_scope(body, open_span);
        true
    }

    /// Parses `enum [class] ...`. Returns true when a body was consumed.
    fn parse_enum(&mut self, scope: ScopeId) -> bool {
        let kw = self.pos;
        self.pos += 1;
        let scoped = self.keyword_at(self.pos, "class") || self.keyword_at(self.pos, "struct");
        if scoped {
            self.pos += 1;
        }
        self.skip_attributes();
        let name_idx = if self.ident_at(self.pos) {
            self.pos += 1;
            Some(self.pos - 1)
        } else {
            None
        };
        if self.punct_at(self.pos, ":") {
            self.pos += 1;
            while let Some(t) = self.peek() {
                if t.is_punct("{") || t.is_punct(";") || t.is_punct("}") {
                    break;
                }
                self.pos += 1;
            }
        }

        if self.punct_at(self.pos, ";") {
            if let Some(name) = name_idx {
                let mut entity = self.new_entity(EntityKind::Enum, name, scope);
                entity.keyword = Some(self.raw(kw));
                entity.flags.is_scoped_enum = scoped;
                entity.flags.is_forward_decl = true;
                self.model.push_entity(entity);
            }
            self.pos += 1;
            return false;
        }
        if !self.punct_at(self.pos, "{") {
            self.pos = kw;
            self.parse_declaration(scope);
            return false;
        }

        let open_span = self.span_at(self.pos);
        let owner = name_idx.map(|name| {
            let mut entity = self.new_entity(EntityKind::Enum, name, scope);
            entity.keyword = Some(self.raw(kw));
            entity.flags.is_scoped_enum = scoped;
            entity.flags.is_definition = true;
            self.model.push_entity(entity)
        });
        let body = self
            .model
            .push_scope(ScopeKind::Enum, scope, owner, open_span);
        if let Some(id) = owner {
            self.model.entity_mut(id).body = Some(body);
        }

        self.pos += 1;
        loop {
            let Some(t) = self.peek() else {
                self.note(kw, "unterminated enum body");
                break;
            };
            if t.is_punct("}") {
                self.pos += 1;
                break;
            }
            if self.skip_attribute() {
                continue;
            }
            if t.is_ident() {
                let mut entity = self.new_entity(EntityKind::EnumVariant, self.pos, body);
                entity.flags.is_member = false;
                entity.flags.is_definition = true;
                self.pos += 1;
                self.skip_attributes();
                if self.punct_at(self.pos, "=") {
                    let init_start = self.pos + 1;
                    let end = self.skip_initializer(init_start);
                    if end > init_start {
                        entity.initializer = Some(self.raw(init_start)..self.raw(end - 1) + 1);
                    }
                    self.pos = end;
                }
                self.model.push_entity(entity);
                continue;
            }
            self.pos += 1;
        }
        self.close_scope(body, open_span);
        true
    }

    fn parse_using(&mut self, scope: ScopeId) {
        let kw = self.pos;
        self.pos += 1;
        if self.ident_at(self.pos) {
            let name = self.pos;
            self.pos += 1;
            self.skip_attributes();
            if self.punct_at(self.pos, "=") {
                let type_start = self.pos + 1;
                let end = match self.statement_end(type_start) {
                    StatementEnd::Semi(i) | StatementEnd::Closer(i) => i,
                    StatementEnd::Group(i) => i + 1,
                    StatementEnd::Eof => self.limit,
                };
                let mut entity = self.new_entity(EntityKind::TypeAlias, name, scope);
                entity.keyword = Some(self.raw(kw));
                entity.type_text = Some(self.render(type_start..end));
                entity.flags.is_definition = true;
                entity.flags.is_member = false;
                self.model.push_entity(entity);
                self.pos = end;
                if self.punct_at(self.pos, ";") {
                    self.pos += 1;
                }
                return;
            }
        }
        self.pos = kw;
        self.skip_statement();
    }

    fn parse_typedef(&mut self, scope: ScopeId) {
        let kw = self.pos;
        self.pos += 1;

        let tag = self.peek().is_some_and(|t| {
            matches!(t.text.as_str(), "class" | "struct" | "union" | "enum")
                && t.kind == TokenKind::Keyword
        });
        if tag && self.tag_has_body(self.pos) {
            let consumed = if self.keyword_at(self.pos, "enum") {
                self.parse_enum(scope)
            } else {
                self.parse_class(scope)
            };
            if consumed {
                self.typedef_names(kw, scope);
            }
            return;
        }

        let start = self.pos;
        let end = match self.statement_end(start) {
            StatementEnd::Semi(i) | StatementEnd::Closer(i) => i,
            StatementEnd::Group(i) => i + 1,
            StatementEnd::Eof => self.limit,
        };

        // typedef R (*Name)(Args);
        let fn_ptr = (start..end).find(|&i| {
            self.punct_at(i, "(")
                && self
                    .at(i + 1)
                    .is_some_and(|t| matches!(t.text.as_str(), "*" | "&" | "^"))
                && self.ident_at(i + 2)
                && self.punct_at(i + 3, ")")
        });
        let name = match fn_ptr {
            Some(i) => Some(i + 2),
            None => {
                let mut j = end;
                while j > start && self.punct_at(j - 1, "]") {
                    j = self.opening_bracket(start, j - 1).unwrap_or(start);
                }
                (j > start + 1 && self.ident_at(j - 1)).then_some(j - 1)
            }
        };
        if let Some(name) = name {
            let mut entity = self.new_entity(EntityKind::TypeAlias, name, scope);
            entity.keyword = Some(self.raw(kw));
            entity.type_text = Some(self.render((start..end).filter(|&i| i != name)));
            entity.flags.is_definition = true;
            entity.flags.is_member = false;
            entity.flags.is_function_pointer = fn_ptr.is_some();
            self.model.push_entity(entity);
        }
        self.pos = end;
        if self.punct_at(self.pos, ";") {
            self.pos += 1;
        }
    }

    /// Alias names after `typedef struct {...}`.
    fn typedef_names(&mut self, kw: usize, scope: ScopeId) {
        loop {
            while self
                .peek()
                .is_some_and(|t| matches!(t.text.as_str(), "*" | "&" | "const" | "volatile"))
            {
                self.pos += 1;
            }
            if !self.ident_at(self.pos) {
                break;
            }
            let mut entity = self.new_entity(EntityKind::TypeAlias, self.pos, scope);
            entity.keyword = Some(self.raw(kw));
            entity.flags.is_definition = true;
            entity.flags.is_member = false;
            self.model.push_entity(entity);
            self.pos += 1;
            while self.punct_at(self.pos, "[") {
                match self.matching(self.pos) {
                    Some(close) => self.pos = close + 1,
                    None => break,
                }
            }
            if self.punct_at(self.pos, ",") {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.finish_after_body();
    }

    fn tag_has_body(&self, from: usize) -> bool {
        let mut i = from;
        while let Some(t) = self.at(i) {
            if t.is_punct("{") {
                return true;
            }
            if t.is_punct(";") || t.is_punct("}") || t.is_punct("(") {
                return false;
            }
            i += 1;
        }
        false
    }

    /// Finds the `[` matching the `]` at `close`, scanning back to `floor`.
    fn opening_bracket(&self, floor: usize, close: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = close + 1;
        while i > floor {
            i -= 1;
            if self.punct_at(i, "]") {
                depth += 1;
            } else if self.punct_at(i, "[") {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    // ── Declarations ──

    fn parse_declaration(&mut self, scope: ScopeId) {
        let start = self.pos;
        if self.try_declaration(scope) {
            if self.punct_at(self.pos, ";") {
                self.pos += 1;
            }
            return;
        }
        self.pos = start;
        if !self.skip_macro_invocation() {
            self.skip_statement();
        }
        if !self.in_block(scope) {
            self.note(start, "unrecognized declaration");
        }
    }

    /// Skips `NAME` or `NAME(...)` when the next token starts a new line and
    /// does not continue the statement.
    fn skip_macro_invocation(&mut self) -> bool {
        if !self.ident_at(self.pos) {
            return false;
        }
        let end = if self.punct_at(self.pos + 1, "(") {
            match self.matching(self.pos + 1) {
                Some(close) => close,
                None => return false,
            }
        } else {
            self.pos
        };
        let Some(next) = self.at(end + 1) else {
            return false;
        };
        let same_line = next.span.start_pos.line == self.span_at(end).end_pos.line;
        let continues = next.kind == TokenKind::Punct
            && matches!(next.text.as_str(), ";" | "{" | ":" | "," | "=" | "(");
        if same_line || continues {
            return false;
        }
        self.pos = end + 1;
        true
    }

    fn scan_head(&self, from: usize) -> Head {
        let mut head = Head::default();
        let mut i = from;
        while let Some(t) = self.at(i) {
            match t.kind {
                TokenKind::Keyword if SPECIFIERS.contains(&t.text.as_str()) => {
                    match t.text.as_str() {
                        "static" => head.specs.is_static = true,
                        "extern" => head.specs.is_extern = true,
                        "constexpr" | "constinit" | "consteval" => head.specs.is_constexpr = true,
                        "thread_local" => head.specs.is_thread_local = true,
                        _ => {}
                    }
                    i += 1;
                }
                TokenKind::Keyword
                    if TYPE_PART_KEYWORDS.contains(&t.text.as_str())
                        || is_type_keyword(&t.text) =>
                {
                    head.parts.push(i);
                    i += 1;
                }
                TokenKind::Keyword if t.text == "decltype" && self.punct_at(i + 1, "(") => {
                    let Some(close) = self.matching(i + 1) else {
                        break;
                    };
                    head.parts.extend(i..=close);
                    i = close + 1;
                }
                TokenKind::Keyword | TokenKind::Identifier
                    if ANNOTATIONS.contains(&t.text.as_str()) && self.punct_at(i + 1, "(") =>
                {
                    let Some(close) = self.matching(i + 1) else {
                        break;
                    };
                    i = close + 1;
                }
                TokenKind::Identifier => {
                    head.parts.push(i);
                    i += 1;
                    if self.punct_at(i, "<") {
                        if let Some(close) = self.matching_angle(i) {
                            head.parts.extend(i..=close);
                            i = close + 1;
                        }
                    }
                }
                TokenKind::Punct => match t.text.as_str() {
                    "::" | "*" | "&" | "&&" | "..." => {
                        head.parts.push(i);
                        i += 1;
                    }
                    "[" if self.punct_at(i + 1, "[") => {
                        let Some(close) = self.matching(i) else {
                            break;
                        };
                        i = close + 1;
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        head.stop = i;
        head
    }

    /// Splits a trailing (possibly qualified) name off `parts`. When
    /// `named` is false the parts end at a `::` (operator or destructor).
    fn split_declarator(&self, parts: &[usize], named: bool) -> Declarator {
        let mut j = parts.len();
        if named {
            j -= 1;
        }
        let mut qualified = false;
        let mut qualifier_last = None;
        while j > 0 && self.punct_at(parts[j - 1], "::") {
            qualified = true;
            j -= 1;
            if j > 0 && self.punct_at(parts[j - 1], ">") {
                let mut depth = 0usize;
                while j > 0 {
                    j -= 1;
                    if self.punct_at(parts[j], ">") {
                        depth += 1;
                    } else if self.punct_at(parts[j], "<") {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
            }
            if j > 0 && self.ident_at(parts[j - 1]) {
                j -= 1;
                if qualifier_last.is_none() {
                    qualifier_last = self.at(parts[j]).map(|t| t.text.clone());
                }
            }
        }
        Declarator {
            type_len: j,
            qualified,
            qualifier_last,
        }
    }

    fn has_type_token(&self, parts: &[usize]) -> bool {
        parts.iter().any(|&i| {
            self.at(i).is_some_and(|t| {
                t.is_ident()
                    || (t.kind == TokenKind::Keyword
                        && (is_type_keyword(&t.text) || t.text == "decltype"))
            })
        })
    }

    fn enclosing_class_name(&self, scope: ScopeId) -> Option<&str> {
        let sem = self.model.semantic_scope(scope);
        if sem.kind != ScopeKind::Class {
            return None;
        }
        self.model.owner(sem.id).map(|e| e.name.as_str())
    }

    fn try_declaration(&mut self, scope: ScopeId) -> bool {
        let head = self.scan_head(self.pos);
        let stop = head.stop;
        let Some(stop_tok) = self.at(stop) else {
            return false;
        };

        // operator@ / conversion functions
        if stop_tok.is_keyword("operator") {
            return self.parse_operator(scope, &head);
        }

        // ~Destructor(
        if stop_tok.is_punct("~") && self.ident_at(stop + 1) && self.punct_at(stop + 2, "(") {
            let decl = self.split_declarator(&head.parts, false);
            let mut flags = EntityFlags {
                is_special: true,
                is_qualified: decl.qualified,
                ..EntityFlags::default()
            };
            flags.is_static = head.specs.is_static;
            let name = format!("~{}", self.at(stop + 1).map_or("", |t| t.text.as_str()));
            return self.parse_function(scope, &head, &decl, stop + 1, Some(name), stop + 2, flags);
        }

        if stop_tok.is_punct("(") {
            if let Some(name) = self.function_pointer_name(stop) {
                if !head.parts.is_empty() && self.has_type_token(&head.parts) {
                    return self.parse_function_pointer(scope, &head, stop, name);
                }
                return false;
            }
            let Some(&last) = head.parts.last() else {
                return false;
            };
            if !self.ident_at(last) {
                return false;
            }
            let decl = self.split_declarator(&head.parts, true);
            let type_parts = &head.parts[..decl.type_len];

            if type_parts.is_empty() || !self.has_type_token(type_parts) {
                let name_text = self.at(last).map(|t| t.text.as_str()).unwrap_or_default();
                let is_ctor = if decl.qualified {
                    decl.qualifier_last.as_deref() == Some(name_text)
                } else {
                    self.enclosing_class_name(scope) == Some(name_text)
                };
                if !is_ctor || !type_parts.is_empty() {
                    return false;
                }
                let flags = EntityFlags {
                    is_special: true,
                    is_qualified: decl.qualified,
                    ..EntityFlags::default()
                };
                return self.parse_function(scope, &head, &decl, last, None, stop, flags);
            }

            let Some(close) = self.matching(stop) else {
                return false;
            };
            if self.in_block(scope) {
                if stop + 1 == close || self.looks_like_params(stop + 1, close) {
                    // Local function declaration or most vexing parse.
                    return false;
                }
                return self.parse_variables(scope, &head, &decl, last, Confidence::High);
            }
            return match self.classify_parens(scope, stop + 1, close) {
                Some(confidence) => self.parse_variables(scope, &head, &decl, last, confidence),
                None => {
                    let flags = EntityFlags {
                        is_qualified: decl.qualified,
                        is_static: head.specs.is_static,
                        storage: head.specs.storage(),
                        is_constexpr: head.specs.is_constexpr,
                        ..EntityFlags::default()
                    };
                    self.parse_function(scope, &head, &decl, last, None, stop, flags)
                }
            };
        }

        let terminates = stop_tok.kind == TokenKind::Punct
            && matches!(
                stop_tok.text.as_str(),
                "=" | ";" | "{" | "[" | "," | ":" | ")"
            );
        if !terminates {
            return false;
        }
        let Some(&last) = head.parts.last() else {
            return false;
        };
        if !self.ident_at(last) {
            return false;
        }
        let decl = self.split_declarator(&head.parts, true);
        let type_parts = &head.parts[..decl.type_len];
        if type_parts.is_empty() || !self.has_type_token(type_parts) {
            return false;
        }
        if self.punct_at(type_parts[0], "*") || self.punct_at(type_parts[0], "&") {
            return false;
        }
        self.parse_variables(scope, &head, &decl, last, Confidence::High)
    }

    /// Recognizes `( [Class::] * name )` at `open`, returning the name index.
    fn function_pointer_name(&self, open: usize) -> Option<usize> {
        let close = self.matching(open)?;
        if close < open + 3 || !self.ident_at(close - 1) {
            return None;
        }
        let inner = open + 1..close - 1;
        let has_indirection = inner.clone().any(|i| {
            self.at(i)
                .is_some_and(|t| matches!(t.text.as_str(), "*" | "&" | "^") && t.kind == TokenKind::Punct)
        });
        let all_declarator = inner.clone().all(|i| {
            self.at(i).is_some_and(|t| {
                t.is_ident()
                    || t.is_keyword("const")
                    || matches!(t.text.as_str(), "*" | "&" | "^" | "::")
            })
        });
        let followed = self.punct_at(close + 1, "(") || self.punct_at(close + 1, "[");
        (has_indirection && all_declarator && followed).then_some(close - 1)
    }

    fn parse_function_pointer(&mut self, scope: ScopeId, head: &Head, open: usize, name: usize) -> bool {
        let Some(close) = self.matching(open) else {
            return false;
        };
        let mut entity = self.new_entity(EntityKind::Variable, name, scope);
        entity.type_text = Some(format!("{}(*)", self.render(head.parts.iter().copied())));
        entity.flags.is_function_pointer = true;
        entity.flags.is_static = head.specs.is_static;
        entity.flags.is_constexpr = head.specs.is_constexpr;
        entity.flags.storage = head.specs.storage();
        entity.confidence = Confidence::Low;
        self.pos = close + 1;
        while self.punct_at(self.pos, "(") || self.punct_at(self.pos, "[") {
            match self.matching(self.pos) {
                Some(c) => self.pos = c + 1,
                None => break,
            }
        }
        self.parse_initializer_into(&mut entity);
        self.model.push_entity(entity);
        if self.punct_at(self.pos, ",") || !self.punct_at(self.pos, ";") {
            self.skip_rest_of_statement();
        }
        true
    }

    fn parse_operator(&mut self, scope: ScopeId, head: &Head) -> bool {
        let kw = head.stop;
        let mut i = kw + 1;
        let mut name = String::from("operator");
        if self.punct_at(i, "(") && self.punct_at(i + 1, ")") {
            name.push_str("()");
            i += 2;
        } else {
            let mut taken = 0;
            while let Some(t) = self.at(i) {
                if t.is_punct("(") || taken > 6 || t.is_punct(";") || t.is_punct("{") {
                    break;
                }
                if t.kind.is_word() && name.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                    name.push(' ');
                }
                name.push_str(&t.text);
                taken += 1;
                i += 1;
            }
        }
        if !self.punct_at(i, "(") {
            return false;
        }
        let decl = self.split_declarator(&head.parts, false);
        let flags = EntityFlags {
            is_special: true,
            is_qualified: decl.qualified,
            is_static: head.specs.is_static,
            ..EntityFlags::default()
        };
        self.parse_function(scope, head, &decl, kw, Some(name), i, flags)
    }

    /// Decides whether `T x(...)` at namespace/class scope is an object.
    /// Returns the confidence of an object reading, or `None` for a function.
    fn classify_parens(&self, scope: ScopeId, from: usize, to: usize) -> Option<Confidence> {
        if from == to {
            return None;
        }
        let pieces = self.split_top_level(from, to);
        let literal_like = pieces.iter().any(|&(a, _)| {
            self.at(a).is_some_and(|t| {
                t.kind.is_literal()
                    || matches!(
                        t.text.as_str(),
                        "nullptr" | "true" | "false" | "this" | "&" | "-" | "!" | "{" | "new"
                    )
            })
        });
        if literal_like {
            return Some(Confidence::High);
        }
        let known_objects = pieces.iter().all(|&(a, b)| {
            b == a + 1
                && self.at(a).is_some_and(|t| {
                    t.is_ident()
                        && self.model.lookup(scope, &t.text).any(|e| {
                            matches!(
                                e.kind,
                                EntityKind::Variable
                                    | EntityKind::Constant
                                    | EntityKind::EnumVariant
                                    | EntityKind::Parameter
                            )
                        })
                })
        });
        known_objects.then_some(Confidence::High)
    }

    fn looks_like_params(&self, from: usize, to: usize) -> bool {
        self.split_top_level(from, to).iter().all(|&(a, b)| {
            let end = self.first_top_level(a, b, "=").unwrap_or(b);
            let single_type = end == a + 1
                && self
                    .at(a)
                    .is_some_and(|t| t.kind == TokenKind::Keyword && is_type_keyword(&t.text));
            let typed_name = end >= a + 2
                && self.ident_at(end - 1)
                && self.has_type_token(&(a..end - 1).collect::<Vec<_>>())
                && (a..end).all(|i| {
                    self.at(i).is_some_and(|t| {
                        t.kind.is_word()
                            || matches!(t.text.as_str(), "::" | "*" | "&" | "&&" | "<" | ">" | ",")
                    })
                });
            single_type || typed_name
        })
    }

    /// Splits `[from, to)` at top-level commas.
    fn split_top_level(&self, from: usize, to: usize) -> Vec<(usize, usize)> {
        let mut pieces = Vec::new();
        let mut depth = 0usize;
        let mut angle = 0usize;
        let mut piece_start = from;
        for i in from..to {
            let Some(t) = self.at(i) else { break };
            if t.kind != TokenKind::Punct {
                continue;
            }
            match t.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                "<" if i > from && self.at(i - 1).is_some_and(|p| p.is_ident() || p.is_keyword("template")) => {
                    angle += 1;
                }
                ">" if angle > 0 => angle -= 1,
                "," if depth == 0 && angle == 0 => {
                    pieces.push((piece_start, i));
                    piece_start = i + 1;
                }
                _ => {}
            }
        }
        if piece_start < to {
            pieces.push((piece_start, to));
        }
        pieces
    }

    fn first_top_level(&self, from: usize, to: usize, p: &str) -> Option<usize> {
        let mut depth = 0usize;
        let mut angle = 0usize;
        for i in from..to {
            let t = self.at(i)?;
            if t.kind != TokenKind::Punct {
                continue;
            }
            match t.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                "<" if i > from && self.ident_at(i - 1) => angle += 1,
                ">" if angle > 0 => angle -= 1,
                s if s == p && depth == 0 && angle == 0 => return Some(i),
                _ => {}
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_function(
        &mut self,
        scope: ScopeId,
        head: &Head,
        decl: &Declarator,
        name_idx: usize,
        name_override: Option<String>,
        open: usize,
        mut flags: EntityFlags,
    ) -> bool {
        let Some(close) = self.matching(open) else {
            return false;
        };
        let sem_kind = self.model.semantic_scope(scope).kind;
        let kind = if sem_kind == ScopeKind::Class {
            EntityKind::Method
        } else {
            EntityKind::Function
        };
        flags.is_member = sem_kind == ScopeKind::Class;
        flags.is_static = flags.is_static || head.specs.is_static;
        flags.is_constexpr = flags.is_constexpr || head.specs.is_constexpr;
        flags.storage = head.specs.storage();

        let mut entity = self.new_entity(kind, name_idx, scope);
        if let Some(name) = name_override {
            entity.name = name;
        }
        entity.flags = flags;
        let type_parts = &head.parts[..decl.type_len];
        if !type_parts.is_empty() {
            entity.type_text = Some(self.render(type_parts.iter().copied()));
        }
        let id = self.model.push_entity(entity);

        let open_span = self.span_at(open);
        let fscope = self
            .model
            .push_scope(ScopeKind::Function, scope, Some(id), open_span);
        let signature = self.parse_params(open + 1, close, fscope);
        {
            let entity = self.model.entity_mut(id);
            entity.body = Some(fscope);
            entity.signature = Some(signature);
        }

        self.pos = close + 1;
        self.skip_function_suffix(id);

        match self.peek() {
            Some(t) if t.is_punct(";") => {
                self.pos += 1;
            }
            Some(t) if t.is_punct("{") => {
                self.model.entity_mut(id).flags.is_definition = true;
                self.pos += 1;
                self.parse_block(fscope);
                while self.keyword_at(self.pos, "catch") {
                    self.pos += 1;
                    self.parse_catch(fscope);
                }
            }
            _ => self.skip_statement(),
        }
        self.close_scope(fscope, open_span);
        true
    }

    /// Skips cv/ref qualifiers, `noexcept`, trailing return types, pure
    /// specifiers and constructor initializer lists after a parameter list.
    fn skip_function_suffix(&mut self, id: EntityId) {
        while let Some(t) = self.peek() {
            match (t.kind, t.text.as_str()) {
                (TokenKind::Keyword, "const" | "volatile" | "mutable" | "try")
                | (TokenKind::Punct, "&" | "&&") => self.pos += 1,
                (TokenKind::Identifier, "override" | "final") => {
                    self.model.entity_mut(id).flags.is_override = true;
                    self.pos += 1;
                }
                (TokenKind::Keyword, "noexcept" | "throw") => {
                    self.pos += 1;
                    if self.punct_at(self.pos, "(") {
                        match self.matching(self.pos) {
                            Some(c) => self.pos = c + 1,
                            None => return,
                        }
                    }
                }
                (TokenKind::Keyword, "requires") => {
                    self.pos += 1;
                    while let Some(t) = self.peek() {
                        if t.is_punct("{") || t.is_punct(";") || t.is_punct("}") {
                            break;
                        }
                        if t.is_punct("(") {
                            match self.matching(self.pos) {
                                Some(c) => self.pos = c,
                                None => return,
                            }
                        }
                        self.pos += 1;
                    }
                }
                (TokenKind::Punct, "->") => {
                    self.pos += 1;
                    while let Some(t) = self.peek() {
                        if t.is_punct("{") || t.is_punct(";") || t.is_punct("=") || t.is_punct("}") {
                            break;
                        }
                        if t.is_punct("<") {
                            if let Some(c) = self.matching_angle(self.pos) {
                                self.pos = c;
                            }
                        } else if t.is_punct("(") {
                            match self.matching(self.pos) {
                                Some(c) => self.pos = c,
                                None => return,
                            }
                        }
                        self.pos += 1;
                    }
                }
                (TokenKind::Punct, "=") => {
                    // = 0, = default, = delete
                    self.pos += 1;
                    if self
                        .peek()
                        .is_some_and(|t| !t.is_punct(";") && !t.is_punct("{"))
                    {
                        self.pos += 1;
                    }
                }
                (TokenKind::Punct, ":") => self.skip_ctor_initializers(),
                (TokenKind::Punct, "[") if self.punct_at(self.pos + 1, "[") => {
                    self.skip_attribute();
                }
                (_, text) if ANNOTATIONS.contains(&text) => {
                    if !self.skip_attribute() {
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_ctor_initializers(&mut self) {
        self.pos += 1;
        loop {
            while let Some(t) = self.peek() {
                if !(t.is_ident() || t.is_punct("::") || (t.kind == TokenKind::Keyword && t.text != "try")) {
                    break;
                }
                self.pos += 1;
                if self.punct_at(self.pos, "<") {
                    if let Some(c) = self.matching_angle(self.pos) {
                        self.pos = c + 1;
                    }
                }
            }
            if self.punct_at(self.pos, "(") || self.punct_at(self.pos, "{") {
                match self.matching(self.pos) {
                    Some(c) => self.pos = c + 1,
                    None => return,
                }
            } else {
                return;
            }
            if self.punct_at(self.pos, "...") {
                self.pos += 1;
            }
            if self.punct_at(self.pos, ",") {
                self.pos += 1;
            } else {
                return;
            }
        }
    }

    fn parse_params(&mut self, from: usize, to: usize, fscope: ScopeId) -> Signature {
        let mut signature = Signature::default();
        let pieces = self.split_top_level(from, to);
        if let [(a, b)] = pieces[..] {
            if b == a + 1 && self.keyword_at(a, "void") {
                return signature;
            }
        }
        for (a, b) in pieces {
            let mut a = a;
            while self.punct_at(a, "[") && self.punct_at(a + 1, "[") {
                match self.matching(a) {
                    Some(c) => a = c + 1,
                    None => break,
                }
            }
            let end = self.first_top_level(a, b, "=").unwrap_or(b);
            if end <= a {
                continue;
            }
            if end == a + 1 && self.punct_at(a, "...") {
                signature.variadic = true;
                continue;
            }
            let span = self.span_at(a).to(&self.span_at(end - 1));

            let fn_ptr = (a..end)
                .find(|&i| self.punct_at(i, "("))
                .and_then(|open| self.function_pointer_name(open));
            let (name_idx, type_text, confidence, is_fn_ptr) = if let Some(name) = fn_ptr {
                (
                    Some(name),
                    self.render((a..end).filter(|&i| i != name)),
                    Confidence::Low,
                    true,
                )
            } else {
                let mut decl_end = end;
                while decl_end > a + 1 && self.punct_at(decl_end - 1, "]") {
                    decl_end = self.opening_bracket(a, decl_end - 1).unwrap_or(a);
                }
                let named = decl_end >= a + 2
                    && self.ident_at(decl_end - 1)
                    && !self.punct_at(decl_end - 2, "::")
                    && self.has_type_token(&(a..decl_end - 1).collect::<Vec<_>>());
                if named {
                    (
                        Some(decl_end - 1),
                        self.render(a..decl_end - 1),
                        Confidence::High,
                        false,
                    )
                } else {
                    (None, self.render(a..end), Confidence::High, false)
                }
            };

            let mut param = Param {
                type_text: type_text.clone(),
                name: None,
                entity: None,
                span,
            };
            if let Some(name) = name_idx {
                let type_parts: Vec<usize> = (a..name).collect();
                let mut entity = self.new_entity(EntityKind::Parameter, name, fscope);
                entity.type_text = Some(type_text);
                entity.flags.is_member = false;
                entity.flags.is_function_pointer = is_fn_ptr;
                entity.flags.is_pointer = !is_fn_ptr && self.pointer_depth(&type_parts) > 0;
                entity.flags.is_const = self.top_level_const(&type_parts);
                entity.confidence = confidence;
                if end + 1 < b {
                    entity.initializer = Some(self.raw(end + 1)..self.raw(b - 1) + 1);
                }
                param.name = Some(entity.name.clone());
                param.entity = Some(self.model.push_entity(entity));
            }
            signature.params.push(param);
        }
        signature
    }

    /// Number of `*` declarator operators outside template arguments.
    fn pointer_depth(&self, parts: &[usize]) -> usize {
        let mut angle = 0usize;
        let mut count = 0;
        for &i in parts {
            let Some(t) = self.at(i) else { continue };
            match t.text.as_str() {
                "<" if t.kind == TokenKind::Punct => angle += 1,
                ">" if t.kind == TokenKind::Punct && angle > 0 => angle -= 1,
                "*" if t.kind == TokenKind::Punct && angle == 0 => count += 1,
                _ => {}
            }
        }
        count
    }

    /// Top-level const: `const` after the last `*`, or anywhere when the
    /// declarator is not a pointer.
    fn top_level_const(&self, parts: &[usize]) -> bool {
        let mut angle = 0usize;
        let mut seen_const = false;
        for &i in parts {
            let Some(t) = self.at(i) else { continue };
            match t.text.as_str() {
                "<" if t.kind == TokenKind::Punct => angle += 1,
                ">" if t.kind == TokenKind::Punct && angle > 0 => angle -= 1,
                "*" if t.kind == TokenKind::Punct && angle == 0 => seen_const = false,
                "const" if angle == 0 => seen_const = true,
                _ => {}
            }
        }
        seen_const
    }

    fn is_reference(&self, parts: &[usize]) -> bool {
        parts
            .iter()
            .rev()
            .take_while(|&&i| !self.ident_at(i) && !self.punct_at(i, ">"))
            .any(|&i| self.punct_at(i, "&") || self.punct_at(i, "&&"))
    }

    /// Parses one or more object declarators starting with the one named at
    /// `first_name`, whose type is `parts[..decl.type_len]`.
    fn parse_variables(
        &mut self,
        scope: ScopeId,
        head: &Head,
        decl: &Declarator,
        first_name: usize,
        confidence: Confidence,
    ) -> bool {
        let type_parts: Vec<usize> = head.parts[..decl.type_len].to_vec();
        // Base type is everything up to the last type-naming token.
        let base_len = type_parts
            .iter()
            .rposition(|&i| {
                self.at(i).is_some_and(|t| {
                    t.is_ident()
                        || t.is_punct(">")
                        || t.is_punct(")")
                        || (t.kind == TokenKind::Keyword && t.text != "const" && t.text != "volatile")
                })
            })
            .map_or(0, |p| p + 1);
        let base: Vec<usize> = type_parts[..base_len].to_vec();
        let base_const = self.top_level_const(&base);

        let mut declarator: Vec<usize> = type_parts[base_len..].to_vec();
        let mut name = first_name;
        self.pos = name + 1;
        loop {
            let mut all: Vec<usize> = base.clone();
            all.extend(&declarator);
            let pointer = self.pointer_depth(&declarator) > 0;
            let reference = self.is_reference(&all);
            let top_const = if pointer {
                self.top_level_const(&declarator)
            } else {
                base_const || declarator.iter().any(|&i| self.keyword_at(i, "const"))
            };

            let mut entity = self.new_entity(EntityKind::Variable, name, scope);
            entity.type_text = Some(self.render(all.iter().copied()));
            entity.flags.is_const = top_const;
            entity.flags.is_constexpr = head.specs.is_constexpr;
            entity.flags.is_static = head.specs.is_static;
            entity.flags.storage = head.specs.storage();
            entity.flags.is_pointer = pointer;
            entity.flags.is_qualified = decl.qualified;
            entity.confidence = confidence;

            while self.punct_at(self.pos, "[") {
                match self.matching(self.pos) {
                    Some(c) => self.pos = c + 1,
                    None => break,
                }
            }
            self.parse_initializer_into(&mut entity);
            entity.kind = self.object_kind(scope, &entity, reference);
            self.model.push_entity(entity);

            if !self.punct_at(self.pos, ",") {
                break;
            }
            self.pos += 1;
            declarator.clear();
            while self.peek().is_some_and(|t| {
                matches!(t.text.as_str(), "*" | "&" | "&&" | "const" | "volatile")
            }) {
                declarator.push(self.pos);
                self.pos += 1;
            }
            if !self.ident_at(self.pos) {
                break;
            }
            name = self.pos;
            self.pos += 1;
        }
        if !self.punct_at(self.pos, ";") && self.peek().is_some() && !self.in_block(scope) {
            self.skip_rest_of_statement();
        }
        true
    }

    fn skip_rest_of_statement(&mut self) {
        match self.statement_end(self.pos) {
            StatementEnd::Semi(i) => self.pos = i,
            StatementEnd::Group(i) => self.pos = i + 1,
            StatementEnd::Closer(i) => self.pos = i,
            StatementEnd::Eof => self.pos = self.limit,
        }
    }

    /// Consumes `= expr`, `{...}`, `(...)` or a bit-field width after a
    /// declarator and records the initializer range.
    fn parse_initializer_into(&mut self, entity: &mut Entity) {
        match self.peek() {
            Some(t) if t.is_punct("=") => {
                let start = self.pos + 1;
                let end = self.skip_initializer(start);
                if end > start {
                    entity.initializer = Some(self.raw(start)..self.raw(end - 1) + 1);
                }
                entity.flags.is_definition = true;
                self.pos = end;
            }
            Some(t) if t.is_punct("{") || t.is_punct("(") => {
                if let Some(close) = self.matching(self.pos) {
                    if close > self.pos + 1 {
                        entity.initializer = Some(self.raw(self.pos + 1)..self.raw(close - 1) + 1);
                    }
                    entity.flags.is_definition = true;
                    self.pos = close + 1;
                } else {
                    self.pos = self.limit;
                }
            }
            Some(t) if t.is_punct(":") && entity.flags.is_member => {
                self.pos = self.skip_initializer(self.pos + 1);
            }
            _ => {}
        }
    }

    /// Index of the top-level `,`, `;` or unbalanced closer ending an
    /// initializer that starts at `from`.
    fn skip_initializer(&self, from: usize) -> usize {
        let mut depth = 0usize;
        let mut i = from;
        while let Some(t) = self.at(i) {
            if t.kind == TokenKind::Punct {
                match t.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return i;
                        }
                        depth -= 1;
                    }
                    "," | ";" if depth == 0 => return i,
                    _ => {}
                }
            }
            i += 1;
        }
        i
    }

    fn object_kind(&self, scope: ScopeId, entity: &Entity, reference: bool) -> EntityKind {
        let sem = self.model.semantic_scope(scope).kind;
        let flags = entity.flags;
        if flags.is_constexpr {
            return EntityKind::Constant;
        }
        if !flags.is_const || reference {
            return EntityKind::Variable;
        }
        match sem {
            ScopeKind::File | ScopeKind::Namespace if !self.is_mutated_after(entity) => {
                EntityKind::Constant
            }
            ScopeKind::Class if flags.is_static => EntityKind::Constant,
            _ => EntityKind::Variable,
        }
    }

    /// Looks for assignment or increment syntax on the entity's name after
    /// its declaration.
    fn is_mutated_after(&self, entity: &Entity) -> bool {
        let Ok(start) = self.sig.binary_search(&entity.token) else {
            return false;
        };
        let after_decl = entity
            .initializer
            .as_ref()
            .and_then(|r| self.sig.binary_search(&(r.end - 1)).ok())
            .map_or(start + 1, |i| i + 1);
        (after_decl..self.sig.len()).any(|i| {
            let t = &self.tokens[self.sig[i]];
            if !t.is_ident_named(&entity.name) {
                return false;
            }
            let next = self.sig.get(i + 1).map(|&r| &self.tokens[r]);
            let prev = i.checked_sub(1).map(|p| &self.tokens[self.sig[p]]);
            let assigned = next.is_some_and(|n| {
                n.kind == TokenKind::Punct && ASSIGNMENT_OPS.contains(&n.text.as_str())
            });
            let incremented = prev.is_some_and(|p| p.is_punct("++") || p.is_punct("--"));
            assigned || incremented
        })
    }

    // ── Statements ──

    fn parse_block(&mut self, scope: ScopeId) {
        loop {
            let Some(t) = self.peek() else {
                self.note(self.pos.saturating_sub(1), "unterminated block");
                return;
            };
            if t.is_punct("}") {
                self.pos += 1;
                return;
            }
            self.parse_statement(scope);
        }
    }

    fn parse_statement(&mut self, scope: ScopeId) {
        let Some(t) = self.peek() else {
            return;
        };
        let start = self.pos;
        match (t.kind, t.text.as_str()) {
            (TokenKind::Punct, "{") => {
                let open_span = self.span_at(self.pos);
                let block = self
                    .model
                    .push_scope(ScopeKind::Block, scope, None, open_span);
                self.pos += 1;
                self.parse_block(block);
                self.close_scope(block, open_span);
            }
            (TokenKind::Punct, ";") => self.pos += 1,
            (TokenKind::Punct, "}") => {}
            (TokenKind::Keyword, "if" | "while" | "switch" | "for") => self.parse_control(scope),
            (TokenKind::Keyword, "else" | "do" | "try") => {
                self.pos += 1;
                self.parse_statement(scope);
            }
            (TokenKind::Keyword, "catch") => {
                self.pos += 1;
                self.parse_catch(scope);
            }
            (TokenKind::Keyword, "case" | "default") => {
                while let Some(t) = self.peek() {
                    self.pos += 1;
                    if t.is_punct(":") || t.is_punct(";") {
                        break;
                    }
                }
            }
            (
                TokenKind::Keyword,
                "return" | "throw" | "break" | "continue" | "goto" | "co_return" | "co_yield"
                | "co_await" | "delete",
            ) => self.skip_statement(),
            (
                TokenKind::Keyword,
                "class" | "struct" | "union" | "enum" | "using" | "typedef" | "template"
                | "static_assert" | "namespace",
            ) => self.parse_item(scope),
            (TokenKind::Identifier, _) if self.punct_at(self.pos + 1, ":") => self.pos += 2,
            (TokenKind::Punct, "[") if self.punct_at(self.pos + 1, "[") => {
                self.skip_attribute();
            }
            _ => {
                if self.try_declaration(scope) {
                    if self.punct_at(self.pos, ";") {
                        self.pos += 1;
                    } else if self.peek().is_some_and(|t| !t.is_punct("}")) {
                        self.skip_statement();
                    }
                } else {
                    self.pos = start;
                    self.skip_statement();
                }
            }
        }
        if self.pos == start && self.peek().is_some_and(|t| !t.is_punct("}")) {
            self.pos += 1;
        }
    }

    /// `if`/`while`/`switch`/`for`: the parenthesized header may declare
    /// objects scoped to the statement.
    fn parse_control(&mut self, scope: ScopeId) {
        let kw = self.pos;
        self.pos += 1;
        if self.keyword_at(self.pos, "constexpr") {
            self.pos += 1;
        }
        if !self.punct_at(self.pos, "(") {
            return;
        }
        let open = self.pos;
        let Some(close) = self.matching(open) else {
            self.skip_statement();
            return;
        };
        let kw_span = self.span_at(kw);
        let stmt_scope = self
            .model
            .push_scope(ScopeKind::Block, scope, None, kw_span);

        let saved_limit = self.limit;
        self.limit = close;
        self.pos = open + 1;
        if self.pos < close {
            let _ = self.try_declaration(stmt_scope);
        }
        self.limit = saved_limit;

        self.pos = close + 1;
        if self.peek().is_some() {
            self.parse_statement(stmt_scope);
        }
        self.close_scope(stmt_scope, kw_span);
    }

    fn parse_catch(&mut self, scope: ScopeId) {
        let kw_span = self.prev_span();
        let catch_scope = self
            .model
            .push_scope(ScopeKind::Block, scope, None, kw_span);
        if self.punct_at(self.pos, "(") {
            match self.matching(self.pos) {
                Some(close) => self.pos = close + 1,
                None => {
                    self.skip_statement();
                    return;
                }
            }
        }
        if self.punct_at(self.pos, "{") {
            self.pos += 1;
            self.parse_block(catch_scope);
        }
        self.close_scope(catch_scope, kw_span);
    }

    // ── Preprocessor ──

    fn extract_macros(&mut self) {
        let root = self.model.root();
        let tokens = self.tokens;
        for (raw, tok) in tokens.iter().enumerate() {
            if tok.kind != TokenKind::Directive {
                continue;
            }
            let Some(rest) = tok.text.strip_prefix('#') else {
                continue;
            };
            let Some(after) = rest.trim_start().strip_prefix("define") else {
                continue;
            };
            if !after.starts_with(|c: char| c.is_whitespace()) {
                continue;
            }
            let name_text = after.trim_start();
            let offset = tok.text.len() - name_text.len();
            let len = name_text
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(name_text.len());
            if len == 0 {
                continue;
            }
            let start_pos = advance(tok.span.start_pos, &tok.text[..offset]);
            let end_pos = advance(start_pos, &name_text[..len]);
            let span = Span {
                start: tok.span.start + offset,
                end: tok.span.start + offset + len,
                start_pos,
                end_pos,
            };
            self.model.push_entity(Entity {
                id: EntityId(0),
                kind: EntityKind::Macro,
                name: name_text[..len].to_string(),
                scope: root,
                span,
                token: raw,
                keyword: None,
                type_text: None,
                initializer: None,
                body: None,
                signature: None,
                flags: EntityFlags {
                    is_definition: true,
                    ..EntityFlags::default()
                },
                confidence: Confidence::High,
            });
        }
    }
}

/// Position reached after walking over `text` from `from`.
fn advance(from: Position, text: &str) -> Position {
    text.chars().fold(from, |pos, c| {
        if c == '\n' {
            Position::new(pos.line + 1, 1)
        } else {
            Position::new(pos.line, pos.column + 1)
        }
    })
}
