//! C++ tokenizer.
//!
//! [`tokenize`] turns source text into a lazy stream of [`Token`]s. The lexer
//! is total: any input produces a token stream, and bytes that fit no token
//! class come out as [`TokenKind::Unknown`]. String and character literal
//! contents (escapes and raw-string delimiters included) and comments are
//! consumed whole, so identifiers inside them never surface as code.
//!
//! `>>` and `>>=` are never produced; they lex as `>` `>` and `>` `>=` so that
//! closing template argument lists need no context.

use std::fmt;

/// A 1-indexed line/column pair. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// A half-open byte range plus the line/column of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
    /// Position of `start`.
    pub start_pos: Position,
    /// Position of `end`.
    pub end_pos: Position,
}

impl Span {
    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true for an empty span.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `offset` lies inside the span.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if `other` lies entirely inside this span.
    #[must_use]
    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(&self, other: &Span) -> Span {
        let (start, start_pos) = if self.start <= other.start {
            (self.start, self.start_pos)
        } else {
            (other.start, other.start_pos)
        };
        let (end, end_pos) = if self.end >= other.end {
            (self.end, self.end_pos)
        } else {
            (other.end, other.end_pos)
        };
        Span {
            start,
            end,
            start_pos,
            end_pos,
        }
    }
}

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier, including contextual keywords such as `override`.
    Identifier,
    /// Reserved C++ keyword.
    Keyword,
    /// Integer or floating literal.
    Number,
    /// String literal, any prefix, raw or cooked.
    String,
    /// Character literal.
    Char,
    /// Operator or punctuator.
    Punct,
    /// `// ...` comment.
    LineComment,
    /// `/* ... */` comment.
    BlockComment,
    /// Preprocessor directive line, continuations included.
    Directive,
    /// Anything else, including unterminated literals.
    Unknown,
}

impl TokenKind {
    /// Returns true for either comment kind.
    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    /// Returns true for number, string and character literals.
    #[must_use]
    pub fn is_literal(self) -> bool {
        matches!(self, Self::Number | Self::String | Self::Char)
    }

    /// Returns true for identifiers, keywords and numbers.
    #[must_use]
    pub fn is_word(self) -> bool {
        matches!(self, Self::Identifier | Self::Keyword | Self::Number)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Identifier => "identifier",
            Self::Keyword => "keyword",
            Self::Number => "number",
            Self::String => "string",
            Self::Char => "char",
            Self::Punct => "punct",
            Self::LineComment => "line-comment",
            Self::BlockComment => "block-comment",
            Self::Directive => "directive",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A classified slice of source text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token class.
    pub kind: TokenKind,
    /// Raw source text.
    pub text: String,
    /// Location in the source.
    pub span: Span,
}

impl Token {
    /// Returns true if this is the punctuator `p`.
    #[must_use]
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    /// Returns true if this is the keyword `kw`.
    #[must_use]
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == kw
    }

    /// Returns true for identifiers.
    #[must_use]
    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Returns true if this is the identifier `name`.
    #[must_use]
    pub fn is_ident_named(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }
}

/// Reserved words, sorted for binary search.
const KEYWORDS: &[&str] = &[
    "alignas",
    "alignof",
    "and",
    "and_eq",
    "asm",
    "auto",
    "bitand",
    "bitor",
    "bool",
    "break",
    "case",
    "catch",
    "char",
    "char16_t",
    "char32_t",
    "char8_t",
    "class",
    "co_await",
    "co_return",
    "co_yield",
    "compl",
    "concept",
    "const",
    "const_cast",
    "consteval",
    "constexpr",
    "constinit",
    "continue",
    "decltype",
    "default",
    "delete",
    "do",
    "double",
    "dynamic_cast",
    "else",
    "enum",
    "explicit",
    "export",
    "extern",
    "false",
    "float",
    "for",
    "friend",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "mutable",
    "namespace",
    "new",
    "noexcept",
    "not",
    "not_eq",
    "nullptr",
    "operator",
    "or",
    "or_eq",
    "private",
    "protected",
    "public",
    "register",
    "reinterpret_cast",
    "requires",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_assert",
    "static_cast",
    "struct",
    "switch",
    "template",
    "this",
    "thread_local",
    "throw",
    "true",
    "try",
    "typedef",
    "typeid",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "void",
    "volatile",
    "wchar_t",
    "while",
    "xor",
    "xor_eq",
];

/// Keywords that name or modify a built-in type.
const TYPE_KEYWORDS: &[&str] = &[
    "auto", "bool", "char", "char16_t", "char32_t", "char8_t", "double", "float", "int", "long",
    "short", "signed", "unsigned", "void", "wchar_t",
];

/// Returns true if `word` is a reserved C++ keyword.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.binary_search(&word).is_ok()
}

/// Returns true if `word` is a built-in type keyword.
#[must_use]
pub fn is_type_keyword(word: &str) -> bool {
    TYPE_KEYWORDS.contains(&word)
}

/// Multi-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    "<=>", "->*", "...", "<<=", "::", "->", "++", "--", "&&", "||", "==", "!=", "<=", ">=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", "##", ".*",
];

const SINGLE_PUNCT: &str = "{}[]();:,.?~!+-*/%^&|=<>#";

const STRING_PREFIXES: &[&str] = &["L", "u", "U", "u8", "R", "LR", "uR", "UR", "u8R"];

const CHAR_PREFIXES: &[&str] = &["L", "u", "U", "u8"];

const MAX_RAW_DELIMITER: usize = 16;

/// Lazily tokenizes `source`. Calling again on the same text restarts the stream.
#[must_use]
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Forward-only token iterator over one source file.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `src`.
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn bump_to(&mut self, target: usize) {
        while self.pos < target && self.bump().is_some() {}
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                self.at_line_start = true;
            } else if !c.is_whitespace() {
                // A backslash-newline outside a directive is a line splice.
                if c == '\\' && self.splice_len() > 0 {
                    let n = self.splice_len();
                    for _ in 0..n {
                        self.bump();
                    }
                    continue;
                }
                break;
            }
            self.bump();
        }
    }

    /// Number of chars in a `\` + newline splice at the cursor, or 0.
    fn splice_len(&self) -> usize {
        let rest = self.rest();
        if rest.starts_with("\\\n") {
            2
        } else if rest.starts_with("\\\r\n") {
            3
        } else {
            0
        }
    }

    fn lex_line_comment(&mut self) -> TokenKind {
        self.bump_while(|c| c != '\n');
        TokenKind::LineComment
    }

    fn lex_block_comment(&mut self) -> TokenKind {
        self.bump();
        self.bump();
        match self.rest().find("*/") {
            Some(i) => {
                let target = self.pos + i + 2;
                self.bump_to(target);
            }
            None => self.bump_to(self.src.len()),
        }
        TokenKind::BlockComment
    }

    /// Consumes a directive line. Stops before a trailing comment.
    fn lex_directive(&mut self) -> (TokenKind, usize, Position) {
        let mut last_end = self.pos;
        let mut last_pos = self.here();
        while let Some(c) = self.peek() {
            match c {
                '\n' => break,
                '\\' if self.splice_len() > 0 => {
                    let n = self.splice_len();
                    for _ in 0..n {
                        self.bump();
                    }
                    continue;
                }
                '/' if matches!(self.peek_nth(1), Some('/' | '*')) => break,
                '"' | '\'' => {
                    self.lex_quoted(c);
                }
                _ => {
                    self.bump();
                }
            }
            if !c.is_whitespace() {
                last_end = self.pos;
                last_pos = self.here();
            }
        }
        (TokenKind::Directive, last_end, last_pos)
    }

    /// Consumes a quoted literal starting at `quote`. Unterminated literals
    /// stop before the newline and come back as `Unknown`.
    fn lex_quoted(&mut self, quote: char) -> TokenKind {
        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') => return TokenKind::Unknown,
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    return if quote == '"' {
                        TokenKind::String
                    } else {
                        TokenKind::Char
                    };
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Consumes a raw string body, the cursor sitting on the opening quote.
    fn lex_raw_string(&mut self) -> TokenKind {
        self.bump();
        let rest = self.rest();
        let Some(open) = rest.find('(') else {
            self.bump_while(|c| c != '\n');
            return TokenKind::Unknown;
        };
        let delimiter = &rest[..open];
        if delimiter.len() > MAX_RAW_DELIMITER
            || delimiter
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '\\' | '(' | ')' | '"'))
        {
            self.bump_while(|c| c != '\n');
            return TokenKind::Unknown;
        }
        let closing = format!("){delimiter}\"");
        let body_start = self.pos + open + 1;
        match self.src[body_start..].find(&closing) {
            Some(i) => {
                let target = body_start + i + closing.len();
                self.bump_to(target);
                TokenKind::String
            }
            None => {
                self.bump_to(self.src.len());
                TokenKind::Unknown
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let take = c.is_ascii_alphanumeric()
                || c == '_'
                || c == '.'
                || (c == '\''
                    && self
                        .peek_nth(1)
                        .is_some_and(|n| n.is_ascii_alphanumeric()))
                || (matches!(c, '+' | '-')
                    && (matches!(prev, 'p' | 'P') || (!hex && matches!(prev, 'e' | 'E'))));
            if !take {
                break;
            }
            prev = c;
            self.bump();
        }
        TokenKind::Number
    }

    fn lex_word(&mut self, start: usize) -> TokenKind {
        self.bump_while(is_ident_continue);
        let word = &self.src[start..self.pos];
        match self.peek() {
            Some('"') if STRING_PREFIXES.contains(&word) => {
                if word.ends_with('R') {
                    self.lex_raw_string()
                } else {
                    self.lex_quoted('"')
                }
            }
            Some('\'') if CHAR_PREFIXES.contains(&word) => self.lex_quoted('\''),
            _ if is_keyword(word) => TokenKind::Keyword,
            _ => TokenKind::Identifier,
        }
    }

    fn lex_punct(&mut self) -> TokenKind {
        let rest = self.rest();
        if let Some(p) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            let target = self.pos + p.len();
            self.bump_to(target);
            return TokenKind::Punct;
        }
        match self.bump() {
            Some(c) if SINGLE_PUNCT.contains(c) => TokenKind::Punct,
            _ => TokenKind::Unknown,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric())
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let c = self.peek()?;
        let start = self.pos;
        let start_pos = self.here();
        let next = self.peek_nth(1);

        let mut end_override = None;
        let kind = match c {
            '/' if next == Some('/') => self.lex_line_comment(),
            '/' if next == Some('*') => self.lex_block_comment(),
            '#' if self.at_line_start => {
                let (kind, end, end_pos) = self.lex_directive();
                end_override = Some((end, end_pos));
                kind
            }
            '"' | '\'' => self.lex_quoted(c),
            c if c.is_ascii_digit() => self.lex_number(),
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => self.lex_number(),
            c if is_ident_start(c) => self.lex_word(start),
            _ => self.lex_punct(),
        };
        self.at_line_start = false;

        let (end, end_pos) = end_override.unwrap_or((self.pos, self.here()));
        Some(Token {
            kind,
            text: self.src[start..end].to_string(),
            span: Span {
                start,
                end,
                start_pos,
                end_pos,
            },
        })
    }
}
