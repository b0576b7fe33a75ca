//! Context types for rule execution.

use crate::types::Location;
use cxxlint_syntax::{DeclarationModel, Entity, ScopeId, Span, Token};
use std::path::{Path, PathBuf};

/// File extensions treated as headers.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl", "ipp"];

/// File extensions treated as C++ sources (headers included).
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "c++", "cppm", "ixx", "tpp", "h", "hh", "hpp", "hxx", "h++", "inl",
    "ipp",
];

/// Context provided to per-file rules.
///
/// Holds one file's text, token stream and declaration model. Everything is
/// borrowed from the per-file pipeline and discarded with it.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Absolute path to the file.
    pub path: &'a Path,
    /// Path relative to the project root.
    pub relative_path: PathBuf,
    /// File contents.
    pub content: &'a str,
    /// Full token stream, comments and directives included.
    pub tokens: &'a [Token],
    /// Declarations extracted from `tokens`.
    pub model: &'a DeclarationModel,
    /// Whether the file is a header.
    pub is_header: bool,
    /// Number of files in the current check set.
    pub check_set_size: usize,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context for a single-file check set.
    #[must_use]
    pub fn new(
        path: &'a Path,
        content: &'a str,
        tokens: &'a [Token],
        model: &'a DeclarationModel,
        root: &Path,
    ) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);
        Self {
            path,
            relative_path,
            content,
            tokens,
            model,
            is_header: Self::detect_header(path),
            check_set_size: 1,
        }
    }

    /// Sets the number of files being checked together.
    #[must_use]
    pub fn with_check_set_size(mut self, size: usize) -> Self {
        self.check_set_size = size;
        self
    }

    /// Detects a header file by extension.
    #[must_use]
    pub fn detect_header(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| HEADER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    }

    /// Location of a token span in this file.
    #[must_use]
    pub fn location(&self, span: &Span) -> Location {
        Location::from_span(self.relative_path.clone(), span)
    }

    /// Location of an entity's name.
    #[must_use]
    pub fn entity_location(&self, entity: &Entity) -> Location {
        self.location(&entity.span)
    }

    /// Location for a byte range, computing line and column from the text.
    #[must_use]
    pub fn location_at(&self, offset: usize, length: usize) -> Location {
        let offset = offset.min(self.content.len());
        let before = self.content.get(..offset).unwrap_or_default();
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Location::new(self.relative_path.clone(), line, column).with_span(offset, length)
    }

    /// Calculates the byte offset for a 1-indexed line and column.
    ///
    /// Returns the file length when out of bounds.
    #[must_use]
    pub fn offset_for(&self, line: usize, column: usize) -> usize {
        if line == 0 {
            return 0;
        }
        let mut offset = 0;
        for (i, line_content) in self.content.split_inclusive('\n').enumerate() {
            if i + 1 == line {
                let within: usize = line_content
                    .chars()
                    .take(column.saturating_sub(1))
                    .map(char::len_utf8)
                    .sum();
                return offset + within;
            }
            offset += line_content.len();
        }
        offset
    }

    /// Byte range covered by the scope a rename of `entity` may touch: the
    /// enclosing function for parameters and locals, otherwise the file.
    #[must_use]
    pub fn rename_range(&self, entity: &Entity) -> (usize, usize) {
        match self.local_scope(entity) {
            Some(scope) => {
                let span = self.model.scope(scope).span;
                (span.start, span.end)
            }
            None => (0, self.content.len()),
        }
    }

    /// Enclosing function scope for function-local entities.
    #[must_use]
    pub fn local_scope(&self, entity: &Entity) -> Option<ScopeId> {
        self.model.enclosing_function(entity.scope).map(|s| s.id)
    }

    /// Indices of identifier tokens named `name` whose start lies in `range`.
    pub fn identifier_tokens<'s>(
        &'s self,
        name: &'s str,
        range: (usize, usize),
    ) -> impl Iterator<Item = usize> + 's {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(_, t)| {
                t.is_ident_named(name) && t.span.start >= range.0 && t.span.start < range.1
            })
            .map(|(i, _)| i)
    }

    /// Previous token that is not a comment or directive.
    #[must_use]
    pub fn prev_code_token(&self, index: usize) -> Option<(usize, &'a Token)> {
        let tokens = self.tokens;
        tokens[..index.min(tokens.len())]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, t)| !t.kind.is_comment() && t.kind != cxxlint_syntax::TokenKind::Directive)
    }

    /// Next token that is not a comment or directive.
    #[must_use]
    pub fn next_code_token(&self, index: usize) -> Option<(usize, &'a Token)> {
        let tokens = self.tokens;
        tokens
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, t)| !t.kind.is_comment() && t.kind != cxxlint_syntax::TokenKind::Directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxlint_syntax::{extract, tokenize};

    fn with_ctx<R>(src: &str, path: &str, f: impl FnOnce(&FileContext) -> R) -> R {
        let tokens: Vec<Token> = tokenize(src).collect();
        let model = extract(&tokens);
        let ctx = FileContext::new(Path::new(path), src, &tokens, &model, Path::new("/proj"));
        f(&ctx)
    }

    #[test]
    fn test_detect_header() {
        assert!(FileContext::detect_header(Path::new("include/foo.h")));
        assert!(FileContext::detect_header(Path::new("foo.HPP")));
        assert!(FileContext::detect_header(Path::new("detail/impl.inl")));
        assert!(!FileContext::detect_header(Path::new("src/foo.cpp")));
        assert!(!FileContext::detect_header(Path::new("Makefile")));
    }

    #[test]
    fn test_relative_path() {
        with_ctx("", "/proj/src/a.cpp", |ctx| {
            assert_eq!(ctx.relative_path, PathBuf::from("src/a.cpp"));
        });
        with_ctx("", "/elsewhere/a.cpp", |ctx| {
            assert_eq!(ctx.relative_path, PathBuf::from("/elsewhere/a.cpp"));
        });
    }

    #[test]
    fn test_offset_calculation() {
        with_ctx("line1\nline2\nline3", "/proj/a.cpp", |ctx| {
            assert_eq!(ctx.offset_for(1, 1), 0);
            assert_eq!(ctx.offset_for(2, 1), 6);
            assert_eq!(ctx.offset_for(2, 3), 8);
        });
    }

    #[test]
    fn test_location_at_counts_characters() {
        with_ctx("int a;\n// é\nint b;", "/proj/a.cpp", |ctx| {
            let offset = ctx.content.find('b').unwrap_or_default();
            let loc = ctx.location_at(offset, 1);
            assert_eq!((loc.line, loc.column), (3, 5));
        });
    }

    #[test]
    fn test_rename_range_is_function_for_locals() {
        let src = "int g;\nvoid f(int arg) { int local = arg; }\n";
        with_ctx(src, "/proj/a.cpp", |ctx| {
            let local = ctx
                .model
                .entities()
                .iter()
                .find(|e| e.name == "local")
                .cloned();
            let local = local.unwrap_or_else(|| panic!("local not extracted"));
            let (start, end) = ctx.rename_range(&local);
            assert!(start > 0 && end <= src.len());
            assert!(src[start..end].contains("arg"));
            let global = ctx.model.entities()[0].clone();
            assert_eq!(ctx.rename_range(&global), (0, src.len()));
        });
    }
}
