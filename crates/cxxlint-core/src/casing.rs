//! Identifier casing: word splitting, conversion and validation.
//!
//! Identifiers are split into words on `_` and on case boundaries:
//!
//! - a lower-case letter or digit followed by an upper-case letter
//!   (`parseHttp` -> `parse`, `Http`)
//! - an upper-case letter followed by an upper-case then lower-case letter
//!   (`HTTPServer` -> `HTTP`, `Server`)
//!
//! Acronyms are ordinary words, so an all-caps run is just a word that is
//! spelled in the wrong case for UpperCamelCase. A name is valid for a casing
//! exactly when converting it yields the name itself.

use serde::{Deserialize, Serialize};

/// Casing styles enforced on identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    /// `UpperCamelCase`
    UpperCamel,
    /// `lower_snake_case`
    LowerSnake,
    /// `UPPER_SNAKE_CASE`
    UpperSnake,
}

impl Casing {
    /// Human-readable label used in messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::UpperCamel => "UpperCamelCase",
            Self::LowerSnake => "lower_snake_case",
            Self::UpperSnake => "UPPER_SNAKE_CASE",
        }
    }

    /// Returns true if `name` is already in this casing.
    #[must_use]
    pub fn is_valid(self, name: &str) -> bool {
        convert(name, self) == name
    }
}

impl std::fmt::Display for Casing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Splits an identifier into words.
#[must_use]
pub fn split_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for segment in name.split('_').filter(|s| !s.is_empty()) {
        let chars: Vec<(usize, char)> = segment.char_indices().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let prev = chars[i - 1].1;
            let cur = chars[i].1;
            let next = chars.get(i + 1).map(|&(_, c)| c);
            let boundary = (cur.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit()))
                || (cur.is_uppercase()
                    && prev.is_uppercase()
                    && next.is_some_and(char::is_lowercase));
            if boundary {
                let at = chars[i].0;
                words.push(&segment[start..at]);
                start = at;
            }
        }
        words.push(&segment[start..]);
    }
    words
}

/// Converts `name` to `casing`.
///
/// The conversion is repeated until it is stable, so the result always
/// satisfies [`Casing::is_valid`]. Leading underscores are dropped; snake
/// cases keep a single trailing underscore.
#[must_use]
pub fn convert(name: &str, casing: Casing) -> String {
    let mut current = convert_once(name, casing);
    for _ in 0..4 {
        let next = convert_once(&current, casing);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn convert_once(name: &str, casing: Casing) -> String {
    let words = split_words(name);
    let trailing = name.ends_with('_') && !words.is_empty();
    let mut out = match casing {
        Casing::UpperCamel => words.iter().map(|w| capitalize(w)).collect::<String>(),
        Casing::LowerSnake => words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        Casing::UpperSnake => words
            .iter()
            .map(|w| w.to_uppercase())
            .collect::<Vec<_>>()
            .join("_"),
    };
    if trailing && casing != Casing::UpperCamel {
        out.push('_');
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Suggests a rename of `name` into `casing`.
///
/// Returns `None` when the name is already valid or when the converted form
/// would not be a usable identifier (empty, leading digit, or a keyword).
#[must_use]
pub fn suggest(name: &str, casing: Casing) -> Option<String> {
    let converted = convert(name, casing);
    if converted == name
        || converted.is_empty()
        || converted.starts_with(|c: char| c.is_ascii_digit())
        || cxxlint_syntax::is_keyword(&converted)
    {
        return None;
    }
    Some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("parseHttpRequest"), vec!["parse", "Http", "Request"]);
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("MAX_count"), vec!["MAX", "count"]);
        assert_eq!(split_words("__x__y"), vec!["x", "y"]);
        assert_eq!(split_words("Vec3D"), vec!["Vec3", "D"]);
        assert_eq!(split_words("vec3d"), vec!["vec3d"]);
    }

    #[test]
    fn test_upper_camel() {
        assert!(Casing::UpperCamel.is_valid("HttpServer"));
        assert!(!Casing::UpperCamel.is_valid("HTTPServer"));
        assert!(!Casing::UpperCamel.is_valid("AB"));
        assert!(!Casing::UpperCamel.is_valid("my_type"));
        assert_eq!(convert("HTTPServer", Casing::UpperCamel), "HttpServer");
        assert_eq!(convert("my_type", Casing::UpperCamel), "MyType");
        assert_eq!(convert("T", Casing::UpperCamel), "T");
    }

    #[test]
    fn test_upper_camel_reaches_fixpoint() {
        let once = convert_once("a_b_c", Casing::UpperCamel);
        assert_eq!(once, "ABC");
        assert_eq!(convert("a_b_c", Casing::UpperCamel), "Abc");
        assert!(Casing::UpperCamel.is_valid("Abc"));
    }

    #[test]
    fn test_lower_snake() {
        assert!(Casing::LowerSnake.is_valid("max_count"));
        assert!(Casing::LowerSnake.is_valid("member_"));
        assert!(Casing::LowerSnake.is_valid("vec3d"));
        assert!(!Casing::LowerSnake.is_valid("MAX_count"));
        assert!(!Casing::LowerSnake.is_valid("_hidden"));
        assert_eq!(convert("MAX_count", Casing::LowerSnake), "max_count");
        assert_eq!(convert("parseHTTPRequest", Casing::LowerSnake), "parse_http_request");
        assert_eq!(convert("count__", Casing::LowerSnake), "count_");
    }

    #[test]
    fn test_upper_snake() {
        assert!(Casing::UpperSnake.is_valid("MAX_COUNT"));
        assert!(Casing::UpperSnake.is_valid("FOO_H_"));
        assert_eq!(convert("maxCount", Casing::UpperSnake), "MAX_COUNT");
    }

    #[test]
    fn test_suggest() {
        assert_eq!(suggest("MAX_count", Casing::LowerSnake).as_deref(), Some("max_count"));
        assert_eq!(suggest("max_count", Casing::LowerSnake), None);
        assert_eq!(suggest("New", Casing::LowerSnake), None);
        assert_eq!(suggest("_", Casing::LowerSnake), None);
    }

    #[test]
    fn test_suggestion_is_valid() {
        for name in ["getHTTPResponseCode", "XMLHttpRequest", "already_fine_", "A1b2C3"] {
            for casing in [Casing::UpperCamel, Casing::LowerSnake, Casing::UpperSnake] {
                if let Some(s) = suggest(name, casing) {
                    assert!(casing.is_valid(&s), "{name} -> {s} not {casing}");
                }
            }
        }
    }
}
