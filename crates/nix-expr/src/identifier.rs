use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_'-]*$").unwrap());

/// Words that cannot appear as bare attribute names.
///
/// `import` is only a builtin in Nix, but it is quoted as well so generated
/// sets never shadow it by accident. Kept sorted for binary search.
pub const KEYWORDS: &[&str] = &[
    "assert", "else", "if", "import", "in", "inherit", "let", "or", "rec", "then", "with",
];

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.binary_search(&s).is_ok()
}

/// Whether `s` can be written as an attribute name without quotes.
pub fn is_bare_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s) && !is_keyword(s)
}

/// Render an attribute name, quoting it when it is not a bare identifier.
pub fn format_key(key: &str) -> Cow<'_, str> {
    if is_bare_identifier(key) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(format_string(key))
    }
}

/// Render a double-quoted Nix string literal.
pub fn format_string(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Escape the contents of a double-quoted Nix string.
///
/// `${` is escaped so the text is never read back as an interpolation.
pub fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => escaped.push_str("\\$"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_sorted() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KEYWORDS);
    }

    #[test]
    fn test_bare_identifier() {
        assert!(is_bare_identifier("greeting"));
        assert!(is_bare_identifier("_private"));
        assert!(is_bare_identifier("foo-bar"));
        assert!(is_bare_identifier("foo'"));
        assert!(is_bare_identifier("URL2"));
    }

    #[test]
    fn test_not_bare_identifier() {
        assert!(!is_bare_identifier(""));
        assert!(!is_bare_identifier("1abc"));
        assert!(!is_bare_identifier("-abc"));
        assert!(!is_bare_identifier("with space"));
        assert!(!is_bare_identifier("a.b"));
        assert!(!is_bare_identifier("おーい"));
    }

    #[test]
    fn test_keywords_are_not_bare() {
        for keyword in KEYWORDS {
            assert!(!is_bare_identifier(keyword), "{keyword} must be quoted");
        }
        // builtins that may be shadowed stay bare
        assert!(is_bare_identifier("true"));
        assert!(is_bare_identifier("null"));
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key("greeting"), "greeting");
        assert_eq!(format_key("if"), "\"if\"");
        assert_eq!(format_key("a b"), "\"a b\"");
        assert_eq!(format_key(""), "\"\"");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("C:\\dir"), "C:\\\\dir");
        assert_eq!(escape_string("a\nb\tc\r"), "a\\nb\\tc\\r");
        assert_eq!(escape_string("${pkgs}"), "\\${pkgs}");
        assert_eq!(escape_string("$out"), "$out");
        assert_eq!(escape_string("cost: $"), "cost: $");
    }
}
