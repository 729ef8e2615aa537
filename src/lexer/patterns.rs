//! Compiled-once character-class patterns shared by the scanner.
//!
//! Grounded on the teacher's `annotation_pattern`/`definition_pattern`
//! style (`tokenizer/lexer.rs`): a private `OnceLock<Regex>` per pattern,
//! built lazily on first use.

use regex::Regex;
use std::sync::OnceLock;

fn hex_body() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-fA-F][0-9a-fA-F_]*$").expect("static pattern"))
}

fn binary_body() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[01][01_]*$").expect("static pattern"))
}

fn decimal_float_body() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?$").expect("static pattern")
    })
}

/// True if `body` (the digits after a `0x` prefix) is a well-formed hex
/// literal body. `spec.md` §4.L: "a numeric literal whose base prefix
/// disagrees with its body" is a lex error.
pub fn is_valid_hex_body(body: &str) -> bool {
    !body.is_empty() && hex_body().is_match(body)
}

/// True if `body` (the digits after a `0b` prefix) is a well-formed binary
/// literal body.
pub fn is_valid_binary_body(body: &str) -> bool {
    !body.is_empty() && binary_body().is_match(body)
}

/// True if `text` is a well-formed decimal float literal (digits, a
/// required decimal point, digits, optional exponent).
pub fn is_valid_decimal_float(text: &str) -> bool {
    decimal_float_body().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_body_rejects_non_hex() {
        assert!(is_valid_hex_body("ff"));
        assert!(!is_valid_hex_body("gg"));
        assert!(!is_valid_hex_body(""));
    }

    #[test]
    fn binary_body_rejects_non_binary_digits() {
        assert!(is_valid_binary_body("1010"));
        assert!(!is_valid_binary_body("102"));
    }

    #[test]
    fn decimal_float_requires_digits_on_both_sides_of_the_point() {
        assert!(is_valid_decimal_float("2.0"));
        assert!(is_valid_decimal_float("2.5e10"));
        assert!(!is_valid_decimal_float("2."));
    }
}
