//! The main lexer engine (`spec.md` §4.L).
//!
//! Grounded on the teacher's character-at-a-time `Lexer`
//! (`tokenizer/infrastructure/lexer.rs`): a `Vec<char>` buffer, a cursor,
//! and one `read_*` method per token shape, tried in sequence. Unlike the
//! teacher (whose grammar has no keywords and a very different delimiter
//! set), this lexer additionally classifies identifiers against the
//! keyword table and the primitive-type spelling table, and tracks
//! indentation via [`crate::lexer::indentation::IndentationTracker`].

use crate::hash::FileHash;
use crate::lexer::error::LexError;
use crate::lexer::indentation::IndentationTracker;
use crate::lexer::patterns;
use crate::lexer::token::{Keyword, NumericBase, Token, TokenKind, TokenPosition};
use crate::types::Primitive;

pub struct Lexer {
    input: Vec<char>,
    file: FileHash,
    position: usize,
    line: u32,
    column: u32,
    indent: IndentationTracker,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str, file: FileHash) -> Self {
        Self {
            input: source.chars().collect(),
            file,
            position: 0,
            line: 1,
            column: 0,
            indent: IndentationTracker::new(),
            at_line_start: true,
        }
    }

    /// Tokenizes the entire source. On the first lexical error the partial
    /// token list is discarded, per `spec.md` §4.L.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            if self.at_line_start {
                if let Some(indent_tokens) = self.process_line_start()? {
                    tokens.extend(indent_tokens);
                }
                self.at_line_start = false;
                continue;
            }

            if self.is_at_end() {
                break;
            }

            match self.peek() {
                Some('\n') => {
                    let pos = self.current_position(0);
                    self.advance();
                    tokens.push(Token::new(TokenKind::Eol, pos));
                    self.at_line_start = true;
                }
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    self.skip_line_comment();
                }
                Some(ch) if ch.is_ascii_digit() => {
                    tokens.push(self.read_number()?);
                }
                Some(ch) if is_ident_start(ch) => {
                    tokens.push(self.read_identifier_or_keyword());
                }
                Some('"') => {
                    tokens.extend(self.read_string()?);
                }
                Some('\'') => {
                    tokens.push(self.read_char_literal()?);
                }
                Some(_) => {
                    tokens.push(self.read_operator_or_punctuation()?);
                }
                None => break,
            }
        }

        let eof_pos = self.current_position(0);
        tokens.extend(self.indent.finalize(self.file, self.line));
        tokens.push(Token::new(TokenKind::Eof, eof_pos));

        Ok(tokens)
    }

    /// Measures leading whitespace width, skips blank lines and
    /// comment-only lines entirely (`spec.md` §4.L: "blank lines and
    /// comments are dropped"), and emits `INDENT`/`DEDENT` for the first
    /// real line of content.
    fn process_line_start(&mut self) -> Result<Option<Vec<Token>>, LexError> {
        let line_start = self.position;
        let mut width = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => {
                    width += 1;
                    self.advance();
                }
                '\t' => {
                    width += 4;
                    self.advance();
                }
                _ => break,
            }
        }

        match self.peek() {
            None => Ok(None),
            Some('\n') => {
                // Blank line: dropped, but the newline itself still must
                // be consumed so the main loop progresses.
                self.position = line_start;
                self.column = 0;
                while self.peek() == Some(' ') || self.peek() == Some('\t') {
                    self.advance();
                }
                self.advance();
                Ok(None)
            }
            Some('/') if self.peek_at(1) == Some('/') => {
                self.skip_line_comment();
                Ok(None)
            }
            _ => Ok(Some(self.indent.advance_to(width, self.file, self.line))),
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.current_position(0);
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = if let Some(keyword) = Keyword::from_spelling(&text) {
            TokenKind::Keyword(keyword)
        } else if let Some(primitive) = Primitive::from_spelling(&text) {
            TokenKind::PrimitiveType(primitive)
        } else {
            TokenKind::Identifier(text.clone())
        };

        Token::new(kind, self.spanned(start, text.chars().count()))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.current_position(0);
        let mut text = String::new();

        let base = if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            text.push(self.advance().unwrap());
            text.push(self.advance().unwrap());
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() || ch == '_' {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if !patterns::is_valid_hex_body(&text[2..]) {
                return Err(LexError::BadNumericLiteral { position: start, text });
            }
            NumericBase::Hex
        } else if self.peek() == Some('0') && matches!(self.peek_at(1), Some('b') | Some('B')) {
            text.push(self.advance().unwrap());
            text.push(self.advance().unwrap());
            while let Some(ch) = self.peek() {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if !patterns::is_valid_binary_body(&text[2..]) {
                return Err(LexError::BadNumericLiteral { position: start, text });
            }
            NumericBase::Binary
        } else {
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() || ch == '_' {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            NumericBase::Decimal
        };

        if base == NumericBase::Decimal
            && self.peek() == Some('.')
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            text.push(self.advance().unwrap());
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() || ch == '_' {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                text.push(self.advance().unwrap());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.advance().unwrap());
                }
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            if !patterns::is_valid_decimal_float(&text) {
                return Err(LexError::BadNumericLiteral { position: start, text });
            }
            return Ok(Token::new(
                TokenKind::FloatLiteral(text.clone()),
                self.spanned(start, text.chars().count()),
            ));
        }

        Ok(Token::new(
            TokenKind::IntLiteral { text: text.clone(), base },
            self.spanned(start, text.chars().count()),
        ))
    }

    /// Reads a string literal, splitting it into alternating `STR_PART`
    /// and interpolation-bracket tokens (`spec.md` §4.L). The tokens
    /// between `InterpExprStart` and `InterpExprEnd` are ordinary
    /// subsequent tokens from this same scan, so the caller just keeps
    /// reading — the Parser is the one that groups them into an
    /// expression.
    fn read_string(&mut self) -> Result<Vec<Token>, LexError> {
        let start = self.current_position(0);
        self.advance(); // opening quote
        let mut tokens = Vec::new();
        let mut part = String::new();
        let part_start = self.current_position(0);

        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedString { position: start }),
                Some('"') => {
                    self.advance();
                    tokens.push(Token::new(
                        TokenKind::StrPart(part.clone()),
                        self.spanned(part_start, part.chars().count()),
                    ));
                    return Ok(tokens);
                }
                Some('\\') => {
                    let escape_pos = self.current_position(0);
                    self.advance();
                    match self.peek() {
                        Some('n') => {
                            part.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            part.push('\t');
                            self.advance();
                        }
                        Some('\\') => {
                            part.push('\\');
                            self.advance();
                        }
                        Some('"') => {
                            part.push('"');
                            self.advance();
                        }
                        Some('{') => {
                            tokens.push(Token::new(
                                TokenKind::StrPart(part.clone()),
                                self.spanned(part_start, part.chars().count()),
                            ));
                            part.clear();
                            let brace_pos = self.current_position(0);
                            self.advance(); // consume '{'
                            tokens.push(Token::new(TokenKind::InterpExprStart, brace_pos));
                            self.read_interpolated_expr(&mut tokens)?;
                        }
                        Some(other) => {
                            return Err(LexError::InvalidEscape { position: escape_pos, escape: other });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                }
                Some(ch) => {
                    part.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Tokenizes the sub-stream inside `\{ ... }`, sharing this lexer's
    /// scan loop, and emits the closing `InterpExprEnd`.
    fn read_interpolated_expr(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let mut depth = 1;
        loop {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedInterpolation { position: self.current_position(0) });
                }
                Some('}') if depth == 1 => {
                    let pos = self.current_position(0);
                    self.advance();
                    tokens.push(Token::new(TokenKind::InterpExprEnd, pos));
                    return Ok(());
                }
                Some('{') => {
                    depth += 1;
                    tokens.push(self.read_operator_or_punctuation()?);
                }
                Some('}') => {
                    depth -= 1;
                    tokens.push(self.read_operator_or_punctuation()?);
                }
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some(ch) if ch.is_ascii_digit() => tokens.push(self.read_number()?),
                Some(ch) if is_ident_start(ch) => tokens.push(self.read_identifier_or_keyword()),
                Some('"') => tokens.extend(self.read_string()?),
                Some(_) => tokens.push(self.read_operator_or_punctuation()?),
            }
        }
    }

    fn read_char_literal(&mut self) -> Result<Token, LexError> {
        let start = self.current_position(0);
        self.advance(); // opening quote
        let value = match self.peek() {
            Some('\\') => {
                self.advance();
                match self.peek() {
                    Some('n') => {
                        self.advance();
                        '\n'
                    }
                    Some('t') => {
                        self.advance();
                        '\t'
                    }
                    Some('\\') => {
                        self.advance();
                        '\\'
                    }
                    Some('\'') => {
                        self.advance();
                        '\''
                    }
                    Some(other) => {
                        return Err(LexError::InvalidEscape { position: start, escape: other });
                    }
                    None => return Err(LexError::UnterminatedString { position: start }),
                }
            }
            Some(ch) => {
                self.advance();
                ch
            }
            None => return Err(LexError::UnterminatedString { position: start }),
        };

        if self.peek() != Some('\'') {
            return Err(LexError::UnterminatedString { position: start });
        }
        self.advance();

        Ok(Token::new(TokenKind::CharLiteral(value), self.spanned(start, 3)))
    }

    fn read_operator_or_punctuation(&mut self) -> Result<Token, LexError> {
        let start = self.current_position(0);
        let ch = self.peek().expect("caller checked Some");

        macro_rules! two {
            ($second:expr, $two_kind:expr, $one_kind:expr) => {{
                self.advance();
                if self.peek() == Some($second) {
                    self.advance();
                    Token::new($two_kind, self.spanned(start, 2))
                } else {
                    Token::new($one_kind, self.spanned(start, 1))
                }
            }};
        }

        let token = match ch {
            '=' => two!('=', TokenKind::Eq, TokenKind::Assign),
            '!' => two!('=', TokenKind::NotEq, TokenKind::Bang),
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Token::new(TokenKind::LtEq, self.spanned(start, 2))
                    }
                    Some('<') => {
                        self.advance();
                        Token::new(TokenKind::Shl, self.spanned(start, 2))
                    }
                    _ => Token::new(TokenKind::Lt, self.spanned(start, 1)),
                }
            }
            '>' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Token::new(TokenKind::GtEq, self.spanned(start, 2))
                    }
                    Some('>') => {
                        self.advance();
                        Token::new(TokenKind::Shr, self.spanned(start, 2))
                    }
                    _ => Token::new(TokenKind::Gt, self.spanned(start, 1)),
                }
            }
            '&' => two!('&', TokenKind::AndAnd, TokenKind::Ampersand),
            '|' => two!('|', TokenKind::OrOr, TokenKind::Pipe),
            '?' => {
                self.advance();
                match self.peek() {
                    Some('.') => {
                        self.advance();
                        Token::new(TokenKind::QuestionDot, self.spanned(start, 2))
                    }
                    Some('!') => {
                        self.advance();
                        Token::new(TokenKind::QuestionBang, self.spanned(start, 2))
                    }
                    _ => Token::new(TokenKind::Question, self.spanned(start, 1)),
                }
            }
            '.' => {
                self.advance();
                if self.peek() == Some('.') {
                    self.advance();
                    Token::new(TokenKind::DotDot, self.spanned(start, 2))
                } else {
                    Token::new(TokenKind::Dot, self.spanned(start, 1))
                }
            }
            '-' => {
                self.advance();
                if self.peek() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::Arrow, self.spanned(start, 2))
                } else {
                    Token::new(TokenKind::Minus, self.spanned(start, 1))
                }
            }
            '+' => {
                self.advance();
                Token::new(TokenKind::Plus, self.spanned(start, 1))
            }
            '*' => {
                self.advance();
                Token::new(TokenKind::Star, self.spanned(start, 1))
            }
            '/' => {
                self.advance();
                Token::new(TokenKind::Slash, self.spanned(start, 1))
            }
            '%' => {
                self.advance();
                Token::new(TokenKind::Percent, self.spanned(start, 1))
            }
            '(' => {
                self.advance();
                Token::new(TokenKind::LParen, self.spanned(start, 1))
            }
            ')' => {
                self.advance();
                Token::new(TokenKind::RParen, self.spanned(start, 1))
            }
            '{' => {
                self.advance();
                Token::new(TokenKind::LBrace, self.spanned(start, 1))
            }
            '}' => {
                self.advance();
                Token::new(TokenKind::RBrace, self.spanned(start, 1))
            }
            '[' => {
                self.advance();
                Token::new(TokenKind::LBracket, self.spanned(start, 1))
            }
            ']' => {
                self.advance();
                Token::new(TokenKind::RBracket, self.spanned(start, 1))
            }
            ',' => {
                self.advance();
                Token::new(TokenKind::Comma, self.spanned(start, 1))
            }
            ':' => {
                self.advance();
                Token::new(TokenKind::Colon, self.spanned(start, 1))
            }
            '^' => {
                self.advance();
                Token::new(TokenKind::Caret, self.spanned(start, 1))
            }
            '~' => {
                self.advance();
                Token::new(TokenKind::Tilde, self.spanned(start, 1))
            }
            other => {
                self.advance();
                return Err(LexError::UnknownCharacter { position: start, ch: other });
            }
        };

        Ok(token)
    }

    fn current_position(&self, length: usize) -> TokenPosition {
        TokenPosition { file: self.file, line: self.line, column: self.column, length: length as u32 }
    }

    fn spanned(&self, start: TokenPosition, length: usize) -> TokenPosition {
        TokenPosition { length: length as u32, ..start }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    fn file() -> FileHash {
        FileHash::of_canonical_path(Path::new("/tmp/scanner_test.flint"))
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, file())
            .tokenize()
            .expect("tokenize should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keyword_and_identifier_are_distinguished() {
        let kinds = kinds("def foo");
        assert_eq!(kinds[0], TokenKind::Keyword(Keyword::Def));
        assert!(matches!(kinds[1], TokenKind::Identifier(ref s) if s == "foo"));
    }

    #[rstest]
    #[case("i32", Primitive::I32)]
    #[case("i64", Primitive::I64)]
    #[case("u8", Primitive::U8)]
    #[case("f32", Primitive::F32)]
    #[case("f64", Primitive::F64)]
    #[case("bool", Primitive::Bool)]
    #[case("str", Primitive::Str)]
    fn primitive_type_spelling_recognized(#[case] spelling: &str, #[case] expected: Primitive) {
        let kinds = kinds(spelling);
        assert_eq!(kinds[0], TokenKind::PrimitiveType(expected));
    }

    #[test]
    fn hex_and_binary_literals() {
        let kinds = kinds("0xFF 0b101");
        assert!(matches!(&kinds[0], TokenKind::IntLiteral { base: NumericBase::Hex, .. }));
        assert!(matches!(&kinds[1], TokenKind::IntLiteral { base: NumericBase::Binary, .. }));
    }

    #[test]
    fn bad_binary_literal_is_an_error() {
        let result = Lexer::new("0b102", file()).tokenize();
        assert!(matches!(result, Err(LexError::BadNumericLiteral { .. })));
    }

    #[test]
    fn string_with_interpolation_splits_into_parts() {
        let kinds = kinds("\"a\\{x}b\"");
        assert!(matches!(&kinds[0], TokenKind::StrPart(ref s) if s == "a"));
        assert_eq!(kinds[1], TokenKind::InterpExprStart);
        assert!(matches!(&kinds[2], TokenKind::Identifier(ref s) if s == "x"));
        assert_eq!(kinds[3], TokenKind::InterpExprEnd);
        assert!(matches!(&kinds[4], TokenKind::StrPart(ref s) if s == "b"));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let result = Lexer::new("\"abc", file()).tokenize();
        assert!(matches!(result, Err(LexError::UnterminatedString { .. })));
    }

    #[test]
    fn blank_lines_and_comments_produce_no_tokens() {
        let kinds = kinds("def a\n\n// a comment\ndef b");
        let defs = kinds.iter().filter(|k| matches!(k, TokenKind::Keyword(Keyword::Def))).count();
        assert_eq!(defs, 2);
        assert!(!kinds.iter().any(|k| matches!(k, TokenKind::Identifier(s) if s.contains("comment"))));
    }

    #[test]
    fn indentation_produces_indent_and_dedent() {
        let kinds = kinds("def a\n    return 1\ndef b");
        assert!(kinds.iter().any(|k| matches!(k, TokenKind::Indent)));
        assert!(kinds.iter().any(|k| matches!(k, TokenKind::Dedent)));
    }

    #[test]
    fn multi_character_operators() {
        let kinds = kinds("a == b != c <= d >= e .. f ?. g ?! h << i >> j");
        assert!(kinds.contains(&TokenKind::Eq));
        assert!(kinds.contains(&TokenKind::NotEq));
        assert!(kinds.contains(&TokenKind::LtEq));
        assert!(kinds.contains(&TokenKind::GtEq));
        assert!(kinds.contains(&TokenKind::DotDot));
        assert!(kinds.contains(&TokenKind::QuestionDot));
        assert!(kinds.contains(&TokenKind::QuestionBang));
        assert!(kinds.contains(&TokenKind::Shl));
        assert!(kinds.contains(&TokenKind::Shr));
    }

    #[test]
    fn unknown_character_is_an_error() {
        let result = Lexer::new("a $ b", file()).tokenize();
        assert!(matches!(result, Err(LexError::UnknownCharacter { ch: '$', .. })));
    }
}
