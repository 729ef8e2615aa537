//! A position-tracking cursor over one file's token stream, shared by
//! pass 1 and pass 2.

use crate::lexer::{Token, TokenKind, TokenPosition};
use crate::parser::error::ParserError;

pub struct Cursor<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn peek(&self) -> &TokenKind {
        self.tokens.get(self.index).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    pub fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens.get(self.index + offset).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    pub fn position(&self) -> TokenPosition {
        self.tokens
            .get(self.index)
            .map(|t| t.position)
            .or_else(|| self.tokens.last().map(|t| t.position))
            .expect("token stream always has at least an EOF token")
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if !self.is_eof() {
            self.index += 1;
        }
        kind
    }

    /// Skips tokens until `pred` matches, or EOF — used for error recovery
    /// at statement boundaries.
    pub fn skip_until(&mut self, pred: impl Fn(&TokenKind) -> bool) {
        while !self.is_eof() && !pred(self.peek()) {
            self.advance();
        }
    }

    pub fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: &TokenKind, label: &str) -> Result<(), ParserError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParserError::UnexpectedToken {
                position: self.position(),
                expected: label.to_string(),
                found: format!("{:?}", self.peek()),
            })
        }
    }

    pub fn expect_identifier(&mut self) -> Result<String, ParserError> {
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParserError::UnexpectedToken {
                position: self.position(),
                expected: "identifier".to_string(),
                found: format!("{:?}", other),
            }),
        }
    }

    /// Skips `EOL` and `INDENT`/`DEDENT` tokens — used between top-level
    /// declarations in pass 1 where blank structural separation carries no
    /// meaning beyond delimiting.
    pub fn skip_line_breaks(&mut self) {
        while matches!(self.peek(), TokenKind::Eol) {
            self.advance();
        }
    }

    /// Skips `EOL`, `INDENT` and `DEDENT` tokens. Block structure in this
    /// grammar is carried by braces (`spec.md`'s token set keeps `INDENT`
    /// around for the lexer's own line-tracking, per `SPEC_FULL.md` §4.L),
    /// so the significant-whitespace tokens are pure trivia everywhere the
    /// Parser itself looks for structure.
    pub fn skip_trivia(&mut self) {
        while matches!(self.peek(), TokenKind::Eol | TokenKind::Indent | TokenKind::Dedent) {
            self.advance();
        }
    }

    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.index.min(self.tokens.len())..]
    }

    /// Current index into the underlying token slice, for pass-1's body
    /// stashing (`spec.md` §4.P: "stash the body tokens without parsing
    /// them").
    pub fn index(&self) -> usize {
        self.index
    }

    /// The full underlying token slice from `start` to the end — used to
    /// recover a contiguous span once its end index is known.
    pub fn tokens_from(&self, start: usize) -> &'a [Token] {
        &self.tokens[start.min(self.tokens.len())..]
    }
}
