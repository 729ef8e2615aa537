//! Indentation tracking: turns leading whitespace on each logical line
//! into `INDENT`/`DEDENT` tokens.
//!
//! Grounded on the teacher's `IndentationTracker`
//! (`tokenizer/indentation.rs`): a stack of indent widths, pushed on
//! increase and popped (possibly more than once) on decrease.

use crate::lexer::token::{Token, TokenKind, TokenPosition};

pub struct IndentationTracker {
    /// Stack of indent widths currently open, root implicit at 0.
    levels: Vec<usize>,
}

impl IndentationTracker {
    pub fn new() -> Self {
        Self { levels: vec![0] }
    }

    /// Given the width of a new logical line's leading whitespace, returns
    /// the `INDENT`/`DEDENT` tokens needed to reach it from the current
    /// level.
    pub fn advance_to(&mut self, width: usize, file: crate::hash::FileHash, line: u32) -> Vec<Token> {
        let mut tokens = Vec::new();
        let current = *self.levels.last().expect("root level always present");

        if width > current {
            self.levels.push(width);
            tokens.push(Token::new(
                TokenKind::Indent,
                TokenPosition { file, line, column: 0, length: width as u32 },
            ));
        } else {
            while width < *self.levels.last().expect("root level always present") {
                self.levels.pop();
                tokens.push(Token::new(
                    TokenKind::Dedent,
                    TokenPosition { file, line, column: 0, length: 0 },
                ));
            }
        }

        tokens
    }

    /// Emits the `DEDENT`s needed to unwind every open level at end of
    /// file.
    pub fn finalize(&mut self, file: crate::hash::FileHash, line: u32) -> Vec<Token> {
        let mut tokens = Vec::new();
        while self.levels.len() > 1 {
            self.levels.pop();
            tokens.push(Token::new(
                TokenKind::Dedent,
                TokenPosition { file, line, column: 0, length: 0 },
            ));
        }
        tokens
    }
}

impl Default for IndentationTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FileHash;
    use std::path::Path;

    fn file() -> FileHash {
        FileHash::of_canonical_path(Path::new("/tmp/indent_test.flint"))
    }

    #[test]
    fn single_indent_then_dedent() {
        let mut tracker = IndentationTracker::new();
        let f = file();
        assert_eq!(tracker.advance_to(4, f, 1).len(), 1);
        assert!(matches!(tracker.advance_to(4, f, 2).as_slice(), []));
        let dedent = tracker.advance_to(0, f, 3);
        assert_eq!(dedent.len(), 1);
        assert!(matches!(dedent[0].kind, TokenKind::Dedent));
    }

    #[test]
    fn nested_indent_unwinds_multiple_levels() {
        let mut tracker = IndentationTracker::new();
        let f = file();
        tracker.advance_to(4, f, 1);
        tracker.advance_to(8, f, 2);
        let dedents = tracker.advance_to(0, f, 3);
        assert_eq!(dedents.len(), 2);
    }

    #[test]
    fn finalize_unwinds_remaining_levels() {
        let mut tracker = IndentationTracker::new();
        let f = file();
        tracker.advance_to(4, f, 1);
        tracker.advance_to(8, f, 2);
        let tokens = tracker.finalize(f, 3);
        assert_eq!(tokens.len(), 2);
    }
}
