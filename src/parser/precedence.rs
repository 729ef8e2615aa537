//! The binary-operator precedence table (`spec.md` §4.P "Expression
//! parsing"): `=`=0, `||`=2, `&&`=3, equality=1, `not`=4, comparisons=5,
//! additive=6, multiplicative=7, power=8.
//!
//! The equality tier sitting *below* `||` in this table (an inversion
//! from the usual C-family ordering) is taken verbatim from `spec.md` —
//! not a transcription slip.

use crate::ast::BinaryOperator;
use crate::lexer::TokenKind;

pub fn binding_power(op: BinaryOperator) -> u8 {
    use BinaryOperator::*;
    match op {
        Assign => 0,
        Equal | NotEqual => 1,
        Or => 2,
        And => 3,
        Less | LessEqual | Greater | GreaterEqual => 5,
        Add | Subtract => 6,
        Multiply | Divide | Modulo => 7,
        Power => 8,
    }
}

/// Attempts to read the current token as a binary operator, without
/// consuming it.
pub fn peek_binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    use BinaryOperator::*;
    Some(match kind {
        TokenKind::Assign => Assign,
        TokenKind::Eq => Equal,
        TokenKind::NotEq => NotEqual,
        TokenKind::OrOr => Or,
        TokenKind::AndAnd => And,
        TokenKind::Lt => Less,
        TokenKind::LtEq => LessEqual,
        TokenKind::Gt => Greater,
        TokenKind::GtEq => GreaterEqual,
        TokenKind::Plus => Add,
        TokenKind::Minus => Subtract,
        TokenKind::Star => Multiply,
        TokenKind::Slash => Divide,
        TokenKind::Percent => Modulo,
        TokenKind::Caret => Power,
        _ => return None,
    })
}
