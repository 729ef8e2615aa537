//! Token and TokenKind (`spec.md` §3 "Token": "tag + lexeme + (line,
//! column, length)").

use crate::hash::FileHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Def,
    Return,
    If,
    Else,
    While,
    Do,
    For,
    In,
    Break,
    Continue,
    Switch,
    Default,
    Throw,
    Catch,
    Import,
    Use,
    As,
    Data,
    Entity,
    Enum,
    Error,
    Variant,
    Func,
    Test,
    Const,
    Mut,
    Extern,
    Aligned,
    Pub,
    Priv,
    True,
    False,
    None,
    Some,
    And,
    Or,
    Not,
    Is,
    Link,
}

impl Keyword {
    /// Reverse lookup table, `spec.md` §4.L's ≈60-keyword set expanded in
    /// `SPEC_FULL.md` §4.L. Primitive-type spellings (`i32`, `str`, ...)
    /// are recognized separately by [`crate::types::Primitive::from_spelling`]
    /// rather than here, since they behave as type-position identifiers,
    /// not control keywords.
    pub fn from_spelling(s: &str) -> Option<Self> {
        use Keyword::*;
        Some(match s {
            "def" => Def,
            "return" => Return,
            "if" => If,
            "else" => Else,
            "while" => While,
            "do" => Do,
            "for" => For,
            "in" => In,
            "break" => Break,
            "continue" => Continue,
            "switch" => Switch,
            "default" => Default,
            "throw" => Throw,
            "catch" => Catch,
            "import" => Import,
            "use" => Use,
            "as" => As,
            "data" => Data,
            "entity" => Entity,
            "enum" => Enum,
            "error" => Error,
            "variant" => Variant,
            "func" => Func,
            "test" => Test,
            "const" => Const,
            "mut" => Mut,
            "extern" => Extern,
            "aligned" => Aligned,
            "pub" => Pub,
            "priv" => Priv,
            "true" => True,
            "false" => False,
            "none" => None,
            "some" => Some,
            "and" => And,
            "or" => Or,
            "not" => Not,
            "is" => Is,
            "link" => Link,
            _ => return Option::None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericBase {
    Decimal,
    Hex,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    /// Name of a primitive type spelled as an identifier in type position
    /// (`i32`, `f64x4`, `ptr`, ...).
    PrimitiveType(crate::types::Primitive),
    IntLiteral { text: String, base: NumericBase },
    FloatLiteral(String),
    /// A plain string literal with no interpolation, or one segment of an
    /// interpolated one (`spec.md` §4.L: "splits an interpolated literal
    /// into alternating STR_PART and INTERP_EXPR tokens").
    StrPart(String),
    /// Marks the start of an interpolated expression embedded in a string
    /// literal (`\{` ... `}`); the tokens between this and the matching
    /// close are a normal sub-token-stream to be parsed as an expression.
    InterpExprStart,
    InterpExprEnd,
    CharLiteral(char),

    // Punctuation / operators.
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    DotDot,
    QuestionDot,
    QuestionBang,
    Question,
    Shl,
    Shr,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Arrow,
    Ampersand,
    Pipe,
    Caret,
    Tilde,

    /// Significant indentation, one per logical line that indents deeper
    /// than its predecessor.
    Indent,
    /// One per level unwound; `SPEC_FULL.md` §4.L's supplement to
    /// `spec.md`'s `INDENT`-only token set.
    Dedent,
    Eol,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPosition {
    pub file: FileHash,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl TokenPosition {
    pub fn new(file: FileHash, line: u32, column: u32, length: u32) -> Self {
        Self { file, line, column, length }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: TokenPosition,
}

impl Token {
    pub fn new(kind: TokenKind, position: TokenPosition) -> Self {
        Self { kind, position }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
