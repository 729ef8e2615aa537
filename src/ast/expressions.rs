//! ExpressionNode: the ~22-variant expression sum type (`spec.md` §3).
//!
//! Grounded on `original_source/include/parser/ast/expressions/*.hpp` (one
//! struct per kind), collapsed per Design Note "polymorphic hierarchies ->
//! tagged union" into a single `ExpressionKind` enum dispatched by
//! exhaustive `match`. Every [`ExpressionNode`] carries its resolved type,
//! per the spec's "every expression carries a resolved type pointer."

use crate::ast::position::SourcePosition;
use crate::types::TypeRef;

/// One expression node: its source position, resolved type, and variant
/// payload.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub position: SourcePosition,
    pub ty: TypeRef,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
    Reference,
    Dereference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Assign,
}

/// The tagged-union payload of an expression node.
#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Literal(Literal),
    Variable {
        name: String,
        scope_id: u64,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<ExpressionNode>,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<ExpressionNode>,
        rhs: Box<ExpressionNode>,
    },
    /// A call used in expression position; the `call_id` indexes into the
    /// process-wide call arena (`spec.md` §4.P, Design Note "arena +
    /// index").
    Call {
        call_id: u64,
    },
    /// A call on an entity instance (`instance.method(...)`), likewise
    /// arena-indexed.
    InstanceCall {
        instance: Box<ExpressionNode>,
        call_id: u64,
    },
    /// `Data { field: value, ... }` construction.
    Initializer {
        type_name: String,
        field_values: Vec<(String, Box<ExpressionNode>)>,
    },
    ArrayInitializer {
        element_type: TypeRef,
        dimensions: Vec<Box<ExpressionNode>>,
        elements: Vec<Box<ExpressionNode>>,
    },
    ArrayAccess {
        array: Box<ExpressionNode>,
        index: Box<ExpressionNode>,
    },
    DataAccess {
        base: Box<ExpressionNode>,
        field_name: String,
        field_id: usize,
    },
    /// `(a, b).field` access into a group member that is itself a data type.
    GroupedDataAccess {
        base: Box<ExpressionNode>,
        group_index: usize,
        field_name: String,
        field_id: usize,
    },
    /// `(e1, e2, ...)` — a group-typed tuple expression.
    GroupExpression {
        elements: Vec<Box<ExpressionNode>>,
        /// Allocated from the process-wide group-id counter (`spec.md`
        /// §3); distinguishes this literal group from every other one
        /// constructed in the same compile run.
        group_id: u64,
    },
    RangeExpression {
        start: Box<ExpressionNode>,
        end: Box<ExpressionNode>,
    },
    StringInterpolation {
        parts: Vec<InterpolationPart>,
    },
    SwitchExpression {
        subject: Box<ExpressionNode>,
        branches: Vec<SwitchBranch>,
    },
    /// One `case <matches> -> <result>` arm, used both in switch
    /// expressions and statements; the matches are themselves expressions
    /// (literals, enum/variant patterns) evaluated against the subject.
    SwitchMatch {
        matches: Vec<Box<ExpressionNode>>,
        result: Box<ExpressionNode>,
    },
    /// The `default` branch marker of a switch.
    Default,
    TypeCast {
        value: Box<ExpressionNode>,
        target: TypeRef,
        is_explicit: bool,
    },
    /// A type used as a first-class expression value (e.g. passed to a
    /// `parse` core-module call that takes a type argument).
    TypeExpression {
        named: TypeRef,
    },
    /// `expr?.field` — short-circuits to `none` if `expr` is `none`.
    OptionalChain {
        base: Box<ExpressionNode>,
        field_name: String,
    },
    /// `expr?!` — unwraps an optional, panicking (at the generator level)
    /// if absent.
    OptionalUnwrap {
        base: Box<ExpressionNode>,
    },
    /// Pattern-match extraction of a variant's payload: `variant is Case(x)`.
    VariantExtraction {
        base: Box<ExpressionNode>,
        case_name: String,
        bindings: Vec<String>,
    },
    /// `variant!` — unwraps a variant to its single known case's payload.
    VariantUnwrap {
        base: Box<ExpressionNode>,
    },
}

#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(String),
    Expression(Box<ExpressionNode>),
}

#[derive(Debug, Clone)]
pub struct SwitchBranch {
    pub matches: Vec<Box<ExpressionNode>>,
    pub is_default: bool,
    pub result: Box<ExpressionNode>,
}

impl ExpressionNode {
    pub fn new(position: SourcePosition, ty: TypeRef, kind: ExpressionKind) -> Self {
        Self { position, ty, kind }
    }

    /// `true` for kinds the literal-folding pass in the Parser produces and
    /// consumes (`spec.md` §4.P "Literal folding").
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExpressionKind::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExpressionKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }
}
