//! StatementNode: the ~20-variant statement sum type (`spec.md` §3).
//!
//! Grounded on `original_source/include/parser/ast/statements/*.hpp`,
//! collapsed into one tagged union per Design Note. Blocks (`if`/`while`/
//! `for`/...) own a child [`Scope`] outright, matching the ownership rule
//! in `spec.md`'s lifecycle section: "a Scope owns its statements and
//! child scopes."

use crate::ast::expressions::{ExpressionNode, SwitchBranch};
use crate::ast::position::SourcePosition;
use crate::ast::scope::Scope;
use crate::types::TypeRef;

#[derive(Debug)]
pub struct StatementNode {
    pub position: SourcePosition,
    pub kind: StatementKind,
}

/// The left-hand side of an assignment; `spec.md` enumerates direct,
/// array-indexed, data-field, grouped-data-field, group, and "stacked"
/// (a chain of the above, e.g. `a.b[0].c := x`) variants.
#[derive(Debug)]
pub enum AssignmentTarget {
    Direct { name: String, scope_id: u64 },
    ArrayIndexed { base: Box<ExpressionNode>, index: Box<ExpressionNode> },
    DataField { base: Box<ExpressionNode>, field_name: String, field_id: usize },
    GroupedDataField {
        base: Box<ExpressionNode>,
        group_index: usize,
        field_name: String,
        field_id: usize,
    },
    Group { targets: Vec<AssignmentTarget> },
    /// A chain of the above applied in sequence, e.g. `a.b[0].c`.
    Stacked { steps: Vec<AssignmentTarget> },
}

#[derive(Debug)]
pub enum StatementKind {
    /// `let name: T = expr` or `let name := expr` (inferred).
    Declaration {
        name: String,
        declared_type: Option<TypeRef>,
        is_mutable: bool,
        value: Box<ExpressionNode>,
    },
    /// `(a, b) := expr` — `expr` must be group-typed; binds each component.
    GroupDeclaration {
        names: Vec<(String, bool)>,
        value: Box<ExpressionNode>,
        /// Allocated from the process-wide group-id counter (`spec.md`
        /// §3), so every destructured group in a compile run is
        /// distinguishable even across files.
        group_id: u64,
    },
    Assignment {
        target: AssignmentTarget,
        value: Box<ExpressionNode>,
    },
    /// A call used in statement position (its value, if any, is discarded).
    Call {
        call_id: u64,
    },
    /// `catch` — refers to the most recently parsed call at this point,
    /// per `spec.md` §4.P ("catch refers to the most recently parsed
    /// call"). Resolved to a concrete `call_id` during parsing.
    Catch {
        call_id: u64,
        error_binding: Option<String>,
        body: Box<Scope>,
    },
    Throw {
        error: Box<ExpressionNode>,
    },
    Return {
        values: Vec<Box<ExpressionNode>>,
    },
    If {
        condition: Box<ExpressionNode>,
        then_branch: Box<Scope>,
        else_branch: Option<Box<Scope>>,
    },
    While {
        condition: Box<ExpressionNode>,
        body: Box<Scope>,
    },
    DoWhile {
        body: Box<Scope>,
        condition: Box<ExpressionNode>,
    },
    For {
        init: Box<StatementNode>,
        condition: Box<ExpressionNode>,
        post: Box<StatementNode>,
        body: Box<Scope>,
    },
    /// `for item in iterable { ... }`.
    EnhancedFor {
        binding: String,
        is_reference: bool,
        iterable: Box<ExpressionNode>,
        body: Box<Scope>,
    },
    Switch {
        subject: Box<ExpressionNode>,
        branches: Vec<SwitchBranch>,
        bodies: Vec<Box<Scope>>,
    },
    Break,
    Continue,
    UnaryOp {
        target: AssignmentTarget,
        op: crate::ast::expressions::UnaryOperator,
    },
}

impl StatementNode {
    pub fn new(position: SourcePosition, kind: StatementKind) -> Self {
        Self { position, kind }
    }
}
