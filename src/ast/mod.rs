//! The AST data model (`spec.md` §3): definitions, expressions, statements,
//! scopes, calls, and the per-file root node.
//!
//! Grounded on `original_source/include/parser/ast/**`'s one-struct-per-
//! node-kind header layout, collapsed per Design Note "polymorphic
//! hierarchies -> tagged union" into the five submodules below, each one
//! enum dispatched via exhaustive `match` instead of `dynamic_cast`.

pub mod call;
pub mod definitions;
pub mod expressions;
pub mod file;
pub mod position;
pub mod scope;
pub mod statements;

pub use call::{Argument, CallNodeBase, CoreModuleCall};
pub use definitions::{DefinitionKind, DefinitionRef};
pub use expressions::{BinaryOperator, ExpressionKind, ExpressionNode, Literal, UnaryOperator};
pub use file::{FileNode, PreFileNode};
pub use position::SourcePosition;
pub use scope::{Scope, Variable};
pub use statements::{AssignmentTarget, StatementKind, StatementNode};
