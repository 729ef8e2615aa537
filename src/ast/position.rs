//! Source positions, carried by every definition/expression/statement node.
//!
//! A position is a 1-based (line, column) plus token length, scoped to one
//! file (`spec.md` §3: "every definition carries file-hash + source
//! position"). The Lexer already produces exactly this shape for every
//! token (`crate::lexer::TokenPosition`), so the AST reuses it rather than
//! defining a second, field-for-field identical struct that would need
//! converting at every parser production.
pub use crate::lexer::TokenPosition as SourcePosition;
