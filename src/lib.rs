//! Front end of the Flint compiler: lexer, two-pass parser, resolver,
//! type registry and semantic analyzer.
//!
//! This crate turns source text rooted at one file into a frozen AST plus
//! a per-file namespace map (`spec.md` §1). It does not emit LLVM-IR,
//! invoke a linker, or speak the LSP protocol — those are external
//! consumers of [`driver::compile`]'s output.
//!
//! The phases, in the order the [`driver`] runs them:
//!
//! - [`lexer`] (L): source text -> token stream.
//! - [`hash`] (H): absolute path -> stable file identity.
//! - [`resolver`] (R): the import dependency graph, with cycle tolerance.
//! - [`parser`] (P): two-pass parse (declaration skimming, then bodies).
//! - [`types`] (T): per-namespace structural type interning.
//! - [`namespace`] (N): per-file symbol table.
//! - [`analyzer`] (A): a read-only semantic walk over the frozen AST.
//! - [`registries`] (G): thread-safe id dispensers and cross-file tables.
//! - [`driver`] (D): orchestrates all of the above.
//!
//! [`diagnostics`] renders whatever any phase reports.

pub mod analyzer;
pub mod ast;
pub mod diagnostics;
pub mod driver;
pub mod hash;
pub mod lexer;
pub mod namespace;
pub mod parser;
pub mod registries;
pub mod resolver;
pub mod types;
