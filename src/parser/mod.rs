//! Phase P: Parser.
//!
//! Ties pass-1 ([`decl::DeclParser`]) and pass-2 ([`stmt::StmtParser`])
//! together for one file. `spec.md` §4.P's ordering requirement — every
//! file's pass-1 must finish before any file's pass-2 begins, since a
//! call in file A's body may forward-reference a function declared in
//! file B — is the Driver's responsibility: it alone sees the whole file
//! set and can run all pass-1s to completion first.

pub mod cursor;
pub mod decl;
pub mod error;
pub mod expr;
pub mod precedence;
pub mod stmt;

pub use decl::DeclParser;
pub use error::{ParseResult, ParserError};
pub use expr::ExprParser;
pub use stmt::StmtParser;

use crate::ast::file::{FileNode, PreFileNode};
use crate::ast::DefinitionKind;
use crate::hash::FileHash;
use crate::lexer::Token;
use crate::namespace::Namespace;
use crate::registries::Registries;

pub struct Parser<'a> {
    pub file: FileHash,
    pub file_name: String,
    pub namespace: &'a Namespace,
    pub registries: &'a Registries,
}

impl<'a> Parser<'a> {
    pub fn new(file: FileHash, file_name: String, namespace: &'a Namespace, registries: &'a Registries) -> Self {
        Self { file, file_name, namespace, registries }
    }

    pub fn pass1(&self, tokens: Vec<Token>) -> ParseResult<PreFileNode> {
        DeclParser::new(self.file, self.file_name.clone(), self.namespace, self.registries).parse_pre_file(tokens)
    }

    /// Completes a [`PreFileNode`] by parsing every stashed function and
    /// test body, filling in each node's [`crate::ast::scope::Scope`]
    /// exactly once and returning the finished [`FileNode`]. Must only be
    /// called once every file in the compile unit has run `pass1`.
    pub fn pass2(&self, pre: PreFileNode) -> ParseResult<FileNode> {
        let stmt_parser = StmtParser::new(self.file, self.namespace, self.registries);
        let PreFileNode { file_hash, file_name, mut definitions, open_functions, open_tests } = pre;

        for (index, tokens) in open_functions {
            let parameters = match definitions[index].as_ref() {
                DefinitionKind::Function(f) => f.parameters.clone(),
                _ => unreachable!("open_functions only indexes Function definitions"),
            };
            let scope = stmt_parser.parse_function_body(&tokens, &parameters)?;
            match definitions[index].as_ref() {
                DefinitionKind::Function(f) => f.set_scope(scope),
                _ => unreachable!("open_functions only indexes Function definitions"),
            }
        }

        for (index, tokens) in open_tests {
            let scope = stmt_parser.parse_test_body(&tokens)?;
            match definitions[index].as_ref() {
                DefinitionKind::Test(t) => t.set_scope(scope),
                _ => unreachable!("open_tests only indexes Test definitions"),
            }
        }

        let mut file = FileNode::new(file_hash, file_name);
        file.definitions.append(&mut definitions);
        Ok(file)
    }
}
