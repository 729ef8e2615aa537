//! FileNode: the root AST node of one compilation unit (`spec.md` §3).

use crate::ast::definitions::{DefinitionKind, DefinitionRef, ImportTarget};
use crate::hash::FileHash;

/// Root node of one file's AST. Holds its definitions (shared with the
/// file's [`crate::namespace::Namespace`], since both need to look a
/// definition up by identity) in parse order.
#[derive(Debug)]
pub struct FileNode {
    pub file_hash: FileHash,
    pub file_name: String,
    pub definitions: Vec<DefinitionRef>,
}

impl FileNode {
    pub fn new(file_hash: FileHash, file_name: String) -> Self {
        Self {
            file_hash,
            file_name,
            definitions: Vec::new(),
        }
    }

    pub fn push(&mut self, def: DefinitionRef) {
        self.definitions.push(def);
    }

    /// The core modules this file imports, derived from its `Import`
    /// definitions rather than tracked separately — `spec.md` §6's
    /// external-interface listing is a view over `definitions`, not a
    /// second source of truth.
    pub fn imported_core_modules(&self) -> Vec<&str> {
        self.definitions
            .iter()
            .filter_map(|def| match def.as_ref() {
                DefinitionKind::Import(import) => match &import.target {
                    ImportTarget::CoreModule(name) => Some(name.as_str()),
                    ImportTarget::File { .. } => None,
                },
                _ => None,
            })
            .collect()
    }
}

/// The declaration-only result of pass-1, before bodies are parsed.
/// Design Note: "model the two passes as distinct phases with a typed
/// handoff... pass-1 returns a `PreFileNode`."
#[derive(Debug)]
pub struct PreFileNode {
    pub file_hash: FileHash,
    pub file_name: String,
    pub definitions: Vec<DefinitionRef>,
    /// Function definitions whose body tokens were stashed and still need
    /// pass-2 (index into `definitions`, plus the raw token slice).
    pub open_functions: Vec<(usize, Vec<crate::lexer::Token>)>,
    pub open_tests: Vec<(usize, Vec<crate::lexer::Token>)>,
}

impl PreFileNode {
    pub fn new(file_hash: FileHash, file_name: String) -> Self {
        Self {
            file_hash,
            file_name,
            definitions: Vec::new(),
            open_functions: Vec::new(),
            open_tests: Vec::new(),
        }
    }

    pub fn push(&mut self, def: DefinitionRef) {
        self.definitions.push(def);
    }
}
