//! Phase N: Namespace.
//!
//! A [`Namespace`] is the per-file container `spec.md` §4.N describes: a
//! type registry plus the set of public top-level definitions, plus the
//! core modules this file imports. One `Namespace` is created per file
//! during pass-1 and is read-only from pass-2 onward.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::ast::DefinitionRef;
use crate::hash::FileHash;
use crate::types::TypeRegistry;

/// Error raised when a Namespace invariant would be violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    /// `spec.md` §4.N invariant 1: a name was defined twice in one file.
    DuplicateDefinition { name: String },
    /// `spec.md` §4.N invariant 2: an `import <module>` named a module
    /// outside the fixed core-module set (`spec.md` §6).
    UnknownCoreModule { name: String },
}

impl std::fmt::Display for NamespaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamespaceError::DuplicateDefinition { name } => {
                write!(f, "'{name}' is already defined in this file")
            }
            NamespaceError::UnknownCoreModule { name } => {
                write!(f, "'{name}' is not a recognized core module")
            }
        }
    }
}

impl std::error::Error for NamespaceError {}

/// Per-file symbol table plus type registry (`spec.md` §3 "Namespace").
pub struct Namespace {
    pub file_hash: FileHash,
    pub types: TypeRegistry,
    definitions: RwLock<HashMap<String, DefinitionRef>>,
    imported_core_modules: RwLock<HashMap<String, CoreModuleImport>>,
}

/// Records that a file imported a fixed core module (`import assert`, for
/// example), paired with the source position of the import for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreModuleImport {
    pub module: String,
    pub line: u32,
    pub column: u32,
}

impl Namespace {
    pub fn new(file_hash: FileHash) -> Self {
        Self {
            file_hash,
            types: TypeRegistry::new(),
            definitions: RwLock::new(HashMap::new()),
            imported_core_modules: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a top-level definition under `name`. Enforces invariant 1:
    /// every top-level name in a file has exactly one definition entry.
    pub fn define(&self, name: String, def: DefinitionRef) -> Result<(), NamespaceError> {
        let mut definitions = self.definitions.write().expect("namespace poisoned");
        if definitions.contains_key(&name) {
            return Err(NamespaceError::DuplicateDefinition { name });
        }
        definitions.insert(name, def);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<DefinitionRef> {
        self.definitions.read().expect("namespace poisoned").get(name).cloned()
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.read().expect("namespace poisoned").len()
    }

    pub fn definition_names(&self) -> Vec<String> {
        self.definitions
            .read()
            .expect("namespace poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Records an `import <core-module>`. Enforces invariant 2.
    pub fn import_core_module(
        &self,
        module: String,
        line: u32,
        column: u32,
    ) -> Result<(), NamespaceError> {
        if !crate::types::core_modules::is_core_module(&module) {
            return Err(NamespaceError::UnknownCoreModule { name: module });
        }
        self.imported_core_modules.write().expect("namespace poisoned").insert(
            module.clone(),
            CoreModuleImport {
                module,
                line,
                column,
            },
        );
        Ok(())
    }

    pub fn imported_core_modules(&self) -> Vec<CoreModuleImport> {
        self.imported_core_modules
            .read()
            .expect("namespace poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn has_imported(&self, module: &str) -> bool {
        self.imported_core_modules
            .read()
            .expect("namespace poisoned")
            .contains_key(module)
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("file_hash", &self.file_hash)
            .field("definition_count", &self.definition_count())
            .field("type_count", &self.types.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::definitions::{DefinitionKind, FunctionNode};
    use crate::ast::SourcePosition;
    use std::sync::Arc;

    fn dummy_function(name: &str) -> DefinitionRef {
        Arc::new(DefinitionKind::Function(FunctionNode {
            position: SourcePosition::new(FileHash::of_canonical_path(std::path::Path::new("/x")), 1, 1, 1),
            name: name.to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![],
            error_types: vec![],
            scope: std::sync::OnceLock::new(),
        }))
    }

    #[test]
    fn duplicate_definition_rejected() {
        let ns = Namespace::new(FileHash::of_canonical_path(std::path::Path::new("/a")));
        ns.define("main".to_string(), dummy_function("main")).unwrap();
        let err = ns.define("main".to_string(), dummy_function("main")).unwrap_err();
        assert_eq!(
            err,
            NamespaceError::DuplicateDefinition {
                name: "main".to_string()
            }
        );
    }

    #[test]
    fn unknown_core_module_rejected() {
        let ns = Namespace::new(FileHash::of_canonical_path(std::path::Path::new("/a")));
        assert!(ns.import_core_module("network".to_string(), 1, 1).is_err());
        assert!(ns.import_core_module("assert".to_string(), 1, 1).is_ok());
    }
}
