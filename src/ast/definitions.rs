//! DefinitionNode: the 10-variant top-level definition sum type
//! (`spec.md` §3).
//!
//! Grounded on `original_source/include/parser/ast/definitions/*.hpp`, one
//! struct per kind in the original, collapsed here into `DefinitionKind`.
//! Every definition carries its [`SourcePosition`] (which itself carries
//! the owning file's hash), per `spec.md`'s "every definition carries
//! file-hash + source position."

use std::sync::{Arc, OnceLock};

use crate::ast::position::SourcePosition;
use crate::ast::scope::Scope;
use crate::types::TypeRef;

/// Shared, reference-counted handle to a definition. Definitions are
/// looked up by name from many places at once during pass-2 (current
/// scope -> enclosing scopes -> file namespace -> imported namespaces,
/// per `spec.md` §4.P), so they are held behind `Arc` rather than owned
/// uniquely by one container.
pub type DefinitionRef = Arc<DefinitionKind>;

#[derive(Debug)]
pub enum DefinitionKind {
    Data(DataNode),
    Entity(EntityNode),
    Enum(EnumNode),
    Error(ErrorNode),
    /// A `func` module: a named collection of related function
    /// definitions sharing a namespace prefix (distinct from a single
    /// `function`).
    FuncModule(FuncModuleNode),
    Function(FunctionNode),
    Import(ImportNode),
    /// `link <name>` — an external link directive consumed by the linker
    /// collaborator; the front end only records its presence and name.
    Link(LinkNode),
    Test(TestNode),
    Variant(VariantNode),
}

impl DefinitionKind {
    pub fn position(&self) -> SourcePosition {
        match self {
            DefinitionKind::Data(n) => n.position,
            DefinitionKind::Entity(n) => n.position,
            DefinitionKind::Enum(n) => n.position,
            DefinitionKind::Error(n) => n.position,
            DefinitionKind::FuncModule(n) => n.position,
            DefinitionKind::Function(n) => n.position,
            DefinitionKind::Import(n) => n.position,
            DefinitionKind::Link(n) => n.position,
            DefinitionKind::Test(n) => n.position,
            DefinitionKind::Variant(n) => n.position,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DefinitionKind::Data(n) => &n.name,
            DefinitionKind::Entity(n) => &n.name,
            DefinitionKind::Enum(n) => &n.name,
            DefinitionKind::Error(n) => &n.name,
            DefinitionKind::FuncModule(n) => &n.name,
            DefinitionKind::Function(n) => &n.name,
            DefinitionKind::Import(n) => &n.alias,
            DefinitionKind::Link(n) => &n.name,
            DefinitionKind::Test(n) => &n.name,
            DefinitionKind::Variant(n) => &n.name,
        }
    }
}

#[derive(Debug)]
pub struct DataNode {
    pub position: SourcePosition,
    pub name: String,
    pub fields: Vec<(String, TypeRef, bool)>,
    pub is_extern: bool,
}

/// The modular entity path only (`spec.md` §9 Open Question iii): an
/// entity groups data fields with methods. The "monolithic entity"
/// variant from the original is intentionally not modeled; its semantics
/// were never defined in `spec.md`.
#[derive(Debug)]
pub struct EntityNode {
    pub position: SourcePosition,
    pub name: String,
    pub fields: Vec<(String, TypeRef, bool)>,
    pub method_indices: Vec<usize>,
}

#[derive(Debug)]
pub struct EnumNode {
    pub position: SourcePosition,
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub struct ErrorNode {
    pub position: SourcePosition,
    pub name: String,
    pub variants: Vec<String>,
}

#[derive(Debug)]
pub struct FuncModuleNode {
    pub position: SourcePosition,
    pub name: String,
    pub function_indices: Vec<usize>,
}

#[derive(Debug)]
pub struct FunctionNode {
    pub position: SourcePosition,
    pub name: String,
    pub is_aligned: bool,
    pub is_const: bool,
    pub is_extern: bool,
    /// (type, name, is_mutable) per `spec.md` §3's `CallNodeBase`
    /// parameter shape.
    pub parameters: Vec<(TypeRef, String, bool)>,
    pub return_types: Vec<TypeRef>,
    pub error_types: Vec<TypeRef>,
    /// Unset for a pure declaration (e.g. `extern`) or before pass-2 has
    /// run; set exactly once, by pass-2, after which the node is frozen.
    /// `OnceLock` rather than `Option<Box<Scope>>` because the
    /// [`DefinitionRef`] wrapping this node is already shared (`Arc`) by
    /// the time pass-2 fills the body in — pass-1 registers the node's
    /// signature into `Registries`/`Namespace` so calls can resolve
    /// against it before any body exists.
    pub scope: OnceLock<Box<Scope>>,
}

impl FunctionNode {
    /// The (name, argument-type-list) identity `spec.md` §4.P uses to
    /// disambiguate overloads.
    pub fn signature_key(&self) -> (String, Vec<String>) {
        (
            self.name.clone(),
            self.parameters
                .iter()
                .map(|(ty, _, _)| ty.canonical_string())
                .collect(),
        )
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.get().map(|b| b.as_ref())
    }

    /// Fills in the parsed body. Called exactly once, by pass-2.
    pub fn set_scope(&self, scope: Box<Scope>) {
        let _ = self.scope.set(scope);
    }
}

#[derive(Debug)]
pub struct ImportNode {
    /// The alias this import is bound to in the importing file (the
    /// module's own name if no `as` clause was given).
    pub alias: String,
    pub position: SourcePosition,
    pub target: ImportTarget,
    /// `spec.md` §4.R: aliased imports are recursed into even in
    /// `minimal_tree` (LSP) mode.
    pub is_aliased: bool,
}

#[derive(Debug, Clone)]
pub enum ImportTarget {
    CoreModule(String),
    /// A file import: directory (relative to the importing file) and file
    /// name, matching `original_source`'s `FileDependency`.
    File { directory: std::path::PathBuf, filename: String },
}

#[derive(Debug)]
pub struct LinkNode {
    pub position: SourcePosition,
    pub name: String,
}

#[derive(Debug)]
pub struct TestNode {
    pub position: SourcePosition,
    pub name: String,
    /// Allocated from the process-wide test-id counter (`spec.md` §3).
    pub test_id: u64,
    /// Set exactly once, by pass-2 — see [`FunctionNode::scope`].
    pub scope: OnceLock<Box<Scope>>,
}

impl TestNode {
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.get().map(|b| b.as_ref())
    }

    pub fn set_scope(&self, scope: Box<Scope>) {
        let _ = self.scope.set(scope);
    }
}

#[derive(Debug)]
pub struct VariantNode {
    pub position: SourcePosition,
    pub name: String,
    /// Each case: name plus an optional payload type.
    pub cases: Vec<(String, Option<TypeRef>)>,
}
