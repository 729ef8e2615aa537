//! Scope: tracks variable declarations and statement bodies.
//!
//! Grounded on `original_source/include/parser/ast/scope.hpp`, translated
//! from the shared_ptr/raw-map scheme into an owned tree: a `Scope` owns
//! its statements and child scopes outright (`spec.md`'s ownership
//! section), and refers to its parent only through the parent's segment
//! number at the point of nesting, never through a shared pointer back up.

use std::collections::HashMap;

use super::statements::StatementNode;
use crate::types::TypeRef;

/// A variable's declaration-site bookkeeping (`spec.md` §3 "Scope").
#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: TypeRef,
    pub scope_id: u64,
    pub scope_segment: u32,
    pub is_mutable: bool,
    pub is_parameter: bool,
    pub is_reference: bool,
    pub is_pseudo: bool,
    pub scope_ids_where_returned: Vec<u64>,
}

/// A lexical scope: an ordered body of statements plus the variables live
/// within it. Scopes nest; a child scope clones its parent's live variables
/// at construction time so that shadowing is just "insert under a name
/// already present," which [`Scope::declare`] rejects only within the same
/// scope (per the Scope invariant: shadowing across nested scopes is the
/// only legal duplication).
#[derive(Debug)]
pub struct Scope {
    pub scope_id: u64,
    pub body: Vec<StatementNode>,
    pub parent_scope_segment: u32,
    /// Current segment counter; incremented each time a child scope nests
    /// or a declaration is added, so that "which variables are live at a
    /// given point" can be computed later (glossary: "Scope segment").
    pub segment: u32,
    variables: HashMap<String, Variable>,
}

impl Scope {
    pub fn new_root(scope_id: u64) -> Self {
        Self {
            scope_id,
            body: Vec::new(),
            parent_scope_segment: 0,
            segment: 0,
            variables: HashMap::new(),
        }
    }

    /// Creates a child scope nested inside `parent` at the parent's current
    /// segment, cloning the parent's currently-live variables so lookups in
    /// the child never need to walk up the tree.
    pub fn new_child(scope_id: u64, parent: &Scope) -> Self {
        Self {
            scope_id,
            body: Vec::new(),
            parent_scope_segment: parent.segment,
            segment: 0,
            variables: parent.variables.clone(),
        }
    }

    /// Declares a new variable in this scope. Returns `false` (and declares
    /// nothing) if the name is already live in this scope — the Scope
    /// invariant: a name is unique within the union of a scope's own
    /// declarations and its transitive parents' pre-nesting declarations.
    pub fn declare(&mut self, name: String, mut variable: Variable) -> bool {
        if self.variables.contains_key(&name) {
            return false;
        }
        variable.scope_segment = self.segment;
        self.segment += 1;
        self.variables.insert(name, variable);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// Variables declared in this scope that are not present (by name) in
    /// the variable set this scope was created from — used by the
    /// generator-facing consumer to know which variables fall out of scope
    /// at a given segment. Mirrors `Scope::get_unique_variables`.
    pub fn unique_variables_up_to(&self, segment: u32, inherited: &Scope) -> HashMap<String, Variable> {
        self.variables
            .iter()
            .filter(|(name, var)| var.scope_segment <= segment && !inherited.variables.contains_key(*name))
            .map(|(name, var)| (name.clone(), var.clone()))
            .collect()
    }

    pub fn push_statement(&mut self, stmt: StatementNode) {
        self.body.push(stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Primitive, Type};
    use std::sync::Arc;

    fn var(ty: Primitive) -> Variable {
        Variable {
            ty: Arc::new(Type::Primitive(ty)),
            scope_id: 0,
            scope_segment: 0,
            is_mutable: true,
            is_parameter: false,
            is_reference: false,
            is_pseudo: false,
            scope_ids_where_returned: vec![],
        }
    }

    #[test]
    fn redeclaration_in_same_scope_rejected() {
        let mut scope = Scope::new_root(0);
        assert!(scope.declare("a".to_string(), var(Primitive::I32)));
        assert!(!scope.declare("a".to_string(), var(Primitive::Bool)));
    }

    #[test]
    fn child_scope_sees_parent_variables() {
        let mut parent = Scope::new_root(0);
        parent.declare("a".to_string(), var(Primitive::I32));
        let child = Scope::new_child(1, &parent);
        assert!(child.lookup("a").is_some());
    }

    #[test]
    fn shadowing_in_child_scope_is_allowed() {
        let mut parent = Scope::new_root(0);
        parent.declare("a".to_string(), var(Primitive::I32));
        let mut child = Scope::new_child(1, &parent);
        assert!(child.declare("a".to_string(), var(Primitive::Bool)));
    }
}
