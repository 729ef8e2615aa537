//! CallNodeBase: function pointer + arguments + resolved return type.
//!
//! The original compiler keeps `CallNodeBase*` pointers in a global
//! ordered map (`original_source/include/parser/ast/call_node_base.hpp`).
//! Design Note "raw `this`-pointers in call tracking" re-architects this as
//! an arena + index: call nodes live in `Registries::calls`
//! (a `Mutex<Vec<CallNodeBase>>`), and the `call_id` *is* the index, so the
//! "ordered map" `spec.md` §4.P describes is just arena insertion order —
//! no separate ordered map is needed.

use crate::ast::expressions::ExpressionNode;
use crate::types::TypeRef;

/// One argument to a call: the expression plus whether it is passed by
/// reference (`spec.md` §3 "CallNodeBase").
#[derive(Debug)]
pub struct Argument {
    pub value: Box<ExpressionNode>,
    pub by_reference: bool,
}

/// The base information shared by statement-position and expression-
/// position calls (`spec.md` §3 "CallNodeBase").
#[derive(Debug)]
pub struct CallNodeBase {
    /// Index of the resolved callee in `Registries::parsed_functions`, or
    /// `None` if the call targets a core module function rather than a
    /// user-defined one.
    pub function_index: Option<usize>,
    pub core_module_call: Option<CoreModuleCall>,
    pub arguments: Vec<Argument>,
    pub error_types: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub scope_id: u64,
    pub has_catch: bool,
    /// Filled in once the arena holds this node; equal to its own index.
    pub call_id: u64,
}

#[derive(Debug, Clone)]
pub struct CoreModuleCall {
    pub module: String,
    pub function: String,
}

impl CallNodeBase {
    pub fn may_throw(&self) -> bool {
        !self.error_types.is_empty()
    }
}
