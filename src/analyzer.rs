//! Phase A: Analyzer.
//!
//! A read-only walk over one file's frozen AST (`spec.md` §4.A), checked
//! against its `Namespace` and the process-wide `Registries` call arena.
//! Unlike the Lex/Parse layers, semantic errors are *collected* rather
//! than aborting the walk (`spec.md` §7's error-classification table:
//! "Semantic ... collected; reported; sets final status to failure but
//! continues") — `analyze_file` always finishes and hands back every
//! violation it found.

use std::collections::HashSet;

use crate::ast::call::Argument;
use crate::ast::definitions::DefinitionKind;
use crate::ast::expressions::{BinaryOperator, ExpressionKind, ExpressionNode, Literal};
use crate::ast::file::FileNode;
use crate::ast::position::SourcePosition;
use crate::ast::scope::Scope;
use crate::ast::statements::{AssignmentTarget, StatementKind, StatementNode};
use crate::namespace::Namespace;
use crate::registries::Registries;
use crate::types::{Type, TypeRef};

#[derive(Debug, Clone)]
pub enum AnalyzeError {
    PointerOutsideExtern { position: SourcePosition },
    BreakOutsideLoop { position: SourcePosition },
    ContinueOutsideLoop { position: SourcePosition },
    ThrowOutsideErrorFunction { position: SourcePosition },
    ReturnTypeMismatch { position: SourcePosition, expected: Vec<String>, found: Vec<String> },
    NonExhaustiveSwitch { position: SourcePosition, missing: Vec<String> },
    DuplicateVariantBinding { position: SourcePosition, name: String },
    CatchOnNonThrowingCall { position: SourcePosition },
    ImmutableAssignment { position: SourcePosition, name: String },
    NonIntegerArrayIndex { position: SourcePosition },
    NonIntegerArrayDimension { position: SourcePosition },
    ConstFunctionViolation { position: SourcePosition, detail: String },
    GroupArityMismatch { position: SourcePosition, expected: usize, found: usize },
    DuplicateVariable { position: SourcePosition, name: String },
    DivisionByZero { position: SourcePosition },
}

impl AnalyzeError {
    /// The stable error code this variant corresponds to, where `spec.md`
    /// §4.A names one explicitly; the rest are this crate's own, in the
    /// same `ERR_*` family.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::PointerOutsideExtern { .. } => "ERR_PTR_NOT_ALLOWED_IN_NON_EXTERN_CONTEXT",
            AnalyzeError::BreakOutsideLoop { .. } => "ERR_BREAK_OUTSIDE_LOOP",
            AnalyzeError::ContinueOutsideLoop { .. } => "ERR_CONTINUE_OUTSIDE_LOOP",
            AnalyzeError::ThrowOutsideErrorFunction { .. } => "ERR_THROW_OUTSIDE_ERROR_FUNCTION",
            AnalyzeError::ReturnTypeMismatch { .. } => "ERR_RETURN_TYPE_MISMATCH",
            AnalyzeError::NonExhaustiveSwitch { .. } => "ERR_NON_EXHAUSTIVE_SWITCH",
            AnalyzeError::DuplicateVariantBinding { .. } => "ERR_DUPLICATE_VARIANT_BINDING",
            AnalyzeError::CatchOnNonThrowingCall { .. } => "ERR_CATCH_ON_NON_THROWING_CALL",
            AnalyzeError::ImmutableAssignment { .. } => "ERR_IMMUTABLE_ASSIGNMENT",
            AnalyzeError::NonIntegerArrayIndex { .. } => "ERR_NON_INTEGER_ARRAY_INDEX",
            AnalyzeError::NonIntegerArrayDimension { .. } => "ERR_NON_INTEGER_ARRAY_DIMENSION",
            AnalyzeError::ConstFunctionViolation { .. } => "ERR_CONST_VIOLATION",
            AnalyzeError::GroupArityMismatch { .. } => "ERR_GROUP_ARITY_MISMATCH",
            AnalyzeError::DuplicateVariable { .. } => "ERR_DUPLICATE_VARIABLE",
            AnalyzeError::DivisionByZero { .. } => "ERR_DIVISION_BY_ZERO",
        }
    }

    pub fn position(&self) -> SourcePosition {
        match self {
            AnalyzeError::PointerOutsideExtern { position }
            | AnalyzeError::BreakOutsideLoop { position }
            | AnalyzeError::ContinueOutsideLoop { position }
            | AnalyzeError::ThrowOutsideErrorFunction { position }
            | AnalyzeError::ReturnTypeMismatch { position, .. }
            | AnalyzeError::NonExhaustiveSwitch { position, .. }
            | AnalyzeError::DuplicateVariantBinding { position, .. }
            | AnalyzeError::CatchOnNonThrowingCall { position }
            | AnalyzeError::ImmutableAssignment { position, .. }
            | AnalyzeError::NonIntegerArrayIndex { position }
            | AnalyzeError::NonIntegerArrayDimension { position }
            | AnalyzeError::ConstFunctionViolation { position, .. }
            | AnalyzeError::GroupArityMismatch { position, .. }
            | AnalyzeError::DuplicateVariable { position, .. }
            | AnalyzeError::DivisionByZero { position } => *position,
        }
    }
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.position();
        match self {
            AnalyzeError::PointerOutsideExtern { .. } => {
                write!(f, "{}:{}: [{}] pointer types are only allowed in extern contexts", p.line, p.column, self.code())
            }
            AnalyzeError::BreakOutsideLoop { .. } => {
                write!(f, "{}:{}: [{}] 'break' outside a loop", p.line, p.column, self.code())
            }
            AnalyzeError::ContinueOutsideLoop { .. } => {
                write!(f, "{}:{}: [{}] 'continue' outside a loop", p.line, p.column, self.code())
            }
            AnalyzeError::ThrowOutsideErrorFunction { .. } => write!(
                f,
                "{}:{}: [{}] 'throw' in a function with no declared error types",
                p.line, p.column, self.code()
            ),
            AnalyzeError::ReturnTypeMismatch { expected, found, .. } => write!(
                f,
                "{}:{}: [{}] return type mismatch: expected ({}), found ({})",
                p.line, p.column, self.code(), expected.join(", "), found.join(", ")
            ),
            AnalyzeError::NonExhaustiveSwitch { missing, .. } => write!(
                f,
                "{}:{}: [{}] switch is not exhaustive, missing: {}",
                p.line, p.column, self.code(), missing.join(", ")
            ),
            AnalyzeError::DuplicateVariantBinding { name, .. } => write!(
                f,
                "{}:{}: [{}] binding '{}' used more than once in this pattern",
                p.line, p.column, self.code(), name
            ),
            AnalyzeError::CatchOnNonThrowingCall { .. } => write!(
                f,
                "{}:{}: [{}] 'catch' follows a call that declares no error types",
                p.line, p.column, self.code()
            ),
            AnalyzeError::ImmutableAssignment { name, .. } => write!(
                f,
                "{}:{}: [{}] '{}' is not mutable",
                p.line, p.column, self.code(), name
            ),
            AnalyzeError::NonIntegerArrayIndex { .. } => {
                write!(f, "{}:{}: [{}] array index must be integer-typed", p.line, p.column, self.code())
            }
            AnalyzeError::NonIntegerArrayDimension { .. } => {
                write!(f, "{}:{}: [{}] array dimension must be integer-typed", p.line, p.column, self.code())
            }
            AnalyzeError::ConstFunctionViolation { detail, .. } => {
                write!(f, "{}:{}: [{}] {}", p.line, p.column, self.code(), detail)
            }
            AnalyzeError::GroupArityMismatch { expected, found, .. } => write!(
                f,
                "{}:{}: [{}] group declaration expects {} value(s), found {}",
                p.line, p.column, self.code(), expected, found
            ),
            AnalyzeError::DuplicateVariable { name, .. } => write!(
                f,
                "{}:{}: [{}] '{}' is already declared in this scope",
                p.line, p.column, self.code(), name
            ),
            AnalyzeError::DivisionByZero { .. } => {
                write!(f, "{}:{}: [{}] division by zero", p.line, p.column, self.code())
            }
        }
    }
}

impl std::error::Error for AnalyzeError {}

/// Everything about the enclosing function a statement/expression walk
/// needs to judge, threaded down by value (it is `Copy`-cheap: a few
/// slices and flags) rather than recomputed per node.
struct FnContext<'a> {
    return_types: &'a [TypeRef],
    has_error_types: bool,
    is_extern: bool,
    is_const: bool,
    const_parameters: &'a [String],
    in_loop: bool,
}

pub struct Analyzer<'a> {
    namespace: &'a Namespace,
    registries: &'a Registries,
}

impl<'a> Analyzer<'a> {
    pub fn new(namespace: &'a Namespace, registries: &'a Registries) -> Self {
        Self { namespace, registries }
    }

    pub fn analyze_file(&self, file: &FileNode) -> Vec<AnalyzeError> {
        let mut errors = Vec::new();
        for def in &file.definitions {
            match def.as_ref() {
                DefinitionKind::Function(func) => {
                    for ty in func.parameters.iter().map(|(t, _, _)| t).chain(func.return_types.iter()).chain(func.error_types.iter()) {
                        check_no_pointer_outside_extern(ty, func.position, func.is_extern, &mut errors);
                    }
                    if let Some(scope) = func.scope() {
                        let const_parameters: Vec<String> = func.parameters.iter().map(|(_, name, _)| name.clone()).collect();
                        let ctx = FnContext {
                            return_types: &func.return_types,
                            has_error_types: !func.error_types.is_empty(),
                            is_extern: func.is_extern,
                            is_const: func.is_const,
                            const_parameters: &const_parameters,
                            in_loop: false,
                        };
                        self.walk_scope(scope, &ctx, &mut errors);
                    }
                }
                DefinitionKind::Test(test) => {
                    if let Some(scope) = test.scope() {
                        let ctx = FnContext {
                            return_types: &[],
                            has_error_types: false,
                            is_extern: false,
                            is_const: false,
                            const_parameters: &[],
                            in_loop: false,
                        };
                        self.walk_scope(scope, &ctx, &mut errors);
                    }
                }
                _ => {}
            }
        }
        errors
    }

    fn walk_scope(&self, scope: &Scope, ctx: &FnContext, errors: &mut Vec<AnalyzeError>) {
        let mut locally_declared: HashSet<String> = HashSet::new();
        for stmt in &scope.body {
            self.walk_statement(stmt, scope, ctx, &mut locally_declared, errors);
        }
    }

    fn walk_statement(
        &self,
        stmt: &StatementNode,
        scope: &Scope,
        ctx: &FnContext,
        locally_declared: &mut HashSet<String>,
        errors: &mut Vec<AnalyzeError>,
    ) {
        match &stmt.kind {
            StatementKind::Declaration { name, declared_type, value, .. } => {
                if !locally_declared.insert(name.clone()) {
                    errors.push(AnalyzeError::DuplicateVariable { position: stmt.position, name: name.clone() });
                }
                let ty = declared_type.clone().unwrap_or_else(|| value.ty.clone());
                check_no_pointer_outside_extern(&ty, stmt.position, ctx.is_extern, errors);
                self.walk_expression(value, ctx, errors);
            }
            StatementKind::GroupDeclaration { names, value, group_id: _ } => {
                for (name, _) in names {
                    if !locally_declared.insert(name.clone()) {
                        errors.push(AnalyzeError::DuplicateVariable { position: stmt.position, name: name.clone() });
                    }
                }
                match value.ty.as_ref() {
                    Type::Group(items) if items.len() == names.len() => {}
                    Type::Group(items) => errors.push(AnalyzeError::GroupArityMismatch {
                        position: stmt.position,
                        expected: names.len(),
                        found: items.len(),
                    }),
                    _ => errors.push(AnalyzeError::GroupArityMismatch {
                        position: stmt.position,
                        expected: names.len(),
                        found: 1,
                    }),
                }
                self.walk_expression(value, ctx, errors);
            }
            StatementKind::Assignment { target, value } => {
                self.check_assignment_target(target, scope, stmt.position, errors);
                self.walk_expression(value, ctx, errors);
            }
            StatementKind::Call { call_id } => self.walk_call(*call_id, ctx, errors),
            StatementKind::Catch { call_id, body, .. } => {
                let may_throw = self.registries.with_call(*call_id, |call| call.may_throw()).unwrap_or(false);
                if !may_throw {
                    errors.push(AnalyzeError::CatchOnNonThrowingCall { position: stmt.position });
                }
                self.walk_scope(body, ctx, errors);
            }
            StatementKind::Throw { error } => {
                if !ctx.has_error_types {
                    errors.push(AnalyzeError::ThrowOutsideErrorFunction { position: stmt.position });
                }
                self.walk_expression(error, ctx, errors);
            }
            StatementKind::Return { values } => {
                let found: Vec<String> = values.iter().map(|v| v.ty.canonical_string()).collect();
                let expected: Vec<String> = ctx.return_types.iter().map(|t| t.canonical_string()).collect();
                if found != expected {
                    errors.push(AnalyzeError::ReturnTypeMismatch { position: stmt.position, expected, found });
                }
                for v in values {
                    self.walk_expression(v, ctx, errors);
                }
            }
            StatementKind::If { condition, then_branch, else_branch } => {
                self.walk_expression(condition, ctx, errors);
                self.walk_scope(then_branch, ctx, errors);
                if let Some(else_branch) = else_branch {
                    self.walk_scope(else_branch, ctx, errors);
                }
            }
            StatementKind::While { condition, body } => {
                self.walk_expression(condition, ctx, errors);
                let loop_ctx = FnContext { in_loop: true, ..ctx.shallow_clone() };
                self.walk_scope(body, &loop_ctx, errors);
            }
            StatementKind::DoWhile { body, condition } => {
                let loop_ctx = FnContext { in_loop: true, ..ctx.shallow_clone() };
                self.walk_scope(body, &loop_ctx, errors);
                self.walk_expression(condition, ctx, errors);
            }
            StatementKind::For { init, condition, post, body } => {
                let mut declared = HashSet::new();
                self.walk_statement(init, scope, ctx, &mut declared, errors);
                self.walk_expression(condition, ctx, errors);
                let loop_ctx = FnContext { in_loop: true, ..ctx.shallow_clone() };
                self.walk_scope(body, &loop_ctx, errors);
                self.walk_statement(post, scope, ctx, &mut declared, errors);
            }
            StatementKind::EnhancedFor { iterable, body, .. } => {
                self.walk_expression(iterable, ctx, errors);
                let loop_ctx = FnContext { in_loop: true, ..ctx.shallow_clone() };
                self.walk_scope(body, &loop_ctx, errors);
            }
            StatementKind::Switch { subject, branches, bodies } => {
                self.walk_expression(subject, ctx, errors);
                self.check_switch_exhaustiveness(subject, branches, stmt.position, errors);
                for branch in branches {
                    for m in &branch.matches {
                        self.walk_expression(m, ctx, errors);
                    }
                }
                for body in bodies {
                    self.walk_scope(body, ctx, errors);
                }
            }
            StatementKind::Break => {
                if !ctx.in_loop {
                    errors.push(AnalyzeError::BreakOutsideLoop { position: stmt.position });
                }
            }
            StatementKind::Continue => {
                if !ctx.in_loop {
                    errors.push(AnalyzeError::ContinueOutsideLoop { position: stmt.position });
                }
            }
            StatementKind::UnaryOp { target, .. } => {
                self.check_assignment_target(target, scope, stmt.position, errors);
            }
        }
    }

    fn check_assignment_target(&self, target: &AssignmentTarget, scope: &Scope, position: SourcePosition, errors: &mut Vec<AnalyzeError>) {
        match target {
            AssignmentTarget::Direct { name, .. } => {
                if let Some(var) = scope.lookup(name) {
                    if !var.is_mutable {
                        errors.push(AnalyzeError::ImmutableAssignment { position, name: name.clone() });
                    }
                }
            }
            AssignmentTarget::DataField { base, field_name, field_id } | AssignmentTarget::GroupedDataField { base, field_name, field_id, .. } => {
                if let Type::Data { name: data_name } = base.ty.as_ref() {
                    if let Some(def) = self.namespace.lookup(data_name) {
                        if let DefinitionKind::Data(data) = def.as_ref() {
                            if let Some((_, _, is_mutable)) = data.fields.get(*field_id) {
                                if !is_mutable {
                                    errors.push(AnalyzeError::ImmutableAssignment { position, name: field_name.clone() });
                                }
                            }
                        }
                    }
                }
            }
            AssignmentTarget::ArrayIndexed { .. } | AssignmentTarget::Group { .. } | AssignmentTarget::Stacked { .. } => {}
        }
    }

    fn check_switch_exhaustiveness(
        &self,
        subject: &ExpressionNode,
        branches: &[crate::ast::expressions::SwitchBranch],
        position: SourcePosition,
        errors: &mut Vec<AnalyzeError>,
    ) {
        if branches.iter().any(|b| b.is_default) {
            return;
        }
        let total: Vec<String> = match subject.ty.as_ref() {
            Type::Enum { name } => match self.namespace.lookup(name).as_deref() {
                Some(DefinitionKind::Enum(en)) => en.values.clone(),
                _ => return,
            },
            Type::Variant { name } => match self.namespace.lookup(name).as_deref() {
                Some(DefinitionKind::Variant(var)) => var.cases.iter().map(|(case, _)| case.clone()).collect(),
                _ => return,
            },
            _ => return,
        };
        let mut covered = HashSet::new();
        for branch in branches {
            for m in &branch.matches {
                if let Some(name) = match_case_name(m) {
                    covered.insert(name);
                }
            }
        }
        let missing: Vec<String> = total.into_iter().filter(|c| !covered.contains(c)).collect();
        if !missing.is_empty() {
            errors.push(AnalyzeError::NonExhaustiveSwitch { position, missing });
        }
    }

    fn walk_call(&self, call_id: u64, ctx: &FnContext, errors: &mut Vec<AnalyzeError>) {
        let Some((function_index, core_module_call, arguments_len)) = self.registries.with_call(call_id, |call| {
            (call.function_index, call.core_module_call.clone(), call.arguments.len())
        }) else {
            return;
        };
        let _ = arguments_len;

        if ctx.is_const {
            match function_index {
                Some(index) => {
                    if let Some((def, _file)) = self.registries.function_at(index) {
                        if let DefinitionKind::Function(callee) = def.as_ref() {
                            if !callee.is_const {
                                errors.push(AnalyzeError::ConstFunctionViolation {
                                    position: callee.position,
                                    detail: format!("const function calls non-const function '{}'", callee.name),
                                });
                            }
                        }
                    }
                }
                None => {
                    if core_module_call.is_some() {
                        errors.push(AnalyzeError::ConstFunctionViolation {
                            position: SourcePosition::new(self.namespace.file_hash, 0, 0, 0),
                            detail: "const function calls a core module function".to_string(),
                        });
                    }
                }
            }
        }

        let _ = self.registries.with_call(call_id, |call| {
            for Argument { value, .. } in &call.arguments {
                self.walk_expression(value, ctx, errors);
            }
        });
    }

    fn walk_expression(&self, expr: &ExpressionNode, ctx: &FnContext, errors: &mut Vec<AnalyzeError>) {
        match &expr.kind {
            ExpressionKind::Literal(_) | ExpressionKind::Default | ExpressionKind::TypeExpression { .. } => {}
            ExpressionKind::Variable { name, .. } => {
                if ctx.is_const && !ctx.const_parameters.iter().any(|p| p == name) {
                    errors.push(AnalyzeError::ConstFunctionViolation {
                        position: expr.position,
                        detail: format!("const function touches variable '{}' outside its parameter list", name),
                    });
                }
            }
            ExpressionKind::UnaryOp { operand, .. } => self.walk_expression(operand, ctx, errors),
            ExpressionKind::BinaryOp { op, lhs, rhs } => {
                if matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo) && is_literal_zero(rhs) {
                    errors.push(AnalyzeError::DivisionByZero { position: expr.position });
                }
                self.walk_expression(lhs, ctx, errors);
                self.walk_expression(rhs, ctx, errors);
            }
            ExpressionKind::Call { call_id } => self.walk_call(*call_id, ctx, errors),
            ExpressionKind::InstanceCall { instance, call_id } => {
                self.walk_expression(instance, ctx, errors);
                self.walk_call(*call_id, ctx, errors);
            }
            ExpressionKind::Initializer { field_values, .. } => {
                for (_, value) in field_values {
                    self.walk_expression(value, ctx, errors);
                }
            }
            ExpressionKind::ArrayInitializer { dimensions, elements, .. } => {
                for dim in dimensions {
                    if !dim.ty.is_integer() {
                        errors.push(AnalyzeError::NonIntegerArrayDimension { position: dim.position });
                    }
                    self.walk_expression(dim, ctx, errors);
                }
                for element in elements {
                    self.walk_expression(element, ctx, errors);
                }
            }
            ExpressionKind::ArrayAccess { array, index } => {
                self.walk_expression(array, ctx, errors);
                if !index.ty.is_integer() {
                    errors.push(AnalyzeError::NonIntegerArrayIndex { position: index.position });
                }
                self.walk_expression(index, ctx, errors);
            }
            ExpressionKind::DataAccess { base, .. } | ExpressionKind::GroupedDataAccess { base, .. } => {
                self.walk_expression(base, ctx, errors);
            }
            ExpressionKind::GroupExpression { elements, group_id: _ } => {
                for e in elements {
                    self.walk_expression(e, ctx, errors);
                }
            }
            ExpressionKind::RangeExpression { start, end } => {
                self.walk_expression(start, ctx, errors);
                self.walk_expression(end, ctx, errors);
            }
            ExpressionKind::StringInterpolation { parts } => {
                for part in parts {
                    if let crate::ast::expressions::InterpolationPart::Expression(e) = part {
                        self.walk_expression(e, ctx, errors);
                    }
                }
            }
            ExpressionKind::SwitchExpression { subject, branches } => {
                self.walk_expression(subject, ctx, errors);
                for branch in branches {
                    for m in &branch.matches {
                        self.walk_expression(m, ctx, errors);
                    }
                    self.walk_expression(&branch.result, ctx, errors);
                }
            }
            ExpressionKind::SwitchMatch { matches, result } => {
                for m in matches {
                    self.walk_expression(m, ctx, errors);
                }
                self.walk_expression(result, ctx, errors);
            }
            ExpressionKind::TypeCast { value, .. } => self.walk_expression(value, ctx, errors),
            ExpressionKind::OptionalChain { base, .. } | ExpressionKind::OptionalUnwrap { base } | ExpressionKind::VariantUnwrap { base } => {
                self.walk_expression(base, ctx, errors);
            }
            ExpressionKind::VariantExtraction { base, bindings, .. } => {
                self.walk_expression(base, ctx, errors);
                let mut seen = HashSet::new();
                for binding in bindings {
                    if !seen.insert(binding.clone()) {
                        errors.push(AnalyzeError::DuplicateVariantBinding { position: expr.position, name: binding.clone() });
                    }
                }
            }
        }
    }
}

impl<'a> FnContext<'a> {
    fn shallow_clone(&self) -> FnContext<'a> {
        FnContext {
            return_types: self.return_types,
            has_error_types: self.has_error_types,
            is_extern: self.is_extern,
            is_const: self.is_const,
            const_parameters: self.const_parameters,
            in_loop: self.in_loop,
        }
    }
}

fn check_no_pointer_outside_extern(ty: &TypeRef, position: SourcePosition, is_extern: bool, errors: &mut Vec<AnalyzeError>) {
    if !is_extern && contains_pointer(ty) {
        errors.push(AnalyzeError::PointerOutsideExtern { position });
    }
}

/// The folder in `expr.rs` leaves a literal-zero divisor unfolded so this
/// walk, not parsing, reports it.
fn is_literal_zero(expr: &ExpressionNode) -> bool {
    match &expr.kind {
        ExpressionKind::Literal(Literal::Int(0)) | ExpressionKind::Literal(Literal::UInt(0)) => true,
        ExpressionKind::Literal(Literal::Float(f)) => *f == 0.0,
        _ => false,
    }
}

fn contains_pointer(ty: &TypeRef) -> bool {
    match ty.as_ref() {
        Type::Pointer { .. } => true,
        Type::Array { element, .. } | Type::Optional(element) | Type::Range { bound: element } => contains_pointer(element),
        Type::Group(items) => items.iter().any(contains_pointer),
        _ => false,
    }
}

/// Extracts the bare case/value name a switch-branch match expression
/// refers to, where one can be determined statically — an unqualified
/// `Variable` reference (enum value) or a `VariantExtraction`'s case name.
/// Anything else (a literal, a computed expression) can't name a case and
/// is simply not counted towards exhaustiveness.
fn match_case_name(expr: &ExpressionNode) -> Option<String> {
    match &expr.kind {
        ExpressionKind::Variable { name, .. } => Some(name.clone()),
        ExpressionKind::VariantExtraction { case_name, .. } => Some(case_name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::definitions::{FunctionNode, TestNode};
    use crate::ast::scope::Variable;
    use crate::hash::FileHash;
    use crate::types::Primitive;
    use std::path::Path;
    use std::sync::{Arc, OnceLock};

    fn pos(line: u32) -> SourcePosition {
        SourcePosition::new(FileHash::of_canonical_path(Path::new("/x.flint")), line, 1, 1)
    }

    fn void() -> TypeRef {
        Arc::new(Type::Primitive(Primitive::Void))
    }

    fn i32_ty() -> TypeRef {
        Arc::new(Type::Primitive(Primitive::I32))
    }

    fn lit_expr(position: SourcePosition, ty: TypeRef) -> ExpressionNode {
        ExpressionNode::new(position, ty, ExpressionKind::Literal(crate::ast::expressions::Literal::Int(0)))
    }

    #[test]
    fn break_outside_loop_is_flagged() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let mut scope = Scope::new_root(registries.next_scope_id());
        scope.push_statement(StatementNode::new(pos(2), StatementKind::Break));

        let func = FunctionNode {
            position: pos(1),
            name: "main".to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![void()],
            error_types: vec![],
            scope: OnceLock::new(),
        };
        func.set_scope(Box::new(scope));
        let def = Arc::new(DefinitionKind::Function(func));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(errors.iter().any(|e| matches!(e, AnalyzeError::BreakOutsideLoop { .. })));
    }

    #[test]
    fn break_inside_while_is_allowed() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let mut body = Scope::new_root(registries.next_scope_id());
        body.push_statement(StatementNode::new(pos(3), StatementKind::Break));

        let mut root = Scope::new_root(registries.next_scope_id());
        root.push_statement(StatementNode::new(
            pos(2),
            StatementKind::While {
                condition: Box::new(lit_expr(pos(2), Arc::new(Type::Primitive(Primitive::Bool)))),
                body: Box::new(body),
            },
        ));

        let func = FunctionNode {
            position: pos(1),
            name: "main".to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![void()],
            error_types: vec![],
            scope: OnceLock::new(),
        };
        func.set_scope(Box::new(root));
        let def = Arc::new(DefinitionKind::Function(func));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(!errors.iter().any(|e| matches!(e, AnalyzeError::BreakOutsideLoop { .. })));
    }

    #[test]
    fn return_type_mismatch_is_flagged() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let mut scope = Scope::new_root(registries.next_scope_id());
        scope.push_statement(StatementNode::new(
            pos(2),
            StatementKind::Return { values: vec![Box::new(lit_expr(pos(2), i32_ty()))] },
        ));

        let func = FunctionNode {
            position: pos(1),
            name: "main".to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![void()],
            error_types: vec![],
            scope: OnceLock::new(),
        };
        func.set_scope(Box::new(scope));
        let def = Arc::new(DefinitionKind::Function(func));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(errors.iter().any(|e| matches!(e, AnalyzeError::ReturnTypeMismatch { .. })));
    }

    #[test]
    fn pointer_field_outside_extern_is_flagged() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let ptr_ty: TypeRef = Arc::new(Type::Pointer { inner: i32_ty() });
        let mut scope = Scope::new_root(registries.next_scope_id());
        scope.declare(
            "p".to_string(),
            Variable {
                ty: ptr_ty.clone(),
                scope_id: 0,
                scope_segment: 0,
                is_mutable: true,
                is_parameter: false,
                is_reference: false,
                is_pseudo: false,
                scope_ids_where_returned: vec![],
            },
        );
        scope.push_statement(StatementNode::new(
            pos(2),
            StatementKind::Declaration {
                name: "p".to_string(),
                declared_type: Some(ptr_ty.clone()),
                is_mutable: true,
                value: Box::new(lit_expr(pos(2), ptr_ty)),
            },
        ));

        let func = FunctionNode {
            position: pos(1),
            name: "main".to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![void()],
            error_types: vec![],
            scope: OnceLock::new(),
        };
        func.set_scope(Box::new(scope));
        let def = Arc::new(DefinitionKind::Function(func));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(errors.iter().any(|e| matches!(e, AnalyzeError::PointerOutsideExtern { .. })));
    }

    #[test]
    fn test_body_with_no_error_types_rejects_throw() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let mut scope = Scope::new_root(registries.next_scope_id());
        scope.push_statement(StatementNode::new(
            pos(2),
            StatementKind::Throw { error: Box::new(lit_expr(pos(2), i32_ty())) },
        ));

        let test = TestNode { position: pos(1), name: "t".to_string(), test_id: 0, scope: OnceLock::new() };
        test.set_scope(Box::new(scope));
        let def = Arc::new(DefinitionKind::Test(test));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(errors.iter().any(|e| matches!(e, AnalyzeError::ThrowOutsideErrorFunction { .. })));
    }

    #[test]
    fn literal_zero_divisor_is_flagged() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let divide = ExpressionNode::new(
            pos(2),
            i32_ty(),
            ExpressionKind::BinaryOp {
                op: BinaryOperator::Divide,
                lhs: Box::new(lit_expr(pos(2), i32_ty())),
                rhs: Box::new(ExpressionNode::new(pos(2), i32_ty(), ExpressionKind::Literal(Literal::Int(0)))),
            },
        );
        let mut scope = Scope::new_root(registries.next_scope_id());
        scope.push_statement(StatementNode::new(pos(2), StatementKind::Return { values: vec![Box::new(divide)] }));

        let func = FunctionNode {
            position: pos(1),
            name: "main".to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![i32_ty()],
            error_types: vec![],
            scope: OnceLock::new(),
        };
        func.set_scope(Box::new(scope));
        let def = Arc::new(DefinitionKind::Function(func));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(errors.iter().any(|e| matches!(e, AnalyzeError::DivisionByZero { .. })));
    }

    #[test]
    fn division_by_nonzero_literal_is_allowed() {
        let namespace = Namespace::new(FileHash::of_canonical_path(Path::new("/x.flint")));
        let registries = Registries::new();
        let analyzer = Analyzer::new(&namespace, &registries);

        let divide = ExpressionNode::new(
            pos(2),
            i32_ty(),
            ExpressionKind::BinaryOp {
                op: BinaryOperator::Divide,
                lhs: Box::new(lit_expr(pos(2), i32_ty())),
                rhs: Box::new(ExpressionNode::new(pos(2), i32_ty(), ExpressionKind::Literal(Literal::Int(2)))),
            },
        );
        let mut scope = Scope::new_root(registries.next_scope_id());
        scope.push_statement(StatementNode::new(pos(2), StatementKind::Return { values: vec![Box::new(divide)] }));

        let func = FunctionNode {
            position: pos(1),
            name: "main".to_string(),
            is_aligned: false,
            is_const: false,
            is_extern: false,
            parameters: vec![],
            return_types: vec![i32_ty()],
            error_types: vec![],
            scope: OnceLock::new(),
        };
        func.set_scope(Box::new(scope));
        let def = Arc::new(DefinitionKind::Function(func));
        let mut file = FileNode::new(namespace.file_hash, "x.flint".to_string());
        file.push(def);

        let errors = analyzer.analyze_file(&file);
        assert!(!errors.iter().any(|e| matches!(e, AnalyzeError::DivisionByZero { .. })));
    }
}
