//! Expression parsing: Pratt precedence climbing (`spec.md` §4.P
//! "Expression parsing"), plus literal folding (`spec.md` §4.P "Literal
//! folding" / `SPEC_FULL.md` §4.P disposition) and overload resolution
//! via structural `Arc<Type>` equality (`spec.md` §9 Open Question ii).

use std::sync::Arc;

use crate::ast::call::{Argument, CallNodeBase, CoreModuleCall};
use crate::ast::expressions::{BinaryOperator, ExpressionKind, ExpressionNode, InterpolationPart, Literal, UnaryOperator};
use crate::ast::scope::Scope;
use crate::hash::FileHash;
use crate::lexer::{Keyword, NumericBase, TokenKind};
use crate::namespace::Namespace;
use crate::parser::cursor::Cursor;
use crate::parser::error::{ParseResult, ParserError};
use crate::parser::precedence::{binding_power, peek_binary_operator};
use crate::registries::Registries;
use crate::types::{Primitive, Type, TypeRef};

pub struct ExprParser<'a> {
    pub file: FileHash,
    pub namespace: &'a Namespace,
    pub registries: &'a Registries,
}

impl<'a> ExprParser<'a> {
    pub fn new(file: FileHash, namespace: &'a Namespace, registries: &'a Registries) -> Self {
        Self { file, namespace, registries }
    }

    fn primitive(&self, p: Primitive) -> TypeRef {
        self.namespace.types.intern(Type::Primitive(p)).type_ref()
    }

    /// Resolves a core-module catalog spelling (`"str"`, `"str[]"`, ...)
    /// to an interned [`TypeRef`].
    fn resolve_core_type_spelling(&self, spelling: &str) -> TypeRef {
        if let Some(base) = spelling.strip_suffix("[]") {
            let element = self.resolve_core_type_spelling(base);
            return self.namespace.types.intern(Type::Array { element, rank: 1 }).type_ref();
        }
        if let Some(p) = Primitive::from_spelling(spelling) {
            return self.primitive(p);
        }
        self.namespace.types.intern(Type::Data { name: spelling.to_string() }).type_ref()
    }

    /// Resolves `base.field_name`'s `(field_id, type)` against the
    /// `data`/`entity` definition `base_ty` names, when it is one and the
    /// field exists. Everything else (a core-module qualifier like
    /// `assert.equals`, an entity method name, an unresolved base) falls
    /// back to the `(0, Void)` placeholder the Analyzer/overload resolver
    /// never inspects for those shapes.
    fn resolve_data_field(&self, base_ty: &TypeRef, field_name: &str) -> (usize, TypeRef) {
        if let Type::Data { name } = base_ty.as_ref() {
            if let Some(def) = self.namespace.lookup(name) {
                let fields: Option<&[(String, TypeRef, bool)]> = match def.as_ref() {
                    crate::ast::definitions::DefinitionKind::Data(d) => Some(&d.fields),
                    crate::ast::definitions::DefinitionKind::Entity(e) => Some(&e.fields),
                    _ => None,
                };
                if let Some(fields) = fields {
                    if let Some((id, (_, ty, _))) = fields.iter().enumerate().find(|(_, (n, _, _))| n == field_name) {
                        return (id, Arc::clone(ty));
                    }
                }
            }
        }
        (0, self.primitive(Primitive::Void))
    }

    /// Entry point: parses one full expression at the lowest precedence.
    pub fn parse(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<ExpressionNode> {
        self.parse_binary(cursor, scope, 0)
    }

    fn parse_binary(&self, cursor: &mut Cursor, scope: &mut Scope, min_bp: u8) -> ParseResult<ExpressionNode> {
        let mut lhs = self.parse_unary(cursor, scope)?;

        loop {
            let op = match peek_binary_operator(cursor.peek()) {
                Some(op) => op,
                None => break,
            };
            let bp = binding_power(op);
            if bp < min_bp {
                break;
            }
            let position = cursor.position();
            cursor.advance();
            let rhs = self.parse_binary(cursor, scope, bp + 1)?;
            lhs = self.fold_or_build_binary(position, op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    fn fold_or_build_binary(
        &self,
        position: crate::ast::SourcePosition,
        op: BinaryOperator,
        lhs: ExpressionNode,
        rhs: ExpressionNode,
    ) -> ParseResult<ExpressionNode> {
        if let (Some(l), Some(r)) = (lhs.as_literal(), rhs.as_literal()) {
            if let Some(folded) = fold_literals(op, l, r) {
                // Division by a literal zero is never folded: the
                // Analyzer, not the Parser, reports ERR_DIVISION_BY_ZERO.
                let is_zero_divisor = matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo)
                    && matches!(r, Literal::Int(0) | Literal::UInt(0));
                if !is_zero_divisor {
                    let ty = self.literal_type(&folded);
                    return Ok(ExpressionNode::new(position, ty, ExpressionKind::Literal(folded)));
                }
            }
        }

        let ty = result_type_of(op, &lhs.ty, &rhs.ty, self);
        Ok(ExpressionNode::new(
            position,
            ty,
            ExpressionKind::BinaryOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
        ))
    }

    fn literal_type(&self, lit: &Literal) -> TypeRef {
        match lit {
            Literal::Int(_) => self.primitive(Primitive::I32),
            Literal::UInt(_) => self.primitive(Primitive::U32),
            Literal::Float(_) => self.primitive(Primitive::F64),
            Literal::Str(_) => self.primitive(Primitive::Str),
            Literal::Char(_) => self.primitive(Primitive::U8),
            Literal::Bool(_) => self.primitive(Primitive::Bool),
        }
    }

    fn parse_unary(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<ExpressionNode> {
        let position = cursor.position();
        let op = match cursor.peek() {
            TokenKind::Minus => Some(UnaryOperator::Negate),
            TokenKind::Keyword(Keyword::Not) | TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Ampersand => Some(UnaryOperator::Reference),
            TokenKind::Star => Some(UnaryOperator::Dereference),
            _ => None,
        };

        if let Some(op) = op {
            cursor.advance();
            let operand = self.parse_unary(cursor, scope)?;
            let ty = if op == UnaryOperator::Dereference {
                match operand.ty.as_ref() {
                    Type::Pointer { inner } => Arc::clone(inner),
                    _ => Arc::clone(&operand.ty),
                }
            } else if op == UnaryOperator::Reference {
                self.namespace
                    .types
                    .intern(Type::Pointer { inner: Arc::clone(&operand.ty) })
                    .type_ref()
            } else {
                Arc::clone(&operand.ty)
            };
            if let Some(lit) = operand.as_literal() {
                if let Some(folded) = fold_unary(op, lit) {
                    let ty = self.literal_type(&folded);
                    return Ok(ExpressionNode::new(position, ty, ExpressionKind::Literal(folded)));
                }
            }
            return Ok(ExpressionNode::new(
                position,
                ty,
                ExpressionKind::UnaryOp { op, operand: Box::new(operand) },
            ));
        }

        self.parse_postfix(cursor, scope)
    }

    fn parse_postfix(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<ExpressionNode> {
        let mut expr = self.parse_primary(cursor, scope)?;

        loop {
            match cursor.peek().clone() {
                TokenKind::LParen => {
                    expr = self.parse_call_postfix(cursor, scope, expr)?;
                }
                TokenKind::LBrace if self.is_record_type_name(&expr) => {
                    expr = self.parse_initializer(cursor, scope, expr)?;
                }
                TokenKind::LBracket => {
                    let position = cursor.position();
                    cursor.advance();
                    let index = self.parse(cursor, scope)?;
                    cursor.expect(&TokenKind::RBracket, "]")?;
                    let ty = match expr.ty.as_ref() {
                        Type::Array { element, .. } => Arc::clone(element),
                        _ => Arc::clone(&expr.ty),
                    };
                    expr = ExpressionNode::new(
                        position,
                        ty,
                        ExpressionKind::ArrayAccess { array: Box::new(expr), index: Box::new(index) },
                    );
                }
                TokenKind::Dot => {
                    let position = cursor.position();
                    cursor.advance();
                    let field_name = cursor.expect_identifier()?;
                    let (field_id, field_type) = self.resolve_data_field(&expr.ty, &field_name);
                    expr = ExpressionNode::new(
                        position,
                        field_type,
                        ExpressionKind::DataAccess { base: Box::new(expr), field_name, field_id },
                    );
                }
                TokenKind::DotDot => {
                    let position = cursor.position();
                    cursor.advance();
                    let end = self.parse_unary(cursor, scope)?;
                    let ty = Arc::clone(&expr.ty);
                    expr = ExpressionNode::new(
                        position,
                        self.namespace.types.intern(Type::Range { bound: ty }).type_ref(),
                        ExpressionKind::RangeExpression { start: Box::new(expr), end: Box::new(end) },
                    );
                }
                TokenKind::QuestionDot => {
                    let position = cursor.position();
                    cursor.advance();
                    let field_name = cursor.expect_identifier()?;
                    let ty = expr.ty.clone();
                    expr = ExpressionNode::new(
                        position,
                        self.namespace.types.intern(Type::Optional(ty)).type_ref(),
                        ExpressionKind::OptionalChain { base: Box::new(expr), field_name },
                    );
                }
                TokenKind::QuestionBang => {
                    let position = cursor.position();
                    cursor.advance();
                    let ty = match expr.ty.as_ref() {
                        Type::Optional(inner) => Arc::clone(inner),
                        _ => Arc::clone(&expr.ty),
                    };
                    expr = ExpressionNode::new(
                        position,
                        ty,
                        ExpressionKind::OptionalUnwrap { base: Box::new(expr) },
                    );
                }
                TokenKind::Keyword(Keyword::As) => {
                    let position = cursor.position();
                    cursor.advance();
                    let (target, _) = self.parse_type_annotation(cursor)?;
                    expr = ExpressionNode::new(
                        position,
                        target.clone(),
                        ExpressionKind::TypeCast { value: Box::new(expr), target, is_explicit: true },
                    );
                }
                TokenKind::Keyword(Keyword::Is) => {
                    let position = cursor.position();
                    cursor.advance();
                    let case_name = cursor.expect_identifier()?;
                    let mut bindings = Vec::new();
                    if cursor.eat(&TokenKind::LParen) {
                        loop {
                            bindings.push(cursor.expect_identifier()?);
                            if !cursor.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                        cursor.expect(&TokenKind::RParen, ")")?;
                    }
                    expr = ExpressionNode::new(
                        position,
                        self.primitive(Primitive::Bool),
                        ExpressionKind::VariantExtraction { base: Box::new(expr), case_name, bindings },
                    );
                }
                TokenKind::Bang => {
                    let position = cursor.position();
                    cursor.advance();
                    expr = ExpressionNode::new(
                        position,
                        Arc::clone(&expr.ty),
                        ExpressionKind::VariantUnwrap { base: Box::new(expr) },
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Whether `expr` is a bare, unbound name referring to a `data`/`entity`
    /// definition in this file's namespace — the same fork the original
    /// parser's `create_call_or_initializer_expression` makes between a
    /// call and a record construction, decided here by definition kind
    /// rather than by argument shape.
    fn is_record_type_name(&self, expr: &ExpressionNode) -> bool {
        match &expr.kind {
            ExpressionKind::Variable { name, .. } => matches!(
                self.namespace.lookup(name).as_deref(),
                Some(crate::ast::definitions::DefinitionKind::Data(_)) | Some(crate::ast::definitions::DefinitionKind::Entity(_))
            ),
            _ => false,
        }
    }

    fn parse_initializer(&self, cursor: &mut Cursor, scope: &mut Scope, callee: ExpressionNode) -> ParseResult<ExpressionNode> {
        let position = cursor.position();
        let type_name = match callee.kind {
            ExpressionKind::Variable { name, .. } => name,
            _ => unreachable!("is_record_type_name only accepts Variable nodes"),
        };
        cursor.expect(&TokenKind::LBrace, "{")?;
        let mut field_values = Vec::new();
        while !cursor.check(&TokenKind::RBrace) {
            let field_name = cursor.expect_identifier()?;
            cursor.expect(&TokenKind::Colon, ":")?;
            let value = self.parse(cursor, scope)?;
            field_values.push((field_name, Box::new(value)));
            if !cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        cursor.expect(&TokenKind::RBrace, "}")?;

        let ty = self.namespace.types.intern(Type::Data { name: type_name.clone() }).type_ref();
        Ok(ExpressionNode::new(position, ty, ExpressionKind::Initializer { type_name, field_values }))
    }

    fn parse_call_postfix(&self, cursor: &mut Cursor, scope: &mut Scope, callee: ExpressionNode) -> ParseResult<ExpressionNode> {
        let position = cursor.position();
        // `module.function(...)` parses its callee as a `DataAccess` node
        // (the `.` postfix does not know in advance it is addressing a
        // core module rather than a field); recover the (module,
        // function) pair from that shape before falling back either to a
        // plain name (ordinary user function) or to an instance method
        // call (`receiver.method(...)` where `receiver` is not an
        // imported core module).
        enum Callee {
            Name(String),
            ModuleFunction(String, String),
            Instance(Box<ExpressionNode>, String),
        }

        let resolved_callee = match callee.kind {
            ExpressionKind::Variable { name, .. } => Callee::Name(name),
            ExpressionKind::DataAccess { base, field_name, .. } => match &base.kind {
                ExpressionKind::Variable { name, .. } if self.namespace.has_imported(name) => {
                    Callee::ModuleFunction(name.clone(), field_name)
                }
                _ => Callee::Instance(base, field_name),
            },
            other => {
                return Err(ParserError::UnexpectedToken {
                    position,
                    expected: "callable expression".to_string(),
                    found: format!("{:?}", other),
                })
            }
        };
        cursor.advance(); // '('
        let mut arguments = Vec::new();
        if !cursor.check(&TokenKind::RParen) {
            loop {
                let by_reference = cursor.eat(&TokenKind::Ampersand);
                let value = self.parse(cursor, scope)?;
                arguments.push(Argument { value: Box::new(value), by_reference });
                if !cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        cursor.expect(&TokenKind::RParen, ")")?;

        let arg_types: Vec<String> = arguments.iter().map(|a| a.value.ty.canonical_string()).collect();

        let resolve_by_name = |name: &str| -> Result<(Option<usize>, TypeRef, Vec<TypeRef>), ParserError> {
            match self.registries.resolve_function(name, &arg_types) {
                Ok(index) => {
                    let (def, _file) = self.registries.function_at(index).expect("just resolved");
                    if let crate::ast::DefinitionKind::Function(f) = def.as_ref() {
                        let returns = if f.return_types.len() == 1 {
                            Arc::clone(&f.return_types[0])
                        } else if f.return_types.is_empty() {
                            self.primitive(Primitive::Void)
                        } else {
                            self.namespace.types.intern(Type::Group(f.return_types.clone())).type_ref()
                        };
                        Ok((Some(index), returns, f.error_types.clone()))
                    } else {
                        Ok((Some(index), self.primitive(Primitive::Void), vec![]))
                    }
                }
                Err(crate::registries::OverloadResolutionError::Ambiguous(candidates)) => Err(ParserError::AmbiguousCall {
                    position,
                    name: name.to_string(),
                    candidates: candidates.len(),
                }),
                Err(crate::registries::OverloadResolutionError::NoMatch) => {
                    Err(ParserError::UnresolvedCall { position, name: name.to_string() })
                }
            }
        };

        let (instance, function_index, core_module_call, return_type, error_types) = match resolved_callee {
            Callee::ModuleFunction(module, function) => {
                let overload = crate::types::core_modules::function_overloads(&module, &function)
                    .and_then(|list| list.iter().find(|ov| ov.params.len() == arguments.len()));
                let (returns, errors) = match overload {
                    Some(ov) => {
                        let return_types: Vec<TypeRef> =
                            ov.returns.iter().map(|s| self.resolve_core_type_spelling(s)).collect();
                        let returns = if return_types.len() == 1 {
                            Arc::clone(&return_types[0])
                        } else if return_types.is_empty() {
                            self.primitive(Primitive::Void)
                        } else {
                            self.namespace.types.intern(Type::Group(return_types)).type_ref()
                        };
                        let errors = if ov.may_throw { vec![self.primitive(Primitive::Void)] } else { vec![] };
                        (returns, errors)
                    }
                    None => (self.primitive(Primitive::Void), vec![]),
                };
                (None, None, Some(CoreModuleCall { module, function }), returns, errors)
            }
            Callee::Name(name) => {
                let (index, returns, errors) = resolve_by_name(&name)?;
                (None, index, None, returns, errors)
            }
            Callee::Instance(base, method) => {
                // The receiver's entity type is only fully known to the
                // Analyzer; the Parser resolves the method purely by name
                // and argument shape, same as an ordinary call, and leaves
                // a dangling `function_index: None` for the Analyzer to
                // flag if nothing actually matches on the receiver's type.
                let (index, returns, errors) = match resolve_by_name(&method) {
                    Ok(result) => result,
                    Err(_) => (None, self.primitive(Primitive::Void), vec![]),
                };
                (Some(base), index, None, returns, errors)
            }
        };

        let call = CallNodeBase {
            function_index,
            core_module_call,
            arguments,
            error_types,
            return_type: Arc::clone(&return_type),
            scope_id: scope.scope_id,
            has_catch: false,
            call_id: 0,
        };
        let call_id = self.registries.push_call(call);

        let kind = match instance {
            Some(base) => ExpressionKind::InstanceCall { instance: base, call_id },
            None => ExpressionKind::Call { call_id },
        };

        Ok(ExpressionNode::new(position, return_type, kind))
    }

    fn parse_primary(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<ExpressionNode> {
        let position = cursor.position();
        match cursor.peek().clone() {
            TokenKind::IntLiteral { text, base } => {
                cursor.advance();
                let value = parse_int_literal(&text, base)
                    .ok_or_else(|| ParserError::InvalidLiteral { position, text: text.clone() })?;
                Ok(ExpressionNode::new(position, self.primitive(Primitive::I32), ExpressionKind::Literal(Literal::Int(value))))
            }
            TokenKind::FloatLiteral(text) => {
                cursor.advance();
                let value: f64 = text
                    .replace('_', "")
                    .parse()
                    .map_err(|_| ParserError::InvalidLiteral { position, text: text.clone() })?;
                Ok(ExpressionNode::new(position, self.primitive(Primitive::F64), ExpressionKind::Literal(Literal::Float(value))))
            }
            TokenKind::CharLiteral(ch) => {
                cursor.advance();
                Ok(ExpressionNode::new(position, self.primitive(Primitive::U8), ExpressionKind::Literal(Literal::Char(ch))))
            }
            TokenKind::StrPart(text) => self.parse_string(cursor, scope, position, text),
            TokenKind::Keyword(Keyword::True) => {
                cursor.advance();
                Ok(ExpressionNode::new(position, self.primitive(Primitive::Bool), ExpressionKind::Literal(Literal::Bool(true))))
            }
            TokenKind::Keyword(Keyword::False) => {
                cursor.advance();
                Ok(ExpressionNode::new(position, self.primitive(Primitive::Bool), ExpressionKind::Literal(Literal::Bool(false))))
            }
            TokenKind::Keyword(Keyword::Default) => {
                cursor.advance();
                Ok(ExpressionNode::new(position, self.primitive(Primitive::Void), ExpressionKind::Default))
            }
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_expression(cursor, scope, position),
            TokenKind::Identifier(name) => {
                cursor.advance();
                if let Some(var) = scope.lookup(&name) {
                    let ty = Arc::clone(&var.ty);
                    let scope_id = var.scope_id;
                    Ok(ExpressionNode::new(position, ty, ExpressionKind::Variable { name, scope_id }))
                } else {
                    // Not a bound variable: left for postfix `(` to turn
                    // into a call, or resolved by the Analyzer as a bare
                    // reference to a type/module name.
                    Ok(ExpressionNode::new(position, self.primitive(Primitive::Void), ExpressionKind::Variable { name, scope_id: scope.scope_id }))
                }
            }
            TokenKind::LParen => {
                cursor.advance();
                let mut elements = vec![self.parse(cursor, scope)?];
                let mut is_group = false;
                while cursor.eat(&TokenKind::Comma) {
                    is_group = true;
                    elements.push(self.parse(cursor, scope)?);
                }
                cursor.expect(&TokenKind::RParen, ")")?;
                if is_group {
                    let element_types: Vec<TypeRef> = elements.iter().map(|e| Arc::clone(&e.ty)).collect();
                    let ty = self.namespace.types.intern(Type::Group(element_types)).type_ref();
                    let group_id = self.registries.next_group_id();
                    Ok(ExpressionNode::new(
                        position,
                        ty,
                        ExpressionKind::GroupExpression { elements: elements.into_iter().map(Box::new).collect(), group_id },
                    ))
                } else {
                    Ok(elements.pop().expect("at least one element parsed"))
                }
            }
            other => Err(ParserError::UnexpectedToken {
                position,
                expected: "expression".to_string(),
                found: format!("{:?}", other),
            }),
        }
    }

    fn parse_string(
        &self,
        cursor: &mut Cursor,
        scope: &mut Scope,
        position: crate::ast::SourcePosition,
        first_part: String,
    ) -> ParseResult<ExpressionNode> {
        cursor.advance();
        if !cursor.check(&TokenKind::InterpExprStart) {
            return Ok(ExpressionNode::new(position, self.primitive(Primitive::Str), ExpressionKind::Literal(Literal::Str(first_part))));
        }

        let mut parts = vec![InterpolationPart::Literal(first_part)];
        loop {
            if cursor.eat(&TokenKind::InterpExprStart) {
                let expr = self.parse(cursor, scope)?;
                cursor.expect(&TokenKind::InterpExprEnd, "}")?;
                parts.push(InterpolationPart::Expression(Box::new(expr)));
                if let TokenKind::StrPart(text) = cursor.peek().clone() {
                    cursor.advance();
                    parts.push(InterpolationPart::Literal(text));
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(ExpressionNode::new(position, self.primitive(Primitive::Str), ExpressionKind::StringInterpolation { parts }))
    }

    fn parse_switch_expression(&self, cursor: &mut Cursor, scope: &mut Scope, position: crate::ast::SourcePosition) -> ParseResult<ExpressionNode> {
        cursor.advance(); // `switch`
        let subject = self.parse(cursor, scope)?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let mut branches = Vec::new();
        let mut result_ty = self.primitive(Primitive::Void);
        while !cursor.check(&TokenKind::RBrace) {
            let is_default = cursor.eat(&TokenKind::Keyword(Keyword::Default));
            let mut matches = Vec::new();
            if !is_default {
                loop {
                    matches.push(Box::new(self.parse(cursor, scope)?));
                    if !cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            cursor.expect(&TokenKind::Arrow, "->")?;
            let result = self.parse(cursor, scope)?;
            result_ty = Arc::clone(&result.ty);
            branches.push(crate::ast::expressions::SwitchBranch { matches, is_default, result: Box::new(result) });
            cursor.eat(&TokenKind::Comma);
            cursor.skip_line_breaks();
        }
        cursor.expect(&TokenKind::RBrace, "}")?;

        Ok(ExpressionNode::new(position, result_ty, ExpressionKind::SwitchExpression { subject: Box::new(subject), branches }))
    }

    /// Parses a type annotation (`: T`, `as T`, declared return/parameter
    /// types): primitive keywords, `[]` suffixes for arrays, `?` suffix for
    /// optional, and bare identifiers for named data/enum/variant types.
    pub fn parse_type_annotation(&self, cursor: &mut Cursor) -> ParseResult<(TypeRef, String)> {
        let position = cursor.position();
        let mut ty = match cursor.peek().clone() {
            TokenKind::PrimitiveType(p) => {
                cursor.advance();
                self.primitive(p)
            }
            TokenKind::Identifier(name) if name == "ptr" && *cursor.peek_at(1) == TokenKind::Lt => {
                cursor.advance();
                cursor.advance();
                let (inner, _) = self.parse_type_annotation(cursor)?;
                cursor.expect(&TokenKind::Gt, ">")?;
                self.namespace.types.intern(Type::Pointer { inner }).type_ref()
            }
            TokenKind::Identifier(name) => {
                cursor.advance();
                // Resolved precisely against the Namespace/def kind by the
                // Analyzer; the Parser interns a named placeholder so every
                // node still carries *a* resolved type, per `spec.md` §3.
                self.namespace.types.intern(Type::Data { name }).type_ref()
            }
            other => {
                return Err(ParserError::UnexpectedToken {
                    position,
                    expected: "type".to_string(),
                    found: format!("{:?}", other),
                })
            }
        };

        loop {
            if cursor.eat(&TokenKind::LBracket) {
                cursor.expect(&TokenKind::RBracket, "]")?;
                ty = self.namespace.types.intern(Type::Array { element: ty, rank: 1 }).type_ref();
            } else if cursor.eat(&TokenKind::Question) {
                ty = self.namespace.types.intern(Type::Optional(ty)).type_ref();
            } else {
                break;
            }
        }

        let canonical = ty.canonical_string();
        Ok((ty, canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::definitions::DefinitionKind;
    use crate::ast::statements::StatementKind;
    use crate::hash::FileHash;
    use crate::parser::Parser;
    use rstest::rstest;
    use std::path::Path;

    fn parse_file(text: &str) -> crate::ast::file::FileNode {
        let hash = FileHash::of_canonical_path(Path::new("/t.flint"));
        let tokens = crate::lexer::tokenize(text, hash).expect("lex");
        let namespace = Namespace::new(hash);
        let registries = Registries::new();
        let parser = Parser::new(hash, "t.flint".to_string(), &namespace, &registries);
        let pre = parser.pass1(tokens).expect("pass1");
        parser.pass2(pre).expect("pass2")
    }

    fn main_return_expr(file: &crate::ast::file::FileNode) -> &ExpressionNode {
        for def in &file.definitions {
            if let DefinitionKind::Function(f) = def.as_ref() {
                if f.name == "main" {
                    let scope = f.scope().expect("main has a parsed body");
                    match &scope.body.last().expect("body is non-empty").kind {
                        StatementKind::Return { values } => return &values[0],
                        other => panic!("expected Return, got {other:?}"),
                    }
                }
            }
        }
        panic!("no 'main' function in file");
    }

    #[rstest]
    #[case("1 + 2 * 3", 7)]
    #[case("10 / 2", 5)]
    #[case("-5", -5)]
    #[case("(1 + 2) * 3", 9)]
    #[case("2 * 3 + 4 * 5", 26)]
    fn arithmetic_expressions_fold_to_a_literal(#[case] expr: &str, #[case] expected: i64) {
        let file = parse_file(&format!("def main() -> i32 {{\n return {expr}\n}}\n"));
        match &main_return_expr(&file).kind {
            ExpressionKind::Literal(Literal::Int(v)) => assert_eq!(*v, expected),
            other => panic!("expected a folded Literal, got {other:?}"),
        }
    }

    #[test]
    fn division_by_literal_zero_is_left_unfolded_for_the_analyzer() {
        let file = parse_file("def main() -> i32 {\n return 1 / 0\n}\n");
        match &main_return_expr(&file).kind {
            ExpressionKind::BinaryOp { op, .. } => assert_eq!(*op, BinaryOperator::Divide),
            other => panic!("expected an unfolded BinaryOp, got {other:?}"),
        }
    }

    #[test]
    fn initializer_parses_named_field_values() {
        let file = parse_file(
            "data Point {\n x: i32,\n y: i32\n}\n\ndef main() -> i32 {\n p := Point { x: 1, y: 2 }\n return p.x\n}\n",
        );
        for def in &file.definitions {
            if let DefinitionKind::Function(f) = def.as_ref() {
                if f.name == "main" {
                    let scope = f.scope().unwrap();
                    match &scope.body[0].kind {
                        StatementKind::Declaration { value, .. } => match &value.kind {
                            ExpressionKind::Initializer { type_name, field_values } => {
                                assert_eq!(type_name, "Point");
                                assert_eq!(field_values.len(), 2);
                                assert_eq!(field_values[0].0, "x");
                                assert_eq!(field_values[1].0, "y");
                            }
                            other => panic!("expected Initializer, got {other:?}"),
                        },
                        other => panic!("expected Declaration, got {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn data_field_access_resolves_the_declared_field_type_not_void() {
        let file = parse_file(
            "data Point {\n x: i32,\n y: i32\n}\n\ndef main() -> i32 {\n p := Point { x: 1, y: 2 }\n return p.x\n}\n",
        );
        let expr = main_return_expr(&file);
        match &expr.kind {
            ExpressionKind::DataAccess { field_name, field_id, .. } => {
                assert_eq!(field_name, "x");
                assert_eq!(*field_id, 0);
            }
            other => panic!("expected DataAccess, got {other:?}"),
        }
        assert_eq!(expr.ty.as_ref(), &Type::Primitive(Primitive::I32));
    }

    #[test]
    fn second_field_resolves_its_own_id_and_type() {
        let file = parse_file(
            "data Point {\n x: i32,\n y: i32\n}\n\ndef main() -> i32 {\n p := Point { x: 1, y: 2 }\n return p.y\n}\n",
        );
        let expr = main_return_expr(&file);
        match &expr.kind {
            ExpressionKind::DataAccess { field_name, field_id, .. } => {
                assert_eq!(field_name, "y");
                assert_eq!(*field_id, 1);
            }
            other => panic!("expected DataAccess, got {other:?}"),
        }
    }

    #[test]
    fn array_index_postfix_resolves_the_element_type() {
        let file = parse_file(
            "def main(xs: i32[]) -> i32 {\n return xs[0]\n}\n",
        );
        let expr = main_return_expr(&file);
        assert!(matches!(expr.kind, ExpressionKind::ArrayAccess { .. }));
        assert_eq!(expr.ty.as_ref(), &Type::Primitive(Primitive::I32));
    }

    #[test]
    fn type_cast_postfix_carries_the_target_type() {
        let file = parse_file("def main() -> i32 {\n return 1 as i32\n}\n");
        let expr = main_return_expr(&file);
        match &expr.kind {
            ExpressionKind::TypeCast { target, is_explicit, .. } => {
                assert!(*is_explicit);
                assert_eq!(target.as_ref(), &Type::Primitive(Primitive::I32));
            }
            other => panic!("expected TypeCast, got {other:?}"),
        }
    }
}

fn parse_int_literal(text: &str, base: NumericBase) -> Option<i64> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    match base {
        NumericBase::Decimal => clean.parse().ok(),
        NumericBase::Hex => i64::from_str_radix(clean.trim_start_matches("0x").trim_start_matches("0X"), 16).ok(),
        NumericBase::Binary => i64::from_str_radix(clean.trim_start_matches("0b").trim_start_matches("0B"), 2).ok(),
    }
}

fn fold_literals(op: BinaryOperator, l: &Literal, r: &Literal) -> Option<Literal> {
    use BinaryOperator::*;
    use Literal::*;
    match (l, r) {
        (Int(a), Int(b)) => Some(match op {
            Add => Int(a.checked_add(*b)?),
            Subtract => Int(a.checked_sub(*b)?),
            Multiply => Int(a.checked_mul(*b)?),
            Divide => {
                if *b == 0 {
                    return None;
                }
                Int(a.checked_div(*b)?)
            }
            Modulo => {
                if *b == 0 {
                    return None;
                }
                Int(a.checked_rem(*b)?)
            }
            Equal => Bool(a == b),
            NotEqual => Bool(a != b),
            Less => Bool(a < b),
            LessEqual => Bool(a <= b),
            Greater => Bool(a > b),
            GreaterEqual => Bool(a >= b),
            _ => return None,
        }),
        (Float(a), Float(b)) => Some(match op {
            Add => Float(a + b),
            Subtract => Float(a - b),
            Multiply => Float(a * b),
            Divide => Float(a / b),
            Equal => Bool(a == b),
            NotEqual => Bool(a != b),
            Less => Bool(a < b),
            LessEqual => Bool(a <= b),
            Greater => Bool(a > b),
            GreaterEqual => Bool(a >= b),
            _ => return None,
        }),
        (Bool(a), Bool(b)) => Some(match op {
            And => Bool(*a && *b),
            Or => Bool(*a || *b),
            Equal => Bool(a == b),
            NotEqual => Bool(a != b),
            _ => return None,
        }),
        (Str(a), Str(b)) if op == Equal => Some(Bool(a == b)),
        (Str(a), Str(b)) if op == NotEqual => Some(Bool(a != b)),
        _ => None,
    }
}

fn fold_unary(op: UnaryOperator, lit: &Literal) -> Option<Literal> {
    match (op, lit) {
        (UnaryOperator::Negate, Literal::Int(v)) => Some(Literal::Int(v.checked_neg()?)),
        (UnaryOperator::Negate, Literal::Float(v)) => Some(Literal::Float(-v)),
        (UnaryOperator::Not, Literal::Bool(v)) => Some(Literal::Bool(!v)),
        _ => None,
    }
}

fn result_type_of(op: BinaryOperator, lhs: &TypeRef, rhs: &TypeRef, parser: &ExprParser) -> TypeRef {
    use BinaryOperator::*;
    match op {
        Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual | And | Or => {
            parser.primitive(Primitive::Bool)
        }
        Assign => Arc::clone(rhs),
        _ => Arc::clone(lhs),
    }
}
