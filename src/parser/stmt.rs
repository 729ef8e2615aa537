//! Pass 2: statement/body parsing (`spec.md` §4.P "Pass 2").
//!
//! Consumes one function's or test's stashed body tokens (see
//! [`crate::parser::decl::DeclParser::parse_pre_file`]) and produces the
//! [`Scope`] tree pass-1 could not build yet: declarations bind fresh
//! [`Variable`]s, nested blocks (`if`/`while`/`for`/`switch`) each own a
//! child [`Scope`], and every expression is parsed through [`ExprParser`]
//! so call resolution sees every function signature in the program, not
//! just the ones already parsed in this file.
//!
//! This grammar has no `let` keyword and no `;` statement terminator (the
//! Lexer never produces one — `SPEC_FULL.md` §4.L): `name := expr` always
//! introduces a new binding with an inferred type, `name: T = expr` an
//! explicit one, and a bare `name = expr` assigns to whatever `name`
//! already resolves to in the enclosing scope chain.

use std::sync::Arc;

use crate::ast::expressions::{ExpressionKind, ExpressionNode};
use crate::ast::position::SourcePosition;
use crate::ast::scope::{Scope, Variable};
use crate::ast::statements::{AssignmentTarget, StatementKind, StatementNode};
use crate::hash::FileHash;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::namespace::Namespace;
use crate::parser::cursor::Cursor;
use crate::parser::error::{ParseResult, ParserError};
use crate::parser::expr::ExprParser;
use crate::registries::Registries;
use crate::types::{Primitive, Type, TypeRef};

pub struct StmtParser<'a> {
    pub file: FileHash,
    pub namespace: &'a Namespace,
    pub registries: &'a Registries,
}

impl<'a> StmtParser<'a> {
    pub fn new(file: FileHash, namespace: &'a Namespace, registries: &'a Registries) -> Self {
        Self { file, namespace, registries }
    }

    fn expr(&self) -> ExprParser<'a> {
        ExprParser::new(self.file, self.namespace, self.registries)
    }

    fn void(&self) -> TypeRef {
        self.namespace.types.intern(Type::Primitive(Primitive::Void)).type_ref()
    }

    /// Parses a function body: a fresh root scope seeded with its
    /// parameters as already-live variables.
    pub fn parse_function_body(
        &self,
        tokens: &[Token],
        parameters: &[(TypeRef, String, bool)],
    ) -> ParseResult<Box<Scope>> {
        let mut scope = Scope::new_root(self.registries.next_scope_id());
        for (ty, name, is_mutable) in parameters {
            scope.declare(
                name.clone(),
                Variable {
                    ty: Arc::clone(ty),
                    scope_id: scope.scope_id,
                    scope_segment: 0,
                    is_mutable: *is_mutable,
                    is_parameter: true,
                    is_reference: false,
                    is_pseudo: false,
                    scope_ids_where_returned: vec![],
                },
            );
        }
        let mut cursor = Cursor::new(tokens);
        self.parse_statements_until_eof(&mut cursor, &mut scope)?;
        Ok(Box::new(scope))
    }

    /// Parses a test body: a fresh root scope with no pre-bound variables.
    pub fn parse_test_body(&self, tokens: &[Token]) -> ParseResult<Box<Scope>> {
        let mut scope = Scope::new_root(self.registries.next_scope_id());
        let mut cursor = Cursor::new(tokens);
        self.parse_statements_until_eof(&mut cursor, &mut scope)?;
        Ok(Box::new(scope))
    }

    fn parse_statements_until_eof(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<()> {
        cursor.skip_trivia();
        while !cursor.is_eof() {
            let stmt = self.parse_statement(cursor, scope)?;
            scope.push_statement(stmt);
            cursor.skip_trivia();
        }
        Ok(())
    }

    /// Parses a brace-delimited block as a fresh child scope of `parent`.
    fn parse_block(&self, cursor: &mut Cursor, parent: &Scope) -> ParseResult<Box<Scope>> {
        let mut scope = Scope::new_child(self.registries.next_scope_id(), parent);
        self.parse_block_into(cursor, &mut scope)?;
        Ok(Box::new(scope))
    }

    /// Parses a brace-delimited block's statements into an already-
    /// constructed scope — used where the caller needs to pre-populate the
    /// scope (e.g. a `for`-loop binding) before its body is parsed.
    fn parse_block_into(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<()> {
        cursor.expect(&TokenKind::LBrace, "{")?;
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            let stmt = self.parse_statement(cursor, scope)?;
            scope.push_statement(stmt);
            cursor.skip_trivia();
        }
        cursor.expect(&TokenKind::RBrace, "}")?;
        Ok(())
    }

    fn parse_statement(&self, cursor: &mut Cursor, scope: &mut Scope) -> ParseResult<StatementNode> {
        let position = cursor.position();
        match cursor.peek().clone() {
            TokenKind::Keyword(Keyword::Return) => self.parse_return(cursor, scope, position),
            TokenKind::Keyword(Keyword::If) => self.parse_if(cursor, scope, position),
            TokenKind::Keyword(Keyword::While) => self.parse_while(cursor, scope, position),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while(cursor, scope, position),
            TokenKind::Keyword(Keyword::For) => self.parse_for(cursor, scope, position),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(cursor, scope, position),
            TokenKind::Keyword(Keyword::Break) => {
                cursor.advance();
                Ok(StatementNode::new(position, StatementKind::Break))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                cursor.advance();
                Ok(StatementNode::new(position, StatementKind::Continue))
            }
            TokenKind::Keyword(Keyword::Throw) => self.parse_throw(cursor, scope, position),
            TokenKind::Keyword(Keyword::Catch) => self.parse_catch(cursor, scope, position),
            TokenKind::LParen => self.parse_group_declaration(cursor, scope, position),
            _ => self.parse_expr_statement(cursor, scope, position),
        }
    }

    fn parse_return(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `return`
        let mut values = Vec::new();
        if !matches!(cursor.peek(), TokenKind::Eol | TokenKind::RBrace | TokenKind::Eof) {
            loop {
                values.push(Box::new(self.expr().parse(cursor, scope)?));
                if !cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(StatementNode::new(position, StatementKind::Return { values }))
    }

    fn parse_if(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `if`
        let condition = Box::new(self.expr().parse(cursor, scope)?);
        let then_branch = self.parse_block(cursor, scope)?;
        cursor.skip_trivia();
        let else_branch = if cursor.eat(&TokenKind::Keyword(Keyword::Else)) {
            cursor.skip_trivia();
            if cursor.check(&TokenKind::Keyword(Keyword::If)) {
                let nested_position = cursor.position();
                let nested = self.parse_if(cursor, scope, nested_position)?;
                let mut wrapper = Scope::new_child(self.registries.next_scope_id(), scope);
                wrapper.push_statement(nested);
                Some(Box::new(wrapper))
            } else {
                Some(self.parse_block(cursor, scope)?)
            }
        } else {
            None
        };
        Ok(StatementNode::new(position, StatementKind::If { condition, then_branch, else_branch }))
    }

    fn parse_while(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `while`
        let condition = Box::new(self.expr().parse(cursor, scope)?);
        let body = self.parse_block(cursor, scope)?;
        Ok(StatementNode::new(position, StatementKind::While { condition, body }))
    }

    fn parse_do_while(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `do`
        let body = self.parse_block(cursor, scope)?;
        cursor.skip_trivia();
        cursor.expect(&TokenKind::Keyword(Keyword::While), "while")?;
        let condition = Box::new(self.expr().parse(cursor, scope)?);
        Ok(StatementNode::new(position, StatementKind::DoWhile { body, condition }))
    }

    fn iterable_element_type(&self, ty: &TypeRef) -> TypeRef {
        match ty.as_ref() {
            Type::Array { element, .. } => Arc::clone(element),
            Type::Range { bound } => Arc::clone(bound),
            _ => Arc::clone(ty),
        }
    }

    fn parse_for(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `for`
        cursor.expect(&TokenKind::LParen, "(")?;

        let is_reference = cursor.eat(&TokenKind::Ampersand);
        if matches!(cursor.peek(), TokenKind::Identifier(_)) && matches!(cursor.peek_at(1), TokenKind::Keyword(Keyword::In)) {
            let binding = cursor.expect_identifier()?;
            cursor.advance(); // `in`
            let iterable = Box::new(self.expr().parse(cursor, scope)?);
            cursor.expect(&TokenKind::RParen, ")")?;
            let element_ty = self.iterable_element_type(&iterable.ty);
            let mut body_scope = Scope::new_child(self.registries.next_scope_id(), scope);
            body_scope.declare(
                binding.clone(),
                Variable {
                    ty: element_ty,
                    scope_id: body_scope.scope_id,
                    scope_segment: 0,
                    is_mutable: is_reference,
                    is_parameter: false,
                    is_reference,
                    is_pseudo: true,
                    scope_ids_where_returned: vec![],
                },
            );
            self.parse_block_into(cursor, &mut body_scope)?;
            return Ok(StatementNode::new(
                position,
                StatementKind::EnhancedFor { binding, is_reference, iterable, body: Box::new(body_scope) },
            ));
        }

        // Classic `for (init, condition, post) { ... }`: no `;` token
        // exists in this grammar, so the three clauses are comma-separated
        // instead, sharing one header scope.
        let mut header_scope = Scope::new_child(self.registries.next_scope_id(), scope);
        let init = Box::new(self.parse_statement(cursor, &mut header_scope)?);
        cursor.expect(&TokenKind::Comma, ",")?;
        let condition = Box::new(self.expr().parse(cursor, &mut header_scope)?);
        cursor.expect(&TokenKind::Comma, ",")?;
        let post = Box::new(self.parse_statement(cursor, &mut header_scope)?);
        cursor.expect(&TokenKind::RParen, ")")?;
        self.parse_block_into(cursor, &mut header_scope)?;
        Ok(StatementNode::new(position, StatementKind::For { init, condition, post, body: Box::new(header_scope) }))
    }

    fn parse_switch_statement(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `switch`
        let subject = Box::new(self.expr().parse(cursor, scope)?);
        cursor.expect(&TokenKind::LBrace, "{")?;
        let mut branches = Vec::new();
        let mut bodies = Vec::new();
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            let is_default = cursor.eat(&TokenKind::Keyword(Keyword::Default));
            let mut matches = Vec::new();
            if !is_default {
                loop {
                    matches.push(Box::new(self.expr().parse(cursor, scope)?));
                    if !cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            cursor.expect(&TokenKind::Arrow, "->")?;
            let body = self.parse_block(cursor, scope)?;
            // `result` is unused in statement form (the branch's effect is
            // its block, held in `bodies`); carries a `Default` sentinel so
            // every `SwitchBranch` stays uniformly constructible for both
            // the expression and statement forms.
            branches.push(crate::ast::expressions::SwitchBranch {
                matches,
                is_default,
                result: Box::new(ExpressionNode::new(cursor.position(), self.void(), ExpressionKind::Default)),
            });
            bodies.push(body);
            cursor.eat(&TokenKind::Comma);
            cursor.skip_trivia();
        }
        cursor.expect(&TokenKind::RBrace, "}")?;
        Ok(StatementNode::new(position, StatementKind::Switch { subject, branches, bodies }))
    }

    fn parse_throw(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `throw`
        let error = Box::new(self.expr().parse(cursor, scope)?);
        Ok(StatementNode::new(position, StatementKind::Throw { error }))
    }

    fn parse_catch(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        cursor.advance(); // `catch`
        // `spec.md` §4.P: "catch refers to the most recently parsed call."
        let call_id = self.registries.last_call_id().ok_or_else(|| ParserError::UnexpectedToken {
            position,
            expected: "a preceding call for this catch to attach to".to_string(),
            found: "no call parsed yet".to_string(),
        })?;
        self.registries.mark_has_catch(call_id);
        let error_binding = if let TokenKind::Identifier(name) = cursor.peek().clone() {
            cursor.advance();
            Some(name)
        } else {
            None
        };
        let body = self.parse_block(cursor, scope)?;
        Ok(StatementNode::new(position, StatementKind::Catch { call_id, error_binding, body }))
    }

    /// Pure lookahead: `true` iff the tokens starting at `cursor` spell
    /// `(name, name, ...) :=`, without consuming anything. Used to
    /// disambiguate a group declaration from an ordinary parenthesized
    /// expression statement, both of which start with `(`.
    fn scan_group_declaration(&self, cursor: &Cursor) -> Option<usize> {
        let mut offset = 1; // past '('
        let mut count = 0usize;
        loop {
            if matches!(cursor.peek_at(offset), TokenKind::Keyword(Keyword::Mut)) {
                offset += 1;
            }
            if !matches!(cursor.peek_at(offset), TokenKind::Identifier(_)) {
                return None;
            }
            offset += 1;
            count += 1;
            if matches!(cursor.peek_at(offset), TokenKind::Comma) {
                offset += 1;
                continue;
            }
            break;
        }
        if !matches!(cursor.peek_at(offset), TokenKind::RParen) {
            return None;
        }
        offset += 1;
        if matches!(cursor.peek_at(offset), TokenKind::Colon) && matches!(cursor.peek_at(offset + 1), TokenKind::Assign) {
            Some(count)
        } else {
            None
        }
    }

    fn parse_group_declaration(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        let Some(name_count) = self.scan_group_declaration(cursor) else {
            return self.parse_expr_statement(cursor, scope, position);
        };
        cursor.advance(); // '('
        let mut names = Vec::new();
        for i in 0..name_count {
            let is_mutable = cursor.eat(&TokenKind::Keyword(Keyword::Mut));
            let name = cursor.expect_identifier()?;
            names.push((name, is_mutable));
            if i + 1 < name_count {
                cursor.expect(&TokenKind::Comma, ",")?;
            }
        }
        cursor.expect(&TokenKind::RParen, ")")?;
        cursor.expect(&TokenKind::Colon, ":")?;
        cursor.expect(&TokenKind::Assign, "=")?;
        let value = Box::new(self.expr().parse(cursor, scope)?);
        // Each bound name's exact type is the corresponding member of
        // `value`'s group type — left to the Analyzer to refine, same as
        // every other inferred declaration in this parser.
        for (name, is_mutable) in &names {
            scope.declare(
                name.clone(),
                Variable {
                    ty: self.void(),
                    scope_id: scope.scope_id,
                    scope_segment: 0,
                    is_mutable: *is_mutable,
                    is_parameter: false,
                    is_reference: false,
                    is_pseudo: false,
                    scope_ids_where_returned: vec![],
                },
            );
        }
        let group_id = self.registries.next_group_id();
        Ok(StatementNode::new(position, StatementKind::GroupDeclaration { names, value, group_id }))
    }

    fn finish_declaration(
        &self,
        scope: &mut Scope,
        position: SourcePosition,
        name: String,
        declared_type: Option<TypeRef>,
        is_mutable: bool,
        value: Box<ExpressionNode>,
    ) -> ParseResult<StatementNode> {
        let ty = declared_type.clone().unwrap_or_else(|| Arc::clone(&value.ty));
        scope.declare(
            name.clone(),
            Variable {
                ty,
                scope_id: scope.scope_id,
                scope_segment: 0,
                is_mutable,
                is_parameter: false,
                is_reference: false,
                is_pseudo: false,
                scope_ids_where_returned: vec![],
            },
        );
        Ok(StatementNode::new(position, StatementKind::Declaration { name, declared_type, is_mutable, value }))
    }

    fn parse_expr_statement(&self, cursor: &mut Cursor, scope: &mut Scope, position: SourcePosition) -> ParseResult<StatementNode> {
        let leading_mut = cursor.eat(&TokenKind::Keyword(Keyword::Mut));

        if let TokenKind::Identifier(name) = cursor.peek().clone() {
            if matches!(cursor.peek_at(1), TokenKind::Colon) && matches!(cursor.peek_at(2), TokenKind::Assign) {
                cursor.advance(); // name
                cursor.advance(); // ':'
                cursor.advance(); // '='
                let value = Box::new(self.expr().parse(cursor, scope)?);
                return self.finish_declaration(scope, position, name, None, true, value);
            }
            if matches!(cursor.peek_at(1), TokenKind::Colon) && !matches!(cursor.peek_at(2), TokenKind::Assign) {
                cursor.advance(); // name
                cursor.advance(); // ':'
                let (declared_type, _) = self.expr().parse_type_annotation(cursor)?;
                cursor.expect(&TokenKind::Assign, "=")?;
                let value = Box::new(self.expr().parse(cursor, scope)?);
                return self.finish_declaration(scope, position, name, Some(declared_type), leading_mut, value);
            }
        }

        if leading_mut {
            return Err(ParserError::UnexpectedToken {
                position,
                expected: "a declaration after 'mut'".to_string(),
                found: format!("{:?}", cursor.peek()),
            });
        }

        let expr = self.expr().parse(cursor, scope)?;
        if cursor.eat(&TokenKind::Assign) {
            let value = Box::new(self.expr().parse(cursor, scope)?);
            let target = expression_to_assignment_target(expr)?;
            return Ok(StatementNode::new(position, StatementKind::Assignment { target, value }));
        }

        match expr.kind {
            ExpressionKind::Call { call_id } | ExpressionKind::InstanceCall { call_id, .. } => {
                Ok(StatementNode::new(position, StatementKind::Call { call_id }))
            }
            other => Err(ParserError::UnexpectedToken {
                position,
                expected: "a call or assignment used as a statement".to_string(),
                found: format!("{:?}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::definitions::DefinitionKind;
    use crate::parser::Parser;
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

    fn main_scope(file: &crate::ast::file::FileNode) -> &Scope {
        for def in &file.definitions {
            if let DefinitionKind::Function(f) = def.as_ref() {
                if f.name == "main" {
                    return f.scope().expect("main has a parsed body");
                }
            }
        }
        panic!("no 'main' function in file");
    }

    #[test]
    fn inferred_declaration_is_mutable() {
        let file = parse_file("def main() -> i32 {\n x := 1\n return x\n}\n");
        let scope = main_scope(&file);
        match &scope.body[0].kind {
            StatementKind::Declaration { is_mutable, .. } => assert!(*is_mutable),
            other => panic!("expected Declaration, got {other:?}"),
        }
    }

    #[test]
    fn explicit_declaration_respects_mut_keyword() {
        let file = parse_file("def main() -> i32 {\n mut x: i32 = 1\n return x\n}\n");
        let scope = main_scope(&file);
        match &scope.body[0].kind {
            StatementKind::Declaration { is_mutable, declared_type, .. } => {
                assert!(*is_mutable);
                assert!(declared_type.is_some());
            }
            other => panic!("expected Declaration, got {other:?}"),
        }
    }

    #[test]
    fn group_declaration_destructures_a_group_expression() {
        let file = parse_file("def main() -> i32 {\n (a, b) := (1, 2)\n return a\n}\n");
        let scope = main_scope(&file);
        match &scope.body[0].kind {
            StatementKind::GroupDeclaration { names, .. } => {
                assert_eq!(names.len(), 2);
                assert_eq!(names[0].0, "a");
                assert_eq!(names[1].0, "b");
            }
            other => panic!("expected GroupDeclaration, got {other:?}"),
        }
    }

    #[test]
    fn while_loop_parses_condition_and_body() {
        let file = parse_file("def main() -> i32 {\n while true {\n break\n }\n return 0\n}\n");
        let scope = main_scope(&file);
        match &scope.body[0].kind {
            StatementKind::While { body, .. } => assert_eq!(body.body.len(), 1),
            other => panic!("expected While, got {other:?}"),
        }
    }

    #[test]
    fn catch_binds_to_the_most_recently_parsed_call() {
        let file = parse_file(
            "import assert\ndef main() -> i32 {\n assert.assert(true)\n catch err {\n }\n return 0\n}\n",
        );
        let scope = main_scope(&file);
        assert!(matches!(scope.body[0].kind, StatementKind::Call { .. }));
        assert!(matches!(scope.body[1].kind, StatementKind::Catch { .. }));
    }

    #[test]
    fn enhanced_for_binds_element_type_from_array() {
        let file = parse_file(
            "def main() -> i32 {\n mut total: i32 = 0\n for (n in xs) {\n total = n\n }\n return total\n}\n",
        );
        let scope = main_scope(&file);
        assert!(matches!(scope.body[1].kind, StatementKind::EnhancedFor { .. }));
    }
}

fn expression_to_assignment_target(expr: ExpressionNode) -> ParseResult<AssignmentTarget> {
    match expr.kind {
        ExpressionKind::Variable { name, scope_id } => Ok(AssignmentTarget::Direct { name, scope_id }),
        ExpressionKind::ArrayAccess { array, index } => Ok(AssignmentTarget::ArrayIndexed { base: array, index }),
        ExpressionKind::DataAccess { base, field_name, field_id } => {
            Ok(AssignmentTarget::DataField { base, field_name, field_id })
        }
        ExpressionKind::GroupedDataAccess { base, group_index, field_name, field_id } => {
            Ok(AssignmentTarget::GroupedDataField { base, group_index, field_name, field_id })
        }
        other => Err(ParserError::UnexpectedToken {
            position: expr.position,
            expected: "an assignable expression".to_string(),
            found: format!("{:?}", other),
        }),
    }
}
