//! Pass 1: declaration skimming (`spec.md` §4.P "Pass 1").
//!
//! For each top-level construct, splits the leading declaration tokens
//! from the body tokens and parses only the declaration eagerly: name,
//! signature, parameter/return/error types, parent entities. Function and
//! test bodies are stashed as raw token slices (brace-matched, not yet
//! parsed) for pass 2. Every definition is recorded into the file's
//! `Namespace` and into `Registries` as it is parsed, so a forward
//! reference from another file's pass-2 body can already resolve it.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::ast::definitions::{
    DataNode, DefinitionKind, EntityNode, EnumNode, ErrorNode, FuncModuleNode, FunctionNode,
    ImportNode, ImportTarget, LinkNode, TestNode, VariantNode,
};
use crate::ast::file::PreFileNode;
use crate::ast::position::SourcePosition;
use crate::hash::FileHash;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::namespace::{Namespace, NamespaceError};
use crate::parser::cursor::Cursor;
use crate::parser::error::{ParseResult, ParserError};
use crate::parser::expr::ExprParser;
use crate::registries::Registries;
use crate::types::TypeRef;

/// The leading modifier keywords a `def`/`data`/... construct can carry,
/// in any order, before its defining keyword.
#[derive(Debug, Default, Clone, Copy)]
pub struct Modifiers {
    pub is_extern: bool,
    pub is_const: bool,
    pub is_aligned: bool,
}

pub struct DeclParser<'a> {
    pub file: FileHash,
    pub file_name: String,
    pub namespace: &'a Namespace,
    pub registries: &'a Registries,
}

impl<'a> DeclParser<'a> {
    pub fn new(
        file: FileHash,
        file_name: String,
        namespace: &'a Namespace,
        registries: &'a Registries,
    ) -> Self {
        Self { file, file_name, namespace, registries }
    }

    fn expr_parser(&self) -> ExprParser<'a> {
        ExprParser::new(self.file, self.namespace, self.registries)
    }

    /// Entry point: skims every top-level construct in `tokens`, building
    /// a [`PreFileNode`] whose `open_functions`/`open_tests` carry stashed
    /// body token slices for pass 2.
    pub fn parse_pre_file(&self, tokens: Vec<Token>) -> ParseResult<PreFileNode> {
        let mut cursor = Cursor::new(&tokens);
        let mut pre = PreFileNode::new(self.file, self.file_name.clone());
        cursor.skip_trivia();
        while !cursor.is_eof() {
            self.parse_top_level(&mut cursor, &mut pre)?;
            cursor.skip_trivia();
        }
        Ok(pre)
    }

    fn parse_modifiers(&self, cursor: &mut Cursor) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            match cursor.peek() {
                TokenKind::Keyword(Keyword::Extern) => {
                    modifiers.is_extern = true;
                    cursor.advance();
                }
                TokenKind::Keyword(Keyword::Const) => {
                    modifiers.is_const = true;
                    cursor.advance();
                }
                TokenKind::Keyword(Keyword::Aligned) => {
                    modifiers.is_aligned = true;
                    cursor.advance();
                }
                TokenKind::Keyword(Keyword::Pub) | TokenKind::Keyword(Keyword::Priv) => {
                    cursor.advance();
                }
                _ => break,
            }
        }
        modifiers
    }

    fn parse_top_level(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let modifiers = self.parse_modifiers(cursor);
        match cursor.peek().clone() {
            TokenKind::Keyword(Keyword::Import) => self.parse_import(cursor, pre),
            TokenKind::Keyword(Keyword::Link) => self.parse_link(cursor, pre),
            TokenKind::Keyword(Keyword::Data) => self.parse_data(cursor, pre, modifiers),
            TokenKind::Keyword(Keyword::Entity) => self.parse_entity(cursor, pre),
            TokenKind::Keyword(Keyword::Enum) => self.parse_enum(cursor, pre),
            TokenKind::Keyword(Keyword::Error) => self.parse_error_def(cursor, pre),
            TokenKind::Keyword(Keyword::Variant) => self.parse_variant(cursor, pre),
            TokenKind::Keyword(Keyword::Func) => self.parse_func_module(cursor, pre),
            TokenKind::Keyword(Keyword::Test) => self.parse_test(cursor, pre),
            TokenKind::Keyword(Keyword::Def) => {
                self.parse_function(cursor, pre, &modifiers, true)?;
                Ok(())
            }
            other => Err(ParserError::UnexpectedToken {
                position: cursor.position(),
                expected: "top-level declaration".to_string(),
                found: format!("{:?}", other),
            }),
        }
    }

    fn define_or_err(&self, name: String, def: &Arc<DefinitionKind>, position: SourcePosition) -> ParseResult<()> {
        self.namespace
            .define(name, Arc::clone(def))
            .map_err(|err| namespace_err_to_parser(err, position))
    }

    fn parse_import(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `import`
        match cursor.peek().clone() {
            TokenKind::StrPart(path) => {
                cursor.advance();
                let path_buf = PathBuf::from(&path);
                let filename = path_buf
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.clone());
                let directory = path_buf.parent().map(|p| p.to_path_buf()).unwrap_or_default();
                let is_aliased = cursor.check(&TokenKind::Keyword(Keyword::As));
                let alias = if cursor.eat(&TokenKind::Keyword(Keyword::As)) {
                    cursor.expect_identifier()?
                } else {
                    filename.trim_end_matches(".flint").to_string()
                };
                let def = Arc::new(DefinitionKind::Import(ImportNode {
                    alias: alias.clone(),
                    position,
                    target: ImportTarget::File { directory, filename },
                    is_aliased,
                }));
                self.define_or_err(alias, &def, position)?;
                pre.push(def);
                Ok(())
            }
            TokenKind::Identifier(name) => {
                cursor.advance();
                self.namespace
                    .import_core_module(name.clone(), position.line, position.column)
                    .map_err(|_| ParserError::UnknownCoreModule { position, name: name.clone() })?;
                let def = Arc::new(DefinitionKind::Import(ImportNode {
                    alias: name.clone(),
                    position,
                    target: ImportTarget::CoreModule(name.clone()),
                    is_aliased: false,
                }));
                self.define_or_err(name, &def, position)?;
                pre.push(def);
                Ok(())
            }
            other => Err(ParserError::UnexpectedToken {
                position,
                expected: "import target".to_string(),
                found: format!("{:?}", other),
            }),
        }
    }

    fn parse_link(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `link`
        let name = match cursor.peek().clone() {
            TokenKind::StrPart(s) => {
                cursor.advance();
                s
            }
            TokenKind::Identifier(s) => {
                cursor.advance();
                s
            }
            other => {
                return Err(ParserError::UnexpectedToken {
                    position,
                    expected: "link target".to_string(),
                    found: format!("{:?}", other),
                })
            }
        };
        pre.push(Arc::new(DefinitionKind::Link(LinkNode { position, name })));
        Ok(())
    }

    fn parse_fields(&self, cursor: &mut Cursor) -> ParseResult<Vec<(String, TypeRef, bool)>> {
        let mut fields = Vec::new();
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            let is_mutable = cursor.eat(&TokenKind::Keyword(Keyword::Mut));
            let field_name = cursor.expect_identifier()?;
            cursor.expect(&TokenKind::Colon, ":")?;
            let (ty, _) = self.expr_parser().parse_type_annotation(cursor)?;
            fields.push((field_name, ty, is_mutable));
            cursor.eat(&TokenKind::Comma);
            cursor.skip_trivia();
        }
        Ok(fields)
    }

    fn parse_data(&self, cursor: &mut Cursor, pre: &mut PreFileNode, modifiers: Modifiers) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `data`
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let fields = self.parse_fields(cursor)?;
        cursor.expect(&TokenKind::RBrace, "}")?;
        let def = Arc::new(DefinitionKind::Data(DataNode {
            position,
            name: name.clone(),
            fields,
            is_extern: modifiers.is_extern,
        }));
        self.define_or_err(name, &def, position)?;
        self.registries.register_data(self.file_name.clone(), Arc::clone(&def));
        pre.push(def);
        Ok(())
    }

    fn parse_entity(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `entity`
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let mut fields = Vec::new();
        let mut method_indices = Vec::new();
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            let modifiers = self.parse_modifiers(cursor);
            if cursor.check(&TokenKind::Keyword(Keyword::Def)) {
                let index = self.parse_function(cursor, pre, &modifiers, false)?;
                method_indices.push(index);
            } else {
                let is_mutable = cursor.eat(&TokenKind::Keyword(Keyword::Mut));
                let field_name = cursor.expect_identifier()?;
                cursor.expect(&TokenKind::Colon, ":")?;
                let (ty, _) = self.expr_parser().parse_type_annotation(cursor)?;
                fields.push((field_name, ty, is_mutable));
                cursor.eat(&TokenKind::Comma);
            }
            cursor.skip_trivia();
        }
        cursor.expect(&TokenKind::RBrace, "}")?;
        let def = Arc::new(DefinitionKind::Entity(EntityNode {
            position,
            name: name.clone(),
            fields,
            method_indices,
        }));
        self.define_or_err(name, &def, position)?;
        pre.push(def);
        Ok(())
    }

    fn parse_name_list(&self, cursor: &mut Cursor) -> ParseResult<Vec<String>> {
        let mut names = Vec::new();
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            names.push(cursor.expect_identifier()?);
            cursor.eat(&TokenKind::Comma);
            cursor.skip_trivia();
        }
        Ok(names)
    }

    fn parse_enum(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `enum`
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let values = self.parse_name_list(cursor)?;
        cursor.expect(&TokenKind::RBrace, "}")?;
        let def = Arc::new(DefinitionKind::Enum(EnumNode { position, name: name.clone(), values }));
        self.define_or_err(name, &def, position)?;
        pre.push(def);
        Ok(())
    }

    fn parse_error_def(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `error`
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let variants = self.parse_name_list(cursor)?;
        cursor.expect(&TokenKind::RBrace, "}")?;
        let def = Arc::new(DefinitionKind::Error(ErrorNode { position, name: name.clone(), variants }));
        self.define_or_err(name, &def, position)?;
        pre.push(def);
        Ok(())
    }

    fn parse_variant(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `variant`
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let mut cases = Vec::new();
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            let case_name = cursor.expect_identifier()?;
            let payload = if cursor.eat(&TokenKind::LParen) {
                let (ty, _) = self.expr_parser().parse_type_annotation(cursor)?;
                cursor.expect(&TokenKind::RParen, ")")?;
                Some(ty)
            } else {
                None
            };
            cases.push((case_name, payload));
            cursor.eat(&TokenKind::Comma);
            cursor.skip_trivia();
        }
        cursor.expect(&TokenKind::RBrace, "}")?;
        let def = Arc::new(DefinitionKind::Variant(VariantNode { position, name: name.clone(), cases }));
        self.define_or_err(name, &def, position)?;
        pre.push(def);
        Ok(())
    }

    fn parse_func_module(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `func`
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LBrace, "{")?;
        let mut function_indices = Vec::new();
        cursor.skip_trivia();
        while !cursor.check(&TokenKind::RBrace) {
            let modifiers = self.parse_modifiers(cursor);
            let index = self.parse_function(cursor, pre, &modifiers, false)?;
            function_indices.push(index);
            cursor.skip_trivia();
        }
        cursor.expect(&TokenKind::RBrace, "}")?;
        let def = Arc::new(DefinitionKind::FuncModule(FuncModuleNode {
            position,
            name: name.clone(),
            function_indices,
        }));
        self.define_or_err(name, &def, position)?;
        pre.push(def);
        Ok(())
    }

    fn parse_type_list(&self, cursor: &mut Cursor) -> ParseResult<Vec<TypeRef>> {
        if cursor.eat(&TokenKind::LParen) {
            let mut types = Vec::new();
            if !cursor.check(&TokenKind::RParen) {
                loop {
                    let (ty, _) = self.expr_parser().parse_type_annotation(cursor)?;
                    types.push(ty);
                    if !cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            cursor.expect(&TokenKind::RParen, ")")?;
            Ok(types)
        } else {
            let (ty, _) = self.expr_parser().parse_type_annotation(cursor)?;
            Ok(vec![ty])
        }
    }

    fn parse_parameters(&self, cursor: &mut Cursor) -> ParseResult<Vec<(TypeRef, String, bool)>> {
        let mut params = Vec::new();
        if !cursor.check(&TokenKind::RParen) {
            loop {
                let is_mutable = cursor.eat(&TokenKind::Keyword(Keyword::Mut));
                let name = cursor.expect_identifier()?;
                cursor.expect(&TokenKind::Colon, ":")?;
                let (ty, _) = self.expr_parser().parse_type_annotation(cursor)?;
                params.push((ty, name, is_mutable));
                if !cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(params)
    }

    /// Parses one `def` construct's signature and stashes its body (if
    /// any — an `extern` declaration has none). Used both for top-level
    /// functions and for entity/func-module members; `register_in_namespace`
    /// is false for the latter two since an entity method's bare name is
    /// not a unique top-level identifier (two entities may each declare a
    /// method of the same name).
    fn parse_function(
        &self,
        cursor: &mut Cursor,
        pre: &mut PreFileNode,
        modifiers: &Modifiers,
        register_in_namespace: bool,
    ) -> ParseResult<usize> {
        let position = cursor.position();
        cursor.expect(&TokenKind::Keyword(Keyword::Def), "def")?;
        let name = cursor.expect_identifier()?;
        cursor.expect(&TokenKind::LParen, "(")?;
        let parameters = self.parse_parameters(cursor)?;
        cursor.expect(&TokenKind::RParen, ")")?;
        let return_types = if cursor.eat(&TokenKind::Arrow) {
            self.parse_type_list(cursor)?
        } else {
            Vec::new()
        };
        let error_types = if cursor.eat(&TokenKind::Bang) {
            self.parse_type_list(cursor)?
        } else {
            Vec::new()
        };
        let body_tokens = if cursor.check(&TokenKind::LBrace) {
            Some(self.capture_brace_body(cursor)?)
        } else {
            None
        };

        let function = FunctionNode {
            position,
            name: name.clone(),
            is_aligned: modifiers.is_aligned,
            is_const: modifiers.is_const,
            is_extern: modifiers.is_extern,
            parameters,
            return_types,
            error_types,
            scope: OnceLock::new(),
        };
        let def = Arc::new(DefinitionKind::Function(function));
        if register_in_namespace {
            self.define_or_err(name.clone(), &def, position)?;
        }
        self.registries.register_function(Arc::clone(&def), self.file_name.clone());

        let index = pre.definitions.len();
        pre.push(Arc::clone(&def));
        if let Some(tokens) = body_tokens {
            pre.open_functions.push((index, tokens));
        }
        Ok(index)
    }

    fn parse_test(&self, cursor: &mut Cursor, pre: &mut PreFileNode) -> ParseResult<()> {
        let position = cursor.position();
        cursor.advance(); // `test`
        let name = match cursor.peek().clone() {
            TokenKind::StrPart(s) => {
                cursor.advance();
                s
            }
            TokenKind::Identifier(s) => {
                cursor.advance();
                s
            }
            other => {
                return Err(ParserError::UnexpectedToken {
                    position,
                    expected: "test name".to_string(),
                    found: format!("{:?}", other),
                })
            }
        };
        // `spec.md` §4.P: `check_test_name` adds under lock, false on
        // collision (`spec.md` §8 invariant 7 / E6).
        if !self.registries.check_test_name(&self.file_name, &name) {
            return Err(ParserError::DuplicateTestName { position, name });
        }
        let body_tokens = self.capture_brace_body(cursor)?;
        let test_id = self.registries.next_test_id();
        let test = TestNode { position, name: name.clone(), test_id, scope: OnceLock::new() };
        let def = Arc::new(DefinitionKind::Test(test));
        self.registries.register_test(Arc::clone(&def), self.file_name.clone());
        let index = pre.definitions.len();
        pre.push(Arc::clone(&def));
        pre.open_tests.push((index, body_tokens));
        Ok(())
    }

    /// Consumes a `{ ... }` block and returns its interior tokens (brace-
    /// depth matched, so nested `{`/`}` from `if`/`while`/`switch` bodies
    /// pass through untouched) terminated by a synthetic `EOF`, without
    /// parsing them — `spec.md` §4.P: "stash the body tokens without
    /// parsing them."
    fn capture_brace_body(&self, cursor: &mut Cursor) -> ParseResult<Vec<Token>> {
        cursor.expect(&TokenKind::LBrace, "{")?;
        let start = cursor.index();
        let mut depth = 1usize;
        loop {
            match cursor.peek() {
                TokenKind::Eof => {
                    return Err(ParserError::UnexpectedEof { expected: "}".to_string() })
                }
                TokenKind::LBrace => {
                    depth += 1;
                    cursor.advance();
                }
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        let end = cursor.index();
                        cursor.advance(); // consume the matching `}`
                        let mut body = cursor.tokens_from(start)[..end - start].to_vec();
                        body.push(Token::new(TokenKind::Eof, cursor.position()));
                        return Ok(body);
                    }
                    cursor.advance();
                }
                _ => {
                    cursor.advance();
                }
            }
        }
    }
}

fn namespace_err_to_parser(err: NamespaceError, position: SourcePosition) -> ParserError {
    match err {
        NamespaceError::DuplicateDefinition { name } => ParserError::DuplicateDefinition { position, name },
        NamespaceError::UnknownCoreModule { name } => ParserError::UnknownCoreModule { position, name },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use std::path::Path;

    fn pass1(text: &str) -> PreFileNode {
        let hash = FileHash::of_canonical_path(Path::new("/t.flint"));
        let tokens = crate::lexer::tokenize(text, hash).expect("lex");
        let namespace = Namespace::new(hash);
        let registries = Registries::new();
        let parser = Parser::new(hash, "t.flint".to_string(), &namespace, &registries);
        parser.pass1(tokens).expect("pass1")
    }

    #[test]
    fn function_signature_is_skimmed_without_touching_its_body() {
        let pre = pass1("def main(a: i32) -> i32 {\n this is not valid statement syntax at all\n}\n");
        assert_eq!(pre.definitions.len(), 1);
        assert_eq!(pre.open_functions.len(), 1);
        match pre.definitions[0].as_ref() {
            DefinitionKind::Function(f) => {
                assert_eq!(f.name, "main");
                assert_eq!(f.parameters.len(), 1);
            }
            other => panic!("expected Function, got {other:?}"),
        }
    }

    #[test]
    fn data_fields_are_recorded_in_declaration_order() {
        let pre = pass1("data Point {\n x: i32,\n mut y: i32\n}\n");
        match pre.definitions[0].as_ref() {
            DefinitionKind::Data(d) => {
                assert_eq!(d.name, "Point");
                assert_eq!(d.fields[0].0, "x");
                assert!(!d.fields[0].2);
                assert_eq!(d.fields[1].0, "y");
                assert!(d.fields[1].2);
            }
            other => panic!("expected Data, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_top_level_name_is_rejected() {
        let hash = FileHash::of_canonical_path(Path::new("/t.flint"));
        let tokens = crate::lexer::tokenize("def f() {\n}\ndef f() {\n}\n", hash).expect("lex");
        let namespace = Namespace::new(hash);
        let registries = Registries::new();
        let parser = Parser::new(hash, "t.flint".to_string(), &namespace, &registries);
        let result = parser.pass1(tokens);
        assert!(matches!(result, Err(ParserError::DuplicateDefinition { .. })));
    }

    #[test]
    fn duplicate_test_name_is_rejected() {
        let hash = FileHash::of_canonical_path(Path::new("/t.flint"));
        let tokens = crate::lexer::tokenize("test \"dup\" {\n}\ntest \"dup\" {\n}\n", hash).expect("lex");
        let namespace = Namespace::new(hash);
        let registries = Registries::new();
        let parser = Parser::new(hash, "t.flint".to_string(), &namespace, &registries);
        let result = parser.pass1(tokens);
        assert!(matches!(result, Err(ParserError::DuplicateTestName { .. })));
    }

    #[test]
    fn core_module_import_is_recognized() {
        let pre = pass1("import assert\ndef main() {\n}\n");
        assert_eq!(pre.definitions.len(), 2);
    }

    #[test]
    fn unknown_core_module_import_is_rejected() {
        let hash = FileHash::of_canonical_path(Path::new("/t.flint"));
        let tokens = crate::lexer::tokenize("import notamodule\n", hash).expect("lex");
        let namespace = Namespace::new(hash);
        let registries = Registries::new();
        let parser = Parser::new(hash, "t.flint".to_string(), &namespace, &registries);
        let result = parser.pass1(tokens);
        assert!(matches!(result, Err(ParserError::UnknownCoreModule { .. })));
    }
}
