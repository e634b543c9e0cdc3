use std::collections::VecDeque;

use rowan::{GreenNode, GreenNodeBuilder};
#[cfg(test)]
use rowan::NodeOrToken;
use text_size::TextSize;

use crate::lexer::{lex, Token};
use crate::syntax_kind::{CSharpLanguage, SyntaxKind};
use crate::{ParseError, TextRange};

pub type SyntaxNode = rowan::SyntaxNode<CSharpLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<CSharpLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<CSharpLanguage>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSharpParseResult {
    pub green: GreenNode,
    pub errors: Vec<ParseError>,
}

impl CSharpParseResult {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn token_at_offset(&self, offset: u32) -> rowan::TokenAtOffset<SyntaxToken> {
        self.syntax().token_at_offset(TextSize::from(offset))
    }

    pub fn covering_element(&self, range: TextRange) -> SyntaxElement {
        self.syntax().covering_element(text_size::TextRange::new(
            TextSize::from(range.start),
            TextSize::from(range.end),
        ))
    }
}

pub fn parse_csharp(input: &str) -> CSharpParseResult {
    let result = Parser::new(input).parse();
    if !result.errors.is_empty() {
        tracing::debug!(errors = result.errors.len(), "parsed with syntax errors");
    }
    result
}

struct Parser<'a> {
    input: &'a str,
    tokens: VecDeque<Token>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: VecDeque::from(lex(input)),
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> CSharpParseResult {
        self.builder.start_node(SyntaxKind::CompilationUnit.into());
        self.eat_trivia();

        // `using Foo.Bar;` directives; `using (...)` is a statement and is
        // left for the top-level statement loop below.
        while self.at(SyntaxKind::UsingKw) && self.nth(1) != Some(SyntaxKind::LParen) {
            self.parse_using_directive();
        }

        while !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::NamespaceKw) {
                self.parse_namespace_decl();
            } else if self.at_type_decl_start() {
                self.parse_type_declaration();
            } else {
                // Top-level statement.
                self.builder.start_node(SyntaxKind::GlobalStatement.into());
                self.parse_statement();
                self.builder.finish_node();
            }
        }

        self.eat_trivia();
        self.expect(SyntaxKind::Eof, "expected end of file");
        self.builder.finish_node();

        CSharpParseResult {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    fn parse_using_directive(&mut self) {
        self.builder.start_node(SyntaxKind::UsingDirective.into());
        self.expect(SyntaxKind::UsingKw, "expected `using`");
        if self.at(SyntaxKind::StaticKw) {
            self.bump();
        }
        self.parse_name();
        self.expect(SyntaxKind::Semicolon, "expected `;` after using directive");
        self.builder.finish_node();
    }

    fn parse_namespace_decl(&mut self) {
        self.builder
            .start_node(SyntaxKind::NamespaceDeclaration.into());
        self.expect(SyntaxKind::NamespaceKw, "expected `namespace`");
        self.parse_name();
        self.expect(SyntaxKind::LBrace, "expected `{` after namespace name");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::NamespaceKw) {
                self.parse_namespace_decl();
            } else if self.at_type_decl_start() {
                self.parse_type_declaration();
            } else {
                self.recover_in_braces("expected type declaration in namespace");
            }
        }
        self.expect(SyntaxKind::RBrace, "expected `}` to close namespace");
        self.builder.finish_node();
    }

    fn parse_type_declaration(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.parse_modifiers();
        self.parse_type_declaration_inner(checkpoint);
    }

    fn parse_type_declaration_inner(&mut self, checkpoint: rowan::Checkpoint) {
        let kind = match self.current() {
            SyntaxKind::ClassKw => SyntaxKind::ClassDeclaration,
            SyntaxKind::StructKw => SyntaxKind::StructDeclaration,
            SyntaxKind::InterfaceKw => SyntaxKind::InterfaceDeclaration,
            _ => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::Error.into());
                self.error_here("expected type declaration");
                self.recover_to(&[
                    SyntaxKind::ClassKw,
                    SyntaxKind::StructKw,
                    SyntaxKind::InterfaceKw,
                    SyntaxKind::NamespaceKw,
                    SyntaxKind::RBrace,
                    SyntaxKind::Eof,
                ]);
                self.builder.finish_node();
                return;
            }
        };

        self.builder.start_node_at(checkpoint, kind.into());
        self.bump(); // class/struct/interface
        self.expect_ident_like("expected type name");
        if self.at(SyntaxKind::Less) {
            self.parse_type_parameter_list();
        }
        if self.at(SyntaxKind::Colon) {
            self.bump();
            self.parse_type();
            while self.at(SyntaxKind::Comma) {
                self.bump();
                self.parse_type();
            }
        }
        while self.at(SyntaxKind::WhereKw) {
            // Constraint clauses are consumed loosely; nothing downstream
            // inspects them.
            self.bump();
            self.expect_ident_like("expected type parameter name");
            self.expect(SyntaxKind::Colon, "expected `:` in constraint clause");
            self.parse_type();
            while self.at(SyntaxKind::Comma) {
                self.bump();
                self.parse_type();
            }
        }
        self.parse_type_body();
        self.builder.finish_node();
    }

    fn parse_type_body(&mut self) {
        self.builder.start_node(SyntaxKind::TypeBody.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.parse_member();
        }
        self.expect(SyntaxKind::RBrace, "expected `}`");
        self.builder.finish_node();
    }

    fn parse_member(&mut self) {
        // Stray semicolons are legal between members.
        if self.at(SyntaxKind::Semicolon) {
            self.bump();
            return;
        }

        let checkpoint = self.builder.checkpoint();
        self.parse_modifiers();

        // Nested types.
        if matches!(
            self.current(),
            SyntaxKind::ClassKw | SyntaxKind::StructKw | SyntaxKind::InterfaceKw
        ) {
            self.parse_type_declaration_inner(checkpoint);
            return;
        }

        // Constructor: `Name(...)`.
        if self.at_ident_like() && self.nth(1) == Some(SyntaxKind::LParen) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ConstructorDeclaration.into());
            self.bump(); // name
            self.parse_parameter_list();
            if self.at(SyntaxKind::Colon) {
                // `: this(...)` / `: base(...)`.
                self.bump();
                if self.at(SyntaxKind::ThisKw) || self.at(SyntaxKind::BaseKw) {
                    self.bump();
                } else {
                    self.error_here("expected `this` or `base` in constructor initializer");
                }
                if self.at(SyntaxKind::LParen) {
                    self.parse_argument_list();
                }
            }
            self.parse_function_body();
            self.builder.finish_node();
            return;
        }

        if self.at_type_start() || self.at(SyntaxKind::VoidKw) {
            self.parse_type();
            if !self.at_ident_like() {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::Error.into());
                self.error_here("expected member name");
                self.recover_to_member_boundary();
                self.builder.finish_node();
                return;
            }

            match self.nth(1) {
                Some(SyntaxKind::LParen) | Some(SyntaxKind::Less) => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::MethodDeclaration.into());
                    self.bump(); // name
                    if self.at(SyntaxKind::Less) {
                        self.parse_type_parameter_list();
                    }
                    self.parse_parameter_list();
                    while self.at(SyntaxKind::WhereKw) {
                        self.bump();
                        self.expect_ident_like("expected type parameter name");
                        self.expect(SyntaxKind::Colon, "expected `:` in constraint clause");
                        self.parse_type();
                        while self.at(SyntaxKind::Comma) {
                            self.bump();
                            self.parse_type();
                        }
                    }
                    self.parse_function_body();
                    self.builder.finish_node();
                }
                Some(SyntaxKind::LBrace) | Some(SyntaxKind::Arrow) => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::PropertyDeclaration.into());
                    self.bump(); // name
                    if self.at(SyntaxKind::LBrace) {
                        self.parse_accessor_list();
                        // Auto-property initializer: `{ get; set; } = expr;`
                        if self.at(SyntaxKind::Eq) {
                            self.bump();
                            self.parse_expression(0);
                            self.expect(SyntaxKind::Semicolon, "expected `;` after property initializer");
                        }
                    } else {
                        // Expression-bodied property.
                        self.bump(); // =>
                        self.parse_expression(0);
                        self.expect(SyntaxKind::Semicolon, "expected `;` after expression body");
                    }
                    self.builder.finish_node();
                }
                _ => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::FieldDeclaration.into());
                    self.parse_variable_declarator_list();
                    self.expect(SyntaxKind::Semicolon, "expected `;` after field declaration");
                    self.builder.finish_node();
                }
            }
            return;
        }

        self.builder
            .start_node_at(checkpoint, SyntaxKind::Error.into());
        self.error_here("unexpected token in type body");
        self.recover_to_member_boundary();
        self.builder.finish_node();
    }

    fn parse_accessor_list(&mut self) {
        self.builder.start_node(SyntaxKind::AccessorList.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.builder.start_node(SyntaxKind::Accessor.into());
            self.parse_modifiers();
            if self.at(SyntaxKind::GetKw) || self.at(SyntaxKind::SetKw) {
                self.bump();
            } else {
                self.error_here("expected `get` or `set`");
                self.bump_any();
            }
            if self.at(SyntaxKind::LBrace) {
                self.parse_block();
            } else if self.at(SyntaxKind::Arrow) {
                self.bump();
                self.parse_expression(0);
                self.expect(SyntaxKind::Semicolon, "expected `;` after accessor body");
            } else {
                self.expect(SyntaxKind::Semicolon, "expected `;`, `{` or `=>` after accessor");
            }
            self.builder.finish_node();
        }
        self.expect(SyntaxKind::RBrace, "expected `}`");
        self.builder.finish_node();
    }

    /// Method/constructor/local-function body: block, `=> expr;`, or `;`.
    fn parse_function_body(&mut self) {
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else if self.at(SyntaxKind::Arrow) {
            self.bump();
            self.parse_expression(0);
            self.expect(SyntaxKind::Semicolon, "expected `;` after expression body");
        } else {
            self.expect(SyntaxKind::Semicolon, "expected method body or `;`");
        }
    }

    fn parse_modifiers(&mut self) {
        self.builder.start_node(SyntaxKind::Modifiers.into());
        loop {
            self.eat_trivia();
            match self.current() {
                SyntaxKind::PublicKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::InternalKw
                | SyntaxKind::StaticKw
                | SyntaxKind::AbstractKw
                | SyntaxKind::SealedKw
                | SyntaxKind::VirtualKw
                | SyntaxKind::OverrideKw
                | SyntaxKind::ReadonlyKw
                | SyntaxKind::UnsafeKw
                | SyntaxKind::VolatileKw
                | SyntaxKind::ConstKw => {
                    self.bump();
                }
                // `async`/`partial` are contextual: they are modifiers only
                // when more declaration follows.
                SyntaxKind::AsyncKw | SyntaxKind::PartialKw
                    if self
                        .nth(1)
                        .is_some_and(|k| k.is_identifier_like() || k.is_predefined_type()
                            || k == SyntaxKind::VoidKw
                            || matches!(k, SyntaxKind::ClassKw | SyntaxKind::StructKw | SyntaxKind::InterfaceKw)) =>
                {
                    self.bump();
                }
                _ => break,
            }
        }
        self.builder.finish_node();
    }

    fn parse_name(&mut self) {
        self.builder.start_node(SyntaxKind::Name.into());
        self.expect_ident_like("expected name");
        while self.at(SyntaxKind::Dot)
            && self.nth(1).is_some_and(|k| k.is_identifier_like())
        {
            self.bump(); // .
            self.expect_ident_like("expected name segment");
        }
        self.builder.finish_node();
    }

    fn parse_type_parameter_list(&mut self) {
        self.builder
            .start_node(SyntaxKind::TypeParameterList.into());
        self.expect(SyntaxKind::Less, "expected `<`");
        while !matches!(self.current(), SyntaxKind::Greater | SyntaxKind::Eof) {
            self.builder.start_node(SyntaxKind::TypeParameter.into());
            self.expect_ident_like("expected type parameter name");
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::Greater, "expected `>`");
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        self.builder.start_node(SyntaxKind::ParameterList.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.builder.start_node(SyntaxKind::Parameter.into());
            while matches!(
                self.current(),
                SyntaxKind::RefKw
                    | SyntaxKind::OutKw
                    | SyntaxKind::InKw
                    | SyntaxKind::ParamsKw
                    | SyntaxKind::ThisKw
            ) {
                self.bump();
            }
            if self.at_type_start() {
                self.parse_type();
            } else {
                self.error_here("expected parameter type");
            }
            self.expect_ident_like("expected parameter name");
            if self.at(SyntaxKind::Eq) {
                self.bump();
                self.parse_expression(2);
            }
            self.builder.finish_node();

            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::RParen, "expected `)`");
        self.builder.finish_node();
    }

    fn parse_argument_list(&mut self) {
        self.builder.start_node(SyntaxKind::ArgumentList.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.parse_argument();
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::RParen, "expected `)`");
        self.builder.finish_node();
    }

    fn parse_argument(&mut self) {
        self.builder.start_node(SyntaxKind::Argument.into());
        let has_modifier = matches!(
            self.current(),
            SyntaxKind::RefKw | SyntaxKind::OutKw | SyntaxKind::InKw
        );
        if has_modifier {
            self.bump();
        }
        // `out int x` / `out var x` declaration arguments.
        if has_modifier && self.at_declaration_argument() {
            self.builder
                .start_node(SyntaxKind::DeclarationPattern.into());
            self.parse_type();
            self.expect_ident_like("expected declared argument name");
            self.builder.finish_node();
        } else {
            self.parse_expression(2);
        }
        self.builder.finish_node();
    }

    fn at_declaration_argument(&mut self) -> bool {
        let i = skip_trivia(&self.tokens, 0);
        let Some(first) = self.tokens.get(i).map(|t| t.kind) else {
            return false;
        };
        if !(first.is_identifier_like() || first.is_predefined_type()) {
            return false;
        }
        let j = skip_trivia(&self.tokens, i + 1);
        if !self
            .tokens
            .get(j)
            .is_some_and(|t| t.kind.is_identifier_like())
        {
            return false;
        }
        let k = skip_trivia(&self.tokens, j + 1);
        matches!(
            self.tokens.get(k).map(|t| t.kind),
            Some(SyntaxKind::Comma) | Some(SyntaxKind::RParen)
        )
    }

    fn parse_block(&mut self) {
        self.builder.start_node(SyntaxKind::Block.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            self.parse_statement();
        }
        self.expect(SyntaxKind::RBrace, "expected `}`");
        self.builder.finish_node();
    }

    fn parse_statement(&mut self) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();
        match self.current() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::IfKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::IfStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `if`");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_statement();
                if self.at(SyntaxKind::ElseKw) {
                    self.bump();
                    self.parse_statement();
                }
                self.builder.finish_node();
            }
            SyntaxKind::SwitchKw => self.parse_switch_statement(checkpoint),
            SyntaxKind::ForKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ForStatement.into());
                self.bump();
                self.builder.start_node(SyntaxKind::ForHeader.into());
                self.expect(SyntaxKind::LParen, "expected `(` after `for`");
                self.parse_for_header_contents();
                self.expect(SyntaxKind::RParen, "expected `)` after for header");
                self.builder.finish_node(); // ForHeader
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::ForeachKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ForeachStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `foreach`");
                self.parse_type();
                self.expect_ident_like("expected iteration variable name");
                self.expect(SyntaxKind::InKw, "expected `in` in foreach");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::WhileKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::WhileStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `while`");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::DoKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::DoWhileStatement.into());
                self.bump();
                self.parse_statement();
                self.expect(SyntaxKind::WhileKw, "expected `while` after `do` body");
                self.expect(SyntaxKind::LParen, "expected `(` after `while`");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.expect(SyntaxKind::Semicolon, "expected `;` after do-while");
                self.builder.finish_node();
            }
            SyntaxKind::TryKw => self.parse_try_statement(checkpoint),
            SyntaxKind::UsingKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::UsingStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `using`");
                if self.at_local_var_decl_start() {
                    self.parse_type();
                    self.parse_variable_declarator_list();
                } else {
                    self.parse_expression(0);
                }
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::LockKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::LockStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `lock`");
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::CheckedKw | SyntaxKind::UncheckedKw
                if self.nth(1) == Some(SyntaxKind::LBrace) =>
            {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::CheckedStatement.into());
                self.bump();
                self.parse_block();
                self.builder.finish_node();
            }
            SyntaxKind::UnsafeKw if self.nth(1) == Some(SyntaxKind::LBrace) => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::UnsafeStatement.into());
                self.bump();
                self.parse_block();
                self.builder.finish_node();
            }
            SyntaxKind::FixedKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::FixedStatement.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `fixed`");
                if self.at_local_var_decl_start() {
                    self.parse_type();
                    self.parse_variable_declarator_list();
                } else {
                    self.parse_expression(0);
                }
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.parse_statement();
                self.builder.finish_node();
            }
            SyntaxKind::ReturnKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ReturnStatement.into());
                self.bump();
                if !self.at(SyntaxKind::Semicolon) {
                    self.parse_expression(0);
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after `return`");
                self.builder.finish_node();
            }
            SyntaxKind::YieldKw
                if matches!(
                    self.nth(1),
                    Some(SyntaxKind::ReturnKw) | Some(SyntaxKind::BreakKw)
                ) =>
            {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::YieldStatement.into());
                self.bump(); // yield
                let is_return = self.at(SyntaxKind::ReturnKw);
                self.bump(); // return/break
                if is_return {
                    self.parse_expression(0);
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after yield statement");
                self.builder.finish_node();
            }
            SyntaxKind::BreakKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::BreakStatement.into());
                self.bump();
                self.expect(SyntaxKind::Semicolon, "expected `;` after `break`");
                self.builder.finish_node();
            }
            SyntaxKind::ContinueKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ContinueStatement.into());
                self.bump();
                self.expect(SyntaxKind::Semicolon, "expected `;` after `continue`");
                self.builder.finish_node();
            }
            SyntaxKind::ThrowKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ThrowStatement.into());
                self.bump();
                // Bare `throw;` is a rethrow.
                if !self.at(SyntaxKind::Semicolon) {
                    self.parse_expression(0);
                }
                self.expect(SyntaxKind::Semicolon, "expected `;` after `throw`");
                self.builder.finish_node();
            }
            SyntaxKind::Semicolon => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::EmptyStatement.into());
                self.bump();
                self.builder.finish_node();
            }
            _ => {
                if self.at_local_function_start() {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::LocalFunctionStatement.into());
                    self.parse_modifiers();
                    self.parse_type();
                    self.expect_ident_like("expected local function name");
                    if self.at(SyntaxKind::Less) {
                        self.parse_type_parameter_list();
                    }
                    self.parse_parameter_list();
                    self.parse_function_body();
                    self.builder.finish_node();
                } else if self.at_local_var_decl_start() {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::LocalDeclarationStatement.into());
                    if self.at(SyntaxKind::ConstKw) {
                        self.bump();
                    }
                    self.parse_type();
                    self.parse_variable_declarator_list();
                    self.expect(
                        SyntaxKind::Semicolon,
                        "expected `;` after local variable declaration",
                    );
                    self.builder.finish_node();
                } else {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ExpressionStatement.into());
                    self.parse_expression(0);
                    self.expect(SyntaxKind::Semicolon, "expected `;` after expression");
                    self.builder.finish_node();
                }
            }
        }
    }

    fn parse_switch_statement(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::SwitchStatement.into());
        self.expect(SyntaxKind::SwitchKw, "expected `switch`");
        self.expect(SyntaxKind::LParen, "expected `(` after `switch`");
        self.parse_expression(0);
        self.expect(SyntaxKind::RParen, "expected `)` after switch expression");
        self.expect(SyntaxKind::LBrace, "expected `{` after switch");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::CaseKw) || self.at(SyntaxKind::DefaultKw) {
                self.builder.start_node(SyntaxKind::SwitchSection.into());
                while self.at(SyntaxKind::CaseKw) || self.at(SyntaxKind::DefaultKw) {
                    self.parse_switch_label();
                }
                while !matches!(
                    self.current(),
                    SyntaxKind::CaseKw
                        | SyntaxKind::DefaultKw
                        | SyntaxKind::RBrace
                        | SyntaxKind::Eof
                ) {
                    self.parse_statement();
                }
                self.builder.finish_node();
            } else {
                self.error_here("expected `case` or `default` label");
                self.bump_any();
            }
        }
        self.expect(SyntaxKind::RBrace, "expected `}` after switch body");
        self.builder.finish_node();
    }

    fn parse_switch_label(&mut self) {
        self.builder.start_node(SyntaxKind::SwitchLabel.into());
        let is_case = self.at(SyntaxKind::CaseKw);
        self.bump(); // case/default
        if is_case {
            if !self.at(SyntaxKind::Colon) {
                self.parse_expression(0);
            } else {
                self.error_here("expected case label expression");
            }
        }
        self.expect(SyntaxKind::Colon, "expected `:` after switch label");
        self.builder.finish_node();
    }

    fn parse_try_statement(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::TryStatement.into());
        self.expect(SyntaxKind::TryKw, "expected `try`");
        self.parse_block();
        while self.at(SyntaxKind::CatchKw) {
            self.builder.start_node(SyntaxKind::CatchClause.into());
            self.bump();
            if self.at(SyntaxKind::LParen) {
                self.bump();
                self.parse_type();
                if self.at_ident_like() {
                    self.bump();
                }
                self.expect(SyntaxKind::RParen, "expected `)` after catch declaration");
            }
            self.parse_block();
            self.builder.finish_node();
        }
        if self.at(SyntaxKind::FinallyKw) {
            self.builder.start_node(SyntaxKind::FinallyClause.into());
            self.bump();
            self.parse_block();
            self.builder.finish_node();
        }
        self.builder.finish_node();
    }

    fn parse_for_header_contents(&mut self) {
        if self.at_local_var_decl_start() {
            self.parse_type();
            self.parse_variable_declarator_list();
        } else if !self.at(SyntaxKind::Semicolon) {
            self.parse_expression(0);
            while self.at(SyntaxKind::Comma) {
                self.bump();
                self.parse_expression(0);
            }
        }
        self.expect(SyntaxKind::Semicolon, "expected `;` in for header");
        if !self.at(SyntaxKind::Semicolon) {
            self.parse_expression(0);
        }
        self.expect(SyntaxKind::Semicolon, "expected `;` in for header");
        if !self.at(SyntaxKind::RParen) {
            self.parse_expression(0);
            while self.at(SyntaxKind::Comma) {
                self.bump();
                self.parse_expression(0);
            }
        }
    }

    fn parse_variable_declarator_list(&mut self) {
        self.builder
            .start_node(SyntaxKind::VariableDeclaratorList.into());
        self.parse_variable_declarator();
        while self.at(SyntaxKind::Comma) {
            self.bump();
            self.parse_variable_declarator();
        }
        self.builder.finish_node();
    }

    fn parse_variable_declarator(&mut self) {
        self.builder
            .start_node(SyntaxKind::VariableDeclarator.into());
        self.expect_ident_like("expected variable name");
        if self.at(SyntaxKind::Eq) {
            self.bump();
            if self.at(SyntaxKind::Semicolon) || self.at(SyntaxKind::Comma) {
                self.error_here("expected initializer expression");
            } else if self.at(SyntaxKind::LBrace) {
                // Bare array initializer: `int[] xs = { 1, 2 };`
                self.parse_initializer_expression();
            } else {
                self.parse_expression(2);
            }
        }
        self.builder.finish_node();
    }

    fn parse_type(&mut self) {
        self.builder.start_node(SyntaxKind::Type.into());
        self.eat_trivia();
        if self.at(SyntaxKind::RefKw) {
            self.bump();
            if self.at(SyntaxKind::ReadonlyKw) {
                self.bump();
            }
        }
        if self.at(SyntaxKind::VoidKw) || self.at_predefined_type() {
            self.builder.start_node(SyntaxKind::PredefinedType.into());
            self.bump();
            self.builder.finish_node();
        } else if self.at(SyntaxKind::LParen) {
            self.parse_tuple_type();
        } else {
            self.builder.start_node(SyntaxKind::NamedType.into());
            self.expect_ident_like("expected type name");
            while self.at(SyntaxKind::Dot)
                && self.nth(1).is_some_and(|k| k.is_identifier_like())
            {
                self.bump();
                self.expect_ident_like("expected type name segment");
            }
            if self.at(SyntaxKind::Less) {
                self.parse_type_argument_list();
            }
            self.builder.finish_node();
        }
        // Nullable annotation; only when it cannot be a conditional operator.
        if self.at(SyntaxKind::Question)
            && self.nth(1).is_some_and(|k| {
                k.is_identifier_like()
                    || matches!(
                        k,
                        SyntaxKind::Greater
                            | SyntaxKind::Comma
                            | SyntaxKind::RParen
                            | SyntaxKind::RBracket
                            | SyntaxKind::LBracket
                    )
            })
        {
            self.bump();
        }
        // Array rank specifiers: `[]`, `[,]`, ...
        while self.at(SyntaxKind::LBracket) && self.rank_specifier_len().is_some() {
            let len = self.rank_specifier_len().unwrap();
            for _ in 0..len {
                self.bump();
            }
        }
        self.builder.finish_node();
    }

    /// Number of tokens in a leading array rank specifier (`[` `,`* `]`), if
    /// the upcoming tokens form one.
    fn rank_specifier_len(&mut self) -> Option<usize> {
        let mut i = skip_trivia(&self.tokens, 0);
        if self.tokens.get(i).map(|t| t.kind) != Some(SyntaxKind::LBracket) {
            return None;
        }
        let mut count = 1;
        i = skip_trivia(&self.tokens, i + 1);
        while self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::Comma) {
            count += 1;
            i = skip_trivia(&self.tokens, i + 1);
        }
        if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::RBracket) {
            Some(count + 1)
        } else {
            None
        }
    }

    fn parse_tuple_type(&mut self) {
        self.builder.start_node(SyntaxKind::TupleType.into());
        self.expect(SyntaxKind::LParen, "expected `(`");
        while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
            self.parse_type();
            // Optional element name.
            if self.at_ident_like() {
                self.bump();
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::RParen, "expected `)` in tuple type");
        self.builder.finish_node();
    }

    fn parse_type_argument_list(&mut self) {
        self.builder
            .start_node(SyntaxKind::TypeArgumentList.into());
        self.expect(SyntaxKind::Less, "expected `<`");
        while !matches!(
            self.current(),
            SyntaxKind::Greater | SyntaxKind::RightShift | SyntaxKind::Eof
        ) {
            self.builder.start_node(SyntaxKind::TypeArgument.into());
            self.parse_type();
            self.builder.finish_node();
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect_gt();
        self.builder.finish_node();
    }

    fn expect_gt(&mut self) {
        self.eat_trivia();
        match self.current() {
            SyntaxKind::Greater => {
                self.bump();
            }
            SyntaxKind::RightShift => {
                self.split_shift_as_greater();
                self.bump();
            }
            _ => {
                self.error_here("expected `>`");
            }
        }
    }

    fn split_shift_as_greater(&mut self) {
        let tok = match self.tokens.pop_front() {
            Some(tok) => tok,
            None => return,
        };
        if tok.kind != SyntaxKind::RightShift {
            self.tokens.push_front(tok);
            return;
        }
        let start = tok.range.start;
        let end = tok.range.end;
        self.tokens.push_front(Token {
            kind: SyntaxKind::Greater,
            range: TextRange {
                start: start + 1,
                end,
            },
        });
        self.tokens.push_front(Token {
            kind: SyntaxKind::Greater,
            range: TextRange {
                start,
                end: start + 1,
            },
        });
    }

    fn parse_expression(&mut self, min_bp: u8) {
        self.eat_trivia();
        let checkpoint = self.builder.checkpoint();

        // Prefix / primary.
        match self.current() {
            SyntaxKind::IntLiteral
            | SyntaxKind::LongLiteral
            | SyntaxKind::RealLiteral
            | SyntaxKind::CharLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::TrueKw
            | SyntaxKind::FalseKw
            | SyntaxKind::NullKw
            | SyntaxKind::DefaultKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::LiteralExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::TypeofKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::LiteralExpression.into());
                self.bump();
                self.expect(SyntaxKind::LParen, "expected `(` after `typeof`");
                self.parse_type();
                self.expect(SyntaxKind::RParen, "expected `)` after `typeof` operand");
                self.builder.finish_node();
            }
            SyntaxKind::ThisKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ThisExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::BaseKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::BaseExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::AwaitKw if self.nth(1).is_some_and(can_start_expression) => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::AwaitExpression.into());
                self.bump();
                self.parse_expression(100);
                self.builder.finish_node();
            }
            SyntaxKind::NewKw => self.parse_creation_expression(checkpoint),
            SyntaxKind::StackallocKw => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::StackAllocExpression.into());
                self.bump();
                self.parse_type();
                if self.at(SyntaxKind::LBracket) {
                    self.bump();
                    if !self.at(SyntaxKind::RBracket) {
                        self.parse_expression(0);
                    }
                    self.expect(SyntaxKind::RBracket, "expected `]` after stackalloc size");
                }
                if self.at(SyntaxKind::LBrace) {
                    self.parse_initializer_expression();
                }
                self.builder.finish_node();
            }
            SyntaxKind::CheckedKw | SyntaxKind::UncheckedKw
                if self.nth(1) == Some(SyntaxKind::LParen) =>
            {
                // `checked(expr)` / `unchecked(expr)`.
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ParenthesizedExpression.into());
                self.bump();
                self.bump(); // (
                self.parse_expression(0);
                self.expect(SyntaxKind::RParen, "expected `)`");
                self.builder.finish_node();
            }
            SyntaxKind::Plus
            | SyntaxKind::Minus
            | SyntaxKind::Bang
            | SyntaxKind::Tilde
            | SyntaxKind::PlusPlus
            | SyntaxKind::MinusMinus => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::UnaryExpression.into());
                self.bump();
                self.parse_expression(100);
                self.builder.finish_node();
            }
            kind if kind.is_identifier_like() => {
                if self.nth(1) == Some(SyntaxKind::Arrow) {
                    self.parse_lambda_expression(checkpoint);
                } else {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::NameExpression.into());
                    self.bump();
                    self.builder.finish_node();
                }
            }
            kind if kind.is_predefined_type() => {
                // Predefined type as member-access receiver: `int.Parse(...)`.
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::NameExpression.into());
                self.bump();
                self.builder.finish_node();
            }
            SyntaxKind::LParen => {
                if self.is_lambda_paren() {
                    self.parse_lambda_expression(checkpoint);
                } else if self.is_cast_expression() {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::CastExpression.into());
                    self.bump();
                    self.parse_type();
                    self.expect(SyntaxKind::RParen, "expected `)` in cast");
                    self.parse_expression(100);
                    self.builder.finish_node();
                } else {
                    // Parenthesized or tuple expression. Tuple elements may be
                    // declarations (`(var x, int y) = ...` deconstruction).
                    self.bump();
                    self.parse_tuple_element();
                    if self.at(SyntaxKind::Comma) {
                        self.builder
                            .start_node_at(checkpoint, SyntaxKind::TupleExpression.into());
                        while self.at(SyntaxKind::Comma) {
                            self.bump();
                            self.parse_tuple_element();
                        }
                        self.expect(SyntaxKind::RParen, "expected `)` after tuple expression");
                        self.builder.finish_node();
                    } else {
                        self.builder.start_node_at(
                            checkpoint,
                            SyntaxKind::ParenthesizedExpression.into(),
                        );
                        self.expect(SyntaxKind::RParen, "expected `)`");
                        self.builder.finish_node();
                    }
                }
            }
            _ => {
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::Error.into());
                self.error_here("expected expression");
                if !self.at(SyntaxKind::Eof) {
                    self.bump_any();
                }
                self.builder.finish_node();
            }
        }

        loop {
            self.eat_trivia();
            let op = self.current();

            // Postfix: call, member access, element access, ++/--.
            match op {
                SyntaxKind::LParen => {
                    if min_bp > 120 {
                        break;
                    }
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::InvocationExpression.into());
                    self.parse_argument_list();
                    self.builder.finish_node();
                    continue;
                }
                SyntaxKind::Dot => {
                    if min_bp > 120 {
                        break;
                    }
                    if self.nth(1).is_some_and(|k| k.is_identifier_like()) {
                        self.builder
                            .start_node_at(checkpoint, SyntaxKind::MemberAccessExpression.into());
                        self.bump(); // .
                        self.bump(); // name
                        self.builder.finish_node();
                        continue;
                    }
                    break;
                }
                SyntaxKind::LBracket => {
                    if min_bp > 120 {
                        break;
                    }
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ElementAccessExpression.into());
                    self.bump();
                    if !self.at(SyntaxKind::RBracket) {
                        self.parse_expression(0);
                        while self.at(SyntaxKind::Comma) {
                            self.bump();
                            self.parse_expression(0);
                        }
                    }
                    self.expect(SyntaxKind::RBracket, "expected `]`");
                    self.builder.finish_node();
                    continue;
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    if min_bp > 120 {
                        break;
                    }
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::UnaryExpression.into());
                    self.bump();
                    self.builder.finish_node();
                    continue;
                }
                _ => {}
            }

            // `is` patterns get a dedicated node so the selection validator
            // can recognize them.
            if op == SyntaxKind::IsKw {
                let (l_bp, _r_bp) = (50, 51);
                if l_bp < min_bp {
                    break;
                }
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::IsPatternExpression.into());
                self.bump(); // is
                self.builder
                    .start_node(SyntaxKind::DeclarationPattern.into());
                self.parse_type();
                if self.at_ident_like() {
                    self.bump(); // designation
                }
                self.builder.finish_node();
                self.builder.finish_node();
                continue;
            }

            if op == SyntaxKind::AsKw {
                let (l_bp, _r_bp) = (50, 51);
                if l_bp < min_bp {
                    break;
                }
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::BinaryExpression.into());
                self.bump(); // as
                self.parse_type();
                self.builder.finish_node();
                continue;
            }

            if let Some((l_bp, r_bp, expr_kind)) = infix_binding_power(op) {
                if l_bp < min_bp {
                    break;
                }
                self.builder.start_node_at(checkpoint, expr_kind.into());
                self.bump();
                self.parse_expression(r_bp);
                self.builder.finish_node();
                continue;
            }

            // Conditional.
            if op == SyntaxKind::Question {
                let (l_bp, r_bp) = (4, 3);
                if l_bp < min_bp {
                    break;
                }
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ConditionalExpression.into());
                self.bump(); // ?
                self.parse_expression(0);
                self.expect(SyntaxKind::Colon, "expected `:` in conditional expression");
                self.parse_expression(r_bp);
                self.builder.finish_node();
                continue;
            }

            break;
        }
    }

    fn parse_creation_expression(&mut self, checkpoint: rowan::Checkpoint) {
        // `new[] { ... }` — implicitly typed array.
        if self.nth(1) == Some(SyntaxKind::LBracket)
            && self.nth(2) == Some(SyntaxKind::RBracket)
        {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ArrayCreationExpression.into());
            self.bump(); // new
            self.bump(); // [
            self.bump(); // ]
            if self.at(SyntaxKind::LBrace) {
                self.parse_initializer_expression();
            } else {
                self.error_here("expected array initializer");
            }
            self.builder.finish_node();
            return;
        }

        // Any `[` in the type section makes this an array creation; decide
        // before opening the node since green nodes cannot be retagged.
        let kind = if self.creation_is_array() {
            SyntaxKind::ArrayCreationExpression
        } else {
            SyntaxKind::ObjectCreationExpression
        };
        self.builder.start_node_at(checkpoint, kind.into());
        self.bump(); // new
        self.parse_type();
        if self.at(SyntaxKind::LBracket) {
            // `new T[expr]` — explicit dimensions.
            self.bump();
            if !self.at(SyntaxKind::RBracket) {
                self.parse_expression(0);
                while self.at(SyntaxKind::Comma) {
                    self.bump();
                    self.parse_expression(0);
                }
            }
            self.expect(SyntaxKind::RBracket, "expected `]` after array dimensions");
        } else if kind == SyntaxKind::ObjectCreationExpression && self.at(SyntaxKind::LParen) {
            self.parse_argument_list();
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_initializer_expression();
        }
        self.builder.finish_node();
    }

    /// After `new`, does a `[` appear within the element-type token run?
    fn creation_is_array(&mut self) -> bool {
        let mut i = skip_trivia(&self.tokens, 0);
        debug_assert_eq!(self.tokens.get(i).map(|t| t.kind), Some(SyntaxKind::NewKw));
        i = skip_trivia(&self.tokens, i + 1);
        while let Some(tok) = self.tokens.get(i) {
            match tok.kind {
                kind if kind.is_trivia() => {}
                SyntaxKind::Less => {
                    i = skip_type_arguments(&self.tokens, i);
                    continue;
                }
                SyntaxKind::LBracket => return true,
                kind if kind.is_identifier_like() || kind.is_predefined_type() => {}
                SyntaxKind::Dot | SyntaxKind::Question => {}
                _ => return false,
            }
            i += 1;
        }
        false
    }

    /// One element of a parenthesized/tuple expression: either a declaration
    /// (`var x` / `int y`, used by deconstruction targets) or an expression.
    fn parse_tuple_element(&mut self) {
        if self.at_declaration_argument() {
            self.builder
                .start_node(SyntaxKind::DeclarationPattern.into());
            self.parse_type();
            self.expect_ident_like("expected declared element name");
            self.builder.finish_node();
        } else {
            self.parse_expression(0);
        }
    }

    fn parse_initializer_expression(&mut self) {
        self.builder
            .start_node(SyntaxKind::InitializerExpression.into());
        self.expect(SyntaxKind::LBrace, "expected `{`");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            if self.at(SyntaxKind::LBrace) {
                self.parse_initializer_expression();
            } else {
                self.parse_expression(2);
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        self.expect(SyntaxKind::RBrace, "expected `}` to close initializer");
        self.builder.finish_node();
    }

    fn parse_lambda_expression(&mut self, checkpoint: rowan::Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::LambdaExpression.into());
        if self.at(SyntaxKind::LParen) {
            self.bump();
            while !self.at(SyntaxKind::RParen) && !self.at(SyntaxKind::Eof) {
                if self.at_ident_like() || self.at(SyntaxKind::Comma) {
                    self.bump();
                } else if self.at_type_start() {
                    // Typed lambda parameter.
                    self.parse_type();
                } else {
                    self.bump_any();
                }
            }
            self.expect(SyntaxKind::RParen, "expected `)` in lambda parameters");
        } else {
            self.expect_ident_like("expected lambda parameter");
        }
        self.expect(SyntaxKind::Arrow, "expected `=>` in lambda");
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.parse_expression(2);
        }
        self.builder.finish_node();
    }

    fn is_lambda_paren(&mut self) -> bool {
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        let mut depth = 0usize;
        let mut i = 0usize;
        while let Some(tok) = self.tokens.get(i) {
            let kind = tok.kind;
            if kind.is_trivia() {
                i += 1;
                continue;
            }
            if kind == SyntaxKind::LParen {
                depth += 1;
            } else if kind == SyntaxKind::RParen {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let mut j = i + 1;
                    while let Some(next) = self.tokens.get(j) {
                        if next.kind.is_trivia() {
                            j += 1;
                            continue;
                        }
                        return next.kind == SyntaxKind::Arrow;
                    }
                    return false;
                }
            }
            i += 1;
        }
        false
    }

    fn is_cast_expression(&mut self) -> bool {
        // `(Type) expr` where the parenthesized run looks like a type and an
        // expression follows the `)`.
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        let mut i = skip_trivia(&self.tokens, 1);
        let Some(first) = self.tokens.get(i).map(|t| t.kind) else {
            return false;
        };
        if !(first.is_identifier_like() || first.is_predefined_type()) {
            return false;
        }
        while let Some(tok) = self.tokens.get(i) {
            if tok.kind.is_trivia() {
                i += 1;
                continue;
            }
            match tok.kind {
                SyntaxKind::RParen => {
                    let mut j = i + 1;
                    while let Some(next) = self.tokens.get(j) {
                        if next.kind.is_trivia() {
                            j += 1;
                            continue;
                        }
                        // `(x) - y` is arithmetic, not a cast; only accept
                        // operand starts that cannot continue a binary
                        // expression.
                        return can_start_expression(next.kind)
                            && !matches!(
                                next.kind,
                                SyntaxKind::Plus | SyntaxKind::Minus
                            );
                    }
                    return false;
                }
                // Tokens that can appear inside a type.
                kind if kind.is_identifier_like() || kind.is_predefined_type() => {}
                SyntaxKind::Dot
                | SyntaxKind::Less
                | SyntaxKind::Greater
                | SyntaxKind::Comma
                | SyntaxKind::Question
                | SyntaxKind::LBracket
                | SyntaxKind::RBracket => {}
                _ => return false,
            }
            i += 1;
        }
        false
    }

    /// Token-level lookahead: does a local variable declaration start here?
    fn at_local_var_decl_start(&mut self) -> bool {
        let mut i = skip_trivia(&self.tokens, 0);

        if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::ConstKw) {
            return true;
        }
        if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::RefKw) {
            i = skip_trivia(&self.tokens, i + 1);
        }

        let Some(first) = self.tokens.get(i).map(|t| t.kind) else {
            return false;
        };

        // `await x` / `yield ...` must never be read as a declaration whose
        // type is the contextual keyword.
        if matches!(first, SyntaxKind::AwaitKw | SyntaxKind::YieldKw) {
            return false;
        }

        if first == SyntaxKind::VarKw {
            let j = skip_trivia(&self.tokens, i + 1);
            return self
                .tokens
                .get(j)
                .is_some_and(|t| t.kind.is_identifier_like());
        }

        if first.is_predefined_type() {
            i += 1;
        } else if first.is_identifier_like() {
            i += 1;
            // Qualified name.
            loop {
                let dot = skip_trivia(&self.tokens, i);
                if self.tokens.get(dot).map(|t| t.kind) != Some(SyntaxKind::Dot) {
                    i = dot;
                    break;
                }
                let seg = skip_trivia(&self.tokens, dot + 1);
                if !self
                    .tokens
                    .get(seg)
                    .is_some_and(|t| t.kind.is_identifier_like())
                {
                    i = dot;
                    break;
                }
                i = seg + 1;
            }

            i = skip_trivia(&self.tokens, i);
            if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::Less) {
                i = skip_type_arguments(&self.tokens, i);
            }
        } else {
            return false;
        }

        // Optional `?`.
        let q = skip_trivia(&self.tokens, i);
        if self.tokens.get(q).map(|t| t.kind) == Some(SyntaxKind::Question) {
            i = q + 1;
        }

        // Array ranks: `[` `,`* `]`.
        loop {
            let j = skip_trivia(&self.tokens, i);
            if self.tokens.get(j).map(|t| t.kind) != Some(SyntaxKind::LBracket) {
                i = j;
                break;
            }
            let mut k = skip_trivia(&self.tokens, j + 1);
            while self.tokens.get(k).map(|t| t.kind) == Some(SyntaxKind::Comma) {
                k = skip_trivia(&self.tokens, k + 1);
            }
            if self.tokens.get(k).map(|t| t.kind) != Some(SyntaxKind::RBracket) {
                i = j;
                break;
            }
            i = k + 1;
        }

        i = skip_trivia(&self.tokens, i);
        self.tokens
            .get(i)
            .is_some_and(|t| t.kind.is_identifier_like())
    }

    /// Local function: `[modifiers] Type Name (` or `[modifiers] Type Name <`.
    fn at_local_function_start(&mut self) -> bool {
        let mut i = skip_trivia(&self.tokens, 0);

        loop {
            match self.tokens.get(i).map(|t| t.kind) {
                Some(SyntaxKind::StaticKw) | Some(SyntaxKind::AsyncKw) | Some(SyntaxKind::UnsafeKw) => {
                    i = skip_trivia(&self.tokens, i + 1);
                }
                _ => break,
            }
        }

        let Some(first) = self.tokens.get(i).map(|t| t.kind) else {
            return false;
        };

        if matches!(first, SyntaxKind::AwaitKw | SyntaxKind::YieldKw) {
            return false;
        }

        if first == SyntaxKind::VoidKw {
            i = skip_trivia(&self.tokens, i + 1);
        } else if first.is_predefined_type() {
            i = skip_trivia(&self.tokens, i + 1);
            if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::Question) {
                i = skip_trivia(&self.tokens, i + 1);
            }
        } else if first.is_identifier_like() && first != SyntaxKind::VarKw {
            i = skip_trivia(&self.tokens, i + 1);
            loop {
                if self.tokens.get(i).map(|t| t.kind) != Some(SyntaxKind::Dot) {
                    break;
                }
                let seg = skip_trivia(&self.tokens, i + 1);
                if !self
                    .tokens
                    .get(seg)
                    .is_some_and(|t| t.kind.is_identifier_like())
                {
                    return false;
                }
                i = skip_trivia(&self.tokens, seg + 1);
            }
            if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::Less) {
                i = skip_trivia(&self.tokens, skip_type_arguments(&self.tokens, i));
            }
            if self.tokens.get(i).map(|t| t.kind) == Some(SyntaxKind::Question) {
                i = skip_trivia(&self.tokens, i + 1);
            }
        } else {
            return false;
        }

        if !self
            .tokens
            .get(i)
            .is_some_and(|t| t.kind.is_identifier_like())
        {
            return false;
        }
        i = skip_trivia(&self.tokens, i + 1);
        matches!(
            self.tokens.get(i).map(|t| t.kind),
            Some(SyntaxKind::LParen) | Some(SyntaxKind::Less)
        )
    }

    fn at_type_decl_start(&mut self) -> bool {
        let mut i = skip_trivia(&self.tokens, 0);
        loop {
            match self.tokens.get(i).map(|t| t.kind) {
                Some(
                    SyntaxKind::PublicKw
                    | SyntaxKind::PrivateKw
                    | SyntaxKind::ProtectedKw
                    | SyntaxKind::InternalKw
                    | SyntaxKind::StaticKw
                    | SyntaxKind::AbstractKw
                    | SyntaxKind::SealedKw
                    | SyntaxKind::PartialKw
                    | SyntaxKind::UnsafeKw
                    | SyntaxKind::ReadonlyKw,
                ) => {
                    i = skip_trivia(&self.tokens, i + 1);
                }
                Some(SyntaxKind::ClassKw | SyntaxKind::StructKw | SyntaxKind::InterfaceKw) => {
                    return true
                }
                _ => return false,
            }
        }
    }

    fn at_type_start(&mut self) -> bool {
        self.at_predefined_type()
            || self.at_ident_like()
            || self.at(SyntaxKind::RefKw)
            || self.at(SyntaxKind::LParen)
    }

    fn at_predefined_type(&mut self) -> bool {
        self.current().is_predefined_type()
    }

    fn recover_in_braces(&mut self, message: &str) {
        self.builder.start_node(SyntaxKind::Error.into());
        self.error_here(message);
        self.recover_to(&[
            SyntaxKind::NamespaceKw,
            SyntaxKind::ClassKw,
            SyntaxKind::StructKw,
            SyntaxKind::InterfaceKw,
            SyntaxKind::RBrace,
            SyntaxKind::Eof,
        ]);
        self.builder.finish_node();
    }

    fn recover_to_member_boundary(&mut self) {
        self.recover_to(&[
            SyntaxKind::Semicolon,
            SyntaxKind::RBrace,
            SyntaxKind::ClassKw,
            SyntaxKind::StructKw,
            SyntaxKind::InterfaceKw,
            SyntaxKind::PublicKw,
            SyntaxKind::PrivateKw,
            SyntaxKind::ProtectedKw,
            SyntaxKind::InternalKw,
            SyntaxKind::StaticKw,
        ]);
        if self.at(SyntaxKind::Semicolon) {
            self.bump();
        }
    }

    fn recover_to(&mut self, recovery: &[SyntaxKind]) {
        while !self.at(SyntaxKind::Eof) {
            if recovery.contains(&self.current()) {
                break;
            }
            self.bump_any();
        }
    }

    fn current(&mut self) -> SyntaxKind {
        self.eat_trivia();
        self.tokens
            .front()
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::Eof)
    }

    fn nth(&mut self, n: usize) -> Option<SyntaxKind> {
        let mut idx = 0usize;
        let mut remaining = n;
        while let Some(tok) = self.tokens.get(idx) {
            if tok.kind.is_trivia() {
                idx += 1;
                continue;
            }
            if remaining == 0 {
                return Some(tok.kind);
            }
            remaining -= 1;
            idx += 1;
        }
        None
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_ident_like(&mut self) -> bool {
        self.current().is_identifier_like()
    }

    fn eat_trivia(&mut self) {
        while self.tokens.front().is_some_and(|t| t.kind.is_trivia()) {
            self.bump_any();
        }
    }

    fn bump(&mut self) {
        self.eat_trivia();
        self.bump_any();
    }

    fn bump_any(&mut self) {
        if let Some(tok) = self.tokens.pop_front() {
            let text = tok.text(self.input);
            self.builder.token(tok.kind.into(), text);
        }
    }

    fn expect(&mut self, kind: SyntaxKind, message: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error_here(message);
            false
        }
    }

    fn expect_ident_like(&mut self, message: &str) {
        if self.at_ident_like() {
            self.bump();
        } else {
            self.error_here(message);
        }
    }

    fn error_here(&mut self, message: &str) {
        let range = self.current_range();
        self.errors.push(ParseError {
            message: message.to_string(),
            range,
        });
    }

    fn current_range(&mut self) -> TextRange {
        self.eat_trivia();
        self.tokens.front().map(|t| t.range).unwrap_or_else(|| {
            let end = self.input.len() as u32;
            TextRange { start: end, end }
        })
    }
}

fn skip_trivia(tokens: &VecDeque<Token>, mut idx: usize) -> usize {
    while tokens.get(idx).is_some_and(|t| t.kind.is_trivia()) {
        idx += 1;
    }
    idx
}

fn skip_type_arguments(tokens: &VecDeque<Token>, mut idx: usize) -> usize {
    // Assumes `tokens[idx]` is `<`; shallow token-level matching.
    let mut depth: i32 = 0;
    while let Some(tok) = tokens.get(idx) {
        if tok.kind.is_trivia() {
            idx += 1;
            continue;
        }
        match tok.kind {
            SyntaxKind::Less => depth += 1,
            SyntaxKind::Greater => depth -= 1,
            SyntaxKind::RightShift => depth -= 2,
            SyntaxKind::Eof => break,
            _ => {}
        }
        idx += 1;
        if depth <= 0 {
            break;
        }
    }
    idx
}

fn can_start_expression(kind: SyntaxKind) -> bool {
    kind.is_identifier_like()
        || kind.is_predefined_type()
        || matches!(
            kind,
            SyntaxKind::ThisKw
                | SyntaxKind::BaseKw
                | SyntaxKind::NewKw
                | SyntaxKind::LParen
                | SyntaxKind::IntLiteral
                | SyntaxKind::LongLiteral
                | SyntaxKind::RealLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
                | SyntaxKind::NullKw
                | SyntaxKind::DefaultKw
                | SyntaxKind::TypeofKw
                | SyntaxKind::StackallocKw
                | SyntaxKind::Plus
                | SyntaxKind::Minus
                | SyntaxKind::Bang
                | SyntaxKind::Tilde
                | SyntaxKind::PlusPlus
                | SyntaxKind::MinusMinus
        )
}

fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8, SyntaxKind)> {
    // Returns (left_bp, right_bp, node_kind). Larger = tighter binding.
    let (l, r, kind) = match op {
        SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => {
            (70, 71, SyntaxKind::BinaryExpression)
        }
        SyntaxKind::Plus | SyntaxKind::Minus => (60, 61, SyntaxKind::BinaryExpression),
        SyntaxKind::LeftShift | SyntaxKind::RightShift => (55, 56, SyntaxKind::BinaryExpression),
        SyntaxKind::Less | SyntaxKind::LessEq | SyntaxKind::Greater | SyntaxKind::GreaterEq => {
            (50, 51, SyntaxKind::BinaryExpression)
        }
        SyntaxKind::EqEq | SyntaxKind::BangEq => (45, 46, SyntaxKind::BinaryExpression),
        SyntaxKind::Amp => (40, 41, SyntaxKind::BinaryExpression),
        SyntaxKind::Caret => (39, 40, SyntaxKind::BinaryExpression),
        SyntaxKind::Pipe => (38, 39, SyntaxKind::BinaryExpression),
        SyntaxKind::AmpAmp => (30, 31, SyntaxKind::BinaryExpression),
        SyntaxKind::PipePipe => (20, 21, SyntaxKind::BinaryExpression),
        // Null-coalescing (right-associative).
        SyntaxKind::QuestionQuestion => (16, 15, SyntaxKind::BinaryExpression),

        // Assignment (right-associative).
        SyntaxKind::Eq
        | SyntaxKind::PlusEq
        | SyntaxKind::MinusEq
        | SyntaxKind::StarEq
        | SyntaxKind::SlashEq
        | SyntaxKind::PercentEq
        | SyntaxKind::AmpEq
        | SyntaxKind::PipeEq
        | SyntaxKind::CaretEq
        | SyntaxKind::LeftShiftEq
        | SyntaxKind::RightShiftEq => (1, 0, SyntaxKind::AssignmentExpression),

        _ => return None,
    };
    Some((l, r, kind))
}

// --- debug helpers used by tests ---

#[cfg(test)]
pub fn debug_dump(node: &SyntaxNode) -> String {
    fn go(node: &SyntaxNode, indent: usize, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{:indent$}{:?}", "", node.kind(), indent = indent);
        for child in node.children_with_tokens() {
            match child {
                NodeOrToken::Node(n) => go(&n, indent + 2, out),
                NodeOrToken::Token(t) => {
                    let _ = writeln!(
                        out,
                        "{:indent$}{:?} {:?}",
                        "",
                        t.kind(),
                        t.text(),
                        indent = indent + 2
                    );
                }
            }
        }
    }

    let mut out = String::new();
    go(node, 0, &mut out);
    out
}
