//! Typed wrappers over the raw syntax tree.
//!
//! One struct per node kind plus sum types for the open positions
//! (statements, expressions, members). The per-kind boilerplate is folded
//! into declarative macros; only the accessors are written out.

use crate::ast::{support, AstNode};
use crate::parser::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

macro_rules! ast_node {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$name
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                Self::can_cast(syntax.kind()).then_some(Self { syntax })
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

macro_rules! ast_enum {
    ($(#[$attr:meta])* $name:ident { $($variant:ident,)* }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            $($variant($variant),)*
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                $($variant::can_cast(kind))||*
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                let kind = syntax.kind();
                if !Self::can_cast(kind) {
                    return None;
                }
                $(
                    if let Some(it) = $variant::cast(syntax.clone()) {
                        return Some(Self::$variant(it));
                    }
                )*
                None
            }

            fn syntax(&self) -> &SyntaxNode {
                match self {
                    $(Self::$variant(it) => it.syntax(),)*
                }
            }
        }
    };
}

// --- Top level ---

ast_node!(CompilationUnit);
ast_node!(UsingDirective);
ast_node!(NamespaceDeclaration);
ast_node!(Modifiers);
ast_node!(Name);

ast_node!(ClassDeclaration);
ast_node!(StructDeclaration);
ast_node!(InterfaceDeclaration);
ast_node!(TypeBody);

ast_node!(FieldDeclaration);
ast_node!(MethodDeclaration);
ast_node!(ConstructorDeclaration);
ast_node!(PropertyDeclaration);
ast_node!(AccessorList);
ast_node!(Accessor);
ast_node!(ParameterList);
ast_node!(Parameter);
ast_node!(TypeParameterList);
ast_node!(TypeParameter);

ast_node!(GlobalStatement);

// --- Statements ---

ast_node!(Block);
ast_node!(IfStatement);
ast_node!(SwitchStatement);
ast_node!(SwitchSection);
ast_node!(SwitchLabel);
ast_node!(ForStatement);
ast_node!(ForHeader);
ast_node!(ForeachStatement);
ast_node!(WhileStatement);
ast_node!(DoWhileStatement);
ast_node!(TryStatement);
ast_node!(CatchClause);
ast_node!(FinallyClause);
ast_node!(UsingStatement);
ast_node!(LockStatement);
ast_node!(CheckedStatement);
ast_node!(UnsafeStatement);
ast_node!(FixedStatement);
ast_node!(ReturnStatement);
ast_node!(YieldStatement);
ast_node!(BreakStatement);
ast_node!(ContinueStatement);
ast_node!(ThrowStatement);
ast_node!(LocalDeclarationStatement);
ast_node!(LocalFunctionStatement);
ast_node!(ExpressionStatement);
ast_node!(EmptyStatement);

ast_node!(VariableDeclaratorList);
ast_node!(VariableDeclarator);

// --- Types ---

ast_node!(Type);
ast_node!(PredefinedType);
ast_node!(NamedType);
ast_node!(TupleType);
ast_node!(TypeArgumentList);
ast_node!(TypeArgument);

ast_node!(ArgumentList);
ast_node!(Argument);

// --- Expressions ---

ast_node!(LiteralExpression);
ast_node!(NameExpression);
ast_node!(ThisExpression);
ast_node!(BaseExpression);
ast_node!(ParenthesizedExpression);
ast_node!(TupleExpression);
ast_node!(ObjectCreationExpression);
ast_node!(ArrayCreationExpression);
ast_node!(InitializerExpression);
ast_node!(StackAllocExpression);
ast_node!(InvocationExpression);
ast_node!(MemberAccessExpression);
ast_node!(ElementAccessExpression);
ast_node!(UnaryExpression);
ast_node!(BinaryExpression);
ast_node!(AssignmentExpression);
ast_node!(ConditionalExpression);
ast_node!(CastExpression);
ast_node!(AwaitExpression);
ast_node!(IsPatternExpression);
ast_node!(DeclarationPattern);
ast_node!(LambdaExpression);

ast_enum!(TypeDeclaration {
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
});

ast_enum!(Member {
    FieldDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    PropertyDeclaration,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
});

ast_enum!(Statement {
    Block,
    IfStatement,
    SwitchStatement,
    ForStatement,
    ForeachStatement,
    WhileStatement,
    DoWhileStatement,
    TryStatement,
    UsingStatement,
    LockStatement,
    CheckedStatement,
    UnsafeStatement,
    FixedStatement,
    ReturnStatement,
    YieldStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    LocalDeclarationStatement,
    LocalFunctionStatement,
    ExpressionStatement,
    EmptyStatement,
});

ast_enum!(Expression {
    LiteralExpression,
    NameExpression,
    ThisExpression,
    BaseExpression,
    ParenthesizedExpression,
    TupleExpression,
    ObjectCreationExpression,
    ArrayCreationExpression,
    InitializerExpression,
    StackAllocExpression,
    InvocationExpression,
    MemberAccessExpression,
    ElementAccessExpression,
    UnaryExpression,
    BinaryExpression,
    AssignmentExpression,
    ConditionalExpression,
    CastExpression,
    AwaitExpression,
    IsPatternExpression,
    LambdaExpression,
});

// --- Accessors ---

impl CompilationUnit {
    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> + '_ {
        support::children(&self.syntax)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceDeclaration> + '_ {
        support::children(&self.syntax)
    }

    pub fn type_declarations(&self) -> impl Iterator<Item = TypeDeclaration> + '_ {
        support::children(&self.syntax)
    }

    pub fn global_statements(&self) -> impl Iterator<Item = GlobalStatement> + '_ {
        support::children(&self.syntax)
    }
}

impl UsingDirective {
    pub fn name(&self) -> Option<Name> {
        support::child(&self.syntax)
    }
}

impl NamespaceDeclaration {
    pub fn name(&self) -> Option<Name> {
        support::child(&self.syntax)
    }

    pub fn type_declarations(&self) -> impl Iterator<Item = TypeDeclaration> + '_ {
        support::children(&self.syntax)
    }
}

impl Modifiers {
    pub fn has(&self, kind: SyntaxKind) -> bool {
        support::token(&self.syntax, kind).is_some()
    }
}

impl Name {
    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

macro_rules! type_decl_accessors {
    ($name:ident) => {
        impl $name {
            pub fn modifiers(&self) -> Option<Modifiers> {
                support::child(&self.syntax)
            }

            pub fn name_token(&self) -> Option<SyntaxToken> {
                support::first_ident_token(&self.syntax)
            }

            pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
                support::child(&self.syntax)
            }

            pub fn body(&self) -> Option<TypeBody> {
                support::child(&self.syntax)
            }
        }
    };
}

type_decl_accessors!(ClassDeclaration);
type_decl_accessors!(StructDeclaration);
type_decl_accessors!(InterfaceDeclaration);

impl TypeDeclaration {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(self.syntax())
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::first_ident_token(self.syntax())
    }

    pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
        support::child(self.syntax())
    }

    pub fn body(&self) -> Option<TypeBody> {
        support::child(self.syntax())
    }
}

impl TypeBody {
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        support::children(&self.syntax)
    }
}

impl FieldDeclaration {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn declarator_list(&self) -> Option<VariableDeclaratorList> {
        support::child(&self.syntax)
    }
}

impl MethodDeclaration {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    pub fn return_type(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
        support::child(&self.syntax)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        support::child(&self.syntax)
    }

    /// Expression body (`=> expr;`), if any.
    pub fn expression_body(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl ConstructorDeclaration {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::first_ident_token(&self.syntax)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        support::child(&self.syntax)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl PropertyDeclaration {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn accessor_list(&self) -> Option<AccessorList> {
        support::child(&self.syntax)
    }

    pub fn expression_body(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl AccessorList {
    pub fn accessors(&self) -> impl Iterator<Item = Accessor> + '_ {
        support::children(&self.syntax)
    }
}

impl Accessor {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::GetKw)
            .or_else(|| support::token(&self.syntax, SyntaxKind::SetKw))
    }

    pub fn body(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        support::children(&self.syntax)
    }
}

impl Parameter {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn ref_token(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::RefKw)
    }

    pub fn out_token(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::OutKw)
    }
}

impl TypeParameterList {
    pub fn type_parameters(&self) -> impl Iterator<Item = TypeParameter> + '_ {
        support::children(&self.syntax)
    }
}

impl TypeParameter {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }
}

impl GlobalStatement {
    pub fn statement(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        support::children(&self.syntax)
    }
}

impl IfStatement {
    pub fn condition(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn then_branch(&self) -> Option<Statement> {
        support::nth_child(&self.syntax, 0)
    }

    pub fn else_branch(&self) -> Option<Statement> {
        support::nth_child(&self.syntax, 1)
    }
}

impl SwitchStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn sections(&self) -> impl Iterator<Item = SwitchSection> + '_ {
        support::children(&self.syntax)
    }
}

impl SwitchSection {
    pub fn labels(&self) -> impl Iterator<Item = SwitchLabel> + '_ {
        support::children(&self.syntax)
    }

    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        support::children(&self.syntax)
    }
}

impl SwitchLabel {
    pub fn is_default(&self) -> bool {
        support::token(&self.syntax, SyntaxKind::DefaultKw).is_some()
    }

    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl ForStatement {
    pub fn header(&self) -> Option<ForHeader> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl ForHeader {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn declarator_list(&self) -> Option<VariableDeclaratorList> {
        support::child(&self.syntax)
    }
}

impl ForeachStatement {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl WhileStatement {
    pub fn condition(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl DoWhileStatement {
    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }

    pub fn condition(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl TryStatement {
    pub fn block(&self) -> Option<Block> {
        support::child(&self.syntax)
    }

    pub fn catch_clauses(&self) -> impl Iterator<Item = CatchClause> + '_ {
        support::children(&self.syntax)
    }

    pub fn finally_clause(&self) -> Option<FinallyClause> {
        support::child(&self.syntax)
    }
}

impl CatchClause {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn block(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl FinallyClause {
    pub fn block(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl UsingStatement {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn declarator_list(&self) -> Option<VariableDeclaratorList> {
        support::child(&self.syntax)
    }

    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl LockStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl CheckedStatement {
    /// The `checked` or `unchecked` keyword.
    pub fn keyword(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::CheckedKw)
            .or_else(|| support::token(&self.syntax, SyntaxKind::UncheckedKw))
    }

    pub fn block(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl UnsafeStatement {
    pub fn block(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl FixedStatement {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn declarator_list(&self) -> Option<VariableDeclaratorList> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Statement> {
        support::child(&self.syntax)
    }
}

impl ReturnStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl YieldStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl ThrowStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    /// `throw;` with no operand rethrows the in-flight exception.
    pub fn is_rethrow(&self) -> bool {
        self.expression().is_none()
    }
}

impl LocalDeclarationStatement {
    pub fn is_const(&self) -> bool {
        support::token(&self.syntax, SyntaxKind::ConstKw).is_some()
    }

    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn declarator_list(&self) -> Option<VariableDeclaratorList> {
        support::child(&self.syntax)
    }
}

impl LocalFunctionStatement {
    pub fn modifiers(&self) -> Option<Modifiers> {
        support::child(&self.syntax)
    }

    pub fn return_type(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }

    pub fn type_parameter_list(&self) -> Option<TypeParameterList> {
        support::child(&self.syntax)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        support::child(&self.syntax)
    }

    pub fn body(&self) -> Option<Block> {
        support::child(&self.syntax)
    }
}

impl ExpressionStatement {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl VariableDeclaratorList {
    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> + '_ {
        support::children(&self.syntax)
    }
}

impl VariableDeclarator {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::first_ident_token(&self.syntax)
    }

    pub fn initializer(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl Type {
    pub fn is_void(&self) -> bool {
        self.syntax
            .descendants_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|tok| tok.kind() == SyntaxKind::VoidKw)
    }

    pub fn is_var(&self) -> bool {
        support::child::<NamedType>(&self.syntax)
            .and_then(|n| support::first_ident_token(n.syntax()))
            .is_some_and(|tok| tok.kind() == SyntaxKind::VarKw)
    }
}

impl ArgumentList {
    pub fn arguments(&self) -> impl Iterator<Item = Argument> + '_ {
        support::children(&self.syntax)
    }
}

impl Argument {
    pub fn ref_token(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::RefKw)
    }

    pub fn out_token(&self) -> Option<SyntaxToken> {
        support::token(&self.syntax, SyntaxKind::OutKw)
    }

    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn declaration(&self) -> Option<DeclarationPattern> {
        support::child(&self.syntax)
    }
}

impl LiteralExpression {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| !tok.kind().is_trivia())
    }
}

impl NameExpression {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| tok.kind().is_identifier_like() || tok.kind().is_predefined_type())
    }
}

impl ParenthesizedExpression {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl TupleExpression {
    pub fn expressions(&self) -> impl Iterator<Item = Expression> + '_ {
        support::children(&self.syntax)
    }

    pub fn declarations(&self) -> impl Iterator<Item = DeclarationPattern> + '_ {
        support::children(&self.syntax)
    }
}

impl ObjectCreationExpression {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        support::child(&self.syntax)
    }

    pub fn initializer(&self) -> Option<InitializerExpression> {
        support::child(&self.syntax)
    }
}

impl ArrayCreationExpression {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn initializer(&self) -> Option<InitializerExpression> {
        support::child(&self.syntax)
    }
}

impl InitializerExpression {
    pub fn expressions(&self) -> impl Iterator<Item = Expression> + '_ {
        support::children(&self.syntax)
    }
}

impl StackAllocExpression {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }
}

impl InvocationExpression {
    pub fn callee(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        support::child(&self.syntax)
    }
}

impl MemberAccessExpression {
    pub fn receiver(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }
}

impl ElementAccessExpression {
    pub fn receiver(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 0)
    }

    pub fn indices(&self) -> impl Iterator<Item = Expression> + '_ {
        support::children::<Expression>(&self.syntax).skip(1)
    }
}

impl UnaryExpression {
    pub fn operand(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| !tok.kind().is_trivia())
    }
}

impl BinaryExpression {
    pub fn lhs(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 0)
    }

    pub fn rhs(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 1)
    }

    /// Right-hand type operand of an `as` expression.
    pub fn rhs_type(&self) -> Option<Type> {
        support::child(&self.syntax)
    }
}

impl AssignmentExpression {
    pub fn target(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 0)
    }

    pub fn value(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 1)
    }

    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| {
                matches!(
                    tok.kind(),
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
                        | SyntaxKind::RightShiftEq
                )
            })
    }

    /// The right-hand side of a simple `=` assignment, if this is one.
    pub fn simple_value(&self) -> Option<Expression> {
        if self.op_token()?.kind() == SyntaxKind::Eq {
            self.value()
        } else {
            None
        }
    }
}

impl ConditionalExpression {
    pub fn condition(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 0)
    }

    pub fn then_expr(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 1)
    }

    pub fn else_expr(&self) -> Option<Expression> {
        support::nth_child(&self.syntax, 2)
    }
}

impl CastExpression {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl AwaitExpression {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}

impl IsPatternExpression {
    pub fn expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }

    pub fn pattern(&self) -> Option<DeclarationPattern> {
        support::child(&self.syntax)
    }
}

impl DeclarationPattern {
    pub fn ty(&self) -> Option<Type> {
        support::child(&self.syntax)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        support::ident_token(&self.syntax)
    }
}

impl LambdaExpression {
    pub fn body_block(&self) -> Option<Block> {
        support::child(&self.syntax)
    }

    pub fn body_expression(&self) -> Option<Expression> {
        support::child(&self.syntax)
    }
}
