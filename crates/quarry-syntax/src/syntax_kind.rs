use rowan::Language;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Unified syntax kind for both tokens and AST nodes.
///
/// This enum is intentionally "fat": a stable set of kinds is a prerequisite
/// for typed AST wrappers and for the refactoring passes that match on node
/// shapes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- Trivia ---
    Whitespace,
    LineComment,
    BlockComment,
    DocComment,
    /// `#if` / `#elif` preprocessor line (whole line, one token).
    IfDirective,
    ElifDirective,
    ElseDirective,
    EndIfDirective,
    RegionDirective,
    EndRegionDirective,
    /// Any other `#...` line (`#pragma`, `#nullable`, `#define`, ...).
    OtherDirective,

    // --- Identifiers & literals ---
    Identifier,
    IntLiteral,
    LongLiteral,
    RealLiteral,
    CharLiteral,
    StringLiteral,

    // --- Keywords (reserved) ---
    AbstractKw,
    AsKw,
    BaseKw,
    BoolKw,
    BreakKw,
    ByteKw,
    CaseKw,
    CatchKw,
    CharKw,
    CheckedKw,
    ClassKw,
    ConstKw,
    ContinueKw,
    DecimalKw,
    DefaultKw,
    DoKw,
    DoubleKw,
    ElseKw,
    EnumKw,
    FinallyKw,
    FixedKw,
    FloatKw,
    ForKw,
    ForeachKw,
    GotoKw,
    IfKw,
    InKw,
    IntKw,
    InterfaceKw,
    InternalKw,
    IsKw,
    LockKw,
    LongKw,
    NamespaceKw,
    NewKw,
    ObjectKw,
    OutKw,
    OverrideKw,
    ParamsKw,
    PrivateKw,
    ProtectedKw,
    PublicKw,
    ReadonlyKw,
    RefKw,
    ReturnKw,
    SbyteKw,
    SealedKw,
    ShortKw,
    StackallocKw,
    StaticKw,
    StringKw,
    StructKw,
    SwitchKw,
    ThisKw,
    ThrowKw,
    TryKw,
    TypeofKw,
    UintKw,
    UlongKw,
    UncheckedKw,
    UnsafeKw,
    UshortKw,
    UsingKw,
    VirtualKw,
    VoidKw,
    VolatileKw,
    WhileKw,

    // Literal keywords.
    TrueKw,
    FalseKw,
    NullKw,

    // --- Contextual keywords ---
    VarKw,
    AsyncKw,
    AwaitKw,
    YieldKw,
    PartialKw,
    WhereKw,
    GetKw,
    SetKw,
    ValueKw,
    NameofKw,

    // --- Operators / punctuation ---
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Question,
    QuestionQuestion,
    Colon,
    /// `=>` (expression bodies, lambdas, switch arms).
    Arrow,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
    Bang,

    Eq,
    EqEq,
    BangEq,

    Less,
    LessEq,
    Greater,
    GreaterEq,

    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,

    PlusPlus,
    MinusMinus,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    LeftShift,
    RightShift,
    LeftShiftEq,
    RightShiftEq,

    // --- Special ---
    Error,
    Eof,

    // --- Nodes ---
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    Modifiers,
    Name,

    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    TypeBody,

    FieldDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    PropertyDeclaration,
    AccessorList,
    Accessor,
    ParameterList,
    Parameter,
    TypeParameterList,
    TypeParameter,

    GlobalStatement,

    Block,
    IfStatement,
    SwitchStatement,
    SwitchSection,
    SwitchLabel,
    ForStatement,
    ForHeader,
    ForeachStatement,
    WhileStatement,
    DoWhileStatement,
    TryStatement,
    CatchClause,
    FinallyClause,
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

    VariableDeclaratorList,
    VariableDeclarator,

    Type,
    PredefinedType,
    NamedType,
    TupleType,
    TypeArgumentList,
    TypeArgument,

    ArgumentList,
    Argument,

    // Expressions.
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
    DeclarationPattern,
    LambdaExpression,

    __Last,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace
                | SyntaxKind::LineComment
                | SyntaxKind::BlockComment
                | SyntaxKind::DocComment
        ) || self.is_directive_trivia()
    }

    pub fn is_directive_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::IfDirective
                | SyntaxKind::ElifDirective
                | SyntaxKind::ElseDirective
                | SyntaxKind::EndIfDirective
                | SyntaxKind::RegionDirective
                | SyntaxKind::EndRegionDirective
                | SyntaxKind::OtherDirective
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            SyntaxKind::LineComment | SyntaxKind::BlockComment | SyntaxKind::DocComment
        )
    }

    pub fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::VarKw
                | SyntaxKind::AsyncKw
                | SyntaxKind::AwaitKw
                | SyntaxKind::YieldKw
                | SyntaxKind::PartialKw
                | SyntaxKind::WhereKw
                | SyntaxKind::GetKw
                | SyntaxKind::SetKw
                | SyntaxKind::ValueKw
                | SyntaxKind::NameofKw
        )
    }

    pub fn is_identifier_like(self) -> bool {
        self == SyntaxKind::Identifier || self.is_contextual_keyword()
    }

    pub fn is_keyword(self) -> bool {
        (self >= SyntaxKind::AbstractKw && self <= SyntaxKind::NullKw)
            || self.is_contextual_keyword()
    }

    pub fn is_predefined_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::BoolKw
                | SyntaxKind::ByteKw
                | SyntaxKind::SbyteKw
                | SyntaxKind::ShortKw
                | SyntaxKind::UshortKw
                | SyntaxKind::IntKw
                | SyntaxKind::UintKw
                | SyntaxKind::LongKw
                | SyntaxKind::UlongKw
                | SyntaxKind::CharKw
                | SyntaxKind::FloatKw
                | SyntaxKind::DoubleKw
                | SyntaxKind::DecimalKw
                | SyntaxKind::StringKw
                | SyntaxKind::ObjectKw
        )
    }

    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            // Reserved keywords.
            "abstract" => SyntaxKind::AbstractKw,
            "as" => SyntaxKind::AsKw,
            "base" => SyntaxKind::BaseKw,
            "bool" => SyntaxKind::BoolKw,
            "break" => SyntaxKind::BreakKw,
            "byte" => SyntaxKind::ByteKw,
            "case" => SyntaxKind::CaseKw,
            "catch" => SyntaxKind::CatchKw,
            "char" => SyntaxKind::CharKw,
            "checked" => SyntaxKind::CheckedKw,
            "class" => SyntaxKind::ClassKw,
            "const" => SyntaxKind::ConstKw,
            "continue" => SyntaxKind::ContinueKw,
            "decimal" => SyntaxKind::DecimalKw,
            "default" => SyntaxKind::DefaultKw,
            "do" => SyntaxKind::DoKw,
            "double" => SyntaxKind::DoubleKw,
            "else" => SyntaxKind::ElseKw,
            "enum" => SyntaxKind::EnumKw,
            "finally" => SyntaxKind::FinallyKw,
            "fixed" => SyntaxKind::FixedKw,
            "float" => SyntaxKind::FloatKw,
            "for" => SyntaxKind::ForKw,
            "foreach" => SyntaxKind::ForeachKw,
            "goto" => SyntaxKind::GotoKw,
            "if" => SyntaxKind::IfKw,
            "in" => SyntaxKind::InKw,
            "int" => SyntaxKind::IntKw,
            "interface" => SyntaxKind::InterfaceKw,
            "internal" => SyntaxKind::InternalKw,
            "is" => SyntaxKind::IsKw,
            "lock" => SyntaxKind::LockKw,
            "long" => SyntaxKind::LongKw,
            "namespace" => SyntaxKind::NamespaceKw,
            "new" => SyntaxKind::NewKw,
            "object" => SyntaxKind::ObjectKw,
            "out" => SyntaxKind::OutKw,
            "override" => SyntaxKind::OverrideKw,
            "params" => SyntaxKind::ParamsKw,
            "private" => SyntaxKind::PrivateKw,
            "protected" => SyntaxKind::ProtectedKw,
            "public" => SyntaxKind::PublicKw,
            "readonly" => SyntaxKind::ReadonlyKw,
            "ref" => SyntaxKind::RefKw,
            "return" => SyntaxKind::ReturnKw,
            "sbyte" => SyntaxKind::SbyteKw,
            "sealed" => SyntaxKind::SealedKw,
            "short" => SyntaxKind::ShortKw,
            "stackalloc" => SyntaxKind::StackallocKw,
            "static" => SyntaxKind::StaticKw,
            "string" => SyntaxKind::StringKw,
            "struct" => SyntaxKind::StructKw,
            "switch" => SyntaxKind::SwitchKw,
            "this" => SyntaxKind::ThisKw,
            "throw" => SyntaxKind::ThrowKw,
            "try" => SyntaxKind::TryKw,
            "typeof" => SyntaxKind::TypeofKw,
            "uint" => SyntaxKind::UintKw,
            "ulong" => SyntaxKind::UlongKw,
            "unchecked" => SyntaxKind::UncheckedKw,
            "unsafe" => SyntaxKind::UnsafeKw,
            "ushort" => SyntaxKind::UshortKw,
            "using" => SyntaxKind::UsingKw,
            "virtual" => SyntaxKind::VirtualKw,
            "void" => SyntaxKind::VoidKw,
            "volatile" => SyntaxKind::VolatileKw,
            "while" => SyntaxKind::WhileKw,

            // Literal keywords.
            "true" => SyntaxKind::TrueKw,
            "false" => SyntaxKind::FalseKw,
            "null" => SyntaxKind::NullKw,

            // Contextual keywords.
            "var" => SyntaxKind::VarKw,
            "async" => SyntaxKind::AsyncKw,
            "await" => SyntaxKind::AwaitKw,
            "yield" => SyntaxKind::YieldKw,
            "partial" => SyntaxKind::PartialKw,
            "where" => SyntaxKind::WhereKw,
            "get" => SyntaxKind::GetKw,
            "set" => SyntaxKind::SetKw,
            "value" => SyntaxKind::ValueKw,
            "nameof" => SyntaxKind::NameofKw,

            _ => return None,
        })
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(value: SyntaxKind) -> Self {
        rowan::SyntaxKind(value as u16)
    }
}

/// Rowan language marker for C#.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CSharpLanguage {}

impl Language for CSharpLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        if raw.0 < SyntaxKind::__Last as u16 {
            // SAFETY: We've verified the numeric value is within the enum range.
            unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
        } else {
            SyntaxKind::Error
        }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}
