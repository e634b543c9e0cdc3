use crate::parser::SyntaxNode;
use crate::syntax_kind::SyntaxKind;

pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(syntax: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

pub mod support {
    use crate::ast::AstNode;
    use crate::parser::{SyntaxNode, SyntaxToken};
    use crate::syntax_kind::SyntaxKind;

    pub fn child<N: AstNode>(node: &SyntaxNode) -> Option<N> {
        node.children().find_map(N::cast)
    }

    pub fn nth_child<N: AstNode>(node: &SyntaxNode, n: usize) -> Option<N> {
        node.children().filter_map(N::cast).nth(n)
    }

    pub fn children<'a, N: AstNode + 'a>(node: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
        node.children().filter_map(N::cast)
    }

    pub fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| tok.kind() == kind)
    }

    pub fn tokens<'a>(
        node: &'a SyntaxNode,
        kind: SyntaxKind,
    ) -> impl Iterator<Item = SyntaxToken> + 'a {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(move |tok| tok.kind() == kind)
    }

    /// The declared-name token among the node's direct children.
    ///
    /// C# has contextual keywords (`var`, `get`, `value`, ...) which the
    /// lexer classifies as dedicated kinds; all of them can be identifiers.
    /// In Quarry's tree shapes the *last* identifier-like direct child is the
    /// declared name (any type portion lives inside a child `Type` node).
    pub fn ident_token(node: &SyntaxNode) -> Option<SyntaxToken> {
        ident_tokens(node).last()
    }

    pub fn first_ident_token(node: &SyntaxNode) -> Option<SyntaxToken> {
        ident_tokens(node).next()
    }

    pub fn ident_tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> + '_ {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|tok| tok.kind().is_identifier_like())
    }
}

mod nodes;

pub use nodes::*;

mod ext;

#[cfg(test)]
mod tests;
