//! Hand-written AST helpers that need token-position awareness.

use crate::ast::{AstNode, Expression, ForHeader, VariableDeclaratorList, Type};
use crate::parser::SyntaxElement;
use crate::syntax_kind::SyntaxKind;

impl ForHeader {
    /// Everything between the two header semicolons: the loop condition.
    pub fn condition(&self) -> Option<Expression> {
        let mut semis = 0usize;
        for el in self.syntax().children_with_tokens() {
            match el {
                SyntaxElement::Token(tok) if tok.kind() == SyntaxKind::Semicolon => semis += 1,
                SyntaxElement::Node(node) if semis == 1 => {
                    if let Some(expr) = Expression::cast(node) {
                        return Some(expr);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Initializer expressions (classic `for (i = 0, j = n; ...)` form).
    pub fn init_expressions(&self) -> Vec<Expression> {
        self.section_expressions(0)
    }

    /// Update expressions after the second semicolon.
    pub fn update_expressions(&self) -> Vec<Expression> {
        self.section_expressions(2)
    }

    fn section_expressions(&self, section: usize) -> Vec<Expression> {
        let mut semis = 0usize;
        let mut out = Vec::new();
        for el in self.syntax().children_with_tokens() {
            match el {
                SyntaxElement::Token(tok) if tok.kind() == SyntaxKind::Semicolon => semis += 1,
                SyntaxElement::Node(node) if semis == section => {
                    if let Some(expr) = Expression::cast(node) {
                        out.push(expr);
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Whether the header declares its induction variables.
    pub fn has_declaration(&self) -> bool {
        self.ty().is_some() && self.declarator_list().is_some()
    }
}

impl Expression {
    /// Strip redundant parentheses.
    pub fn unparenthesized(&self) -> Expression {
        let mut current = self.clone();
        while let Expression::ParenthesizedExpression(paren) = &current {
            match paren.expression() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }
}

impl Type {
    /// Source text of the type with trivia-induced padding collapsed.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        for el in self.syntax().descendants_with_tokens() {
            if let SyntaxElement::Token(tok) = el {
                if tok.kind().is_trivia() {
                    continue;
                }
                let text = tok.text();
                let needs_space = out
                    .chars()
                    .next_back()
                    .is_some_and(|prev| prev.is_alphanumeric() || prev == '_' || prev == ',')
                    && text
                        .chars()
                        .next()
                        .is_some_and(|next| next.is_alphanumeric() || next == '_');
                if needs_space {
                    out.push(' ');
                }
                out.push_str(text);
            }
        }
        out
    }
}

impl VariableDeclaratorList {
    pub fn single_declarator(&self) -> Option<crate::ast::VariableDeclarator> {
        let mut iter = self.declarators();
        let first = iter.next()?;
        if iter.next().is_some() {
            return None;
        }
        Some(first)
    }
}
