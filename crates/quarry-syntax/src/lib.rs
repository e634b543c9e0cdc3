//! Syntax tree and parsing primitives for C# sources.
//!
//! The entry point is [`parse_csharp`], which produces a full-fidelity
//! rowan-based syntax tree: every byte of the input — including whitespace,
//! comments, and preprocessor directive lines — is present in the tree, so
//! refactorings can reason about trivia and splice text without losing user
//! formatting.
//!
//! The grammar is a deliberate subset of C#: the declaration and statement
//! forms the refactoring engine analyzes, parsed permissively. Feature-level
//! validation is not this crate's job; the tree records what was written.

pub mod ast;
mod lexer;
mod parser;
mod syntax_kind;

pub use ast::AstNode;
pub use lexer::{lex, lex_with_errors, LexError, Lexer, Token};
pub use parser::{parse_csharp, CSharpParseResult, SyntaxElement, SyntaxNode, SyntaxToken};
pub use syntax_kind::{CSharpLanguage, SyntaxKind};

use serde::{Deserialize, Serialize};

/// A half-open byte range within a source file (`start..end`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A single edit to a UTF-8 source buffer.
///
/// The edit uses byte offsets and applies `replacement` over `range`
/// (half-open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: u32, text: impl Into<String>) -> Self {
        Self::new(
            TextRange {
                start: offset,
                end: offset,
            },
            text,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

/// The smallest element of `root` covering `range`.
pub fn covering_element(root: &SyntaxNode, range: TextRange) -> SyntaxElement {
    root.covering_element(text_size::TextRange::new(
        text_size::TextSize::from(range.start),
        text_size::TextSize::from(range.end),
    ))
}

/// Byte range of a syntax node in its source document.
pub fn syntax_text_range(node: &SyntaxNode) -> TextRange {
    let range = node.text_range();
    TextRange {
        start: u32::from(range.start()),
        end: u32::from(range.end()),
    }
}

/// Byte range of a token in its source document.
pub fn token_text_range(token: &SyntaxToken) -> TextRange {
    let range = token.text_range();
    TextRange {
        start: u32::from(range.start()),
        end: u32::from(range.end()),
    }
}
