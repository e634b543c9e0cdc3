//! Trivia preservation across the extraction cut.
//!
//! The engine rewrites by text splicing, so trivia ownership is decided by
//! *where the cut ranges land* rather than by re-attaching token trivia
//! lists: everything strictly before the selection's first token stays with
//! the call site, everything strictly after its last token stays with the
//! following code, and everything between the boundary tokens travels into
//! the extracted method verbatim. This module computes those boundaries
//! once, records what each cut edge owns, and answers slicing queries for
//! the code generator; the saved result is consulted during the rewrite and
//! then discarded.

use crate::edit::TextRange;
use crate::extract_method::selection::Selection;

/// The four cut edges around the selection span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanEdge {
    BeforeBeginningOfSpan,
    AfterBeginningOfSpan,
    BeforeEndOfSpan,
    AfterEndOfSpan,
}

/// Who ends up owning the trivia adjacent to a cut edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaOwner {
    CallSite,
    ExtractedMethod,
}

/// Saved trivia decisions for one extraction. Created before any text is
/// rearranged; consumed by codegen and the rewriter; discarded afterwards.
#[derive(Debug, Clone)]
pub struct TriviaSavedResult {
    /// Range replaced at the call site.
    pub call_site_range: TextRange,
    /// Range whose text becomes the extracted method body (trivia-complete:
    /// interior comments and directives ride along).
    pub extract_range: TextRange,
    /// Blank lines dropped from the start of the moved text (they belong to
    /// the call site's vertical spacing, not to the new method).
    pub leading_blank_lines: usize,
    /// Blank lines dropped from the end of the moved text.
    pub trailing_blank_lines: usize,
}

impl TriviaSavedResult {
    /// Which side owns trivia at each edge, under the text-splicing model.
    pub fn owner(&self, edge: SpanEdge) -> TriviaOwner {
        match edge {
            SpanEdge::BeforeBeginningOfSpan | SpanEdge::AfterEndOfSpan => TriviaOwner::CallSite,
            SpanEdge::AfterBeginningOfSpan | SpanEdge::BeforeEndOfSpan => {
                TriviaOwner::ExtractedMethod
            }
        }
    }

    /// The text that moves into the extracted method, with edge blank lines
    /// stripped (interior blank lines are preserved untouched).
    pub fn body_text<'a>(&self, source: &'a str) -> &'a str {
        let slice = &source[self.extract_range.start..self.extract_range.end];
        slice.trim_matches(|c| c == '\n' || c == '\r')
    }
}

/// Snapshot trivia ownership around the selection.
///
/// The selection's `final_range` is token-aligned, so comments *inside* the
/// user's raw span but before the first token (or after the last) naturally
/// stay at the call site; comments between the boundary tokens are part of
/// the extracted range. A raw span that began or ended on blank lines has
/// those counted so the rewriter can keep the call site's vertical rhythm.
pub fn preserve(source: &str, selection: &Selection) -> TriviaSavedResult {
    let mut call_site_range = selection.final_range;

    // Comments the user selected ahead of the first token were written
    // against the first statement; they move with it. Whitespace between the
    // raw start and the first comment stays where it is.
    let raw_start = selection.original_range.start.min(source.len());
    let boundary = call_site_range.start.min(source.len()).max(raw_start);
    let prefix = &source[raw_start..boundary];
    let leading_blank_lines = count_blank_lines(prefix);
    let first_comment = prefix
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(idx, _)| raw_start + idx);
    if let Some(comment_start) = first_comment {
        call_site_range.start = comment_start;
    }

    let raw_end = selection.original_range.end.min(source.len());
    let suffix_start = call_site_range.end.min(raw_end);
    let suffix = &source[suffix_start..raw_end];
    let trailing_blank_lines = count_blank_lines(suffix);

    TriviaSavedResult {
        call_site_range,
        extract_range: call_site_range,
        leading_blank_lines,
        trailing_blank_lines,
    }
}

fn count_blank_lines(text: &str) -> usize {
    text.lines().filter(|line| line.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_counting() {
        assert_eq!(count_blank_lines(""), 0);
        assert_eq!(count_blank_lines("\n\n"), 2);
        assert_eq!(count_blank_lines("  \n\t\n"), 2);
        assert_eq!(count_blank_lines("x\n\n"), 1);
    }
}
