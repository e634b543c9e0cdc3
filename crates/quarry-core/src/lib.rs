//! Core shared types for Quarry.
//!
//! This crate is intentionally small and dependency-light: byte-offset spans,
//! interned-ish names, text-shape helpers, and a cooperative cancellation
//! token. Everything else lives in the crates that need it.

mod cancel;
mod text;

pub use cancel::{CancellationToken, Cancelled};
pub use text::{indentation_at, line_start_offset, reindent};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A half-open byte range `[start, end)` into a source buffer.
///
/// Spans always refer to the document snapshot they were computed against;
/// they are never adjusted across edits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "invalid span: {start}..{end}");
        Self { start, end }
    }

    #[inline]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Whether `self` lies entirely within `other`.
    #[inline]
    pub fn within(self, other: Span) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// Whether the two spans share at least one byte.
    #[inline]
    pub fn intersects(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// An identifier name.
///
/// Backed by `SmolStr` so short names (the overwhelmingly common case) are
/// stored inline without allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name(SmolStr);

impl Name {
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
