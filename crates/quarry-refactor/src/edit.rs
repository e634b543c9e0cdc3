use std::collections::BTreeMap;

use thiserror::Error;

/// Identifier for a workspace file.
///
/// In a full host integration this would be an interned id or a URI; a plain
/// path string keeps the refactoring surface self-contained.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

/// A half-open text range `[start, end)` in UTF-8 byte offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid range: {start}..{end}");
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// A single file edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub file: FileId,
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn insert(file: FileId, offset: usize, text: impl Into<String>) -> Self {
        Self {
            file,
            range: TextRange::new(offset, offset),
            replacement: text.into(),
        }
    }

    pub fn replace(file: FileId, range: TextRange, text: impl Into<String>) -> Self {
        Self {
            file,
            range,
            replacement: text.into(),
        }
    }

    pub fn delete(file: FileId, range: TextRange) -> Self {
        Self {
            file,
            range,
            replacement: String::new(),
        }
    }
}

/// A set of edits across potentially multiple files.
///
/// Edits must be normalized (sorted, deduplicated, non-overlapping) before
/// application; [`WorkspaceEdit::normalize`] establishes that and reports
/// conflicts instead of guessing an order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkspaceEdit {
    pub edits: Vec<TextEdit>,
}

impl WorkspaceEdit {
    pub fn new(edits: Vec<TextEdit>) -> Self {
        Self { edits }
    }

    /// Edits grouped by file, each group ordered by position.
    pub fn edits_by_file(&self) -> BTreeMap<&FileId, Vec<&TextEdit>> {
        let mut map: BTreeMap<&FileId, Vec<&TextEdit>> = BTreeMap::new();
        for edit in &self.edits {
            map.entry(&edit.file).or_default().push(edit);
        }
        for edits in map.values_mut() {
            edits.sort_by(|a, b| {
                (a.range.start, a.range.end, a.replacement.as_str())
                    .cmp(&(b.range.start, b.range.end, b.replacement.as_str()))
            });
        }
        map
    }

    /// Sort, deduplicate, merge same-position inserts, and reject overlaps.
    pub fn normalize(&mut self) -> Result<(), EditError> {
        self.edits.sort_by(|a, b| {
            (&a.file, a.range.start, a.range.end, a.replacement.as_str())
                .cmp(&(&b.file, b.range.start, b.range.end, b.replacement.as_str()))
        });
        self.edits.dedup();

        let mut merged: Vec<TextEdit> = Vec::with_capacity(self.edits.len());
        for edit in self.edits.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.file == edit.file && last.range == edit.range {
                    if last.range.is_empty() {
                        // Same-position inserts concatenate in sorted order.
                        last.replacement.push_str(&edit.replacement);
                        continue;
                    }
                    return Err(EditError::OverlappingEdits {
                        file: edit.file,
                        first: last.range,
                        second: edit.range,
                    });
                }
            }
            merged.push(edit);
        }
        self.edits = merged;

        let mut prev: Option<(&FileId, TextRange)> = None;
        for edit in &self.edits {
            if let Some((prev_file, prev_range)) = prev {
                if prev_file == &edit.file && edit.range.start < prev_range.end {
                    return Err(EditError::OverlappingEdits {
                        file: edit.file.clone(),
                        first: prev_range,
                        second: edit.range,
                    });
                }
            }
            prev = Some((&edit.file, edit.range));
        }

        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("overlapping edits in {file:?}: {first:?} overlaps {second:?}")]
    OverlappingEdits {
        file: FileId,
        first: TextRange,
        second: TextRange,
    },
    #[error("text edit range {range:?} is outside the file bounds (len={len}) in {file:?}")]
    OutOfBounds {
        file: FileId,
        range: TextRange,
        len: usize,
    },
    #[error("edit refers to unknown file {0:?}")]
    UnknownFile(FileId),
}

/// Apply non-overlapping edits to `original` and return the modified text.
pub fn apply_text_edits(original: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(original.to_string());
    }

    let mut sorted = edits.to_vec();
    // Apply back-to-front so earlier offsets stay valid.
    sorted.sort_by(|a, b| {
        (b.range.start, b.range.end, b.replacement.as_str())
            .cmp(&(a.range.start, a.range.end, a.replacement.as_str()))
    });

    let mut out = original.to_string();
    for edit in sorted {
        if edit.range.end > out.len() {
            return Err(EditError::OutOfBounds {
                file: edit.file,
                range: edit.range,
                len: out.len(),
            });
        }
        out.replace_range(edit.range.start..edit.range.end, &edit.replacement);
    }

    Ok(out)
}

/// Apply a workspace edit to a set of file contents.
pub fn apply_workspace_edit(
    files: &BTreeMap<FileId, String>,
    edit: &WorkspaceEdit,
) -> Result<BTreeMap<FileId, String>, EditError> {
    let mut out = files.clone();
    for (file, edits) in edit.edits_by_file() {
        let original = out
            .get(file)
            .ok_or_else(|| EditError::UnknownFile(file.clone()))?;
        let owned: Vec<TextEdit> = edits.into_iter().cloned().collect();
        let new_text = apply_text_edits(original, &owned)?;
        out.insert(file.clone(), new_text);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileId {
        FileId::new("a.cs")
    }

    #[test]
    fn normalize_rejects_overlap() {
        let mut edit = WorkspaceEdit::new(vec![
            TextEdit::replace(file(), TextRange::new(0, 4), "x"),
            TextEdit::replace(file(), TextRange::new(2, 6), "y"),
        ]);
        assert!(matches!(
            edit.normalize(),
            Err(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn normalize_merges_same_position_inserts() {
        let mut edit = WorkspaceEdit::new(vec![
            TextEdit::insert(file(), 3, "a"),
            TextEdit::insert(file(), 3, "b"),
        ]);
        edit.normalize().unwrap();
        assert_eq!(edit.edits.len(), 1);
        assert_eq!(edit.edits[0].replacement, "ab");
    }

    #[test]
    fn apply_is_order_independent() {
        let source = "0123456789";
        let edits = vec![
            TextEdit::replace(file(), TextRange::new(8, 9), "X"),
            TextEdit::replace(file(), TextRange::new(1, 3), "Y"),
        ];
        assert_eq!(apply_text_edits(source, &edits).unwrap(), "0Y34567X9");
    }

    #[test]
    fn apply_workspace_edit_only_touches_edited_files() {
        let mut files = BTreeMap::new();
        files.insert(file(), "hello".to_string());
        files.insert(FileId::new("b.cs"), "other".to_string());

        let edit = WorkspaceEdit::new(vec![TextEdit::replace(
            file(),
            TextRange::new(0, 5),
            "bye",
        )]);
        let out = apply_workspace_edit(&files, &edit).unwrap();
        assert_eq!(out.get(&file()).unwrap(), "bye");
        assert_eq!(out.get(&FileId::new("b.cs")).unwrap(), "other");
    }
}
