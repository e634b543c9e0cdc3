//! Refactoring engine for Quarry.
//!
//! The crate currently ships one refactoring — Extract Method — together
//! with the workspace-edit plumbing it produces its results in:
//! - [`extract_method`]: the full pipeline (selection validation, flow
//!   analysis, code generation, rewrite).
//! - [`edit`] types re-exported at the root: [`WorkspaceEdit`] and friends.

mod edit;

pub mod extract_method;

pub use edit::{
    apply_text_edits, apply_workspace_edit, EditError, FileId, TextEdit, TextRange, WorkspaceEdit,
};
