//! Extract Method refactoring.
//!
//! Given a document and a selected span — an expression, one statement, or a
//! contiguous statement run — produce a [`WorkspaceEdit`] that replaces the
//! selection with a call to a newly synthesized method (or local function)
//! and inserts the definition at an appropriate scope, preserving behavior:
//! locals become parameters or return values according to data-flow facts,
//! and escaping `break`/`continue`/`return` jumps are multiplexed through
//! the return channel and re-issued after the call.
//!
//! The pipeline runs Validator → Trivia Preserver → Flow Analyzer → Code
//! Generator → Tree Rewriter; each stage either produces its value or stops
//! the whole operation with a specific, user-facing refusal. No stage
//! mutates the document; the only output is the final edit.

pub(crate) mod analyze;
pub(crate) mod codegen;
pub(crate) mod rewrite;
pub(crate) mod selection;
pub(crate) mod trivia;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use quarry_core::{indentation_at, CancellationToken, Cancelled};
use quarry_syntax::{parse_csharp, SyntaxNode, SyntaxToken};

use crate::edit::{EditError, FileId, TextRange, WorkspaceEdit};

pub use analyze::{
    AnalyzerResult, ExitJump, FlowControlInformation, FlowEncoding, FlowKind, ParameterBehavior,
    ReturnBehavior, VariableClassification, VariableInfo,
};
pub use selection::{ExtractionHost, Selection, SelectionKind};
pub use trivia::{SpanEdge, TriviaOwner, TriviaSavedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    Protected,
    Internal,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionStrategy {
    /// Insert the extracted method immediately after the enclosing member.
    AfterEnclosingMember,
    /// Insert the extracted method at the end of the enclosing type.
    EndOfType,
}

#[derive(Debug, Clone)]
pub struct ExtractMethodOptions {
    /// Method name; `None` picks a heuristic name (`GetX` for simple
    /// expression getters, `NewMethod` otherwise).
    pub name: Option<String>,
    pub visibility: Visibility,
    pub insertion_strategy: InsertionStrategy,
    /// Extract into a local function hosted by the enclosing body instead of
    /// a member method.
    pub as_local_function: bool,
    /// Mark extracted local functions `static` when they capture nothing.
    pub prefer_static_local_function: bool,
    /// Whether the target language version has static local functions
    /// (C# 8+). When it does not, extracted local functions stay instance
    /// regardless of [`prefer_static_local_function`].
    pub supports_static_local_functions: bool,
    pub cancellation: CancellationToken,
}

impl Default for ExtractMethodOptions {
    fn default() -> Self {
        Self {
            name: None,
            visibility: Visibility::Private,
            insertion_strategy: InsertionStrategy::AfterEnclosingMember,
            as_local_function: false,
            prefer_static_local_function: false,
            supports_static_local_functions: true,
            cancellation: CancellationToken::new(),
        }
    }
}

/// The refactoring request: a file, a raw span, and options.
#[derive(Debug, Clone)]
pub struct ExtractMethod {
    /// File containing the selection (workspace-relative or absolute path).
    pub file: String,
    pub selection: TextRange,
    pub options: ExtractMethodOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractStatus {
    Applied,
    /// The extraction succeeded with a caveat the host should surface.
    BestEffort { message: String },
}

#[derive(Debug, Clone)]
pub struct ExtractMethodOutcome {
    pub edit: WorkspaceEdit,
    pub method_name: String,
    /// Range of the new method's name token in the *post-edit* document,
    /// for caret placement and immediate rename.
    pub name_range: TextRange,
    pub status: ExtractStatus,
}

/// Signature preview produced by [`ExtractMethod::analyze`].
#[derive(Debug, Clone)]
pub struct ExtractMethodAnalysis {
    pub kind: SelectionKind,
    pub variables: Vec<VariableInfo>,
    pub flow: FlowControlInformation,
    pub best_effort: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractMethodError {
    #[error("selection does not cover a complete expression or statement range")]
    InvalidSelection,
    #[error("selection is not inside an extractable member body")]
    InvalidContext,
    #[error("the file contains syntax errors")]
    SyntaxErrors,
    #[error("top-level statements can only be extracted into a local function")]
    TopLevelStatement,
    #[error("selection crosses an unmatched preprocessor directive")]
    CrossesPreprocessorDirective,
    #[error("selection contains a yield statement")]
    ContainsYield,
    #[error("selection contains a rethrow whose catch clause is outside the selection")]
    ContainsBareRethrow,
    #[error("selection is part of a constant initializer")]
    ConstantInitializer,
    #[error("selection is a pattern, not an expression")]
    PatternSelection,
    #[error("`{name}` is not a valid method name")]
    InvalidMethodName { name: String },
    #[error("a method named `{name}` already exists in this scope")]
    NameCollision { name: String },
    #[error("the type of `{name}` could not be resolved")]
    ErrorOrUnknownType { name: String },
    #[error("the selection contains no extractable statement")]
    NoActiveStatement,
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("operation cancelled")]
    Cancelled,
}

impl From<Cancelled> for ExtractMethodError {
    fn from(_: Cancelled) -> Self {
        ExtractMethodError::Cancelled
    }
}

impl ExtractMethod {
    /// Run validation and flow analysis without producing an edit.
    pub fn analyze(&self, source: &str) -> Result<ExtractMethodAnalysis, ExtractMethodError> {
        let (selection, analysis) = self.run_analysis(source)?;
        Ok(ExtractMethodAnalysis {
            kind: selection.kind,
            variables: analysis.variables.clone(),
            flow: analysis.flow.clone(),
            best_effort: analysis.best_effort.clone(),
        })
    }

    /// Run the full pipeline and produce the workspace edit.
    pub fn apply(&self, source: &str) -> Result<ExtractMethodOutcome, ExtractMethodError> {
        let (selection, analysis) = self.run_analysis(source)?;
        let cancellation = &self.options.cancellation;

        let saved = trivia::preserve(source, &selection);
        cancellation.check()?;

        let insertion = rewrite::insertion_point(source, &selection, &self.options)?;
        let call_indent = indentation_at(source, selection.final_range.start);

        let generated = codegen::generate(&codegen::CodegenInput {
            source,
            selection: &selection,
            analysis: &analysis,
            trivia: &saved,
            options: &self.options,
            call_indent,
        })?;
        cancellation.check()?;
        debug!(
            method = %generated.method_name,
            return_type = %generated.return_type,
            "generated extracted method"
        );

        rewrite::apply(
            &FileId::new(self.file.clone()),
            source,
            &saved,
            generated,
            &insertion,
            analysis.best_effort.clone(),
        )
    }

    fn run_analysis(
        &self,
        source: &str,
    ) -> Result<(Selection, AnalyzerResult), ExtractMethodError> {
        self.options.cancellation.check()?;

        let parsed = parse_csharp(source);
        if !parsed.errors.is_empty() {
            return Err(ExtractMethodError::SyntaxErrors);
        }
        let root = parsed.syntax();

        let selection = selection::validate(
            &root,
            source,
            self.selection,
            self.options.as_local_function,
        )?;
        debug!(kind = ?selection.kind, range = ?selection.final_range, "validated selection");

        let analysis = analyze::analyze(source, &selection, &self.options.cancellation)?;
        Ok((selection, analysis))
    }
}

pub(crate) fn node_range(node: &SyntaxNode) -> TextRange {
    let range = node.text_range();
    TextRange::new(u32::from(range.start()) as usize, u32::from(range.end()) as usize)
}

pub(crate) fn token_range(token: &SyntaxToken) -> TextRange {
    let range = token.text_range();
    TextRange::new(u32::from(range.start()) as usize, u32::from(range.end()) as usize)
}
