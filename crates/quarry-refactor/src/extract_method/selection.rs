//! Selection validation: turning a raw text span into a classified,
//! analyzable `Selection` or a specific refusal.

use quarry_syntax::ast::{self, AstNode};
use quarry_syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

use crate::edit::TextRange;
use crate::extract_method::{
    node_range, token_range, ExtractMethodError,
};

/// How the final span classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Expression,
    SingleStatement,
    MultipleStatements,
}

/// Where the selection lives and where the new callable can be hosted.
#[derive(Debug, Clone)]
pub enum ExtractionHost {
    Method(ast::MethodDeclaration),
    Constructor(ast::ConstructorDeclaration),
    Accessor(ast::Accessor),
    LocalFunction(ast::LocalFunctionStatement),
    /// Top-level statements of the compilation unit.
    TopLevel(ast::CompilationUnit),
    /// A field initializer (expression selections only).
    FieldInitializer(ast::FieldDeclaration),
}

impl ExtractionHost {
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            ExtractionHost::Method(m) => m.syntax(),
            ExtractionHost::Constructor(c) => c.syntax(),
            ExtractionHost::Accessor(a) => a.syntax(),
            ExtractionHost::LocalFunction(f) => f.syntax(),
            ExtractionHost::TopLevel(unit) => unit.syntax(),
            ExtractionHost::FieldInitializer(f) => f.syntax(),
        }
    }

    /// The block whose statements contain the selection, if the host has one.
    pub fn body(&self) -> Option<ast::Block> {
        match self {
            ExtractionHost::Method(m) => m.body(),
            ExtractionHost::Constructor(c) => c.body(),
            ExtractionHost::Accessor(a) => a.body(),
            ExtractionHost::LocalFunction(f) => f.body(),
            ExtractionHost::TopLevel(_) | ExtractionHost::FieldInitializer(_) => None,
        }
    }

    pub fn body_statements(&self) -> Vec<ast::Statement> {
        match self {
            ExtractionHost::TopLevel(unit) => unit
                .global_statements()
                .filter_map(|g| g.statement())
                .collect(),
            _ => self
                .body()
                .map(|block| block.statements().collect())
                .unwrap_or_default(),
        }
    }

    pub fn parameter_list(&self) -> Option<ast::ParameterList> {
        match self {
            ExtractionHost::Method(m) => m.parameter_list(),
            ExtractionHost::Constructor(c) => c.parameter_list(),
            ExtractionHost::LocalFunction(f) => f.parameter_list(),
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<ast::Type> {
        match self {
            ExtractionHost::Method(m) => m.return_type(),
            ExtractionHost::LocalFunction(f) => f.return_type(),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Option<ast::Modifiers> {
        match self {
            ExtractionHost::Method(m) => m.modifiers(),
            ExtractionHost::Constructor(c) => c.modifiers(),
            ExtractionHost::LocalFunction(f) => f.modifiers(),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            ExtractionHost::Constructor(_) => false,
            ExtractionHost::TopLevel(_) => true,
            ExtractionHost::Accessor(a) => a
                .syntax()
                .ancestors()
                .find_map(ast::PropertyDeclaration::cast)
                .and_then(|p| p.modifiers())
                .is_some_and(|m| m.has(SyntaxKind::StaticKw)),
            ExtractionHost::FieldInitializer(f) => f
                .modifiers()
                .is_some_and(|m| m.has(SyntaxKind::StaticKw)),
            _ => self
                .modifiers()
                .is_some_and(|m| m.has(SyntaxKind::StaticKw)),
        }
    }

    pub fn enclosing_type(&self) -> Option<ast::TypeDeclaration> {
        self.syntax().ancestors().find_map(ast::TypeDeclaration::cast)
    }

    /// The member whose sibling list receives an ordinary extracted method.
    pub fn member_node(&self) -> Option<SyntaxNode> {
        match self {
            ExtractionHost::Method(m) => Some(m.syntax().clone()),
            ExtractionHost::Constructor(c) => Some(c.syntax().clone()),
            ExtractionHost::FieldInitializer(f) => Some(f.syntax().clone()),
            ExtractionHost::Accessor(a) => a
                .syntax()
                .ancestors()
                .find(|n| n.kind() == SyntaxKind::PropertyDeclaration),
            ExtractionHost::LocalFunction(f) => f
                .syntax()
                .ancestors()
                .find(|n| {
                    matches!(
                        n.kind(),
                        SyntaxKind::MethodDeclaration
                            | SyntaxKind::ConstructorDeclaration
                            | SyntaxKind::PropertyDeclaration
                    )
                }),
            ExtractionHost::TopLevel(_) => None,
        }
    }
}

/// Immutable result of selection validation. Downstream stages consume it
/// read-only; adjustments during validation built a fresh value rather than
/// mutating one.
#[derive(Debug, Clone)]
pub struct Selection {
    pub original_range: TextRange,
    pub final_range: TextRange,
    pub kind: SelectionKind,
    pub first_token: SyntaxToken,
    pub last_token: SyntaxToken,
    /// Selected statement run; empty for expression selections.
    pub statements: Vec<ast::Statement>,
    /// The selected expression, for expression selections.
    pub expression: Option<ast::Expression>,
    pub host: ExtractionHost,
}

impl Selection {
    pub fn is_expression(&self) -> bool {
        self.kind == SelectionKind::Expression
    }
}

pub fn validate(
    root: &SyntaxNode,
    source: &str,
    raw: TextRange,
    as_local_function: bool,
) -> Result<Selection, ExtractMethodError> {
    let trimmed = trim_range(source, raw);
    if trimmed.is_empty() || trimmed.end > source.len() {
        return Err(ExtractMethodError::InvalidSelection);
    }

    let (first_token, last_token) = boundary_tokens(root, trimmed)
        .ok_or(ExtractMethodError::InvalidSelection)?;
    let final_range = TextRange::new(
        token_range(&first_token).start,
        token_range(&last_token).end,
    );
    if final_range.start > final_range.end {
        return Err(ExtractMethodError::InvalidSelection);
    }

    let host = find_host(&first_token, &last_token, final_range)?;
    if matches!(host, ExtractionHost::TopLevel(_)) && !as_local_function {
        return Err(ExtractMethodError::TopLevelStatement);
    }

    check_preprocessor_balance(root, final_range)?;

    // A selection that is exactly a pattern (the right side of `is`) is not
    // an expression and cannot be extracted.
    if pattern_selection(root, final_range) {
        return Err(ExtractMethodError::PatternSelection);
    }

    // Expression selection: the tightest node covering the final span that
    // is an expression with exactly that non-trivia extent.
    if let Some(expr) = exact_expression(root, final_range) {
        let expr = apply_expression_adjustments(expr)?;
        let final_range = non_trivia_range(expr.syntax()).unwrap_or(final_range);
        check_expression_context(&expr, &host)?;
        return Ok(Selection {
            original_range: raw,
            final_range,
            kind: SelectionKind::Expression,
            first_token,
            last_token,
            statements: Vec::new(),
            expression: Some(expr),
            host,
        });
    }

    if matches!(host, ExtractionHost::FieldInitializer(_)) {
        // Only expressions can be lifted out of a field initializer.
        return Err(ExtractMethodError::InvalidSelection);
    }

    let statements = statement_run(root, &host, final_range)
        .ok_or(ExtractMethodError::InvalidSelection)?;
    debug_assert!(!statements.is_empty(), "statement run is never empty");

    check_statement_disqualifiers(&statements, final_range)?;

    let kind = if statements.len() == 1 {
        SelectionKind::SingleStatement
    } else {
        SelectionKind::MultipleStatements
    };

    Ok(Selection {
        original_range: raw,
        final_range,
        kind,
        first_token,
        last_token,
        statements,
        expression: None,
        host,
    })
}

/// Shrink the raw span over whitespace so that a trailing-newline selection
/// does not spill into the next line's first token.
pub fn trim_range(source: &str, mut range: TextRange) -> TextRange {
    let bytes = source.as_bytes();
    let max = source.len();
    range.start = range.start.min(max);
    range.end = range.end.min(max);
    while range.start < range.end && bytes[range.start].is_ascii_whitespace() {
        range.start += 1;
    }
    while range.start < range.end && bytes[range.end - 1].is_ascii_whitespace() {
        range.end -= 1;
    }
    range
}

/// First and last non-trivia tokens fully inside `range`.
fn boundary_tokens(root: &SyntaxNode, range: TextRange) -> Option<(SyntaxToken, SyntaxToken)> {
    let mut first: Option<SyntaxToken> = None;
    let mut last: Option<SyntaxToken> = None;
    let covering = covering_node(root, range);
    for tok in covering
        .descendants_with_tokens()
        .filter_map(|el| el.into_token())
    {
        if tok.kind().is_trivia() || tok.kind() == SyntaxKind::Eof {
            continue;
        }
        let tok_range = token_range(&tok);
        if tok_range.start < range.start || tok_range.end > range.end {
            continue;
        }
        if first.is_none() {
            first = Some(tok.clone());
        }
        last = Some(tok);
    }
    Some((first?, last?))
}

fn covering_node(root: &SyntaxNode, range: TextRange) -> SyntaxNode {
    let covering = quarry_syntax::covering_element(
        root,
        quarry_syntax::TextRange::new(range.start, range.end),
    );
    match covering {
        quarry_syntax::SyntaxElement::Node(node) => node,
        quarry_syntax::SyntaxElement::Token(tok) => tok.parent().unwrap_or_else(|| root.clone()),
    }
}

fn find_host(
    first: &SyntaxToken,
    last: &SyntaxToken,
    range: TextRange,
) -> Result<ExtractionHost, ExtractMethodError> {
    let start_node = first.parent().ok_or(ExtractMethodError::InvalidContext)?;

    for node in start_node.ancestors() {
        match node.kind() {
            SyntaxKind::LocalFunctionStatement => {
                let func = ast::LocalFunctionStatement::cast(node).unwrap();
                if let Some(body) = func.body() {
                    if contains_range(body.syntax(), range) {
                        return Ok(ExtractionHost::LocalFunction(func));
                    }
                }
            }
            SyntaxKind::Accessor => {
                let accessor = ast::Accessor::cast(node).unwrap();
                if let Some(body) = accessor.body() {
                    if contains_range(body.syntax(), range) {
                        return Ok(ExtractionHost::Accessor(accessor));
                    }
                }
            }
            SyntaxKind::MethodDeclaration => {
                let method = ast::MethodDeclaration::cast(node).unwrap();
                if let Some(body) = method.body() {
                    if contains_range(body.syntax(), range) {
                        return Ok(ExtractionHost::Method(method));
                    }
                }
            }
            SyntaxKind::ConstructorDeclaration => {
                let ctor = ast::ConstructorDeclaration::cast(node).unwrap();
                if let Some(body) = ctor.body() {
                    if contains_range(body.syntax(), range) {
                        return Ok(ExtractionHost::Constructor(ctor));
                    }
                }
            }
            SyntaxKind::FieldDeclaration => {
                let field = ast::FieldDeclaration::cast(node).unwrap();
                return Ok(ExtractionHost::FieldInitializer(field));
            }
            SyntaxKind::GlobalStatement => {
                let unit = node
                    .ancestors()
                    .find_map(ast::CompilationUnit::cast)
                    .ok_or(ExtractMethodError::InvalidContext)?;
                // Both ends must be in the top-level statement region.
                if last
                    .parent()
                    .is_some_and(|p| p.ancestors().any(|a| a.kind() == SyntaxKind::GlobalStatement))
                {
                    return Ok(ExtractionHost::TopLevel(unit));
                }
                return Err(ExtractMethodError::InvalidContext);
            }
            _ => {}
        }
    }

    Err(ExtractMethodError::InvalidContext)
}

fn contains_range(node: &SyntaxNode, range: TextRange) -> bool {
    let node_range = node_range(node);
    node_range.start <= range.start && range.end <= node_range.end
}

/// Non-trivia extent of a node.
pub fn non_trivia_range(node: &SyntaxNode) -> Option<TextRange> {
    let mut start: Option<usize> = None;
    let mut end: Option<usize> = None;
    for tok in node
        .descendants_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|tok| !tok.kind().is_trivia())
    {
        let range = token_range(&tok);
        if start.is_none() {
            start = Some(range.start);
        }
        end = Some(range.end);
    }
    Some(TextRange::new(start?, end?))
}

fn pattern_selection(root: &SyntaxNode, range: TextRange) -> bool {
    let mut node = covering_node(root, range);
    loop {
        if node.kind() == SyntaxKind::DeclarationPattern
            && non_trivia_range(&node).is_some_and(|r| r == range)
        {
            return true;
        }
        match node.parent() {
            Some(parent) => node = parent,
            None => return false,
        }
    }
}

fn exact_expression(root: &SyntaxNode, range: TextRange) -> Option<ast::Expression> {
    let mut node = covering_node(root, range);
    loop {
        if let Some(expr) = ast::Expression::cast(node.clone()) {
            if non_trivia_range(expr.syntax()).is_some_and(|r| r == range) {
                return Some(expr);
            }
        }
        node = node.parent()?;
    }
}

/// Boundary-expansion special cases for expression selections.
fn apply_expression_adjustments(
    expr: ast::Expression,
) -> Result<ast::Expression, ExtractMethodError> {
    // Patterns are not expressions; a selection that is exactly the pattern
    // operand of `is` is refused rather than silently widened.
    if let Some(parent) = expr.syntax().parent() {
        if parent.kind() == SyntaxKind::DeclarationPattern {
            return Err(ExtractMethodError::PatternSelection);
        }
    }

    // A casted operand may not retain its original static type on its own;
    // when the operand's type is not self-evident, widen to include the cast.
    if let Some(parent) = expr.syntax().parent() {
        if parent.kind() == SyntaxKind::CastExpression {
            let cast = ast::CastExpression::cast(parent).unwrap();
            if cast.expression().map(|e| e.syntax().clone()).as_ref() == Some(expr.syntax())
                && crate::extract_method::analyze::self_evident_type(&expr).is_none()
            {
                return Ok(ast::Expression::CastExpression(cast));
            }
        }
    }

    Ok(expr)
}

fn check_expression_context(
    expr: &ast::Expression,
    host: &ExtractionHost,
) -> Result<(), ExtractMethodError> {
    // Compile-time-constant initializers must stay constant; extracting a
    // call out of one would not compile.
    for ancestor in expr.syntax().ancestors() {
        match ancestor.kind() {
            SyntaxKind::LocalDeclarationStatement => {
                let decl = ast::LocalDeclarationStatement::cast(ancestor).unwrap();
                if decl.is_const() {
                    return Err(ExtractMethodError::ConstantInitializer);
                }
                break;
            }
            SyntaxKind::FieldDeclaration => {
                let field = ast::FieldDeclaration::cast(ancestor).unwrap();
                if field
                    .modifiers()
                    .is_some_and(|m| m.has(SyntaxKind::ConstKw))
                {
                    return Err(ExtractMethodError::ConstantInitializer);
                }
                break;
            }
            _ => {}
        }
    }

    // `yield` inside a selected lambda/expression cannot occur, but an
    // expression containing `await` outside an async host is refused by
    // analysis later; nothing further to check here.
    let _ = host;
    Ok(())
}

/// Resolve the final span to a contiguous run of complete sibling
/// statements.
///
/// Finds the *innermost* statement container (block, switch section, or the
/// top-level statement list) whose direct children contain a slice
/// `[i..=j]` with:
/// - `range.start == start(stmts[i])`
/// - `range.end == end(stmts[j])`
fn statement_run(
    root: &SyntaxNode,
    host: &ExtractionHost,
    range: TextRange,
) -> Option<Vec<ast::Statement>> {
    let mut best: Option<(usize, Vec<ast::Statement>)> = None;

    let search_root = match host {
        ExtractionHost::TopLevel(unit) => unit.syntax().clone(),
        _ => host.body()?.syntax().clone(),
    };

    let containers = std::iter::once(search_root.clone())
        .chain(search_root.descendants().filter(|n| {
            matches!(n.kind(), SyntaxKind::Block | SyntaxKind::SwitchSection)
        }));

    for container in containers {
        let stmts: Vec<ast::Statement> = if container.kind() == SyntaxKind::CompilationUnit {
            container
                .children()
                .filter_map(ast::GlobalStatement::cast)
                .filter_map(|g| g.statement())
                .collect()
        } else {
            container.children().filter_map(ast::Statement::cast).collect()
        };
        if stmts.is_empty() {
            continue;
        }

        let start_idx = stmts.iter().position(|stmt| {
            non_trivia_range(stmt.syntax()).is_some_and(|r| r.start == range.start)
        });
        let end_idx = stmts.iter().position(|stmt| {
            non_trivia_range(stmt.syntax()).is_some_and(|r| r.end == range.end)
        });
        let (Some(start_idx), Some(end_idx)) = (start_idx, end_idx) else {
            continue;
        };
        if start_idx > end_idx {
            continue;
        }

        let span = node_range(&container).len();
        let run = stmts[start_idx..=end_idx].to_vec();
        if best.as_ref().is_none_or(|(best_span, _)| span < *best_span) {
            best = Some((span, run));
        }
    }

    if best.is_none() {
        // An embedded statement (unbraced loop/if body) is a valid single
        // selection even though it has no sibling list.
        let mut node = covering_node(root, range);
        loop {
            if let Some(stmt) = ast::Statement::cast(node.clone()) {
                if non_trivia_range(stmt.syntax()).is_some_and(|r| r == range) {
                    return Some(vec![stmt]);
                }
            }
            node = node.parent()?;
        }
    }

    best.map(|(_, run)| run)
}

/// Battery of content checks that refuse extraction with a specific reason.
fn check_statement_disqualifiers(
    statements: &[ast::Statement],
    range: TextRange,
) -> Result<(), ExtractMethodError> {
    for stmt in statements {
        for node in stmt.syntax().descendants() {
            match node.kind() {
                SyntaxKind::YieldStatement => {
                    return Err(ExtractMethodError::ContainsYield);
                }
                SyntaxKind::ThrowStatement => {
                    let throw = ast::ThrowStatement::cast(node).unwrap();
                    if throw.is_rethrow() {
                        let catch_inside = throw
                            .syntax()
                            .ancestors()
                            .find(|a| a.kind() == SyntaxKind::CatchClause)
                            .is_some_and(|a| {
                                let r = node_range(&a);
                                range.start <= r.start && r.end <= range.end
                            });
                        if !catch_inside {
                            return Err(ExtractMethodError::ContainsBareRethrow);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Refuse selections that cross an unmatched `#if`/`#endif` or
/// `#region`/`#endregion` boundary.
fn check_preprocessor_balance(
    root: &SyntaxNode,
    range: TextRange,
) -> Result<(), ExtractMethodError> {
    let mut if_depth: i32 = 0;
    let mut region_depth: i32 = 0;

    for tok in root
        .descendants_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|tok| tok.kind().is_directive_trivia())
    {
        let tok_range = token_range(&tok);
        if tok_range.end <= range.start || tok_range.start >= range.end {
            continue;
        }
        match tok.kind() {
            SyntaxKind::IfDirective => if_depth += 1,
            SyntaxKind::EndIfDirective => {
                if_depth -= 1;
                if if_depth < 0 {
                    return Err(ExtractMethodError::CrossesPreprocessorDirective);
                }
            }
            SyntaxKind::ElifDirective | SyntaxKind::ElseDirective => {
                if if_depth <= 0 {
                    return Err(ExtractMethodError::CrossesPreprocessorDirective);
                }
            }
            SyntaxKind::RegionDirective => region_depth += 1,
            SyntaxKind::EndRegionDirective => {
                region_depth -= 1;
                if region_depth < 0 {
                    return Err(ExtractMethodError::CrossesPreprocessorDirective);
                }
            }
            _ => {}
        }
    }

    if if_depth != 0 || region_depth != 0 {
        return Err(ExtractMethodError::CrossesPreprocessorDirective);
    }
    Ok(())
}
