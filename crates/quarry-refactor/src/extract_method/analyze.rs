//! Flow analysis for a validated selection: variable classification, flow
//! control encoding, modifier inference, and type synthesis inputs.

use std::collections::{HashMap, HashSet};

use quarry_core::{CancellationToken, Name, Span};
use quarry_flow::{region_facts, RegionFacts};
use quarry_hir::{lower_flow_statements_with, Body, LocalId};
use quarry_syntax::ast::{self, AstNode};
use quarry_syntax::{SyntaxKind, SyntaxNode};

use crate::edit::TextRange;
use crate::extract_method::selection::{ExtractionHost, Selection};
use crate::extract_method::{node_range, token_range, ExtractMethodError};

/// How a classified variable crosses the extraction boundary as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBehavior {
    None,
    Value,
    Ref,
    Out,
}

/// How a classified variable crosses the boundary through the return channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBehavior {
    None,
    /// The call site declares the variable and initializes it from the call.
    Initialization,
    /// The call site assigns the existing variable from the call.
    Assignment,
}

/// Exhaustive classification; every touched variable gets exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableClassification {
    PureLocal,
    ValueParameter,
    RefParameter,
    OutParameter,
    SplitVariable,
    ReturnValue,
}

#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub ty: String,
    pub parameter_behavior: ParameterBehavior,
    pub return_behavior: ReturnBehavior,
    pub use_as_return_value: bool,
    pub can_be_used_as_return_value: bool,
    pub declared_inside: bool,
    /// Position of the variable's first use inside the selection; parameter
    /// order follows it.
    pub first_use: usize,
}

impl VariableInfo {
    pub fn classification(&self) -> VariableClassification {
        if self.use_as_return_value {
            if self.declared_inside && self.return_behavior == ReturnBehavior::Initialization {
                VariableClassification::SplitVariable
            } else {
                VariableClassification::ReturnValue
            }
        } else {
            match self.parameter_behavior {
                ParameterBehavior::Value => VariableClassification::ValueParameter,
                ParameterBehavior::Ref => VariableClassification::RefParameter,
                ParameterBehavior::Out => VariableClassification::OutParameter,
                ParameterBehavior::None => VariableClassification::PureLocal,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowKind {
    Break,
    Continue,
    Return,
}

impl FlowKind {
    pub fn jump_text(self) -> &'static str {
        match self {
            FlowKind::Break => "break;",
            FlowKind::Continue => "continue;",
            FlowKind::Return => "return;",
        }
    }
}

/// The minimal-width representation of the multiplexed flow flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEncoding {
    /// No flag; either no exits escape, or a single kind is reissued
    /// unconditionally after the call.
    None,
    Boolean,
    NullableBoolean,
    Integer,
}

/// Which jump kinds escape the selection and how they are multiplexed into
/// the synthesized flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowControlInformation {
    /// Kinds that need an encoded flag value, in break < continue < return
    /// order.
    pub encoded_kinds: Vec<FlowKind>,
    /// The selection's natural end can be reached.
    pub has_fallthrough: bool,
    pub encoding: FlowEncoding,
    /// A single escaping kind reissued unconditionally after the call
    /// (selection never falls through, exactly one kind).
    pub unconditional: Option<FlowKind>,
    /// Escaping `return`s re-issue directly inside the extracted method
    /// because fall-through and return meet at the same point.
    pub return_passes_through: bool,
    /// Escaping returns carry the enclosing method's return value.
    pub carries_return_value: bool,
}

impl FlowControlInformation {
    pub fn none() -> Self {
        Self {
            encoded_kinds: Vec::new(),
            has_fallthrough: true,
            encoding: FlowEncoding::None,
            unconditional: None,
            return_passes_through: false,
            carries_return_value: false,
        }
    }

    pub fn needs_flag(&self) -> bool {
        !matches!(self.encoding, FlowEncoding::None)
    }

    pub fn flag_type(&self) -> Option<&'static str> {
        match self.encoding {
            FlowEncoding::None => None,
            FlowEncoding::Boolean => Some("bool"),
            FlowEncoding::NullableBoolean => Some("bool?"),
            FlowEncoding::Integer => Some("int"),
        }
    }

    /// Encoded flag literal for `kind`.
    pub fn encoded_value(&self, kind: FlowKind) -> String {
        let idx = self
            .encoded_kinds
            .iter()
            .position(|k| *k == kind)
            .expect("kind is encoded");
        match self.encoding {
            FlowEncoding::None => unreachable!("no encoding in effect"),
            FlowEncoding::Boolean => (idx == 0).to_string(),
            FlowEncoding::NullableBoolean => match idx {
                0 => "true".to_string(),
                1 => "false".to_string(),
                _ => "null".to_string(),
            },
            FlowEncoding::Integer => (idx + 1).to_string(),
        }
    }

    /// Encoded flag literal for the natural fall-through path.
    pub fn fallthrough_value(&self) -> String {
        match self.encoding {
            FlowEncoding::None => unreachable!("no encoding in effect"),
            FlowEncoding::Boolean => "false".to_string(),
            FlowEncoding::NullableBoolean => "null".to_string(),
            FlowEncoding::Integer => "0".to_string(),
        }
    }
}

/// One escaping jump statement inside the selection.
#[derive(Debug, Clone)]
pub struct ExitJump {
    pub kind: FlowKind,
    /// Full statement range, selection-relative rewriting happens over it.
    pub range: TextRange,
    /// Range of the returned expression, for value-carrying returns.
    pub value_range: Option<TextRange>,
}

#[derive(Debug, Clone)]
pub struct AnalyzerResult {
    pub variables: Vec<VariableInfo>,
    pub flow: FlowControlInformation,
    pub exit_jumps: Vec<ExitJump>,
    /// Inferred type of an expression selection.
    pub expression_type: Option<String>,
    /// Return type of the enclosing callable, when escaping returns carry it.
    pub enclosing_return_type: Option<String>,
    pub type_parameters: Vec<String>,
    pub is_async: bool,
    /// Every awaited expression opts out of context capture.
    pub await_configured: bool,
    pub is_unsafe: bool,
    pub static_context: bool,
    pub should_be_readonly: bool,
    pub uses_instance_member: bool,
    /// `checked`/`unchecked` wrapper required around the new body.
    pub wrap_context: Option<String>,
    /// Set when analysis succeeded with a caveat (type parameter hiding).
    pub best_effort: Option<String>,
}

impl AnalyzerResult {
    /// Parameters in order of first use.
    pub fn parameters(&self) -> impl Iterator<Item = &VariableInfo> {
        self.variables
            .iter()
            .filter(|v| v.parameter_behavior != ParameterBehavior::None)
    }

    /// Variables flowing out through the return channel.
    pub fn return_variables(&self) -> impl Iterator<Item = &VariableInfo> {
        self.variables.iter().filter(|v| v.use_as_return_value)
    }
}

pub fn analyze(
    source: &str,
    selection: &Selection,
    cancellation: &CancellationToken,
) -> Result<AnalyzerResult, ExtractMethodError> {
    cancellation.check()?;

    let types = TypeTable::collect(source, selection);

    let region = Span::new(selection.final_range.start, selection.final_range.end);
    let params = host_params(&selection.host);
    let body = lower_host_body(selection, &params);

    cancellation.check()?;
    let facts = region_facts(&body, region, &mut || {});
    cancellation.check()?;

    let (flow, exit_jumps) = if selection.is_expression() {
        (FlowControlInformation::none(), Vec::new())
    } else {
        compute_flow_control(selection)
    };
    cancellation.check()?;

    let mut variables = classify_variables(&body, &facts, &types)?;
    // When the return channel already carries a flag or the enclosing return
    // value, ref/out parameters stay parameters; only split variables ride
    // along.
    let suppress_param_promotion = flow.needs_flag() || flow.carries_return_value;
    promote_return_value(&mut variables, suppress_param_promotion);
    variables.sort_by_key(|v| v.first_use);

    let enclosing_return_type = enclosing_return_type(&selection.host);
    if flow.carries_return_value && enclosing_return_type.is_none() {
        return Err(ExtractMethodError::ErrorOrUnknownType {
            name: "<return>".to_string(),
        });
    }

    let expression_type = match (&selection.expression, selection.is_expression()) {
        (Some(expr), true) => {
            let ty = types.infer(expr).ok_or_else(|| {
                ExtractMethodError::ErrorOrUnknownType {
                    name: expr_display_name(expr),
                }
            })?;
            Some(ty)
        }
        _ => None,
    };

    let is_async = contains_await(selection);
    let await_configured = is_async && all_awaits_configured(selection);
    let (wrap_context, in_unsafe_block) = surrounding_context(selection);
    let is_unsafe = in_unsafe_block && !host_is_unsafe(&selection.host);

    let (type_parameters, best_effort) = referenced_type_parameters(selection, &variables);

    let uses_instance_member = uses_instance_member(selection);

    Ok(AnalyzerResult {
        variables,
        flow,
        exit_jumps,
        expression_type,
        enclosing_return_type,
        type_parameters,
        is_async,
        await_configured,
        is_unsafe,
        static_context: selection.host.is_static(),
        should_be_readonly: selection
            .host
            .modifiers()
            .is_some_and(|m| m.has(SyntaxKind::ReadonlyKw)),
        uses_instance_member,
        wrap_context,
        best_effort,
    })
}

fn host_params(host: &ExtractionHost) -> Vec<(Name, Span)> {
    let mut out = Vec::new();
    if let Some(list) = host.parameter_list() {
        for param in list.parameters() {
            let Some(name_tok) = param.name_token() else {
                continue;
            };
            let range = token_range(&name_tok);
            out.push((Name::new(name_tok.text()), Span::new(range.start, range.end)));
        }
    }
    out
}

fn lower_host_body(selection: &Selection, params: &[(Name, Span)]) -> Body {
    let stmts = selection.host.body_statements();
    let span = match &selection.host {
        ExtractionHost::TopLevel(unit) => {
            let range = node_range(unit.syntax());
            Span::new(range.start, range.end)
        }
        host => host
            .body()
            .map(|b| {
                let range = node_range(b.syntax());
                Span::new(range.start, range.end)
            })
            .unwrap_or_else(|| {
                let range = node_range(host.syntax());
                Span::new(range.start, range.end)
            }),
    };
    lower_flow_statements_with(&stmts, span, params.to_vec(), &mut || {})
}

// === Variable classification ===

fn classify_variables(
    body: &Body,
    facts: &RegionFacts,
    types: &TypeTable,
) -> Result<Vec<VariableInfo>, ExtractMethodError> {
    let mut touched: Vec<LocalId> = Vec::new();
    for local in facts
        .reads_inside
        .iter()
        .chain(facts.writes_inside.iter())
    {
        if !touched.contains(local) {
            touched.push(*local);
        }
    }

    let mut out = Vec::new();
    for local_id in touched {
        let local = body.local(local_id);
        let declared_inside = facts.declared_inside.contains(&local_id);
        let written = facts.writes_inside.contains(&local_id);
        let live_after = facts.live_after.contains(&local_id);
        let first_read = facts.first_read.get(&local_id).copied();
        let first_write = facts.first_write.get(&local_id).copied();
        let first_use = first_read
            .into_iter()
            .chain(first_write)
            .min()
            .unwrap_or(usize::MAX);

        let mut info = VariableInfo {
            name: local.name.as_str().to_string(),
            ty: String::new(),
            parameter_behavior: ParameterBehavior::None,
            return_behavior: ReturnBehavior::None,
            use_as_return_value: false,
            can_be_used_as_return_value: false,
            declared_inside,
            first_use,
        };

        if declared_inside {
            if !live_after {
                // Pure local: moves into the extracted method untouched.
                out.push(info);
                continue;
            }
            // Split variable: declaration moves to the call site, the
            // extracted method assigns it.
            info.can_be_used_as_return_value = true;
            info.return_behavior = ReturnBehavior::Initialization;
            info.ty = types.local_type(body, local_id).ok_or_else(|| {
                ExtractMethodError::ErrorOrUnknownType {
                    name: info.name.clone(),
                }
            })?;
            out.push(info);
            continue;
        }

        info.ty = types.local_type(body, local_id).ok_or_else(|| {
            ExtractMethodError::ErrorOrUnknownType {
                name: info.name.clone(),
            }
        })?;

        if written {
            let read_before_write = match (first_read, first_write) {
                (Some(read), Some(write)) => read < write,
                (Some(_), None) => true,
                _ => false,
            };
            let always_assigned = facts.always_assigned.contains(&local_id);
            if live_after {
                info.can_be_used_as_return_value = true;
                info.parameter_behavior = if !read_before_write && always_assigned {
                    ParameterBehavior::Out
                } else {
                    ParameterBehavior::Ref
                };
            } else if first_read.is_some() {
                // The write is dead after the selection; a by-value copy
                // preserves every observable behavior.
                info.parameter_behavior = ParameterBehavior::Value;
            } else if always_assigned {
                info.parameter_behavior = ParameterBehavior::Out;
            } else {
                info.parameter_behavior = ParameterBehavior::Ref;
            }
        } else {
            info.parameter_behavior = ParameterBehavior::Value;
        }
        out.push(info);
    }

    Ok(out)
}

/// Decide which variable(s) ride the return channel.
fn promote_return_value(variables: &mut [VariableInfo], suppress_param_promotion: bool) {
    // Defensive: nothing may be pre-marked before promotion runs.
    assert!(
        variables.iter().all(|v| !v.use_as_return_value),
        "return value already selected before promotion"
    );

    let split_count = variables
        .iter()
        .filter(|v| v.return_behavior == ReturnBehavior::Initialization)
        .count();
    if split_count > 0 {
        for var in variables.iter_mut() {
            if var.return_behavior == ReturnBehavior::Initialization {
                var.use_as_return_value = true;
            }
        }
        return;
    }

    if suppress_param_promotion {
        return;
    }

    let out_indices: Vec<usize> = variables
        .iter()
        .enumerate()
        .filter(|(_, v)| v.parameter_behavior == ParameterBehavior::Out)
        .map(|(i, _)| i)
        .collect();
    let ref_indices: Vec<usize> = variables
        .iter()
        .enumerate()
        .filter(|(_, v)| v.parameter_behavior == ParameterBehavior::Ref)
        .map(|(i, _)| i)
        .collect();

    match (out_indices.as_slice(), ref_indices.as_slice()) {
        // Exactly one `out`: it becomes the return value and leaves the
        // parameter list entirely.
        ([idx], _) => {
            let var = &mut variables[*idx];
            var.use_as_return_value = true;
            var.return_behavior = ReturnBehavior::Assignment;
            var.parameter_behavior = ParameterBehavior::None;
        }
        // Exactly one `ref` and no `out`: the current value still flows in,
        // so the parameter stays (by value) and the result flows back.
        ([], [idx]) => {
            let var = &mut variables[*idx];
            var.use_as_return_value = true;
            var.return_behavior = ReturnBehavior::Assignment;
            var.parameter_behavior = ParameterBehavior::Value;
        }
        // Zero or several of both: promotion is ambiguous, the parameters
        // keep their ref/out spelling.
        _ => {}
    }
}

// === Flow control ===

fn compute_flow_control(selection: &Selection) -> (FlowControlInformation, Vec<ExitJump>) {
    let range = selection.final_range;
    let mut exit_jumps = Vec::new();
    let mut kinds: Vec<FlowKind> = Vec::new();
    let mut carries_value = false;

    for stmt in &selection.statements {
        for node in std::iter::once(stmt.syntax().clone()).chain(stmt.syntax().descendants()) {
            match node.kind() {
                SyntaxKind::BreakStatement => {
                    if jump_target_outside(&node, range, true) {
                        push_kind(&mut kinds, FlowKind::Break);
                        exit_jumps.push(ExitJump {
                            kind: FlowKind::Break,
                            range: node_range(&node),
                            value_range: None,
                        });
                    }
                }
                SyntaxKind::ContinueStatement => {
                    if jump_target_outside(&node, range, false) {
                        push_kind(&mut kinds, FlowKind::Continue);
                        exit_jumps.push(ExitJump {
                            kind: FlowKind::Continue,
                            range: node_range(&node),
                            value_range: None,
                        });
                    }
                }
                SyntaxKind::ReturnStatement => {
                    // A return always leaves the selection (nested functions
                    // were not lowered into it).
                    if node
                        .ancestors()
                        .any(|a| {
                            matches!(
                                a.kind(),
                                SyntaxKind::LocalFunctionStatement | SyntaxKind::LambdaExpression
                            ) && contains(range, node_range(&a))
                        })
                    {
                        continue;
                    }
                    push_kind(&mut kinds, FlowKind::Return);
                    let ret = ast::ReturnStatement::cast(node.clone()).unwrap();
                    let value_range = ret.expression().map(|e| node_range(e.syntax()));
                    carries_value |= value_range.is_some();
                    exit_jumps.push(ExitJump {
                        kind: FlowKind::Return,
                        range: node_range(&node),
                        value_range,
                    });
                }
                _ => {}
            }
        }
    }

    let has_fallthrough = sequence_falls_through(&selection.statements);

    // Fall-through and `return` meet at the same point when the selection is
    // a suffix of a void body; the jump then needs no encoded value.
    let return_passes_through = kinds.contains(&FlowKind::Return)
        && !carries_value
        && selection_is_body_suffix(selection);

    let mut encoded: Vec<FlowKind> = kinds
        .iter()
        .copied()
        .filter(|k| !(return_passes_through && *k == FlowKind::Return))
        .collect();
    encoded.sort();

    let (encoding, unconditional) = if encoded.is_empty() {
        (FlowEncoding::None, None)
    } else if !has_fallthrough && encoded.len() == 1 {
        // Every path exits the same way; re-issue it unconditionally.
        (FlowEncoding::None, Some(encoded[0]))
    } else {
        let distinct = encoded.len() + usize::from(has_fallthrough || return_passes_through);
        let encoding = match distinct {
            0 | 1 | 2 => FlowEncoding::Boolean,
            3 => FlowEncoding::NullableBoolean,
            _ => FlowEncoding::Integer,
        };
        (encoding, None)
    };

    let flow = FlowControlInformation {
        encoded_kinds: if matches!(encoding, FlowEncoding::None) {
            Vec::new()
        } else {
            encoded
        },
        has_fallthrough,
        encoding,
        unconditional,
        return_passes_through,
        carries_return_value: carries_value,
    };
    (flow, exit_jumps)
}

fn push_kind(kinds: &mut Vec<FlowKind>, kind: FlowKind) {
    if !kinds.contains(&kind) {
        kinds.push(kind);
    }
}

fn contains(outer: TextRange, inner: TextRange) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Whether the jump's target construct lies outside the selection.
fn jump_target_outside(node: &SyntaxNode, range: TextRange, is_break: bool) -> bool {
    let target = node.ancestors().find(|a| {
        matches!(
            a.kind(),
            SyntaxKind::WhileStatement
                | SyntaxKind::DoWhileStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForeachStatement
        ) || (is_break && a.kind() == SyntaxKind::SwitchStatement)
    });
    match target {
        Some(target) => !contains(range, node_range(&target)),
        // No target at all: malformed code; treat as escaping.
        None => true,
    }
}

/// Structural "can control reach the end of this statement sequence".
fn sequence_falls_through(stmts: &[ast::Statement]) -> bool {
    match stmts.last() {
        Some(last) => statement_falls_through(last),
        None => true,
    }
}

fn statement_falls_through(stmt: &ast::Statement) -> bool {
    match stmt {
        ast::Statement::ReturnStatement(_)
        | ast::Statement::ThrowStatement(_)
        | ast::Statement::BreakStatement(_)
        | ast::Statement::ContinueStatement(_) => false,
        ast::Statement::Block(block) => {
            let stmts: Vec<_> = block.statements().collect();
            sequence_falls_through(&stmts)
        }
        ast::Statement::IfStatement(if_stmt) => match (if_stmt.then_branch(), if_stmt.else_branch())
        {
            (Some(then), Some(else_branch)) => {
                statement_falls_through(&then) || statement_falls_through(&else_branch)
            }
            _ => true,
        },
        ast::Statement::CheckedStatement(checked) => checked
            .block()
            .map(|b| {
                let stmts: Vec<_> = b.statements().collect();
                sequence_falls_through(&stmts)
            })
            .unwrap_or(true),
        ast::Statement::UnsafeStatement(unsafe_stmt) => unsafe_stmt
            .block()
            .map(|b| {
                let stmts: Vec<_> = b.statements().collect();
                sequence_falls_through(&stmts)
            })
            .unwrap_or(true),
        // Loops, switches, and try statements conservatively fall through.
        _ => true,
    }
}

fn selection_is_body_suffix(selection: &Selection) -> bool {
    let body_stmts = selection.host.body_statements();
    let Some(last_body) = body_stmts.last() else {
        return false;
    };
    let Some(last_selected) = selection.statements.last() else {
        return false;
    };
    if last_body.syntax() != last_selected.syntax() {
        return false;
    }
    // Escaping returns re-issue as plain `return;` only in void contexts.
    match &selection.host {
        ExtractionHost::Constructor(_) | ExtractionHost::TopLevel(_) => true,
        host => host
            .return_type()
            .map(|t| t.is_void())
            .unwrap_or(false),
    }
}

// === Modifier / context inference ===

fn contains_await(selection: &Selection) -> bool {
    selection_nodes(selection).any(|n| n.kind() == SyntaxKind::AwaitExpression)
}

fn all_awaits_configured(selection: &Selection) -> bool {
    selection_nodes(selection)
        .filter(|n| n.kind() == SyntaxKind::AwaitExpression)
        .all(|n| {
            let await_expr = ast::AwaitExpression::cast(n).unwrap();
            matches!(
                await_expr.expression(),
                Some(ast::Expression::InvocationExpression(call))
                    if call
                        .callee()
                        .and_then(|callee| match callee {
                            ast::Expression::MemberAccessExpression(access) => access.name_token(),
                            _ => None,
                        })
                        .is_some_and(|tok| tok.text() == "ConfigureAwait")
            )
        })
}

fn selection_nodes(selection: &Selection) -> impl Iterator<Item = SyntaxNode> + '_ {
    let roots: Vec<SyntaxNode> = match &selection.expression {
        Some(expr) => vec![expr.syntax().clone()],
        None => selection
            .statements
            .iter()
            .map(|s| s.syntax().clone())
            .collect(),
    };
    roots
        .into_iter()
        .flat_map(|root| std::iter::once(root.clone()).chain(root.descendants()))
}

/// Context wrappers required around the extracted body, walking out from the
/// selection to the host body: a `checked`/`unchecked` wrapper keyword, and
/// whether an `unsafe` block surrounds the selection.
fn surrounding_context(selection: &Selection) -> (Option<String>, bool) {
    let start = match &selection.expression {
        Some(expr) => expr.syntax().clone(),
        None => match selection.statements.first() {
            Some(stmt) => stmt.syntax().clone(),
            None => return (None, false),
        },
    };

    let mut wrap = None;
    let mut in_unsafe = false;
    for ancestor in start.ancestors() {
        if contains(selection.final_range, node_range(&ancestor)) {
            continue;
        }
        match ancestor.kind() {
            SyntaxKind::CheckedStatement if wrap.is_none() => {
                let checked = ast::CheckedStatement::cast(ancestor).unwrap();
                wrap = checked.keyword().map(|tok| tok.text().to_string());
            }
            SyntaxKind::UnsafeStatement => in_unsafe = true,
            SyntaxKind::MethodDeclaration
            | SyntaxKind::ConstructorDeclaration
            | SyntaxKind::Accessor
            | SyntaxKind::LocalFunctionStatement => break,
            _ => {}
        }
    }
    (wrap, in_unsafe)
}

fn host_is_unsafe(host: &ExtractionHost) -> bool {
    if host
        .modifiers()
        .is_some_and(|m| m.has(SyntaxKind::UnsafeKw))
    {
        return true;
    }
    host.enclosing_type()
        .and_then(|t| t.modifiers())
        .is_some_and(|m| m.has(SyntaxKind::UnsafeKw))
}

/// Type parameters of the enclosing method referenced inside the selection
/// (directly, or through the type of a crossing variable); the second
/// component reports the hidden-by-same-name caveat.
fn referenced_type_parameters(
    selection: &Selection,
    variables: &[VariableInfo],
) -> (Vec<String>, Option<String>) {
    let method_params: Vec<String> = match &selection.host {
        ExtractionHost::Method(m) => type_parameter_names(m.type_parameter_list()),
        ExtractionHost::LocalFunction(f) => type_parameter_names(f.type_parameter_list()),
        _ => Vec::new(),
    };
    if method_params.is_empty() {
        return (Vec::new(), None);
    }

    let type_params: HashSet<String> = selection
        .host
        .enclosing_type()
        .map(|t| type_parameter_names(t.type_parameter_list()))
        .unwrap_or_default()
        .into_iter()
        .collect();

    let mut referenced = Vec::new();
    for node in selection_nodes(selection) {
        for tok in node
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|tok| tok.kind().is_identifier_like())
        {
            let text = tok.text();
            if method_params.iter().any(|p| p == text) && !referenced.contains(&text.to_string()) {
                referenced.push(text.to_string());
            }
        }
    }
    // A type parameter can also cross the boundary through the type of a
    // parameter or return variable without being spelled in the selection.
    for var in variables {
        for word in var.ty.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if method_params.iter().any(|p| p == word)
                && !referenced.contains(&word.to_string())
            {
                referenced.push(word.to_string());
            }
        }
    }

    let hidden: Vec<&String> = referenced
        .iter()
        .filter(|name| type_params.contains(*name))
        .collect();
    let best_effort = if hidden.is_empty() {
        None
    } else {
        Some(format!(
            "type parameter `{}` is hidden by a type parameter of the enclosing type at the insertion point",
            hidden[0]
        ))
    };

    // Type parameters also declared on the type are in scope at the
    // insertion point and are not re-declared.
    let own: Vec<String> = referenced
        .into_iter()
        .filter(|name| !type_params.contains(name))
        .collect();
    (own, best_effort)
}

fn type_parameter_names(list: Option<ast::TypeParameterList>) -> Vec<String> {
    list.map(|list| {
        list.type_parameters()
            .filter_map(|p| p.name_token())
            .map(|tok| tok.text().to_string())
            .collect()
    })
    .unwrap_or_default()
}

/// Whether the selection references an instance member of the enclosing type.
fn uses_instance_member(selection: &Selection) -> bool {
    if selection_nodes(selection).any(|n| {
        matches!(
            n.kind(),
            SyntaxKind::ThisExpression | SyntaxKind::BaseExpression
        )
    }) {
        return true;
    }

    let Some(ty) = selection.host.enclosing_type() else {
        return false;
    };
    let Some(body) = ty.body() else {
        return false;
    };

    let mut instance_members: HashSet<String> = HashSet::new();
    for member in body.members() {
        let (modifiers, name) = match &member {
            ast::Member::FieldDeclaration(f) => (
                f.modifiers(),
                f.declarator_list()
                    .and_then(|l| l.declarators().next())
                    .and_then(|d| d.name_token())
                    .map(|t| t.text().to_string()),
            ),
            ast::Member::MethodDeclaration(m) => {
                (m.modifiers(), m.name_token().map(|t| t.text().to_string()))
            }
            ast::Member::PropertyDeclaration(p) => {
                (p.modifiers(), p.name_token().map(|t| t.text().to_string()))
            }
            _ => (None, None),
        };
        if modifiers.is_some_and(|m| m.has(SyntaxKind::StaticKw) || m.has(SyntaxKind::ConstKw)) {
            continue;
        }
        if let Some(name) = name {
            instance_members.insert(name);
        }
        // Multi-declarator fields: record every name.
        if let ast::Member::FieldDeclaration(f) = &member {
            if let Some(list) = f.declarator_list() {
                for declarator in list.declarators() {
                    if let Some(tok) = declarator.name_token() {
                        instance_members.insert(tok.text().to_string());
                    }
                }
            }
        }
    }

    selection_nodes(selection)
        .filter(|n| n.kind() == SyntaxKind::NameExpression)
        .filter_map(|n| ast::NameExpression::cast(n).unwrap().name_token())
        .any(|tok| instance_members.contains(tok.text()))
}

fn enclosing_return_type(host: &ExtractionHost) -> Option<String> {
    match host {
        ExtractionHost::Method(m) => m.return_type().map(|t| t.display_text()),
        ExtractionHost::LocalFunction(f) => f.return_type().map(|t| t.display_text()),
        ExtractionHost::Accessor(a) => {
            let is_get = a
                .keyword()
                .is_some_and(|tok| tok.kind() == SyntaxKind::GetKw);
            if is_get {
                a.syntax()
                    .ancestors()
                    .find_map(ast::PropertyDeclaration::cast)
                    .and_then(|p| p.ty())
                    .map(|t| t.display_text())
            } else {
                Some("void".to_string())
            }
        }
        ExtractionHost::Constructor(_) | ExtractionHost::TopLevel(_) => Some("void".to_string()),
        ExtractionHost::FieldInitializer(_) => None,
    }
}

fn expr_display_name(expr: &ast::Expression) -> String {
    let mut text = expr.syntax().text().to_string();
    if text.len() > 32 {
        text.truncate(32);
        text.push('…');
    }
    text
}

// === Declared-type table and inference ===

/// Best-effort mapping from a local/param *name token* span to its declared
/// type text. Spans (rather than names) keep shadowed declarations distinct.
pub struct TypeTable {
    by_decl_span: HashMap<Span, String>,
    /// Declaration name and position, for resolving simple-name uses to the
    /// nearest preceding declaration.
    decls: Vec<(String, Span)>,
    /// Return types of methods/local functions visible from the selection,
    /// used to infer `var` and expression types.
    method_returns: HashMap<String, String>,
}

impl TypeTable {
    pub fn collect(source: &str, selection: &Selection) -> Self {
        let mut table = TypeTable {
            by_decl_span: HashMap::new(),
            decls: Vec::new(),
            method_returns: HashMap::new(),
        };

        let scope = match &selection.host {
            ExtractionHost::TopLevel(unit) => unit.syntax().clone(),
            host => host.syntax().clone(),
        };

        if let Some(list) = selection.host.parameter_list() {
            for param in list.parameters() {
                if let (Some(tok), Some(ty)) = (param.name_token(), param.ty()) {
                    table.insert(&tok, ty.display_text());
                }
            }
        }

        // Pass 1: explicit declarations.
        let mut var_decls: Vec<(quarry_syntax::SyntaxToken, ast::Expression)> = Vec::new();
        for node in scope.descendants() {
            match node.kind() {
                SyntaxKind::LocalDeclarationStatement => {
                    let decl = ast::LocalDeclarationStatement::cast(node).unwrap();
                    let Some(ty) = decl.ty() else { continue };
                    table.record_declarators(&ty, decl.declarator_list(), &mut var_decls);
                }
                SyntaxKind::ForHeader => {
                    let header = ast::ForHeader::cast(node).unwrap();
                    let Some(ty) = header.ty() else { continue };
                    table.record_declarators(&ty, header.declarator_list(), &mut var_decls);
                }
                SyntaxKind::UsingStatement => {
                    let using = ast::UsingStatement::cast(node).unwrap();
                    let Some(ty) = using.ty() else { continue };
                    table.record_declarators(&ty, using.declarator_list(), &mut var_decls);
                }
                SyntaxKind::FixedStatement => {
                    let fixed = ast::FixedStatement::cast(node).unwrap();
                    let Some(ty) = fixed.ty() else { continue };
                    table.record_declarators(&ty, fixed.declarator_list(), &mut var_decls);
                }
                SyntaxKind::ForeachStatement => {
                    let foreach = ast::ForeachStatement::cast(node).unwrap();
                    if let (Some(ty), Some(tok)) = (foreach.ty(), foreach.name_token()) {
                        let text = ty.display_text();
                        if text != "var" {
                            table.insert(&tok, text);
                        }
                    }
                }
                SyntaxKind::CatchClause => {
                    let catch = ast::CatchClause::cast(node).unwrap();
                    if let (Some(ty), Some(tok)) = (catch.ty(), catch.name_token()) {
                        table.insert(&tok, ty.display_text());
                    }
                }
                SyntaxKind::DeclarationPattern => {
                    let pattern = ast::DeclarationPattern::cast(node).unwrap();
                    if let (Some(ty), Some(tok)) = (pattern.ty(), pattern.name_token()) {
                        let text = ty.display_text();
                        if text != "var" {
                            table.insert(&tok, text);
                        }
                    }
                }
                _ => {}
            }
        }

        // Visible callables: members of the enclosing type plus local
        // functions in scope.
        if let Some(ty) = selection.host.enclosing_type() {
            if let Some(body) = ty.body() {
                for member in body.members() {
                    if let ast::Member::MethodDeclaration(m) = member {
                        if let (Some(tok), Some(ret)) = (m.name_token(), m.return_type()) {
                            table
                                .method_returns
                                .insert(tok.text().to_string(), ret.display_text());
                        }
                    }
                }
            }
        }
        for node in scope.descendants() {
            if node.kind() == SyntaxKind::LocalFunctionStatement {
                let func = ast::LocalFunctionStatement::cast(node).unwrap();
                if let (Some(tok), Some(ret)) = (func.name_token(), func.return_type()) {
                    table
                        .method_returns
                        .insert(tok.text().to_string(), ret.display_text());
                }
            }
        }

        // Pass 2: `var` declarations, inferred from their initializers (which
        // may reference pass-1 declarations).
        for (tok, initializer) in var_decls {
            if let Some(ty) = table.infer(&initializer) {
                table.insert(&tok, ty);
            }
        }

        let _ = source;
        table
    }

    fn record_declarators(
        &mut self,
        ty: &ast::Type,
        list: Option<ast::VariableDeclaratorList>,
        var_decls: &mut Vec<(quarry_syntax::SyntaxToken, ast::Expression)>,
    ) {
        let text = ty.display_text();
        let Some(list) = list else { return };
        for declarator in list.declarators() {
            let Some(tok) = declarator.name_token() else {
                continue;
            };
            if text == "var" {
                if let Some(init) = declarator.initializer() {
                    var_decls.push((tok, init));
                }
            } else {
                self.insert(&tok, text.clone());
            }
        }
    }

    fn insert(&mut self, token: &quarry_syntax::SyntaxToken, ty: String) {
        let range = token_range(token);
        let span = Span::new(range.start, range.end);
        self.decls.push((token.text().to_string(), span));
        self.by_decl_span.insert(span, ty);
    }

    pub fn local_type(&self, body: &Body, local: LocalId) -> Option<String> {
        let data = body.local(local);
        self.by_decl_span.get(&data.span).cloned()
    }

    /// Best-effort expression type inference; `None` means unknown.
    pub fn infer(&self, expr: &ast::Expression) -> Option<String> {
        match expr {
            ast::Expression::LiteralExpression(lit) => {
                let tok = lit.token()?;
                match tok.kind() {
                    SyntaxKind::IntLiteral => Some("int".to_string()),
                    SyntaxKind::LongLiteral => Some("long".to_string()),
                    SyntaxKind::RealLiteral => {
                        let text = tok.text();
                        if text.ends_with('f') || text.ends_with('F') {
                            Some("float".to_string())
                        } else if text.ends_with('m') || text.ends_with('M') {
                            Some("decimal".to_string())
                        } else {
                            Some("double".to_string())
                        }
                    }
                    SyntaxKind::StringLiteral => Some("string".to_string()),
                    SyntaxKind::CharLiteral => Some("char".to_string()),
                    SyntaxKind::TrueKw | SyntaxKind::FalseKw => Some("bool".to_string()),
                    _ => None,
                }
            }
            ast::Expression::ObjectCreationExpression(creation) => {
                creation.ty().map(|t| t.display_text())
            }
            ast::Expression::ArrayCreationExpression(creation) => {
                let ty = creation.ty().map(|t| t.display_text())?;
                if ty.ends_with(']') {
                    Some(ty)
                } else {
                    Some(format!("{ty}[]"))
                }
            }
            ast::Expression::StackAllocExpression(alloc) => {
                let ty = alloc.ty().map(|t| t.display_text())?;
                Some(format!("System.Span<{ty}>"))
            }
            ast::Expression::CastExpression(cast) => cast.ty().map(|t| t.display_text()),
            ast::Expression::InitializerExpression(init) => {
                let first = init.expressions().next()?;
                let element = self.infer(&first)?;
                Some(format!("{element}[]"))
            }
            ast::Expression::ParenthesizedExpression(paren) => {
                self.infer(&paren.expression()?)
            }
            ast::Expression::NameExpression(name) => {
                let tok = name.name_token()?;
                // Nearest preceding declaration with the same name; scopes
                // are approximated by position, which matches how the body
                // lowerer resolved the use.
                let use_start = token_range(&tok).start;
                let mut best: Option<Span> = None;
                for (decl_name, span) in &self.decls {
                    if decl_name == tok.text()
                        && span.start <= use_start
                        && best.is_none_or(|b| span.start > b.start)
                    {
                        best = Some(*span);
                    }
                }
                self.by_decl_span.get(&best?).cloned()
            }
            ast::Expression::InvocationExpression(call) => {
                let callee = call.callee()?;
                match callee {
                    ast::Expression::NameExpression(name) => {
                        let tok = name.name_token()?;
                        self.method_returns.get(tok.text()).cloned()
                    }
                    _ => None,
                }
            }
            ast::Expression::BinaryExpression(binary) => {
                let op = binary
                    .syntax()
                    .children_with_tokens()
                    .filter_map(|el| el.into_token())
                    .find(|tok| !tok.kind().is_trivia() && !tok.kind().is_identifier_like());
                if let Some(op) = &op {
                    if matches!(
                        op.kind(),
                        SyntaxKind::EqEq
                            | SyntaxKind::BangEq
                            | SyntaxKind::Less
                            | SyntaxKind::LessEq
                            | SyntaxKind::Greater
                            | SyntaxKind::GreaterEq
                            | SyntaxKind::AmpAmp
                            | SyntaxKind::PipePipe
                    ) {
                        return Some("bool".to_string());
                    }
                }
                let lhs = binary.lhs().and_then(|e| self.infer(&e));
                let rhs = binary.rhs().and_then(|e| self.infer(&e));
                lhs.or(rhs)
            }
            ast::Expression::ConditionalExpression(cond) => cond
                .then_expr()
                .and_then(|e| self.infer(&e))
                .or_else(|| cond.else_expr().and_then(|e| self.infer(&e))),
            ast::Expression::AwaitExpression(await_expr) => {
                let inner = self.infer(&await_expr.expression()?)?;
                strip_task(&inner)
            }
            ast::Expression::IsPatternExpression(_) => Some("bool".to_string()),
            ast::Expression::UnaryExpression(unary) => {
                let op = unary.op_token()?;
                if op.kind() == SyntaxKind::Bang {
                    return Some("bool".to_string());
                }
                self.infer(&unary.operand()?)
            }
            _ => None,
        }
    }

}

/// Types that an expression carries on its face (no context needed); used by
/// the cast-widening rule.
pub(crate) fn self_evident_type(expr: &ast::Expression) -> Option<String> {
    match expr {
        ast::Expression::LiteralExpression(_)
        | ast::Expression::ObjectCreationExpression(_)
        | ast::Expression::ArrayCreationExpression(_)
        | ast::Expression::CastExpression(_) => Some(String::new()),
        ast::Expression::ParenthesizedExpression(paren) => {
            self_evident_type(&paren.expression()?)
        }
        _ => None,
    }
}

fn strip_task(ty: &str) -> Option<String> {
    let trimmed = ty.trim();
    if trimmed == "Task" || trimmed == "System.Threading.Tasks.Task" || trimmed == "ValueTask" {
        return Some("void".to_string());
    }
    for prefix in ["Task<", "ValueTask<", "System.Threading.Tasks.Task<"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.strip_suffix('>').map(|s| s.to_string());
        }
    }
    Some(trimmed.to_string())
}
