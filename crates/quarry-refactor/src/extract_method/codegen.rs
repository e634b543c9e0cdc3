//! Code generation: the synthesized method/local function and the call-site
//! replacement, as text anchored to the insertion indents.

use std::collections::HashSet;

use quarry_core::reindent;
use quarry_syntax::ast::{self, AstNode};
use quarry_syntax::SyntaxKind;

use crate::edit::TextRange;
use crate::extract_method::analyze::{
    AnalyzerResult, FlowEncoding, FlowKind, ParameterBehavior, ReturnBehavior, VariableInfo,
};
use crate::extract_method::selection::{ExtractionHost, Selection, SelectionKind};
use crate::extract_method::trivia::TriviaSavedResult;
use crate::extract_method::{ExtractMethodError, ExtractMethodOptions, Visibility};

const INDENT_UNIT: &str = "    ";

pub struct CodegenInput<'a> {
    pub source: &'a str,
    pub selection: &'a Selection,
    pub analysis: &'a AnalyzerResult,
    pub trivia: &'a TriviaSavedResult,
    pub options: &'a ExtractMethodOptions,
    /// Indentation of the line the selection starts on.
    pub call_indent: String,
}

pub struct GeneratedCode {
    /// Replacement for the selection span at the call site.
    pub call_site_text: String,
    /// Signature + body of the new definition, one line per entry, without
    /// outer padding (the rewriter adds insertion-point-specific spacing).
    pub definition_lines: Vec<String>,
    pub method_name: String,
    /// Return type as synthesized (before nullable reconciliation).
    pub return_type: String,
}

/// How the multiplexed results come back out of the call.
struct ReturnShape {
    flag_type: Option<&'static str>,
    flag_name: String,
    value_type: Option<String>,
    value_name: String,
    vars: Vec<VariableInfo>,
}

impl ReturnShape {
    fn element_count(&self) -> usize {
        usize::from(self.flag_type.is_some()) + usize::from(self.value_type.is_some())
            + self.vars.len()
    }

    /// `(type, name)` pairs in flag, value, vars order.
    fn elements(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(flag) = self.flag_type {
            out.push((flag.to_string(), self.flag_name.clone()));
        }
        if let Some(value) = &self.value_type {
            out.push((value.clone(), self.value_name.clone()));
        }
        for var in &self.vars {
            out.push((var.ty.clone(), var.name.clone()));
        }
        out
    }

    fn return_type_text(&self) -> String {
        let elements = self.elements();
        match elements.as_slice() {
            [] => "void".to_string(),
            [(ty, _)] => ty.clone(),
            many => {
                let inner = many
                    .iter()
                    .map(|(ty, name)| format!("{ty} {name}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({inner})")
            }
        }
    }

    /// A `return` payload: encoded flag literal, return-value text, then the
    /// current values of the returned variables. `jump_pos` is the source
    /// offset of the exiting jump, if any: a split variable declared after
    /// that point is not in scope there and yields `default` instead.
    fn exit_payload(&self, flag: Option<String>, value: Option<&str>, jump_pos: Option<usize>) -> String {
        let mut parts = Vec::new();
        if self.flag_type.is_some() {
            parts.push(flag.expect("flag literal required when a flag exists"));
        }
        if self.value_type.is_some() {
            parts.push(value.unwrap_or("default").to_string());
        }
        for var in &self.vars {
            let in_scope = !var.declared_inside
                || jump_pos.is_none_or(|pos| var.first_use <= pos);
            parts.push(if in_scope {
                var.name.clone()
            } else {
                "default".to_string()
            });
        }
        match parts.len() {
            0 => "return;".to_string(),
            1 => format!("return {};", parts[0]),
            _ => format!("return ({});", parts.join(", ")),
        }
    }
}

pub fn generate(input: &CodegenInput<'_>) -> Result<GeneratedCode, ExtractMethodError> {
    let shape = return_shape(input);
    let method_name = pick_name(input)?;

    let body_lines = match input.selection.kind {
        SelectionKind::Expression => expression_body(input, &shape)?,
        SelectionKind::SingleStatement | SelectionKind::MultipleStatements => {
            statement_body(input, &shape)
        }
    };
    let body_lines = run_cleanup_passes(body_lines);
    if body_lines.iter().all(|line| line.trim().is_empty()) {
        // Nothing executable survived; refuse rather than emit a hollow
        // method.
        return Err(ExtractMethodError::NoActiveStatement);
    }
    let body_lines = match &input.analysis.wrap_context {
        Some(keyword) => wrap_in_block(body_lines, keyword),
        None => body_lines,
    };

    let return_type = synthesized_return_type(input, &shape);
    let signature = signature_line(input, &method_name, &return_type);

    let mut definition_lines = Vec::with_capacity(body_lines.len() + 3);
    definition_lines.push(signature);
    definition_lines.push("{".to_string());
    for line in body_lines {
        if line.is_empty() {
            definition_lines.push(line);
        } else {
            definition_lines.push(format!("{INDENT_UNIT}{line}"));
        }
    }
    definition_lines.push("}".to_string());

    let call_site_text = call_site(input, &shape, &method_name);

    Ok(GeneratedCode {
        call_site_text,
        definition_lines,
        method_name,
        return_type,
    })
}

// === Return shape ===

fn return_shape(input: &CodegenInput<'_>) -> ReturnShape {
    let analysis = input.analysis;
    let taken = taken_names(input.selection);

    let vars: Vec<VariableInfo> = analysis
        .return_variables()
        .cloned()
        .collect();

    let value_type = if analysis.flow.carries_return_value {
        analysis.enclosing_return_type.clone()
    } else if input.selection.is_expression() {
        analysis
            .expression_type
            .clone()
            .filter(|ty| ty != "void")
    } else {
        None
    };

    ReturnShape {
        flag_type: analysis.flow.flag_type(),
        flag_name: unique_name("flowControl", &taken),
        value_type,
        value_name: unique_name("value", &taken),
        vars,
    }
}

fn taken_names(selection: &Selection) -> HashSet<String> {
    let mut taken = HashSet::new();
    let scope = match &selection.host {
        ExtractionHost::TopLevel(unit) => unit.syntax().clone(),
        host => host.syntax().clone(),
    };
    for tok in scope
        .descendants_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|tok| tok.kind().is_identifier_like())
    {
        taken.insert(tok.text().to_string());
    }
    taken
}

fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}{counter}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

// === Naming ===

fn pick_name(input: &CodegenInput<'_>) -> Result<String, ExtractMethodError> {
    if let Some(name) = &input.options.name {
        if !is_valid_identifier(name) {
            return Err(ExtractMethodError::InvalidMethodName { name: name.clone() });
        }
        if callable_names(input.selection).contains(name) {
            return Err(ExtractMethodError::NameCollision { name: name.clone() });
        }
        return Ok(name.clone());
    }

    let existing = callable_names(input.selection);
    let base = heuristic_name(input);
    let mut name = base.clone();
    let mut counter = 1usize;
    while existing.contains(&name) {
        name = format!("{base}{counter}");
        counter += 1;
    }
    Ok(name)
}

fn heuristic_name(input: &CodegenInput<'_>) -> String {
    let camel = input.options.as_local_function && camel_case_convention(input.selection);

    if let Some(expr) = &input.selection.expression {
        // `var x = <sel>` names the getter after the initialized variable.
        if let Some(declarator) = expr
            .syntax()
            .ancestors()
            .find_map(ast::VariableDeclarator::cast)
        {
            if declarator
                .initializer()
                .is_some_and(|init| init.syntax() == expr.syntax())
            {
                if let Some(tok) = declarator.name_token() {
                    return accessor_name(tok.text(), camel);
                }
            }
        }
        // A (possibly qualified) name gets `Get` + its unqualified segment.
        match expr {
            ast::Expression::NameExpression(name) => {
                if let Some(tok) = name.name_token() {
                    return accessor_name(tok.text(), camel);
                }
            }
            ast::Expression::MemberAccessExpression(access) => {
                if let Some(tok) = access.name_token() {
                    return accessor_name(tok.text(), camel);
                }
            }
            _ => {}
        }
    }

    if camel {
        "newMethod".to_string()
    } else {
        "NewMethod".to_string()
    }
}

fn accessor_name(var: &str, camel: bool) -> String {
    let mut chars = var.chars();
    let pascal: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return "NewMethod".to_string(),
    };
    if camel {
        format!("get{pascal}")
    } else {
        format!("Get{pascal}")
    }
}

/// Existing local functions written in camelCase signal the convention for
/// new local functions.
fn camel_case_convention(selection: &Selection) -> bool {
    let mut saw_any = false;
    let mut all_camel = true;
    let scope = match &selection.host {
        ExtractionHost::TopLevel(unit) => unit.syntax().clone(),
        host => host.syntax().clone(),
    };
    for node in scope.descendants() {
        if node.kind() == SyntaxKind::LocalFunctionStatement {
            if let Some(tok) = ast::LocalFunctionStatement::cast(node).unwrap().name_token() {
                saw_any = true;
                all_camel &= tok.text().chars().next().is_some_and(char::is_lowercase);
            }
        }
    }
    saw_any && all_camel
}

fn callable_names(selection: &Selection) -> HashSet<String> {
    let mut names = HashSet::new();
    if let Some(ty) = selection.host.enclosing_type() {
        if let Some(body) = ty.body() {
            for member in body.members() {
                if let ast::Member::MethodDeclaration(m) = member {
                    if let Some(tok) = m.name_token() {
                        names.insert(tok.text().to_string());
                    }
                }
            }
        }
    }
    let scope = match &selection.host {
        ExtractionHost::TopLevel(unit) => unit.syntax().clone(),
        host => host.syntax().clone(),
    };
    for node in scope.descendants() {
        if node.kind() == SyntaxKind::LocalFunctionStatement {
            if let Some(tok) = ast::LocalFunctionStatement::cast(node).unwrap().name_token() {
                names.insert(tok.text().to_string());
            }
        }
    }
    names
}

fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let tokens = quarry_syntax::lex(name);
    match tokens.as_slice() {
        [tok, eof] => {
            eof.kind == SyntaxKind::Eof
                && tok.kind.is_identifier_like()
                && !(tok.kind.is_keyword() && !tok.kind.is_contextual_keyword())
        }
        _ => false,
    }
}

// === Signature ===

fn synthesized_return_type(input: &CodegenInput<'_>, shape: &ReturnShape) -> String {
    let core = shape.return_type_text();
    if input.analysis.is_async {
        if core == "void" {
            "Task".to_string()
        } else {
            format!("Task<{core}>")
        }
    } else {
        core
    }
}

fn signature_line(input: &CodegenInput<'_>, name: &str, return_type: &str) -> String {
    let analysis = input.analysis;
    let mut parts: Vec<String> = Vec::new();

    if input.options.as_local_function {
        // Everything the body touches is passed explicitly, so the local
        // function can be static whenever no instance state is involved —
        // provided the language version has static local functions at all.
        if input.options.prefer_static_local_function
            && input.options.supports_static_local_functions
            && !analysis.uses_instance_member
        {
            parts.push("static".to_string());
        }
    } else {
        let keyword = input.options.visibility.keyword();
        if !keyword.is_empty() {
            parts.push(keyword.to_string());
        }
        if analysis.static_context {
            parts.push("static".to_string());
        }
        if analysis.should_be_readonly {
            parts.push("readonly".to_string());
        }
    }
    if analysis.is_unsafe {
        parts.push("unsafe".to_string());
    }
    if analysis.is_async {
        parts.push("async".to_string());
    }

    parts.push(return_type.to_string());

    let type_params = if analysis.type_parameters.is_empty() {
        String::new()
    } else {
        format!("<{}>", analysis.type_parameters.join(", "))
    };

    let params = analysis
        .parameters()
        .map(|p| match p.parameter_behavior {
            ParameterBehavior::Ref => format!("ref {} {}", p.ty, p.name),
            ParameterBehavior::Out => format!("out {} {}", p.ty, p.name),
            _ => format!("{} {}", p.ty, p.name),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("{} {name}{type_params}({params})", parts.join(" "))
}

// === Bodies ===

fn expression_body(
    input: &CodegenInput<'_>,
    shape: &ReturnShape,
) -> Result<Vec<String>, ExtractMethodError> {
    let expr = input
        .selection
        .expression
        .as_ref()
        .expect("expression selection carries its expression");
    let range = input.selection.final_range;
    let text = &input.source[range.start..range.end];

    // A bare array initializer is not an expression on its own; rebuild it
    // as an inferred array creation.
    let text = if matches!(expr, ast::Expression::InitializerExpression(_)) {
        match input.analysis.expression_type.as_deref() {
            Some(ty) if ty.ends_with("[]") => {
                format!("new {ty} {text}")
            }
            _ => format!("new[] {text}"),
        }
    } else {
        text.to_string()
    };

    if shape.value_type.is_some() {
        Ok(vec![format!("return {text};")])
    } else {
        Ok(vec![format!("{text};")])
    }
}

fn statement_body(input: &CodegenInput<'_>, shape: &ReturnShape) -> Vec<String> {
    let analysis = input.analysis;
    let extract = input.trivia.extract_range;
    let mut text = input.source[extract.start..extract.end].to_string();

    // Control-flow conversion: rewrite escaping jumps back-to-front so
    // earlier offsets stay valid.
    let mut jumps = analysis.exit_jumps.clone();
    jumps.sort_by_key(|j| std::cmp::Reverse(j.range.start));
    for jump in &jumps {
        let Some(replacement) =
            exit_replacement(input, shape, jump.kind, jump.range.start, jump.value_range)
        else {
            continue;
        };
        let start = jump.range.start - extract.start;
        let end = jump.range.end - extract.start;
        text.replace_range(start..end, &replacement);
    }

    let reindented = reindent(&text, &input.call_indent, "");
    let mut lines: Vec<String> = reindented.lines().map(|l| l.to_string()).collect();

    // Declaration moved out of the parameter list: a promoted-out return
    // variable is declared at the top of the new body. (A promoted `ref`
    // still arrives as a value parameter and needs no declaration.)
    for var in &shape.vars {
        if !var.declared_inside
            && var.return_behavior == ReturnBehavior::Assignment
            && var.parameter_behavior == ParameterBehavior::None
        {
            lines.insert(0, format!("{} {};", var.ty, var.name));
        }
    }

    // Terminal return for the natural fall-through path.
    if analysis.flow.has_fallthrough && shape.element_count() > 0 {
        let flag = analysis
            .flow
            .needs_flag()
            .then(|| analysis.flow.fallthrough_value());
        lines.push(shape.exit_payload(flag, None, None));
    }

    lines
}

/// Replacement text for one escaping jump, or `None` to leave it untouched.
fn exit_replacement(
    input: &CodegenInput<'_>,
    shape: &ReturnShape,
    kind: FlowKind,
    jump_start: usize,
    value_range: Option<TextRange>,
) -> Option<String> {
    let flow = &input.analysis.flow;
    let value_text = value_range.map(|r| input.source[r.start..r.end].to_string());
    let at = Some(jump_start);

    if flow.needs_flag() {
        if kind == FlowKind::Return && flow.return_passes_through {
            // Fall-through and return meet: the jump takes the fall-through
            // encoding.
            return Some(shape.exit_payload(Some(flow.fallthrough_value()), None, at));
        }
        let flag = flow.encoded_value(kind);
        return Some(shape.exit_payload(Some(flag), value_text.as_deref(), at));
    }

    match flow.unconditional {
        Some(unconditional) if unconditional == kind => match kind {
            // The extracted method returns the enclosing value directly.
            FlowKind::Return => None,
            FlowKind::Break | FlowKind::Continue => Some(shape.exit_payload(None, None, at)),
        },
        _ => {
            // Pass-through returns re-issue unchanged.
            None
        }
    }
}

fn wrap_in_block(lines: Vec<String>, keyword: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + 3);
    out.push(format!("{keyword}"));
    out.push("{".to_string());
    for line in lines {
        if line.is_empty() {
            out.push(line);
        } else {
            out.push(format!("{INDENT_UNIT}{line}"));
        }
    }
    out.push("}".to_string());
    out
}

// === Call site ===

fn call_site(input: &CodegenInput<'_>, shape: &ReturnShape, name: &str) -> String {
    let analysis = input.analysis;
    let args = analysis
        .parameters()
        .map(|p| match p.parameter_behavior {
            ParameterBehavior::Ref => format!("ref {}", p.name),
            ParameterBehavior::Out => format!("out {}", p.name),
            _ => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut call = format!("{name}({args})");
    if analysis.is_async {
        if analysis.await_configured {
            call = format!("await {call}.ConfigureAwait(false)");
        } else {
            call = format!("await {call}");
        }
    }

    if input.selection.is_expression() {
        return call;
    }

    let mut lines = call_site_lines(input, shape, &call);
    lines = merge_adjacent_declarations(lines);

    // The first line replaces text mid-line; subsequent lines carry the call
    // site's indentation.
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&input.call_indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn call_site_lines(input: &CodegenInput<'_>, shape: &ReturnShape, call: &str) -> Vec<String> {
    let flow = &input.analysis.flow;

    let mut lines = match shape.element_count() {
        0 => vec![format!("{call};")],
        1 if shape.flag_type.is_some() => {
            // Flag only: dispatch straight off the call result.
            dispatch(flow, shape, call, true)
        }
        1 if shape.value_type.is_some() => {
            // The call produces the enclosing return value directly.
            return vec![format!("return {call};")];
        }
        1 => {
            let var = &shape.vars[0];
            match var.return_behavior {
                ReturnBehavior::Initialization => {
                    vec![format!("{} {} = {call};", var.ty, var.name)]
                }
                _ => vec![format!("{} = {call};", var.name)],
            }
        }
        _ => {
            let elements = shape
                .elements()
                .iter()
                .map(|(ty, name)| format!("{ty} {name}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut lines = vec![format!("({elements}) = {call};")];
            if shape.flag_type.is_some() {
                lines.extend(dispatch(flow, shape, &shape.flag_name, false));
            }
            lines
        }
    };

    // Every path through the selection exited the same way: re-issue the
    // jump unconditionally after the call.
    if let Some(kind) = flow.unconditional {
        lines.push(kind.jump_text().to_string());
    }
    lines
}

/// Post-invocation control-flow dispatch: re-issue the encoded jump.
///
/// `condition_is_call` inlines the call into the `if` for the common
/// boolean single-kind form (`if (NewMethod()) break;`).
fn dispatch(
    flow: &crate::extract_method::analyze::FlowControlInformation,
    shape: &ReturnShape,
    flag_expr: &str,
    condition_is_call: bool,
) -> Vec<String> {
    let jump_stmt = |kind: FlowKind| -> String {
        match kind {
            FlowKind::Return if shape.value_type.is_some() => {
                format!("return {};", shape.value_name)
            }
            kind => kind.jump_text().to_string(),
        }
    };

    match flow.encoding {
        FlowEncoding::None => Vec::new(),
        FlowEncoding::Boolean => {
            let kinds = &flow.encoded_kinds;
            if kinds.len() == 1 {
                vec![format!("if ({flag_expr}) {}", jump_stmt(kinds[0]))]
            } else {
                let mut lines = vec![format!("if ({flag_expr})"), "{".to_string()];
                lines.push(format!("{INDENT_UNIT}{}", jump_stmt(kinds[0])));
                lines.push("}".to_string());
                lines.push("else".to_string());
                lines.push("{".to_string());
                lines.push(format!("{INDENT_UNIT}{}", jump_stmt(kinds[1])));
                lines.push("}".to_string());
                lines
            }
        }
        FlowEncoding::NullableBoolean | FlowEncoding::Integer => {
            let mut lines = Vec::new();
            let needs_local = condition_is_call;
            let flag_name = if needs_local {
                let ty = shape.flag_type.unwrap_or("var");
                lines.push(format!("{ty} {} = {flag_expr};", shape.flag_name));
                shape.flag_name.clone()
            } else {
                flag_expr.to_string()
            };

            for (idx, kind) in flow.encoded_kinds.iter().enumerate() {
                let comparison = match flow.encoding {
                    FlowEncoding::NullableBoolean => match idx {
                        0 => format!("{flag_name} == true"),
                        1 => format!("{flag_name} == false"),
                        _ => format!("{flag_name} == null"),
                    },
                    _ => format!("{flag_name} == {}", idx + 1),
                };
                let keyword = if idx == 0 { "if" } else { "else if" };
                lines.push(format!("{keyword} ({comparison})"));
                lines.push("{".to_string());
                lines.push(format!("{INDENT_UNIT}{}", jump_stmt(*kind)));
                lines.push("}".to_string());
            }
            lines
        }
    }
}

// === Cleanup passes ===
//
// Each pass is idempotent; running the battery on its own output is a no-op.

pub fn run_cleanup_passes(lines: Vec<String>) -> Vec<String> {
    let lines = remove_redundant_block(lines);
    let lines = merge_declaration_and_assignment(lines);
    let lines = merge_declaration_and_return(lines);
    merge_adjacent_declarations(lines)
}

/// `{ stmt... }` as the entire body unwraps to its statements.
pub fn remove_redundant_block(lines: Vec<String>) -> Vec<String> {
    // A block that sat on one line keeps its statements on that line.
    if let [only] = lines.as_slice() {
        if let Some(inner) = only
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            let inner = inner.trim();
            if !inner.is_empty() {
                return vec![inner.to_string()];
            }
        }
        return lines;
    }
    if lines.len() < 2 || lines.first().map(String::as_str) != Some("{") {
        return lines;
    }
    if lines.last().map(String::as_str) != Some("}") {
        return lines;
    }
    lines[1..lines.len() - 1]
        .iter()
        .map(|line| {
            line.strip_prefix(INDENT_UNIT)
                .unwrap_or(line)
                .to_string()
        })
        .collect()
}

/// `T x;` directly followed by `x = expr;` collapses to `T x = expr;`.
pub fn merge_declaration_and_assignment(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter().peekable();
    while let Some(line) = iter.next() {
        if let Some(name) = bare_declaration_name(&line) {
            if let Some(next) = iter.peek() {
                let prefix = format!("{name} = ");
                if next.starts_with(&prefix) && next.ends_with(';') {
                    let decl = line.strip_suffix(';').unwrap_or(&line);
                    let value = &next[prefix.len()..];
                    out.push(format!("{decl} = {value}"));
                    iter.next();
                    continue;
                }
            }
        }
        out.push(line);
    }
    out
}

/// `T x = expr;` directly followed by `return x;` collapses to
/// `return expr;` — except for stack allocations, which cannot flow through
/// an intermediate expression position.
pub fn merge_declaration_and_return(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter().peekable();
    while let Some(line) = iter.next() {
        if let Some((name, value)) = initialized_declaration(&line) {
            let expected = format!("return {name};");
            if !value.trim_start().starts_with("stackalloc")
                && iter.peek().map(String::as_str) == Some(expected.as_str())
            {
                out.push(format!("return {value};"));
                iter.next();
                continue;
            }
        }
        out.push(line);
    }
    out
}

/// Adjacent uninitialized declarations of the same type merge into one
/// comma-form declaration. Only plain, modifier-free declarations with
/// nothing but whitespace between them participate; anything else might own
/// meaningful trivia.
pub fn merge_adjacent_declarations(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if let (Some((prev_ty, prev_names)), Some((ty, name))) = (
            out.last().and_then(|l| bare_declaration_parts(l)),
            bare_declaration_parts(&line),
        ) {
            if prev_ty == ty {
                let merged = format!("{ty} {}, {};", prev_names, name);
                *out.last_mut().expect("peeked above") = merged;
                continue;
            }
        }
        out.push(line);
    }
    out
}

/// `T x;` → `x` (no initializer, no modifiers, not const).
fn bare_declaration_name(line: &str) -> Option<&str> {
    let (_, names) = bare_declaration_parts(line)?;
    if names.contains(',') {
        return None;
    }
    Some(names)
}

fn bare_declaration_parts(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_suffix(';')?;
    if body.contains('=') || body.contains('(') {
        return None;
    }
    let (ty, names) = body.split_at(body.find(' ')?);
    let names = names.trim();
    if ty.is_empty() || names.is_empty() {
        return None;
    }
    if matches!(ty, "const" | "static" | "readonly" | "ref" | "out") {
        return None;
    }
    if !names
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == ',' || c == ' ')
    {
        return None;
    }
    Some((ty, names))
}

/// `T x = expr;` → (`x`, `expr`).
fn initialized_declaration(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_suffix(';')?;
    let eq = body.find('=')?;
    let (decl, value) = body.split_at(eq);
    let value = value[1..].trim();
    let decl = decl.trim();
    let mut parts = decl.split_whitespace();
    let ty = parts.next()?;
    let name = parts.next()?;
    if parts.next().is_some() || ty == "return" {
        return None;
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, value))
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_assignment_merge_is_idempotent() {
        let lines = vec!["int r;".to_string(), "r = a + b;".to_string()];
        let merged = merge_declaration_and_assignment(lines);
        assert_eq!(merged, vec!["int r = a + b;"]);
        assert_eq!(merge_declaration_and_assignment(merged.clone()), merged);
    }

    #[test]
    fn declaration_return_merge_skips_stackalloc() {
        let lines = vec![
            "Span<int> s = stackalloc int[4];".to_string(),
            "return s;".to_string(),
        ];
        assert_eq!(merge_declaration_and_return(lines.clone()), lines);

        let lines = vec!["int r = a + b;".to_string(), "return r;".to_string()];
        let merged = merge_declaration_and_return(lines);
        assert_eq!(merged, vec!["return a + b;"]);
        assert_eq!(merge_declaration_and_return(merged.clone()), merged);
    }

    #[test]
    fn redundant_block_unwrap_is_idempotent() {
        let lines = vec![
            "{".to_string(),
            "    Foo();".to_string(),
            "}".to_string(),
        ];
        let unwrapped = remove_redundant_block(lines);
        assert_eq!(unwrapped, vec!["Foo();"]);
        assert_eq!(remove_redundant_block(unwrapped.clone()), unwrapped);
    }

    #[test]
    fn adjacent_declarations_merge_only_same_type() {
        let lines = vec![
            "int a;".to_string(),
            "int b;".to_string(),
            "string c;".to_string(),
        ];
        let merged = merge_adjacent_declarations(lines);
        assert_eq!(merged, vec!["int a, b;", "string c;"]);
        assert_eq!(merge_adjacent_declarations(merged.clone()), merged);
    }

    #[test]
    fn initialized_declarations_do_not_merge() {
        let lines = vec!["int a = 1;".to_string(), "int b;".to_string()];
        assert_eq!(merge_adjacent_declarations(lines.clone()), lines);
    }
}
