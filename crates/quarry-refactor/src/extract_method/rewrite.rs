//! Final rewrite: choose the insertion point, splice the generated
//! definition, replace the call site, and reconcile the nullable annotation
//! on the synthesized return type.

use quarry_core::{indentation_at, line_start_offset};
use quarry_syntax::ast::AstNode;

use crate::edit::{FileId, TextEdit, TextRange, WorkspaceEdit};
use crate::extract_method::codegen::GeneratedCode;
use crate::extract_method::selection::{ExtractionHost, Selection};
use crate::extract_method::trivia::TriviaSavedResult;
use crate::extract_method::{
    node_range, token_range, ExtractMethodError, ExtractMethodOptions, ExtractMethodOutcome,
    ExtractStatus, InsertionStrategy,
};

/// Where the synthesized definition is spliced in.
#[derive(Debug, Clone)]
pub struct InsertionPoint {
    pub offset: usize,
    /// Indentation of the definition's signature line.
    pub indent: String,
}

pub fn insertion_point(
    source: &str,
    selection: &Selection,
    options: &ExtractMethodOptions,
) -> Result<InsertionPoint, ExtractMethodError> {
    if options.as_local_function {
        return local_function_insertion(source, selection);
    }

    let member = selection
        .host
        .member_node()
        .ok_or(ExtractMethodError::InvalidContext)?;
    let member_range = node_range(&member);
    let indent = indentation_at(source, member_range.start);

    let offset = match options.insertion_strategy {
        InsertionStrategy::AfterEnclosingMember => member_range.end,
        InsertionStrategy::EndOfType => {
            let ty = selection
                .host
                .enclosing_type()
                .ok_or(ExtractMethodError::InvalidContext)?;
            end_of_type_offset(source, &ty)
        }
    };

    Ok(InsertionPoint { offset, indent })
}

fn local_function_insertion(
    source: &str,
    selection: &Selection,
) -> Result<InsertionPoint, ExtractMethodError> {
    match &selection.host {
        ExtractionHost::TopLevel(unit) => {
            let last = unit
                .global_statements()
                .last()
                .ok_or(ExtractMethodError::InvalidContext)?;
            Ok(InsertionPoint {
                offset: node_range(last.syntax()).end,
                indent: String::new(),
            })
        }
        host => {
            let body = host.body().ok_or(ExtractMethodError::InvalidContext)?;
            let close = body
                .syntax()
                .last_token()
                .filter(|tok| tok.text() == "}")
                .ok_or(ExtractMethodError::InvalidContext)?;
            let close_start = token_range(&close).start;
            let line_start = line_start_offset(source, close_start);

            let indent = body
                .statements()
                .next()
                .map(|stmt| {
                    let start = node_range(stmt.syntax()).start;
                    indentation_at(source, start)
                })
                .unwrap_or_else(|| {
                    let host_indent = indentation_at(source, node_range(host.syntax()).start);
                    format!("{host_indent}    ")
                });

            Ok(InsertionPoint {
                offset: line_start.saturating_sub(1),
                indent,
            })
        }
    }
}

fn end_of_type_offset(source: &str, ty: &quarry_syntax::ast::TypeDeclaration) -> usize {
    let Some(body) = ty.body() else {
        return node_range(ty.syntax()).end;
    };
    let close = body
        .syntax()
        .last_token()
        .filter(|tok| tok.text() == "}")
        .map(|tok| token_range(&tok).start)
        .unwrap_or_else(|| node_range(body.syntax()).end);
    line_start_offset(source, close).saturating_sub(1)
}

/// Assemble the workspace edit and post-edit caret target.
pub fn apply(
    file: &FileId,
    source: &str,
    trivia: &TriviaSavedResult,
    generated: GeneratedCode,
    insertion: &InsertionPoint,
    best_effort: Option<String>,
) -> Result<ExtractMethodOutcome, ExtractMethodError> {
    let mut definition_lines = generated.definition_lines;
    reconcile_nullable_return(&mut definition_lines, &generated.return_type);

    let mut method_text = String::new();
    method_text.push_str("\n\n");
    for (idx, line) in definition_lines.iter().enumerate() {
        if idx > 0 {
            method_text.push('\n');
        }
        if !line.is_empty() {
            method_text.push_str(&insertion.indent);
        }
        method_text.push_str(line);
    }

    let name_in_method = find_name_offset(&method_text, &generated.method_name)
        .ok_or(ExtractMethodError::NoActiveStatement)?;

    let call_range = trivia.call_site_range;
    let replacement_len = generated.call_site_text.len();

    let mut edit = WorkspaceEdit::new(vec![
        TextEdit::replace(file.clone(), call_range, generated.call_site_text),
        TextEdit::insert(file.clone(), insertion.offset, method_text.clone()),
    ]);
    edit.normalize().map_err(ExtractMethodError::Edit)?;

    // Caret target in the post-edit document: account for the size change of
    // any edit that lands before the insertion offset.
    let mut name_offset = insertion.offset + name_in_method;
    if call_range.end <= insertion.offset {
        name_offset = name_offset + replacement_len - call_range.len();
    }
    let name_range = TextRange::new(name_offset, name_offset + generated.method_name.len());

    debug_assert!(insertion.offset <= source.len());

    Ok(ExtractMethodOutcome {
        edit,
        method_name: generated.method_name,
        name_range,
        status: match best_effort {
            Some(message) => ExtractStatus::BestEffort { message },
            None => ExtractStatus::Applied,
        },
    })
}

/// Narrow a provisionally nullable-annotated return type when every `return`
/// in the generated body provably produces a non-null value.
fn reconcile_nullable_return(lines: &mut [String], return_type: &str) {
    let Some(narrowed) = return_type.strip_suffix('?') else {
        return;
    };
    // Flag encodings use `bool?` deliberately; only single-value returns
    // participate.
    if return_type == "bool?" && lines.iter().any(|l| l.trim() == "return null;") {
        return;
    }

    let mut saw_return = false;
    for line in lines.iter().skip(1) {
        let trimmed = line.trim();
        let Some(operand) = trimmed
            .strip_prefix("return ")
            .and_then(|rest| rest.strip_suffix(';'))
        else {
            if trimmed == "return;" {
                return;
            }
            continue;
        };
        saw_return = true;
        if !provably_non_null(operand) {
            return;
        }
    }
    if !saw_return {
        return;
    }

    let signature = &mut lines[0];
    if let Some(pos) = signature.find(return_type) {
        signature.replace_range(pos..pos + return_type.len(), narrowed);
    }
}

fn provably_non_null(operand: &str) -> bool {
    let operand = operand.trim();
    if operand == "null" || operand == "default" || operand.starts_with("default(") {
        return false;
    }
    operand.starts_with("new ")
        || operand.starts_with('"')
        || operand.starts_with('\'')
        || operand.starts_with("$\"")
        || operand
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
        || operand == "true"
        || operand == "false"
}

/// Offset of the method name token inside the generated text: the name
/// followed by `(` or `<` on the signature line.
fn find_name_offset(method_text: &str, name: &str) -> Option<usize> {
    let mut search_from = 0usize;
    while let Some(pos) = method_text[search_from..].find(name) {
        let abs = search_from + pos;
        let after = method_text[abs + name.len()..].chars().next();
        if matches!(after, Some('(') | Some('<')) {
            return Some(abs);
        }
        search_from = abs + name.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_return_narrows_on_provably_non_null_returns() {
        let mut lines = vec![
            "private string? Render()".to_string(),
            "{".to_string(),
            "    return \"done\";".to_string(),
            "}".to_string(),
        ];
        reconcile_nullable_return(&mut lines, "string?");
        assert_eq!(lines[0], "private string Render()");
    }

    #[test]
    fn nullable_return_kept_when_null_flows() {
        let mut lines = vec![
            "private string? Render()".to_string(),
            "{".to_string(),
            "    return null;".to_string(),
            "}".to_string(),
        ];
        reconcile_nullable_return(&mut lines, "string?");
        assert_eq!(lines[0], "private string? Render()");
    }

    #[test]
    fn nullable_return_kept_for_variable_operands() {
        let mut lines = vec![
            "private string? Render()".to_string(),
            "{".to_string(),
            "    return text;".to_string(),
            "}".to_string(),
        ];
        reconcile_nullable_return(&mut lines, "string?");
        assert_eq!(lines[0], "private string? Render()");
    }

    #[test]
    fn name_offset_skips_modifier_collisions() {
        let text = "\n\n    private static int Get(int value)";
        assert_eq!(find_name_offset(text, "Get"), Some(25));
    }
}
