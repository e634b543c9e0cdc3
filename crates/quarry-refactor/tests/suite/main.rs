mod expression;
mod extract_method;
mod flow_control;
mod refusals;

use std::collections::BTreeMap;

use quarry_refactor::extract_method::{
    ExtractMethod, ExtractMethodError, ExtractMethodOptions, ExtractMethodOutcome,
};
use quarry_refactor::{apply_workspace_edit, FileId};
use quarry_test_utils::extract_range;

pub fn options_named(name: &str) -> ExtractMethodOptions {
    ExtractMethodOptions {
        name: Some(name.to_string()),
        ..ExtractMethodOptions::default()
    }
}

pub fn run(fixture: &str, options: ExtractMethodOptions) -> (String, ExtractMethodOutcome) {
    let (source, selection) = extract_range(fixture);
    let refactoring = ExtractMethod {
        file: "Main.cs".to_string(),
        selection,
        options,
    };
    let outcome = refactoring.apply(&source).expect("apply should succeed");

    let mut files = BTreeMap::new();
    let file_id = FileId::new("Main.cs");
    files.insert(file_id.clone(), source);
    let out = apply_workspace_edit(&files, &outcome.edit).expect("apply workspace edit");
    let text = out.get(&file_id).cloned().expect("file must exist");

    // The rewrite must never introduce syntax errors (pre-existing errors
    // would have refused the extraction already).
    let reparsed = quarry_syntax::parse_csharp(&text);
    assert_eq!(reparsed.errors, vec![], "rewrite produced invalid syntax:\n{text}");

    // The caret target points at the new method's name.
    assert_eq!(
        &text[outcome.name_range.start..outcome.name_range.end],
        outcome.method_name,
        "name range must cover the new method's name in:\n{text}"
    );

    (text, outcome)
}

pub fn apply_named(fixture: &str, name: &str) -> String {
    run(fixture, options_named(name)).0
}

pub fn error_of(fixture: &str, options: ExtractMethodOptions) -> ExtractMethodError {
    let (source, selection) = extract_range(fixture);
    let refactoring = ExtractMethod {
        file: "Main.cs".to_string(),
        selection,
        options,
    };
    refactoring
        .apply(&source)
        .expect_err("extraction should be refused")
}
