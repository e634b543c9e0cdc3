use quarry_core::Name;
use quarry_syntax::ast::{self, AstNode};
use quarry_syntax::parse_csharp;

use crate::body::{Body, ExprKind, LocalKind, StmtKind};
use crate::body_lowering::lower_flow_body_with;

fn lower_first_method(source: &str) -> Body {
    let parsed = parse_csharp(source);
    assert_eq!(parsed.errors, vec![], "fixture should parse cleanly");
    let root = parsed.syntax();
    let method = root
        .descendants()
        .find_map(ast::MethodDeclaration::cast)
        .expect("fixture has a method");
    let params = method
        .parameter_list()
        .into_iter()
        .flat_map(|list| list.parameters().collect::<Vec<_>>())
        .filter_map(|p| {
            let tok = p.name_token()?;
            let range = tok.text_range();
            Some((
                Name::new(tok.text()),
                quarry_core::Span::new(
                    u32::from(range.start()) as usize,
                    u32::from(range.end()) as usize,
                ),
            ))
        })
        .collect();
    lower_flow_body_with(&method.body().expect("method has a body"), params, &mut || {})
}

fn local_names(body: &Body, kind: LocalKind) -> Vec<String> {
    body.locals()
        .iter()
        .filter(|l| l.kind == kind)
        .map(|l| l.name.as_str().to_string())
        .collect()
}

#[test]
fn parameters_become_param_locals() {
    let body = lower_first_method("class C { void M(int a, ref int b) { a = b; } }");
    assert_eq!(local_names(&body, LocalKind::Param), vec!["a", "b"]);
}

#[test]
fn declarations_bind_in_order_and_scope() {
    let body = lower_first_method(
        "class C { void M() { int x = 1; { int y = x; } int z = x; } }",
    );
    assert_eq!(local_names(&body, LocalKind::Local), vec!["x", "y", "z"]);
}

#[test]
fn assignment_statement_lowers_to_assign() {
    let body = lower_first_method("class C { void M(int a) { a = 1; } }");
    let found = body.stmt_ids().any(|id| {
        matches!(
            body.stmt(id).kind,
            StmtKind::Assign { target, .. }
                if body.local(target).name.as_str() == "a"
        )
    });
    assert!(found, "expected an Assign statement targeting `a`");
}

#[test]
fn compound_assignment_reads_its_target() {
    let body = lower_first_method("class C { void M(int a) { a += 2; } }");
    // The synthesized value expression must read `a`.
    let reads_a = body.expr_ids().any(|id| {
        matches!(
            body.expr(id).kind,
            ExprKind::Local(local) if body.local(local).name.as_str() == "a"
        )
    });
    assert!(reads_a, "compound assignment should read the target");
}

#[test]
fn out_argument_is_a_by_ref_write() {
    let body = lower_first_method("class C { void M(int a) { F(out a); } }");
    let found = body.expr_ids().any(|id| {
        matches!(
            body.expr(id).kind,
            ExprKind::ByRefArg { target: Some(local), is_out: true }
                if body.local(local).name.as_str() == "a"
        )
    });
    assert!(found, "expected an out-argument write of `a`");
}

#[test]
fn out_var_argument_declares_a_local() {
    let body = lower_first_method("class C { void M() { F(out var x); Use(x); } }");
    assert_eq!(local_names(&body, LocalKind::Local), vec!["x"]);
}

#[test]
fn foreach_declares_the_iteration_variable() {
    let body = lower_first_method(
        "class C { void M(int[] xs) { foreach (int x in xs) { Use(x); } } }",
    );
    assert_eq!(local_names(&body, LocalKind::Local), vec!["x"]);
    let found = body
        .stmt_ids()
        .any(|id| matches!(body.stmt(id).kind, StmtKind::Foreach { .. }));
    assert!(found);
}

#[test]
fn shadowed_names_resolve_to_the_inner_local() {
    let body = lower_first_method(
        "class C { void M(int x) { { int x = 2; Use(x); } } }",
    );
    // Two distinct locals named `x`.
    let count = body
        .locals()
        .iter()
        .filter(|l| l.name.as_str() == "x")
        .count();
    assert_eq!(count, 2);
}

#[test]
fn bare_rethrow_lowers_to_throw_none() {
    let body = lower_first_method(
        "class C { void M() { try { } catch (System.Exception e) { throw; } } }",
    );
    let found = body
        .stmt_ids()
        .any(|id| matches!(body.stmt(id).kind, StmtKind::Throw(None)));
    assert!(found);
}
