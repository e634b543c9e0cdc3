use quarry_core::{Name, Span};
use quarry_hir::{lower_flow_body_with, Body, LocalId};
use quarry_syntax::ast::{self, AstNode};
use quarry_syntax::parse_csharp;

use crate::{build_cfg_with, region_facts};

/// Lower the first method body of `source`; the region is delimited with
/// `/*<*/` and `/*>*/` markers (inclusive of the statements between them).
fn lower_with_region(source: &str) -> (Body, Span) {
    let open = source.find("/*<*/").expect("missing /*<*/ marker") + "/*<*/".len();
    let close = source.find("/*>*/").expect("missing /*>*/ marker");
    let region = Span::new(open, close);

    let parsed = parse_csharp(source);
    assert_eq!(parsed.errors, vec![], "fixture should parse cleanly");
    let method = parsed
        .syntax()
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
                Span::new(u32::from(range.start()) as usize, u32::from(range.end()) as usize),
            ))
        })
        .collect();
    let body = lower_flow_body_with(&method.body().unwrap(), params, &mut || {});
    (body, region)
}

fn names(body: &Body, ids: impl IntoIterator<Item = LocalId>) -> Vec<String> {
    let mut out: Vec<String> = ids
        .into_iter()
        .map(|id| body.local(id).name.as_str().to_string())
        .collect();
    out.sort();
    out
}

#[test]
fn cfg_has_reachable_entry() {
    let (body, _region) = lower_with_region(
        "class C { void M(int a) { /*<*/a = 1;/*>*/ } }",
    );
    let cfg = build_cfg_with(&body, &mut || {});
    let reachable = cfg.reachable_blocks_with(&mut || {});
    assert!(reachable[cfg.entry.index()]);
}

#[test]
fn reads_and_writes_inside_region() {
    let (body, region) = lower_with_region(
        "class C { void M(int a, int b) { int c = 0; /*<*/c = a + b;/*>*/ Use(c); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert_eq!(names(&body, facts.reads_inside.clone()), vec!["a", "b"]);
    assert_eq!(names(&body, facts.writes_inside.clone()), vec!["c"]);
}

#[test]
fn live_after_sees_later_reads() {
    let (body, region) = lower_with_region(
        "class C { void M(int a) { int c = 0; /*<*/c = a;/*>*/ Use(c); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert_eq!(names(&body, facts.live_after.clone()), vec!["c"]);
}

#[test]
fn dead_after_region_is_not_live() {
    let (body, region) = lower_with_region(
        "class C { void M(int a) { int c = 0; /*<*/c = a;/*>*/ } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert!(facts.live_after.is_empty(), "{:?}", facts.live_after);
}

#[test]
fn declared_inside_is_span_based() {
    let (body, region) = lower_with_region(
        "class C { void M() { /*<*/int x = 1; Use(x);/*>*/ int y = 2; Use(y); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert_eq!(names(&body, facts.declared_inside.clone()), vec!["x"]);
}

#[test]
fn reads_are_ordered_by_first_use() {
    let (body, region) = lower_with_region(
        "class C { void M(int a, int b) { /*<*/Use(b); Use(a + b);/*>*/ } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    let ordered: Vec<String> = facts
        .reads_inside
        .iter()
        .map(|id| body.local(*id).name.as_str().to_string())
        .collect();
    assert_eq!(ordered, vec!["b", "a"]);
}

#[test]
fn branch_assignment_is_not_definite() {
    let (body, region) = lower_with_region(
        "class C { void M(int a) { int c; /*<*/if (a > 0) { c = 1; }/*>*/ Use(c); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert!(names(&body, facts.always_assigned.clone()).is_empty());
    assert_eq!(names(&body, facts.writes_inside.clone()), vec!["c"]);
}

#[test]
fn both_branches_assignment_is_definite() {
    let (body, region) = lower_with_region(
        "class C { void M(int a) { int c; /*<*/if (a > 0) { c = 1; } else { c = 2; }/*>*/ Use(c); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert_eq!(names(&body, facts.always_assigned.clone()), vec!["c"]);
}

#[test]
fn loop_carried_variable_is_live_after_loop_body_region() {
    // Selecting the loop body: `total` is read again on the next iteration.
    let (body, region) = lower_with_region(
        "class C { void M(int n) { int total = 0; for (int i = 0; i < n; i++) { /*<*/total += i;/*>*/ } Use(total); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert!(names(&body, facts.live_after.clone()).contains(&"total".to_string()));
}

#[test]
fn out_argument_counts_as_write_not_read() {
    let (body, region) = lower_with_region(
        "class C { void M() { int x; /*<*/F(out x);/*>*/ Use(x); } }",
    );
    let facts = region_facts(&body, region, &mut || {});
    assert_eq!(names(&body, facts.writes_inside.clone()), vec!["x"]);
    assert!(names(&body, facts.reads_inside.clone()).is_empty());
    assert_eq!(names(&body, facts.always_assigned.clone()), vec!["x"]);
}
