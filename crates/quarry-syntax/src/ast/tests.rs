use pretty_assertions::assert_eq;

use crate::ast::{self, AstNode};
use crate::{parse_csharp, SyntaxKind};

fn parse_unit(text: &str) -> ast::CompilationUnit {
    let parsed = parse_csharp(text);
    assert_eq!(parsed.errors, vec![], "fixture should parse cleanly");
    ast::CompilationUnit::cast(parsed.syntax()).expect("root is a compilation unit")
}

fn first_method(unit: &ast::CompilationUnit) -> ast::MethodDeclaration {
    unit.type_declarations()
        .next()
        .and_then(|ty| ty.body())
        .and_then(|body| {
            body.members().find_map(|member| match member {
                ast::Member::MethodDeclaration(m) => Some(m),
                _ => None,
            })
        })
        .expect("fixture has a method")
}

#[test]
fn method_shape() {
    let unit = parse_unit(
        "class C {\n    public static int Add(int a, ref int b, out int c) { c = 0; return a + b; }\n}\n",
    );
    let method = first_method(&unit);

    assert_eq!(method.name_token().unwrap().text(), "Add");
    assert!(method.modifiers().unwrap().has(SyntaxKind::StaticKw));
    assert_eq!(method.return_type().unwrap().display_text(), "int");

    let params: Vec<_> = method.parameter_list().unwrap().parameters().collect();
    assert_eq!(params.len(), 3);
    assert!(params[0].ref_token().is_none());
    assert!(params[1].ref_token().is_some());
    assert!(params[2].out_token().is_some());
    assert_eq!(params[2].name_token().unwrap().text(), "c");
}

#[test]
fn local_declaration_with_multiple_declarators() {
    let unit = parse_unit("class C { void M() { int x = 1, y; } }");
    let method = first_method(&unit);
    let body = method.body().unwrap();
    let stmt = body.statements().next().unwrap();

    let ast::Statement::LocalDeclarationStatement(decl) = stmt else {
        panic!("expected local declaration, got {stmt:?}");
    };
    let declarators: Vec<_> = decl.declarator_list().unwrap().declarators().collect();
    assert_eq!(declarators.len(), 2);
    assert_eq!(declarators[0].name_token().unwrap().text(), "x");
    assert!(declarators[0].initializer().is_some());
    assert!(declarators[1].initializer().is_none());
}

#[test]
fn if_statement_branches_in_order() {
    let unit = parse_unit("class C { void M(int a) { if (a > 0) { a--; } else { a++; } } }");
    let method = first_method(&unit);
    let stmt = method.body().unwrap().statements().next().unwrap();

    let ast::Statement::IfStatement(if_stmt) = stmt else {
        panic!("expected if statement");
    };
    assert!(if_stmt.condition().is_some());
    assert!(matches!(
        if_stmt.then_branch(),
        Some(ast::Statement::Block(_))
    ));
    assert!(matches!(
        if_stmt.else_branch(),
        Some(ast::Statement::Block(_))
    ));
}

#[test]
fn property_accessors() {
    let unit = parse_unit("class C { int X { get { return 1; } set { } } }");
    let ty = unit.type_declarations().next().unwrap();
    let prop = ty
        .body()
        .unwrap()
        .members()
        .find_map(|m| match m {
            ast::Member::PropertyDeclaration(p) => Some(p),
            _ => None,
        })
        .unwrap();

    assert_eq!(prop.name_token().unwrap().text(), "X");
    let accessors: Vec<_> = prop.accessor_list().unwrap().accessors().collect();
    assert_eq!(accessors.len(), 2);
    assert_eq!(accessors[0].keyword().unwrap().kind(), SyntaxKind::GetKw);
    assert!(accessors[0].body().is_some());
    assert_eq!(accessors[1].keyword().unwrap().kind(), SyntaxKind::SetKw);
}

#[test]
fn foreach_parts() {
    let unit = parse_unit("class C { void M(int[] xs) { foreach (int x in xs) { Use(x); } } }");
    let method = first_method(&unit);
    let stmt = method.body().unwrap().statements().next().unwrap();

    let ast::Statement::ForeachStatement(foreach) = stmt else {
        panic!("expected foreach");
    };
    assert_eq!(foreach.ty().unwrap().display_text(), "int");
    assert_eq!(foreach.name_token().unwrap().text(), "x");
    assert!(foreach.expression().is_some());
    assert!(foreach.body().is_some());
}

#[test]
fn for_header_sections() {
    let unit = parse_unit("class C { void M() { for (int i = 0; i < 10; i++) { } } }");
    let method = first_method(&unit);
    let stmt = method.body().unwrap().statements().next().unwrap();

    let ast::Statement::ForStatement(for_stmt) = stmt else {
        panic!("expected for");
    };
    let header = for_stmt.header().unwrap();
    assert!(header.has_declaration());
    assert!(header.condition().is_some());
    assert_eq!(header.update_expressions().len(), 1);
}

#[test]
fn local_function_is_a_statement() {
    let unit = parse_unit("class C { void M() { int Twice(int v) { return v * 2; } Twice(2); } }");
    let method = first_method(&unit);
    let stmts: Vec<_> = method.body().unwrap().statements().collect();
    assert!(matches!(
        stmts[0],
        ast::Statement::LocalFunctionStatement(_)
    ));
    assert!(matches!(stmts[1], ast::Statement::ExpressionStatement(_)));
}

#[test]
fn bare_throw_is_a_rethrow() {
    let unit = parse_unit(
        "class C { void M() { try { } catch (System.Exception e) { throw; } } }",
    );
    let method = first_method(&unit);
    let ast::Statement::TryStatement(try_stmt) = method.body().unwrap().statements().next().unwrap()
    else {
        panic!("expected try");
    };
    let catch = try_stmt.catch_clauses().next().unwrap();
    let ast::Statement::ThrowStatement(throw) = catch.block().unwrap().statements().next().unwrap()
    else {
        panic!("expected throw");
    };
    assert!(throw.is_rethrow());
}

#[test]
fn tuple_deconstruction_round_trips() {
    let unit = parse_unit("class C { void M() { (var x, var y) = F(); Use(x, y); } }");
    let method = first_method(&unit);
    let stmt = method.body().unwrap().statements().next().unwrap();
    let ast::Statement::ExpressionStatement(expr_stmt) = stmt else {
        panic!("expected expression statement");
    };
    let ast::Expression::AssignmentExpression(assign) = expr_stmt.expression().unwrap() else {
        panic!("expected assignment");
    };
    let ast::Expression::TupleExpression(tuple) = assign.target().unwrap() else {
        panic!("expected tuple target");
    };
    assert_eq!(tuple.declarations().count(), 2);
}

#[test]
fn global_statements_parse() {
    let unit = parse_unit("int total = 0;\ntotal += 1;\nSystem.Console.WriteLine(total);\n");
    assert_eq!(unit.global_statements().count(), 3);
}
