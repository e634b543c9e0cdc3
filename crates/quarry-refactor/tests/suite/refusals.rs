use crate::{apply_named, error_of, options_named};
use quarry_refactor::extract_method::{
    ExtractMethod, ExtractMethodError, ExtractMethodOptions,
};
use quarry_test_utils::extract_range;

#[test]
fn yield_statements_are_refused() {
    let fixture = r#"
class C {
    System.Collections.Generic.IEnumerable<int> M() {
        /*start*/yield return 1;/*end*/
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::ContainsYield
    );
}

#[test]
fn bare_rethrow_with_catch_outside_is_refused() {
    let fixture = r#"
class C {
    void M() {
        try {
            Risky();
        } catch {
            /*start*/throw;/*end*/
        }
    }

    void Risky() {
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::ContainsBareRethrow
    );
}

#[test]
fn bare_rethrow_with_catch_inside_is_allowed() {
    let fixture = r#"
class C {
    void M() {
        /*start*/try {
            Risky();
        } catch {
            throw;
        }/*end*/
    }

    void Risky() {
    }
}
"#;

    // The whole try/catch moves, so the rethrow stays legal.
    let actual = apply_named(fixture, "Guarded");
    assert!(actual.contains("private void Guarded()"), "{actual}");
}

#[test]
fn unmatched_preprocessor_region_is_refused() {
    let fixture = r#"
class C {
    void M(int a) {
        /*start*/a = 1;
#if DEBUG
        a = 2;/*end*/
#endif
        System.Console.WriteLine(a);
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::CrossesPreprocessorDirective
    );
}

#[test]
fn balanced_region_inside_the_selection_is_allowed() {
    let fixture = r#"
class C {
    void M(int a) {
        /*start*/a = 1;
#region setup
        a = 2;
#endregion
        a = 3;/*end*/
        System.Console.WriteLine(a);
    }
}
"#;

    let actual = apply_named(fixture, "Setup");
    assert!(actual.contains("#region setup"), "{actual}");
    assert!(actual.contains("#endregion"), "{actual}");
}

#[test]
fn constant_initializer_is_refused() {
    let fixture = r#"
class C {
    void M() {
        const int K = /*start*/1 + 2/*end*/;
        System.Console.WriteLine(K);
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::ConstantInitializer
    );
}

#[test]
fn top_level_statements_require_local_function_extraction() {
    let fixture = r#"int x = 1;
/*start*/System.Console.WriteLine(x);/*end*/
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::TopLevelStatement
    );
}

#[test]
fn is_pattern_selection_is_refused() {
    let fixture = r#"
class C {
    void M(object o) {
        if (o is /*start*/string s/*end*/) {
            System.Console.WriteLine(s);
        }
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::PatternSelection
    );
}

#[test]
fn partial_expression_selection_is_refused() {
    let fixture = r#"
class C {
    void M(int a, int b) {
        int x = /*start*/a +/*end*/ b;
        System.Console.WriteLine(x);
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::InvalidSelection
    );
}

#[test]
fn selection_outside_any_body_is_refused() {
    let fixture = r#"
class C {
    /*start*/int field = 1;/*end*/
}
"#;

    // A whole field declaration is not an extractable statement (only its
    // initializer expression would be).
    assert_eq!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::InvalidSelection
    );
}

#[test]
fn colliding_method_name_is_refused() {
    let fixture = r#"
class C {
    void M() {
        /*start*/Helper();/*end*/
    }

    void Helper() {
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("Helper")),
        ExtractMethodError::NameCollision {
            name: "Helper".to_string()
        }
    );
}

#[test]
fn invalid_method_name_is_refused() {
    let fixture = r#"
class C {
    void M() {
        /*start*/System.Console.WriteLine(1);/*end*/
    }
}
"#;

    assert_eq!(
        error_of(fixture, options_named("123abc")),
        ExtractMethodError::InvalidMethodName {
            name: "123abc".to_string()
        }
    );
    assert_eq!(
        error_of(fixture, options_named("class")),
        ExtractMethodError::InvalidMethodName {
            name: "class".to_string()
        }
    );
}

#[test]
fn unknown_expression_type_is_a_hard_failure() {
    let fixture = r#"
class C {
    void M() {
        var x = /*start*/Mystery()/*end*/;
        System.Console.WriteLine(x);
    }
}
"#;

    assert!(matches!(
        error_of(fixture, options_named("Bad")),
        ExtractMethodError::ErrorOrUnknownType { .. }
    ));
}

#[test]
fn cancellation_is_distinguished_from_refusals() {
    let fixture = r#"
class C {
    void M() {
        /*start*/System.Console.WriteLine(1);/*end*/
    }
}
"#;

    let (source, selection) = extract_range(fixture);
    let options = ExtractMethodOptions {
        name: Some("Extracted".to_string()),
        ..ExtractMethodOptions::default()
    };
    options.cancellation.cancel();
    let refactoring = ExtractMethod {
        file: "Main.cs".to_string(),
        selection,
        options,
    };
    assert_eq!(
        refactoring.apply(&source).unwrap_err(),
        ExtractMethodError::Cancelled
    );
}

#[test]
fn refusals_never_mutate_the_document() {
    let fixture = r#"
class C {
    System.Collections.Generic.IEnumerable<int> M() {
        /*start*/yield return 1;/*end*/
    }
}
"#;

    let (source, selection) = extract_range(fixture);
    let before = source.clone();
    let refactoring = ExtractMethod {
        file: "Main.cs".to_string(),
        selection,
        options: options_named("Bad"),
    };
    let _ = refactoring.apply(&source);
    assert_eq!(source, before);
}
