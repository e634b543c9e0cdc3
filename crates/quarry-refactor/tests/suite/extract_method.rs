use pretty_assertions::assert_eq;

use crate::{apply_named, options_named, run};
use quarry_refactor::extract_method::{ExtractMethodOptions, ExtractStatus, InsertionStrategy};

#[test]
fn extract_method_with_parameters() {
    let fixture = r#"
class C {
    void M(int a) {
        int b = 1;
        /*start*/System.Console.WriteLine(a + b);/*end*/
        System.Console.WriteLine("done");
    }
}
"#;

    let actual = apply_named(fixture, "Extracted");

    let expected = r#"
class C {
    void M(int a) {
        int b = 1;
        Extracted(a, b);
        System.Console.WriteLine("done");
    }

    private void Extracted(int a, int b)
    {
        System.Console.WriteLine(a + b);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn extract_method_preserves_static_context() {
    let fixture = r#"
class C {
    static void M(int a) {
        /*start*/System.Console.WriteLine(a);/*end*/
    }
}
"#;

    let actual = apply_named(fixture, "Extracted");

    let expected = r#"
class C {
    static void M(int a) {
        Extracted(a);
    }

    private static void Extracted(int a)
    {
        System.Console.WriteLine(a);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn assigned_and_live_after_variable_becomes_the_return_value() {
    let fixture = r#"
class C {
    int M(int a) {
        int b = 1;
        int r = 0;
        /*start*/r = a + b;/*end*/
        return r;
    }
}
"#;

    let actual = apply_named(fixture, "Compute");

    // The promoted-out variable collapses to `return a + b;` through the
    // declaration/assignment/return cleanup passes.
    let expected = r#"
class C {
    int M(int a) {
        int b = 1;
        int r = 0;
        r = Compute(a, b);
        return r;
    }

    private int Compute(int a, int b)
    {
        return a + b;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn extract_multiple_statements_orders_parameters_by_first_use() {
    let fixture = r#"
class C {
    void M(int a, int b) {
        int x = 1;
        /*start*/System.Console.WriteLine(b);
        System.Console.WriteLine(a + x);/*end*/
        System.Console.WriteLine("done");
    }
}
"#;

    let actual = apply_named(fixture, "Extracted");

    let expected = r#"
class C {
    void M(int a, int b) {
        int x = 1;
        Extracted(b, a, x);
        System.Console.WriteLine("done");
    }

    private void Extracted(int b, int a, int x)
    {
        System.Console.WriteLine(b);
        System.Console.WriteLine(a + x);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn extract_method_inside_constructor() {
    let fixture = r#"
class C {
    C(int a) {
        int b = 1;
        /*start*/System.Console.WriteLine(a + b);/*end*/
    }

    void M() {
        System.Console.WriteLine("other");
    }
}
"#;

    let actual = apply_named(fixture, "Extracted");

    let expected = r#"
class C {
    C(int a) {
        int b = 1;
        Extracted(a, b);
    }

    private void Extracted(int a, int b)
    {
        System.Console.WriteLine(a + b);
    }

    void M() {
        System.Console.WriteLine("other");
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn split_variable_is_declared_at_the_call_site() {
    let fixture = r#"
class C {
    int M() {
        /*start*/var x = 1 + 2;/*end*/
        return x;
    }
}
"#;

    let actual = apply_named(fixture, "NewMethod");

    let expected = r#"
class C {
    int M() {
        int x = NewMethod();
        return x;
    }

    private int NewMethod()
    {
        return 1 + 2;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn multiple_split_variables_pack_into_a_tuple() {
    let fixture = r#"
class C {
    void M() {
        /*start*/int x = 1;
        int y = 2;/*end*/
        System.Console.WriteLine(x + y);
    }
}
"#;

    let actual = apply_named(fixture, "Init");

    let expected = r#"
class C {
    void M() {
        (int x, int y) = Init();
        System.Console.WriteLine(x + y);
    }

    private (int x, int y) Init()
    {
        int x = 1;
        int y = 2;
        return (x, y);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn pure_local_moves_inside_and_outer_variable_stays_ref() {
    let fixture = r#"
class C {
    void M() {
        int z = 0;
        /*start*/int y = 5;
        z = y + z;/*end*/
        System.Console.WriteLine(z);
    }
}
"#;

    let actual = apply_named(fixture, "Accumulate");

    // `y` is a pure local; `z` is read before written, so its value flows in
    // and back out through the promoted return.
    let expected = r#"
class C {
    void M() {
        int z = 0;
        z = Accumulate(z);
        System.Console.WriteLine(z);
    }

    private int Accumulate(int z)
    {
        int y = 5;
        z = y + z;
        return z;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn two_written_variables_stay_ref_parameters() {
    let fixture = r#"
class C {
    void M() {
        int x = 1;
        int y = 2;
        /*start*/x = x + 1;
        y = y + 1;/*end*/
        System.Console.WriteLine(x + y);
    }
}
"#;

    let actual = apply_named(fixture, "Bump");

    let expected = r#"
class C {
    void M() {
        int x = 1;
        int y = 2;
        Bump(ref x, ref y);
        System.Console.WriteLine(x + y);
    }

    private void Bump(ref int x, ref int y)
    {
        x = x + 1;
        y = y + 1;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn end_of_type_insertion_strategy() {
    let fixture = r#"
class C {
    void M(int a) {
        /*start*/System.Console.WriteLine(a);/*end*/
    }

    void N() {
    }
}
"#;

    let options = ExtractMethodOptions {
        insertion_strategy: InsertionStrategy::EndOfType,
        ..options_named("Extracted")
    };
    let (actual, _) = run(fixture, options);

    let expected = r#"
class C {
    void M(int a) {
        Extracted(a);
    }

    void N() {
    }

    private void Extracted(int a)
    {
        System.Console.WriteLine(a);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn checked_context_wraps_the_new_body() {
    let fixture = r#"
class C {
    void M(int a) {
        checked {
            /*start*/a = a * 2;/*end*/
        }
    }
}
"#;

    let actual = apply_named(fixture, "Doubled");

    let expected = r#"
class C {
    void M(int a) {
        checked {
            Doubled(a);
        }
    }

    private void Doubled(int a)
    {
        checked
        {
            a = a * 2;
        }
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn async_selection_produces_async_task_method() {
    let fixture = r#"
class C {
    async Task M() {
        /*start*/await Task.Delay(100);/*end*/
        System.Console.WriteLine("after");
    }
}
"#;

    let actual = apply_named(fixture, "PauseAsync");

    let expected = r#"
class C {
    async Task M() {
        await PauseAsync();
        System.Console.WriteLine("after");
    }

    private async Task PauseAsync()
    {
        await Task.Delay(100);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn local_function_extraction_inserts_at_end_of_body() {
    let fixture = r#"
class C {
    void M(int a) {
        /*start*/System.Console.WriteLine(a);/*end*/
    }
}
"#;

    let options = ExtractMethodOptions {
        as_local_function: true,
        prefer_static_local_function: true,
        ..options_named("Print")
    };
    let (actual, _) = run(fixture, options);

    let expected = r#"
class C {
    void M(int a) {
        Print(a);

        static void Print(int a)
        {
            System.Console.WriteLine(a);
        }
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn top_level_statements_extract_into_a_local_function() {
    let fixture = r#"int total = 0;
/*start*/total = total + 5;/*end*/
System.Console.WriteLine(total);
"#;

    // Static so the parameter may shadow the top-level local it mirrors.
    let options = ExtractMethodOptions {
        as_local_function: true,
        prefer_static_local_function: true,
        ..options_named("AddFive")
    };
    let (actual, _) = run(fixture, options);

    let expected = r#"int total = 0;
total = AddFive(total);
System.Console.WriteLine(total);

static int AddFive(int total)
{
    total = total + 5;
    return total;
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn generic_method_type_parameter_is_propagated() {
    let fixture = r#"
class C {
    void M<T>(T item) {
        /*start*/System.Console.WriteLine(item);/*end*/
    }
}
"#;

    let actual = apply_named(fixture, "Print");

    let expected = r#"
class C {
    void M<T>(T item) {
        Print(item);
    }

    private void Print<T>(T item)
    {
        System.Console.WriteLine(item);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn hidden_type_parameter_downgrades_to_best_effort() {
    let fixture = r#"
class C<T> {
    void M(T item) {
        /*start*/System.Console.WriteLine(item);/*end*/
    }
}
"#;

    // `T` belongs to the type, not the method: extraction succeeds plainly.
    let (_, outcome) = run(fixture, options_named("Print"));
    assert_eq!(outcome.status, ExtractStatus::Applied);

    let fixture = r#"
class C<T> {
    void M<T>(T item) {
        /*start*/System.Console.WriteLine(item);/*end*/
    }
}
"#;

    let (_, outcome) = run(fixture, options_named("Print"));
    let ExtractStatus::BestEffort { message } = outcome.status else {
        panic!("expected a best-effort status");
    };
    assert!(message.contains('T'), "unexpected message: {message}");
}

#[test]
fn extracting_a_braced_block_unwraps_it() {
    let fixture = r#"
class C {
    void M() {
        /*start*/{
            System.Console.WriteLine(1);
        }/*end*/
    }
}
"#;

    let actual = apply_named(fixture, "Extracted");

    let expected = r#"
class C {
    void M() {
        Extracted();
    }

    private void Extracted()
    {
        System.Console.WriteLine(1);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn comments_inside_the_selection_move_with_the_method() {
    let fixture = r#"
class C {
    void M(int a) {
        /*start*/// explain the magic constant
        System.Console.WriteLine(a + 42);/*end*/
    }
}
"#;

    let actual = apply_named(fixture, "Extracted");

    let expected = r#"
class C {
    void M(int a) {
        Extracted(a);
    }

    private void Extracted(int a)
    {
        // explain the magic constant
        System.Console.WriteLine(a + 42);
    }
}
"#;

    assert_eq!(actual, expected);
}
