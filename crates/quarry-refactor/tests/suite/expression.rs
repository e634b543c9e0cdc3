use pretty_assertions::assert_eq;

use crate::run;
use quarry_refactor::extract_method::ExtractMethodOptions;

fn apply_default(fixture: &str) -> String {
    run(fixture, ExtractMethodOptions::default()).0
}

#[test]
fn initializer_expression_names_the_getter_after_the_variable() {
    let fixture = r#"
class C {
    void M(int price, int tax) {
        var total = /*start*/price + tax/*end*/;
        System.Console.WriteLine(total);
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void M(int price, int tax) {
        var total = GetTotal(price, tax);
        System.Console.WriteLine(total);
    }

    private int GetTotal(int price, int tax)
    {
        return price + tax;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn assignment_rhs_extracts_just_the_rhs() {
    let fixture = r#"
class C {
    void M(int a, int b) {
        int x = 0;
        x = /*start*/a + b/*end*/;
        System.Console.WriteLine(x);
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void M(int a, int b) {
        int x = 0;
        x = NewMethod(a, b);
        System.Console.WriteLine(x);
    }

    private int NewMethod(int a, int b)
    {
        return a + b;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn name_expression_gets_a_getter_name() {
    let fixture = r#"
class C {
    void M() {
        int count = 3;
        var n = /*start*/count/*end*/;
        System.Console.WriteLine(n);
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void M() {
        int count = 3;
        var n = GetN(count);
        System.Console.WriteLine(n);
    }

    private int GetN(int count)
    {
        return count;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn array_initializer_is_wrapped_in_an_array_creation() {
    let fixture = r#"
class C {
    void M() {
        int[] data = /*start*/{ 1, 2, 3 }/*end*/;
        System.Console.WriteLine(data.Length);
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void M() {
        int[] data = GetData();
        System.Console.WriteLine(data.Length);
    }

    private int[] GetData()
    {
        return new int[] { 1, 2, 3 };
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn casted_operand_widens_to_include_the_cast() {
    let fixture = r#"
class C {
    void M(object o) {
        var s = (string)/*start*/o/*end*/;
        System.Console.WriteLine(s);
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void M(object o) {
        var s = GetS(o);
        System.Console.WriteLine(s);
    }

    private string GetS(object o)
    {
        return (string)o;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn void_invocation_extracts_without_a_return() {
    let fixture = r#"
class C {
    void M() {
        /*start*/Helper()/*end*/;
    }

    void Helper() {
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void M() {
        NewMethod();
    }

    private void NewMethod()
    {
        Helper();
    }

    void Helper() {
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn method_body_statement_extracts_as_void_wrapper() {
    // Extract-Method on the body statement `{ Foo(); }` wraps exactly the
    // call with return type `void`.
    let fixture = r#"
class C {
    void Method() {
        /*start*/Foo();/*end*/
    }

    void Foo() {
    }
}
"#;

    let actual = apply_default(fixture);

    let expected = r#"
class C {
    void Method() {
        NewMethod();
    }

    private void NewMethod()
    {
        Foo();
    }

    void Foo() {
    }
}
"#;

    assert_eq!(actual, expected);
}
