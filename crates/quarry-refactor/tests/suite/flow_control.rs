use pretty_assertions::assert_eq;

use crate::{apply_named, options_named};
use quarry_refactor::extract_method::{
    ExtractMethod, FlowEncoding, VariableClassification,
};
use quarry_test_utils::extract_range;

#[test]
fn escaping_break_encodes_as_bool() {
    let fixture = r#"
class C {
    void M(int[] xs) {
        foreach (int x in xs) {
            /*start*/if (x > 10) {
                break;
            }/*end*/
        }
    }
}
"#;

    let actual = apply_named(fixture, "ShouldStop");

    let expected = r#"
class C {
    void M(int[] xs) {
        foreach (int x in xs) {
            if (ShouldStop(x)) break;
        }
    }

    private bool ShouldStop(int x)
    {
        if (x > 10) {
            return true;
        }
        return false;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn break_and_continue_without_fallthrough_encode_as_bool() {
    let fixture = r#"
class C {
    void M(int n) {
        int i = 0;
        while (i < n) {
            i = i + 1;
            /*start*/if (i == 3) {
                break;
            } else {
                continue;
            }/*end*/
        }
    }
}
"#;

    let actual = apply_named(fixture, "Decide");

    let expected = r#"
class C {
    void M(int n) {
        int i = 0;
        while (i < n) {
            i = i + 1;
            if (Decide(i))
            {
                break;
            }
            else
            {
                continue;
            }
        }
    }

    private bool Decide(int i)
    {
        if (i == 3) {
            return true;
        } else {
            return false;
        }
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn three_exit_kinds_encode_as_nullable_bool() {
    let fixture = r#"
class C {
    void M(int n) {
        int i = 0;
        while (i < n) {
            /*start*/if (i == 3) {
                break;
            }
            if (i == 5) {
                continue;
            }
            i = i + 1;/*end*/
        }
    }
}
"#;

    let actual = apply_named(fixture, "Step");

    let expected = r#"
class C {
    void M(int n) {
        int i = 0;
        while (i < n) {
            bool? flowControl = Step(ref i);
            if (flowControl == true)
            {
                break;
            }
            else if (flowControl == false)
            {
                continue;
            }
        }
    }

    private bool? Step(ref int i)
    {
        if (i == 3) {
            return true;
        }
        if (i == 5) {
            return false;
        }
        i = i + 1;
        return null;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn four_exit_kinds_encode_as_int() {
    let fixture = r#"
class C {
    void M(int n) {
        int i = 0;
        while (i < n) {
            /*start*/if (i == 1) {
                break;
            }
            if (i == 2) {
                continue;
            }
            if (i == 3) {
                return;
            }
            i = i + 1;/*end*/
        }
    }
}
"#;

    let actual = apply_named(fixture, "Step");

    let expected = r#"
class C {
    void M(int n) {
        int i = 0;
        while (i < n) {
            int flowControl = Step(ref i);
            if (flowControl == 1)
            {
                break;
            }
            else if (flowControl == 2)
            {
                continue;
            }
            else if (flowControl == 3)
            {
                return;
            }
        }
    }

    private int Step(ref int i)
    {
        if (i == 1) {
            return 1;
        }
        if (i == 2) {
            return 2;
        }
        if (i == 3) {
            return 3;
        }
        i = i + 1;
        return 0;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn escaping_return_with_value_rides_a_tuple() {
    let fixture = r#"
class C {
    int M(int a) {
        /*start*/if (a > 0) {
            return 1;
        }
        a = a + 1;/*end*/
        return a;
    }
}
"#;

    let actual = apply_named(fixture, "Check");

    let expected = r#"
class C {
    int M(int a) {
        (bool flowControl, int value) = Check(ref a);
        if (flowControl) return value;
        return a;
    }

    private (bool flowControl, int value) Check(ref int a)
    {
        if (a > 0) {
            return (true, 1);
        }
        a = a + 1;
        return (false, default);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn suffix_returns_pass_through_without_encoding() {
    let fixture = r#"
class C {
    void M(int a) {
        /*start*/if (a > 0) {
            return;
        }
        System.Console.WriteLine(a);/*end*/
    }
}
"#;

    let actual = apply_named(fixture, "Report");

    let expected = r#"
class C {
    void M(int a) {
        Report(a);
    }

    private void Report(int a)
    {
        if (a > 0) {
            return;
        }
        System.Console.WriteLine(a);
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn unconditional_break_is_reissued_after_the_call() {
    let fixture = r#"
class C {
    void M(int n) {
        while (n > 0) {
            /*start*/n = n - 1;
            break;/*end*/
        }
    }
}
"#;

    let actual = apply_named(fixture, "Step");

    let expected = r#"
class C {
    void M(int n) {
        while (n > 0) {
            n = Step(n);
            break;
        }
    }

    private int Step(int n)
    {
        n = n - 1;
        return n;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn break_whose_loop_is_inside_the_selection_is_not_an_exit() {
    let fixture = r#"
class C {
    void M(int n) {
        /*start*/while (n > 0) {
            n = n - 1;
            break;
        }/*end*/
        System.Console.WriteLine(n);
    }
}
"#;

    let actual = apply_named(fixture, "Drain");

    let expected = r#"
class C {
    void M(int n) {
        n = Drain(n);
        System.Console.WriteLine(n);
    }

    private int Drain(int n)
    {
        while (n > 0) {
            n = n - 1;
            break;
        }
        return n;
    }
}
"#;

    assert_eq!(actual, expected);
}

#[test]
fn every_touched_variable_is_classified_exactly_once() {
    let fixture = r#"
class C {
    void M() {
        int z = 0;
        /*start*/int y = 5;
        int w = y;
        z = w + z;/*end*/
        System.Console.WriteLine(z);
    }
}
"#;

    let (source, selection) = extract_range(fixture);
    let analysis = ExtractMethod {
        file: "Main.cs".to_string(),
        selection,
        options: options_named("Extracted"),
    }
    .analyze(&source)
    .expect("analysis should succeed");

    let mut names: Vec<&str> = analysis.variables.iter().map(|v| v.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["w", "y", "z"]);
    names.dedup();
    assert_eq!(names.len(), 3, "no variable is classified twice");

    let of = |name: &str| {
        analysis
            .variables
            .iter()
            .find(|v| v.name == name)
            .unwrap()
            .classification()
    };
    assert_eq!(of("y"), VariableClassification::PureLocal);
    assert_eq!(of("w"), VariableClassification::PureLocal);
    assert_eq!(of("z"), VariableClassification::ReturnValue);
    assert_eq!(analysis.flow.encoding, FlowEncoding::None);
}
