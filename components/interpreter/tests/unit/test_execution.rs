//! Tests for expression evaluation, control flow and functions

use super::{run, run_error, vm_with};
use core_types::{RuntimeErrorKind, Value};
use interpreter::VmConfig;

#[test]
fn test_arithmetic() {
    assert_eq!(run("print 1 + 2 * 3 - 4 / 2;"), "5\n");
    assert_eq!(run("print 10 / 4; print -(3);"), "2.5\n-3\n");
}

#[test]
fn test_division_by_zero_follows_ieee() {
    assert_eq!(run("print 1 / 0; print -1 / 0; print 0 / 0;"), "inf\n-inf\nnan\n");
}

#[test]
fn test_comparison_and_equality() {
    let source = r#"
        print 1 < 2;
        print 2 <= 1;
        print 3 >= 3;
        print "a" == "a";
        print nil == false;
        print 1 != 2;
    "#;
    assert_eq!(run(source), "true\nfalse\ntrue\ntrue\nfalse\ntrue\n");
}

#[test]
fn test_truthiness() {
    assert_eq!(run("print !nil; print !0; print !\"\";"), "true\nfalse\nfalse\n");
}

#[test]
fn test_string_concatenation_is_interned() {
    let source = r#"
        print "foo" + "bar";
        var a = "ab";
        var b = "a" + "b";
        print a == b;
    "#;
    assert_eq!(run(source), "foobar\ntrue\n");
}

#[test]
fn test_logical_operators_return_operands() {
    let source = r#"
        print nil or "default";
        print 1 and 2;
        print false and 1;
    "#;
    assert_eq!(run(source), "default\n2\nfalse\n");
}

#[test]
fn test_if_else() {
    let source = r#"
        if (1 > 2) print "then"; else print "else";
        if (nil) print "skipped";
        if (true) { print "block"; }
    "#;
    assert_eq!(run(source), "else\nblock\n");
}

#[test]
fn test_for_loop_sum() {
    let source = r#"
        var sum = 0;
        for (var i = 1; i <= 10; i = i + 1) sum = sum + i;
        print sum;
    "#;
    assert_eq!(run(source), "55\n");
}

#[test]
fn test_break_and_continue_in_for() {
    let source = r#"
        for (var i = 0; i < 10; i = i + 1) {
            if (i == 2) continue;
            if (i == 5) break;
            print i;
        }
        print "done";
    "#;
    assert_eq!(run(source), "0\n1\n3\n4\ndone\n");
}

#[test]
fn test_break_pops_block_locals() {
    let source = r#"
        var i = 0;
        while (true) {
            var j = i * 2;
            if (j > 6) break;
            print j;
            i = i + 1;
        }
        var after = "stack intact";
        print after;
    "#;
    assert_eq!(run(source), "0\n2\n4\n6\nstack intact\n");
}

#[test]
fn test_continue_in_while() {
    let source = r#"
        var i = 0;
        while (i < 5) {
            i = i + 1;
            if (i == 3) continue;
            print i;
        }
    "#;
    assert_eq!(run(source), "1\n2\n4\n5\n");
}

#[test]
fn test_ternary() {
    let source = r#"
        print true ? "yes" : "no";
        print nil ? 1 : 2;
        print false ? 1 : true ? 2 : 3;
    "#;
    assert_eq!(run(source), "yes\n2\n2\n");
}

#[test]
fn test_comma_operator() {
    assert_eq!(run("var x = (1, 2); print x; print (1, 2, 3);"), "2\n3\n");
}

#[test]
fn test_recursive_function() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;
    assert_eq!(run(source), "55\n");
}

#[test]
fn test_function_values_print() {
    assert_eq!(
        run("fun f() {} print f; print clock; print fun () {};"),
        "<fn f>\n<native fn>\n<fn lambda>\n"
    );
}

#[test]
fn test_function_without_return_yields_nil() {
    assert_eq!(run("fun f() {} print f();"), "nil\n");
}

#[test]
fn test_counter_closure() {
    let source = r#"
        fun makeCounter() {
            var i = 0;
            fun count() {
                i = i + 1;
                return i;
            }
            return count;
        }
        var c = makeCounter();
        print c();
        print c();
    "#;
    assert_eq!(run(source), "1\n2\n");
}

#[test]
fn test_closures_share_captured_variable() {
    let source = r#"
        var get;
        var set;
        fun make() {
            var x = "initial";
            fun g() { return x; }
            fun s(v) { x = v; }
            get = g;
            set = s;
        }
        make();
        set("updated");
        print get();
    "#;
    assert_eq!(run(source), "updated\n");
}

#[test]
fn test_lambda_arguments() {
    let source = r#"
        var add = fun (a, b) { return a + b; };
        print add(2, 3);
        fun apply(f, x) { return f(x); }
        print apply(fun (n) { return n * n; }, 7);
    "#;
    assert_eq!(run(source), "5\n49\n");
}

#[test]
fn test_clock_native() {
    assert_eq!(run("print clock() > 0;"), "true\n");
    let (err, _) = run_error("clock(1);");
    assert_eq!(err.kind, RuntimeErrorKind::ArityMismatch);
    assert_eq!(err.message, "Expected 0 arguments but got 1.");
}

fn double(args: &[Value]) -> Result<Value, String> {
    match args[0].as_number() {
        Some(n) => Ok(Value::number(n * 2.0)),
        None => Err("Argument must be a number.".to_string()),
    }
}

#[test]
fn test_host_native() {
    let (mut vm, output) = vm_with(VmConfig::default());
    vm.define_native("double", 1, double);
    vm.interpret("print double(21);").unwrap();
    assert_eq!(output.text(), "42\n");

    let err = vm.interpret("double(\"x\");").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Argument must be a number.\n[line 1] in script"
    );
}

#[test]
fn test_long_constants_execute() {
    let mut source: String = (0..300).map(|i| format!("var g{i} = {i};\n")).collect();
    source.push_str("print g0 + g299;\n");
    assert_eq!(run(&source), "299\n");
}
