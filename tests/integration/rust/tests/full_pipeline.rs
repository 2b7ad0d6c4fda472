//! Full pipeline integration tests
//!
//! Source -> Scanner -> Compiler -> Chunk -> VM -> printed output.

use integration_tests::{compile_errors, run, run_error};

#[test]
fn test_arithmetic_and_concatenation() {
    assert_eq!(run("print 1 + 2;"), "3\n");
    assert_eq!(run("print \"a\" + \"b\";"), "ab\n");
    assert_eq!(run("print (1 + 2) * 3 - 4 / 2;"), "7\n");
    assert_eq!(run("print -(3);"), "-3\n");
}

#[test]
fn test_counter_closure() {
    let source = r#"
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }
        var counter = makeCounter();
        print counter();
        print counter();
    "#;
    assert_eq!(run(source), "1\n2\n");
}

#[test]
fn test_closed_upvalues_are_independent() {
    let source = r#"
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }
        var a = makeCounter();
        var b = makeCounter();
        print a();
        print a();
        print b();
    "#;
    assert_eq!(run(source), "1\n2\n1\n");
}

#[test]
fn test_closures_share_captured_variable() {
    let source = r#"
        var first;
        var second;
        {
            var x = "one";
            fun f() { print x; }
            first = f;
            x = "two";
            fun g() { print x; }
            second = g;
        }
        first();
        second();
    "#;
    assert_eq!(run(source), "two\ntwo\n");
}

#[test]
fn test_class_with_initializer() {
    let source = r#"
        class A {
            init(n) { this.n = n; }
            get() { return this.n; }
        }
        print A(5).get();
    "#;
    assert_eq!(run(source), "5\n");
}

#[test]
fn test_bound_method_keeps_receiver() {
    let source = r#"
        class A {
            init(n) { this.n = n; }
            get() { return this.n; }
        }
        var m = A(7).get;
        var other = A(1);
        print m();
        print m;
    "#;
    assert_eq!(run(source), "7\n<fn get>\n");
}

#[test]
fn test_inheritance_and_super() {
    let source = r#"
        class Animal {
            init(name) { this.name = name; }
            speak() { return this.name + " makes a sound"; }
        }
        class Dog < Animal {
            init(name) { super.init(name); }
            speak() { return super.speak() + " (woof)"; }
        }
        print Dog("Rex").speak();
        print Dog;
        print Dog("Fido");
    "#;
    assert_eq!(run(source), "Rex makes a sound (woof)\nDog\nDog instance\n");
}

#[test]
fn test_ternary_and_comma() {
    assert_eq!(run("print true ? 1 : 2;"), "1\n");
    assert_eq!(run("print nil ? 1 : false ? 2 : 3;"), "3\n");
    assert_eq!(run("var a = 1; print (a = 2, a + 1);"), "3\n");
}

#[test]
fn test_break_and_continue() {
    let source = r#"
        for (var i = 0; i < 10; i = i + 1) {
            if (i == 1) continue;
            if (i == 4) break;
            print i;
        }
        var n = 0;
        while (true) {
            n = n + 1;
            if (n > 2) break;
        }
        print n;
    "#;
    assert_eq!(run(source), "0\n2\n3\n3\n");
}

#[test]
fn test_anonymous_functions() {
    let source = r#"
        fun apply(f, x) { return f(x); }
        print apply(fun (n) { return n * 2; }, 21);
        var square = fun (n) { return n * n; };
        print square(4);
        print square;
    "#;
    assert_eq!(run(source), "42\n16\n<fn lambda>\n");
}

#[test]
fn test_recursion() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 2) + fib(n - 1);
        }
        print fib(15);
    "#;
    assert_eq!(run(source), "610\n");
}

#[test]
fn test_many_constants_execute() {
    let source: String = (0..300).map(|i| format!("print {i};\n")).collect();
    let output = run(&source);
    let printed: Vec<&str> = output.lines().collect();
    assert_eq!(printed.len(), 300);
    assert_eq!(printed[255], "255");
    assert_eq!(printed[299], "299");
}

#[test]
fn test_many_globals_execute() {
    let mut source: String = (0..300).map(|i| format!("var g{i} = {i};\n")).collect();
    source.push_str("g299 = g299 + g0 + 1;\nprint g299;\n");
    assert_eq!(run(&source), "300\n");
}

#[test]
fn test_local_self_reference_is_compile_error() {
    assert_eq!(
        compile_errors("{ var a = a; }"),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );
}

#[test]
fn test_mixed_addition_is_runtime_error() {
    let (err, _) = run_error("print 1 + \"a\";");
    assert_eq!(err.message, "Operands must be two numbers or two strings.");
}

#[test]
fn test_declarations_after_many_constants() {
    let mut source: String = (0..300).map(|i| format!("print {i};\n")).collect();
    source.push_str(
        "fun f() { return \"f\"; }\nprint f();\n\
         class P { init() { this.x = 1; } show() { return this.x; } }\n\
         var a = P();\na.x = a.x + 1;\nprint a.show();\n",
    );
    let output = run(&source);
    let tail: Vec<&str> = output.lines().skip(300).collect();
    assert_eq!(tail, vec!["f", "2"]);
}
