//! Tests for runtime error reporting and recovery

use super::{run_error, vm_with};
use core_types::{InterpretError, InterpretResult, RuntimeErrorKind};
use interpreter::{VmConfig, FRAMES_MAX};

fn error_of(source: &str) -> (RuntimeErrorKind, String) {
    let (err, _) = run_error(source);
    (err.kind, err.message)
}

#[test]
fn test_type_errors() {
    let operands = "Operands must be two numbers or two strings.".to_string();
    assert_eq!(
        error_of("print 1 + \"a\";"),
        (RuntimeErrorKind::TypeError, operands.clone())
    );
    assert_eq!(
        error_of("print \"a\" + nil;"),
        (RuntimeErrorKind::TypeError, operands)
    );
    assert_eq!(
        error_of("print -\"a\";"),
        (RuntimeErrorKind::TypeError, "Operand must be a number.".to_string())
    );
    assert_eq!(
        error_of("print 1 < \"a\";"),
        (RuntimeErrorKind::TypeError, "Operands must be numbers.".to_string())
    );
}

#[test]
fn test_undefined_variable() {
    assert_eq!(
        error_of("print missing;"),
        (
            RuntimeErrorKind::UndefinedVariable,
            "Undefined variable 'missing'.".to_string()
        )
    );
}

#[test]
fn test_failed_assignment_does_not_define() {
    let (mut vm, _) = vm_with(VmConfig::default());
    let err = vm.interpret("x = 1;").unwrap_err();
    assert_eq!(err.to_string(), "Undefined variable 'x'.\n[line 1] in script");
    assert!(vm.global("x").is_none());
}

#[test]
fn test_call_errors() {
    assert_eq!(
        error_of("var s = \"str\"; s();"),
        (
            RuntimeErrorKind::NotCallable,
            "Can only call functions and classes.".to_string()
        )
    );
    assert_eq!(
        error_of("fun f(a) {} f();"),
        (
            RuntimeErrorKind::ArityMismatch,
            "Expected 1 arguments but got 0.".to_string()
        )
    );
    assert_eq!(
        error_of("class A {} A(1);"),
        (
            RuntimeErrorKind::ArityMismatch,
            "Expected 0 arguments but got 1.".to_string()
        )
    );
}

#[test]
fn test_property_errors() {
    assert_eq!(
        error_of("class A {} print A().x;"),
        (
            RuntimeErrorKind::UndefinedProperty,
            "Undefined property 'x'.".to_string()
        )
    );
    assert_eq!(
        error_of("class A {} A().nope();"),
        (
            RuntimeErrorKind::UndefinedProperty,
            "Undefined property 'nope'.".to_string()
        )
    );
    assert_eq!(
        error_of("var n = 1; print n.x;").1,
        "Only instances have properties."
    );
    assert_eq!(error_of("var n = 1; n.x = 1;").1, "Only instances have fields.");
    assert_eq!(error_of("var n = 1; n.m();").1, "Only instances have methods.");
}

#[test]
fn test_superclass_must_be_class() {
    assert_eq!(
        error_of("var NotClass = 1; class B < NotClass {}"),
        (
            RuntimeErrorKind::TypeError,
            "Superclass must be a class.".to_string()
        )
    );
}

#[test]
fn test_stack_overflow() {
    let (err, _) = run_error("fun f() { f(); }\nf();");
    assert_eq!(err.kind, RuntimeErrorKind::StackOverflow);
    assert_eq!(err.message, "Stack overflow.");
    assert_eq!(err.stack.len(), FRAMES_MAX);
    assert_eq!(err.stack[0].function_name.as_deref(), Some("f"));
    assert_eq!(err.stack[FRAMES_MAX - 1].function_name, None);
    assert_eq!(err.stack[FRAMES_MAX - 1].line, 2);
}

#[test]
fn test_stack_trace_innermost_first() {
    let source = "fun a() { b(); }\nfun b() { c(); }\nfun c() {\n  nil + 1;\n}\na();";
    let (err, _) = run_error(source);
    assert_eq!(
        err.to_string(),
        "Operands must be two numbers or two strings.\n\
         [line 4] in c()\n\
         [line 2] in b()\n\
         [line 1] in a()\n\
         [line 6] in script"
    );
}

#[test]
fn test_output_before_error_is_kept() {
    let (err, output) = run_error("print \"before\"; print nil * 2; print \"after\";");
    assert_eq!(err.kind, RuntimeErrorKind::TypeError);
    assert_eq!(output, "before\n");
}

#[test]
fn test_vm_is_reusable_after_errors() {
    let (mut vm, output) = vm_with(VmConfig::default());
    let result = vm.interpret("var a = 1; print a; a();");
    assert_eq!(InterpretResult::from(&result), InterpretResult::RuntimeError);
    assert_eq!(vm.stack_depth(), 0);
    assert_eq!(vm.frame_depth(), 0);

    let result = vm.interpret("print a +;");
    assert!(matches!(result, Err(InterpretError::Compile(_))));

    vm.interpret("print a + 1;").unwrap();
    assert_eq!(output.text(), "1\n2\n");
}

#[test]
fn test_open_upvalues_dropped_after_error() {
    let (mut vm, output) = vm_with(VmConfig::default());
    let source = r#"
        var keep;
        fun outer() {
            var x = "captured";
            fun inner() { return x; }
            keep = inner;
            nil();
        }
        outer();
    "#;
    assert!(vm.interpret(source).is_err());
    vm.interpret("print keep();").unwrap();
    assert_eq!(output.text(), "captured\n");
}
