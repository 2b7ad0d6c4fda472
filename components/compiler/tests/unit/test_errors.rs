//! Tests for compile diagnostics

use super::compile_errors;

fn single_error(source: &str) -> String {
    let errors = compile_errors(source);
    assert_eq!(errors.len(), 1, "diagnostics: {errors:?}");
    errors.into_iter().next().unwrap()
}

#[test]
fn test_missing_expression() {
    assert_eq!(
        single_error("print ;"),
        "[line 1] Error at ';': Expect expression."
    );
}

#[test]
fn test_error_at_end() {
    assert_eq!(
        single_error("print 1"),
        "[line 1] Error at end: Expect ';' after value."
    );
}

#[test]
fn test_scanner_error_has_no_location() {
    assert_eq!(
        single_error("print \"abc"),
        "[line 1] Error: Unterminated string."
    );
    assert_eq!(
        single_error("var x = 1 @ 2;"),
        "[line 1] Error: Unexpected character."
    );
}

#[test]
fn test_unterminated_string_reported_where_it_opens() {
    assert_eq!(
        single_error("print 1;\nprint \"abc\n\n\n"),
        "[line 2] Error: Unterminated string."
    );
}

#[test]
fn test_local_in_own_initializer() {
    assert_eq!(
        single_error("{ var a = a; }"),
        "[line 1] Error at 'a': Can't read local variable in its own initializer."
    );
}

#[test]
fn test_global_may_reference_itself() {
    assert!(compile_errors("var a = a;").is_empty());
}

#[test]
fn test_redeclared_local() {
    assert_eq!(
        single_error("{ var a; var a; }"),
        "[line 1] Error at 'a': Already a variable with this name in this scope."
    );
    assert_eq!(
        single_error("fun f(a, a) {}"),
        "[line 1] Error at 'a': Already a variable with this name in this scope."
    );
    assert!(compile_errors("{ var a; { var a; } }").is_empty());
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(
        single_error("1 + 2 = 3;"),
        "[line 1] Error at '=': Invalid assignment target."
    );
    assert_eq!(
        single_error("var a; var b; a + b = 1;"),
        "[line 1] Error at '=': Invalid assignment target."
    );
}

#[test]
fn test_return_outside_function() {
    assert_eq!(
        single_error("return 1;"),
        "[line 1] Error at 'return': Can't return from top-level code."
    );
}

#[test]
fn test_return_value_from_initializer() {
    assert_eq!(
        single_error("class A { init() { return 1; } }"),
        "[line 1] Error at 'return': Can't return a value from an initializer."
    );
    assert!(compile_errors("class A { init() { return; } }").is_empty());
}

#[test]
fn test_this_and_super_outside_class() {
    assert_eq!(
        single_error("print this;"),
        "[line 1] Error at 'this': Can't use 'this' outside of a class."
    );
    assert_eq!(
        single_error("fun f() { super.g(); }"),
        "[line 1] Error at 'super': Can't use 'super' outside of a class."
    );
    assert_eq!(
        single_error("class A { f() { super.f(); } }"),
        "[line 1] Error at 'super': Can't use 'super' in a class with no superclass."
    );
}

#[test]
fn test_class_inheriting_from_itself() {
    assert_eq!(
        single_error("class A < A {}"),
        "[line 1] Error at 'A': A class can't inherit from itself."
    );
}

#[test]
fn test_break_and_continue_outside_loop() {
    assert_eq!(
        single_error("break;"),
        "[line 1] Error at 'break': Can't use 'break' outside of a loop."
    );
    assert_eq!(
        single_error("fun f() { continue; }"),
        "[line 1] Error at 'continue': Can't use 'continue' outside of a loop."
    );
    assert_eq!(
        single_error("while (true) { fun f() { break; } }"),
        "[line 1] Error at 'break': Can't use 'break' outside of a loop."
    );
}

#[test]
fn test_ternary_needs_colon() {
    assert_eq!(
        single_error("print true ? 1;"),
        "[line 1] Error at ';': Expect ':' in ternary expression."
    );
}

#[test]
fn test_too_many_parameters() {
    let params: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));
    assert_eq!(
        single_error(&source),
        "[line 1] Error at 'p255': Can't have more than 255 parameters."
    );
}

#[test]
fn test_too_many_arguments() {
    let args = vec!["nil"; 256].join(", ");
    let source = format!("f({args});");
    assert_eq!(
        single_error(&source),
        "[line 1] Error at 'nil': Can't have more than 255 arguments."
    );
}

#[test]
fn test_too_many_locals() {
    let locals: String = (0..256).map(|i| format!("var l{i}; ")).collect();
    let source = format!("{{ {locals}}}");
    assert_eq!(
        single_error(&source),
        "[line 1] Error at 'l255': Too many local variables in function."
    );
}

#[test]
fn test_recovery_reports_each_statement() {
    let errors = compile_errors("print ;\nvar = 1;\nprint 2;\nprint );");
    assert_eq!(
        errors,
        vec![
            "[line 1] Error at ';': Expect expression.",
            "[line 2] Error at '=': Expect variable name.",
            "[line 4] Error at ')': Expect expression.",
        ]
    );
}

#[test]
fn test_compile_error_display_joins_lines() {
    let mut heap = memory_manager::Heap::new();
    let err = compiler::compile("print ;\nprint ;", &mut heap, &memory_manager::NoRoots)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "[line 1] Error at ';': Expect expression.\n[line 2] Error at ';': Expect expression."
    );
}
