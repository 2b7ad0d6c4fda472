//! Unit tests for error types

use core_types::{
    CompileError, Diagnostic, InterpretError, InterpretResult, RuntimeError, RuntimeErrorKind,
    StackFrame,
};

#[test]
fn test_runtime_error_new_has_empty_stack() {
    let error = RuntimeError::new(RuntimeErrorKind::UndefinedVariable, "Undefined variable 'x'.");
    assert_eq!(error.kind, RuntimeErrorKind::UndefinedVariable);
    assert!(error.stack.is_empty());
    assert_eq!(error.to_string(), "Undefined variable 'x'.");
}

#[test]
fn test_runtime_error_display_lists_frames_innermost_first() {
    let error = RuntimeError {
        kind: RuntimeErrorKind::TypeError,
        message: "Operand must be a number.".to_string(),
        stack: vec![
            StackFrame {
                function_name: Some("c".to_string()),
                line: 3,
            },
            StackFrame {
                function_name: Some("b".to_string()),
                line: 6,
            },
            StackFrame {
                function_name: None,
                line: 9,
            },
        ],
    };
    let rendered = error.to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Operand must be a number.",
            "[line 3] in c()",
            "[line 6] in b()",
            "[line 9] in script",
        ]
    );
}

#[test]
fn test_compile_error_display() {
    let error = CompileError {
        diagnostics: vec![Diagnostic {
            line: 2,
            location: " at 'a'".to_string(),
            message: "Can't read local variable in its own initializer.".to_string(),
        }],
    };
    assert_eq!(
        error.to_string(),
        "[line 2] Error at 'a': Can't read local variable in its own initializer."
    );
}

#[test]
fn test_interpret_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let error: InterpretError = CompileError { diagnostics: vec![] }.into();
    assert_error(&error);
    assert!(matches!(error, InterpretError::Compile(_)));
}

#[test]
fn test_interpret_result_from_result() {
    let failed: Result<(), InterpretError> =
        Err(RuntimeError::new(RuntimeErrorKind::NotCallable, "Can only call functions and classes.").into());
    assert_eq!(InterpretResult::from(&failed), InterpretResult::RuntimeError);
}
