//! Lox error types and error handling.
//!
//! Compilation produces a [`CompileError`] holding every diagnostic the
//! compiler collected; execution produces a [`RuntimeError`] with the call
//! stack at the point of failure. [`InterpretError`] unifies the two for
//! callers of the VM.

use crate::{Diagnostic, StackFrame};
use thiserror::Error;

/// The kind of runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Operand of the wrong type (arithmetic, comparison, property access)
    TypeError,
    /// Call with the wrong number of arguments
    ArityMismatch,
    /// Call of a value that is not a function or class
    NotCallable,
    /// Read or assignment of an undefined global
    UndefinedVariable,
    /// Access of a missing field or method
    UndefinedProperty,
    /// Call frame stack exhausted
    StackOverflow,
    /// A native function reported failure
    NativeError,
    /// Writing `print` output failed
    Output,
    /// Malformed bytecode reached the VM
    InvalidBytecode,
}

/// Compilation failed with one or more diagnostics.
///
/// # Examples
///
/// ```
/// use core_types::{CompileError, Diagnostic};
///
/// let error = CompileError {
///     diagnostics: vec![Diagnostic {
///         line: 1,
///         location: " at end".to_string(),
///         message: "Expect ';' after value.".to_string(),
///     }],
/// };
///
/// assert_eq!(error.to_string(), "[line 1] Error at end: Expect ';' after value.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_diagnostics(.diagnostics))]
pub struct CompileError {
    /// Diagnostics in source order
    pub diagnostics: Vec<Diagnostic>,
}

/// A Lox runtime error with message and stack trace.
///
/// The stack is innermost-first. It is empty when the error is created by an
/// instruction handler and filled in by the VM before the error escapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", render_stack(.stack))]
pub struct RuntimeError {
    /// The type of error
    pub kind: RuntimeErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Call stack at the time of the error
    pub stack: Vec<StackFrame>,
}

impl RuntimeError {
    /// Create an error without stack information
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }
}

/// Any failure of `interpret`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// The source did not compile
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Execution stopped with a runtime error
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    /// Result code for this error
    pub fn result(&self) -> InterpretResult {
        match self {
            InterpretError::Compile(_) => InterpretResult::CompileError,
            InterpretError::Runtime(_) => InterpretResult::RuntimeError,
        }
    }
}

/// Coarse outcome of running a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    /// Ran to completion
    Ok,
    /// Failed to compile
    CompileError,
    /// Failed while running
    RuntimeError,
}

impl InterpretResult {
    /// Conventional process exit status (sysexits `EX_DATAERR` / `EX_SOFTWARE`)
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError => 65,
            InterpretResult::RuntimeError => 70,
        }
    }
}

impl<T> From<&Result<T, InterpretError>> for InterpretResult {
    fn from(result: &Result<T, InterpretError>) -> Self {
        match result {
            Ok(_) => InterpretResult::Ok,
            Err(e) => e.result(),
        }
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_stack(stack: &[StackFrame]) -> String {
    stack.iter().map(|frame| format!("\n{frame}")).collect()
}
