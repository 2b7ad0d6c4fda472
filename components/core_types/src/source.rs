//! Source locations for diagnostics and stack traces.
//!
//! [`Diagnostic`] describes one compile error at a source line;
//! [`StackFrame`] describes one active call when a runtime error occurs.

use std::fmt;

/// A single compile-time error report.
///
/// Renders as `[line N] Error<location>: <message>`, where the location is
/// ` at 'lexeme'`, ` at end`, or empty for errors raised by the scanner.
///
/// # Examples
///
/// ```
/// use core_types::Diagnostic;
///
/// let diagnostic = Diagnostic {
///     line: 3,
///     location: " at '='".to_string(),
///     message: "Invalid assignment target.".to_string(),
/// };
///
/// assert_eq!(diagnostic.to_string(), "[line 3] Error at '=': Invalid assignment target.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line of the offending token
    pub line: u32,
    /// Location suffix placed after `Error`
    pub location: String,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.location, self.message)
    }
}

/// Represents a single frame in a Lox call stack.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("fib".to_string()),
///     line: 25,
/// };
///
/// assert_eq!(frame.to_string(), "[line 25] in fib()");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for the top-level script
    pub function_name: Option<String>,
    /// Line of the instruction executing in this frame
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function_name {
            Some(name) => write!(f, "[line {}] in {}()", self.line, name),
            None => write!(f, "[line {}] in script", self.line),
        }
    }
}
