//! Core Lox value types and error handling.
//!
//! This crate provides the foundational types shared by every runtime
//! component: the value representation, heap handles, and the error types
//! produced by compilation and execution.
//!
//! # Overview
//!
//! - [`Value`] - Lox value (tagged enum, or NaN-boxed with `nan_boxing`)
//! - [`ObjRef`] - Generation-checked handle into the object heap
//! - [`CompileError`] / [`Diagnostic`] - Compile-time errors
//! - [`RuntimeError`] / [`RuntimeErrorKind`] - Runtime errors with stack traces
//! - [`InterpretError`] / [`InterpretResult`] - Outcome of running a script
//!
//! # Examples
//!
//! ```
//! use core_types::{RuntimeError, RuntimeErrorKind, Value};
//!
//! let num = Value::number(42.0);
//! assert!(!num.is_falsey());
//! assert_eq!(num.as_number(), Some(42.0));
//!
//! let error = RuntimeError::new(RuntimeErrorKind::TypeError, "Operand must be a number.");
//! assert_eq!(error.to_string(), "Operand must be a number.");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod value;

pub use error::{CompileError, InterpretError, InterpretResult, RuntimeError, RuntimeErrorKind};
pub use source::{Diagnostic, StackFrame};
pub use value::{format_number, ObjRef, Value, ValueKind};
