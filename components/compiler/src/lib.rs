//! Lox Compiler Component
//!
//! Scans Lox source and compiles it to bytecode in a single pass.
//!
//! # Overview
//!
//! - [`Scanner`] - Produces [`Token`]s on demand
//! - [`compile`] - Compiles a program into the top-level script function
//! - [`Precedence`] - Operator binding levels used by the expression parser
//!
//! # Example
//!
//! ```
//! use compiler::compile;
//! use memory_manager::{Heap, NoRoots};
//!
//! let mut heap = Heap::new();
//! let err = compile("print ;", &mut heap, &NoRoots).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "[line 1] Error at ';': Expect expression."
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod rules;
pub mod scanner;
pub mod scope;
pub mod token;

pub use compiler::{compile, compile_with, CompileOptions};
pub use error::diagnostic_at;
pub use rules::Precedence;
pub use scanner::Scanner;
pub use scope::{FunctionKind, UpvalueRef, MAX_LOCALS, MAX_UPVALUES};
pub use token::{Token, TokenKind};
