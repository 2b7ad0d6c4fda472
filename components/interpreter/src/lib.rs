//! Bytecode virtual machine for the Lox runtime
//!
//! This crate ties the components together: it compiles source with the
//! `compiler` crate and executes the result on a stack machine with:
//! - Call frames over a shared value stack
//! - Closures with open/closed upvalues
//! - Classes, instances, bound methods and single inheritance
//! - Host functions (natives)
//!
//! # Example
//!
//! ```
//! use interpreter::Vm;
//! use core_types::Value;
//!
//! let mut vm = Vm::new().with_output(std::io::sink());
//! vm.interpret("var x = 40 + 2;").unwrap();
//! assert_eq!(vm.global("x"), Some(Value::number(42.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod config;
pub mod context;
mod dispatch;
pub mod natives;
mod upvalue;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::{CallFrame, FRAMES_MAX};
pub use config::VmConfig;
pub use context::ExecutionContext;
pub use vm::Vm;
