//! Bytecode system for the Lox runtime
//!
//! This crate provides the instruction set, the chunk container the compiler
//! writes into and the VM reads from, and a disassembler for listings.
//!
//! # Features
//!
//! - Stack-based bytecode with one-byte opcodes
//! - Short and long (24-bit) constant operands
//! - Run-length encoded line table
//! - Classic textual disassembly
//!
//! # Example
//!
//! ```
//! use bytecode_system::{disassemble_chunk, Chunk, OpCode, PlainFormatter};
//! use core_types::Value;
//!
//! let mut chunk = Chunk::new();
//!
//! // Emit instructions
//! chunk.write_constant(Value::number(42.0), 1);
//! chunk.write_op(OpCode::Print, 1);
//! chunk.write_op(OpCode::Return, 2);
//!
//! assert_eq!(chunk.line_for(2), 1);
//! assert_eq!(chunk.line_for(3), 2);
//!
//! let listing = disassemble_chunk(&chunk, "script", &PlainFormatter);
//! assert!(listing.contains("OP_PRINT"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod disassembler;
pub mod opcode;

// Re-export main types at crate root
pub use chunk::{Chunk, LineRun, MAX_LONG_CONSTANT, MAX_SHORT_CONSTANT};
pub use disassembler::{
    decode, disassemble_chunk, disassemble_instruction, Capture, ConstantFormatter,
    DecodedInstruction, PlainFormatter,
};
pub use opcode::{OpCode, Operands};
