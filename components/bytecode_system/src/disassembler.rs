//! Human-readable chunk listings
//!
//! Decodes a chunk into [`DecodedInstruction`] records and renders them in
//! the classic listing format:
//!
//! ```text
//! == script ==
//! 0000    1 OP_CONSTANT         0 '1.2'
//! 0002    | OP_PRINT
//! ```
//!
//! Objects in the constant pool are rendered by a [`ConstantFormatter`]
//! supplied by whoever owns the heap.

use crate::chunk::Chunk;
use crate::opcode::{OpCode, Operands};
use core_types::{format_number, Value, ValueKind};
use std::fmt;

/// Renders constants for listings
pub trait ConstantFormatter {
    /// Text shown between quotes for a constant
    fn format_constant(&self, value: Value) -> String;

    /// Number of capture descriptors following `OP_CLOSURE` for this
    /// function constant
    fn upvalue_count(&self, value: Value) -> usize;
}

/// Formatter with no heap access: objects render as their handle and
/// closures are assumed to capture nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl ConstantFormatter for PlainFormatter {
    fn format_constant(&self, value: Value) -> String {
        match value.kind() {
            ValueKind::Nil => "nil".to_string(),
            ValueKind::Bool(b) => b.to_string(),
            ValueKind::Number(n) => format_number(n),
            ValueKind::Object(r) => format!("<obj {r}>"),
        }
    }

    fn upvalue_count(&self, _value: Value) -> usize {
        0
    }
}

/// One captured variable described after `OP_CLOSURE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    /// Offset of the descriptor pair
    pub offset: usize,
    /// Captures an enclosing local (true) or an enclosing upvalue (false)
    pub is_local: bool,
    /// Slot or upvalue index
    pub index: u8,
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Byte offset of the opcode
    pub offset: usize,
    /// Raw opcode byte
    pub byte: u8,
    /// Decoded opcode, `None` for unknown bytes
    pub opcode: Option<OpCode>,
    /// Source line of the opcode
    pub line: u32,
    /// Whether the previous instruction came from the same line
    pub same_line: bool,
    /// Rendered operand text, empty for operand-less instructions
    pub operands: String,
    /// Closure capture descriptors
    pub captures: Vec<Capture>,
    /// Total encoded length in bytes
    pub len: usize,
}

impl DecodedInstruction {
    /// Listing name of the instruction
    pub fn mnemonic(&self) -> String {
        match self.opcode {
            Some(op) => op.mnemonic().to_string(),
            None => format!("Unknown opcode {}", self.byte),
        }
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} ", self.offset)?;
        if self.same_line {
            write!(f, "   | ")?;
        } else {
            write!(f, "{:4} ", self.line)?;
        }
        if self.operands.is_empty() {
            write!(f, "{}", self.mnemonic())?;
        } else {
            write!(f, "{:<16} {}", self.mnemonic(), self.operands)?;
        }
        for capture in &self.captures {
            let kind = if capture.is_local { "local" } else { "upvalue" };
            write!(
                f,
                "\n{:04}      |                     {} {}",
                capture.offset, kind, capture.index
            )?;
        }
        Ok(())
    }
}

/// Decode the instruction starting at `offset`
pub fn disassemble_instruction(
    chunk: &Chunk,
    offset: usize,
    formatter: &dyn ConstantFormatter,
) -> DecodedInstruction {
    let byte_at = |at: usize| chunk.code().get(at).copied().unwrap_or(0);
    let constant_at = |index: usize| {
        chunk
            .constant(index)
            .map(|value| formatter.format_constant(value))
            .unwrap_or_else(|| "<bad constant>".to_string())
    };

    let byte = byte_at(offset);
    let opcode = OpCode::from_byte(byte);
    let line = chunk.line_for(offset);
    let same_line = offset > 0 && chunk.line_for(offset - 1) == line;

    let long_at = |at: usize| {
        usize::from(byte_at(at))
            | usize::from(byte_at(at + 1)) << 8
            | usize::from(byte_at(at + 2)) << 16
    };

    let mut captures = Vec::new();
    let (operands, len) = match opcode.map(OpCode::operands) {
        None | Some(Operands::None) => (String::new(), 1),
        Some(Operands::Byte) => (format!("{:4}", byte_at(offset + 1)), 2),
        Some(Operands::Constant) => {
            let index = usize::from(byte_at(offset + 1));
            (format!("{:4} '{}'", index, constant_at(index)), 2)
        }
        Some(Operands::ConstantLong) => {
            let index = long_at(offset + 1);
            (format!("{:4} '{}'", index, constant_at(index)), 4)
        }
        Some(Operands::JumpForward) | Some(Operands::JumpBackward) => {
            let jump = usize::from(u16::from_be_bytes([
                byte_at(offset + 1),
                byte_at(offset + 2),
            ]));
            let target = if opcode == Some(OpCode::Loop) {
                (offset + 3).saturating_sub(jump)
            } else {
                offset + 3 + jump
            };
            (format!("{offset:4} -> {target}"), 3)
        }
        Some(shape @ (Operands::Invoke | Operands::InvokeLong)) => {
            let (index, width) = if shape == Operands::Invoke {
                (usize::from(byte_at(offset + 1)), 1)
            } else {
                (long_at(offset + 1), 3)
            };
            let argc = byte_at(offset + 1 + width);
            (
                format!("({} args) {:4} '{}'", argc, index, constant_at(index)),
                2 + width,
            )
        }
        Some(shape @ (Operands::Closure | Operands::ClosureLong)) => {
            let (index, width) = if shape == Operands::Closure {
                (usize::from(byte_at(offset + 1)), 1)
            } else {
                (long_at(offset + 1), 3)
            };
            let function = chunk.constant(index).unwrap_or_default();
            let mut at = offset + 1 + width;
            for _ in 0..formatter.upvalue_count(function) {
                captures.push(Capture {
                    offset: at,
                    is_local: byte_at(at) == 1,
                    index: byte_at(at + 1),
                });
                at += 2;
            }
            (format!("{:4} {}", index, constant_at(index)), at - offset)
        }
    };

    DecodedInstruction {
        offset,
        byte,
        opcode,
        line,
        same_line,
        operands,
        captures,
        len,
    }
}

/// Decode every instruction in the chunk
pub fn decode(chunk: &Chunk, formatter: &dyn ConstantFormatter) -> Vec<DecodedInstruction> {
    let mut instructions = Vec::new();
    let mut offset = 0;
    while offset < chunk.len() {
        let instruction = disassemble_instruction(chunk, offset, formatter);
        offset += instruction.len;
        instructions.push(instruction);
    }
    instructions
}

/// Render a full listing headed by `== name ==`
pub fn disassemble_chunk(chunk: &Chunk, name: &str, formatter: &dyn ConstantFormatter) -> String {
    let mut out = format!("== {name} ==");
    for instruction in decode(chunk, formatter) {
        out.push('\n');
        out.push_str(&instruction.to_string());
    }
    out
}
