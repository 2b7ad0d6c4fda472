//! Bytecode chunk - compiled bytecode container
//!
//! A chunk owns the raw instruction bytes of one function, its constant pool
//! and a run-length encoded table mapping bytes back to source lines.

use crate::opcode::OpCode;
use core_types::Value;

/// Largest constant index addressable by a one-byte operand
pub const MAX_SHORT_CONSTANT: usize = u8::MAX as usize;

/// Largest constant index addressable by a three-byte operand
pub const MAX_LONG_CONSTANT: usize = (1 << 24) - 1;

/// A run of consecutive bytes that share one source line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    /// Source line (1-based)
    pub line: u32,
    /// Number of bytes in the run
    pub count: u32,
}

/// A compiled bytecode chunk containing instructions and constants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    constants: Vec<Value>,
    lines: Vec<LineRun>,
}

impl Chunk {
    /// Create a new empty bytecode chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte produced by source line `line`
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        match self.lines.last_mut() {
            Some(run) if run.line == line => run.count += 1,
            _ => self.lines.push(LineRun { line, count: 1 }),
        }
    }

    /// Append an opcode byte
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(op.into(), line);
    }

    /// Add a constant to the constant pool and return its index
    ///
    /// The pool is append-only; callers that want to share entries must
    /// remember the returned index themselves.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Emit a constant load, choosing the short or long form by index
    ///
    /// Returns the pool index, or `None` when the pool is beyond the reach
    /// of even the three-byte operand.
    ///
    /// # Example
    ///
    /// ```
    /// use bytecode_system::{Chunk, OpCode};
    /// use core_types::Value;
    ///
    /// let mut chunk = Chunk::new();
    /// chunk.write_constant(Value::number(1.2), 123);
    /// assert_eq!(chunk.code()[0], u8::from(OpCode::Constant));
    /// assert_eq!(chunk.line_for(1), 123);
    /// ```
    pub fn write_constant(&mut self, value: Value, line: u32) -> Option<usize> {
        let index = self.add_constant(value);
        self.write_indexed(OpCode::Constant, OpCode::ConstantLong, index, line)
            .then_some(index)
    }

    /// Emit `short` with a one-byte operand or `long` with a three-byte
    /// little-endian operand, depending on `index`
    pub fn write_indexed(&mut self, short: OpCode, long: OpCode, index: usize, line: u32) -> bool {
        if index <= MAX_SHORT_CONSTANT {
            self.write_op(short, line);
            self.write(index as u8, line);
            true
        } else if index <= MAX_LONG_CONSTANT {
            self.write_op(long, line);
            for shift in [0, 8, 16] {
                self.write((index >> shift) as u8, line);
            }
            true
        } else {
            false
        }
    }

    /// Source line of the byte at `offset`
    ///
    /// Offsets past the end report the last recorded line, or 0 for an
    /// empty chunk.
    pub fn line_for(&self, offset: usize) -> u32 {
        let mut start = 0usize;
        for run in &self.lines {
            start += run.count as usize;
            if offset < start {
                return run.line;
            }
        }
        self.lines.last().map_or(0, |run| run.line)
    }

    /// Overwrite a previously written byte (used for jump patching)
    pub fn patch(&mut self, offset: usize, byte: u8) {
        self.code[offset] = byte;
    }

    /// Instruction bytes
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Constant pool
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Constant at `index`
    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// Run-length encoded line table
    pub fn lines(&self) -> &[LineRun] {
        &self.lines
    }

    /// Number of code bytes
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if no code has been written
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Approximate heap footprint, for GC accounting
    pub fn byte_size(&self) -> usize {
        self.code.capacity()
            + self.constants.capacity() * std::mem::size_of::<Value>()
            + self.lines.capacity() * std::mem::size_of::<LineRun>()
    }

    /// Read a three-byte little-endian operand starting at `offset`
    pub fn read_u24(&self, offset: usize) -> usize {
        usize::from(self.code[offset])
            | usize::from(self.code[offset + 1]) << 8
            | usize::from(self.code[offset + 2]) << 16
    }

    /// Read a two-byte big-endian operand starting at `offset`
    pub fn read_u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.code[offset], self.code[offset + 1]])
    }
}
