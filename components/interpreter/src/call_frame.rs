//! Call frame for function call stack management

use bytecode_system::Chunk;
use core_types::{ObjRef, Value};
use std::rc::Rc;

/// Maximum call depth
pub const FRAMES_MAX: usize = 64;

/// Call frame representing one active closure invocation
///
/// The frame keeps its own handle on the closure's chunk so instructions can
/// be fetched without going through the heap.
#[derive(Debug, Clone)]
pub struct CallFrame {
    /// Closure being executed
    pub closure: ObjRef,
    /// Bytecode of the closure's function
    pub chunk: Rc<Chunk>,
    /// Offset of the next instruction
    pub ip: usize,
    /// Stack index of slot 0 (the callee or receiver)
    pub slots: usize,
}

impl CallFrame {
    /// Create a frame positioned at the first instruction
    pub fn new(closure: ObjRef, chunk: Rc<Chunk>, slots: usize) -> Self {
        Self {
            closure,
            chunk,
            ip: 0,
            slots,
        }
    }

    /// Fetch one byte and advance
    pub fn read_byte(&mut self) -> u8 {
        let byte = self.chunk.code()[self.ip];
        self.ip += 1;
        byte
    }

    /// Fetch a two-byte big-endian operand
    pub fn read_u16(&mut self) -> u16 {
        let value = self.chunk.read_u16(self.ip);
        self.ip += 2;
        value
    }

    /// Fetch a three-byte little-endian operand
    pub fn read_u24(&mut self) -> usize {
        let value = self.chunk.read_u24(self.ip);
        self.ip += 3;
        value
    }

    /// Fetch a one-byte constant index and return the constant
    pub fn read_constant(&mut self) -> Value {
        let index = usize::from(self.read_byte());
        self.constant(index)
    }

    /// Fetch a three-byte constant index and return the constant
    pub fn read_constant_long(&mut self) -> Value {
        let index = self.read_u24();
        self.constant(index)
    }

    fn constant(&self, index: usize) -> Value {
        self.chunk
            .constant(index)
            .unwrap_or_else(|| panic!("constant {index} out of range"))
    }

    /// Source line of the instruction that was fetched last
    pub fn current_line(&self) -> u32 {
        self.chunk.line_for(self.ip.saturating_sub(1))
    }
}
