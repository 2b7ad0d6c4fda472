//! Execution context for the VM
//!
//! Everything the collector must treat as live while code runs: the value
//! stack, the frame stack, the global table and the open upvalues.

use arrayvec::ArrayVec;
use core_types::{ObjRef, Value};
use memory_manager::{Marker, RootSource};
use std::collections::HashMap;

use crate::call_frame::{CallFrame, FRAMES_MAX};

/// Runtime state of a VM
#[derive(Debug)]
pub struct ExecutionContext {
    /// Value stack shared by all frames
    pub stack: Vec<Value>,
    /// Active calls, innermost last
    pub frames: ArrayVec<CallFrame, FRAMES_MAX>,
    /// Global variables keyed by interned name
    pub globals: HashMap<ObjRef, Value>,
    /// Upvalues still pointing into the stack, as `(slot, upvalue)` sorted
    /// by slot
    pub open_upvalues: Vec<(usize, ObjRef)>,
    /// The interned string `init`
    pub init_string: ObjRef,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new(init_string: ObjRef) -> Self {
        Self {
            stack: Vec::with_capacity(FRAMES_MAX * 256),
            frames: ArrayVec::new(),
            globals: HashMap::new(),
            open_upvalues: Vec::new(),
            init_string,
        }
    }

    /// Push a value
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop a value
    pub fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }

    /// Value `distance` slots below the top
    pub fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    /// Overwrite the value `distance` slots below the top
    pub fn set_peek(&mut self, distance: usize, value: Value) {
        let index = self.stack.len() - 1 - distance;
        self.stack[index] = value;
    }

    /// The innermost frame
    ///
    /// # Panics
    ///
    /// Panics when no call is active.
    pub fn frame(&mut self) -> &mut CallFrame {
        self.frames
            .last_mut()
            .unwrap_or_else(|| panic!("no active call frame"))
    }

    /// Drop the stack, frames and open upvalues after an error
    pub fn reset(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.open_upvalues.clear();
    }
}

impl RootSource for ExecutionContext {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        marker.mark_values(&self.stack);
        for frame in &self.frames {
            marker.mark_object(frame.closure);
        }
        for &(_, upvalue) in &self.open_upvalues {
            marker.mark_object(upvalue);
        }
        for (&name, &value) in &self.globals {
            marker.mark_object(name);
            marker.mark_value(value);
        }
        marker.mark_object(self.init_string);
    }
}
