//! Upvalue support for closures
//!
//! An upvalue starts out open, pointing at a stack slot that still holds the
//! captured variable. When that slot goes out of scope the value is copied
//! into the upvalue and it becomes closed. At most one open upvalue exists
//! per stack slot, so every closure capturing a variable shares it.

use core_types::{ObjRef, Value};
use memory_manager::{Obj, Upvalue};

use crate::vm::Vm;

impl Vm {
    /// Return the open upvalue for `slot`, creating it if needed
    pub(crate) fn capture_upvalue(&mut self, slot: usize) -> ObjRef {
        let open = &self.ctx.open_upvalues;
        let position = match open.binary_search_by_key(&slot, |&(s, _)| s) {
            Ok(found) => return open[found].1,
            Err(insert_at) => insert_at,
        };
        let upvalue = self
            .heap
            .alloc(Obj::Upvalue(Upvalue::Open(slot)), &self.ctx);
        self.ctx.open_upvalues.insert(position, (slot, upvalue));
        upvalue
    }

    /// Close every open upvalue at or above stack index `last`
    pub(crate) fn close_upvalues(&mut self, last: usize) {
        let keep = self
            .ctx
            .open_upvalues
            .partition_point(|&(slot, _)| slot < last);
        for (slot, upvalue) in self.ctx.open_upvalues.drain(keep..) {
            let value = self.ctx.stack[slot];
            *self.heap.get_mut(upvalue) = Obj::Upvalue(Upvalue::Closed(value));
        }
    }

    /// Current value of a captured variable
    pub(crate) fn read_upvalue(&self, upvalue: ObjRef) -> Value {
        match self.heap.get(upvalue) {
            Obj::Upvalue(Upvalue::Open(slot)) => self.ctx.stack[*slot],
            Obj::Upvalue(Upvalue::Closed(value)) => *value,
            other => panic!("expected upvalue, found {}", other.type_name()),
        }
    }

    /// Assign a captured variable
    pub(crate) fn write_upvalue(&mut self, upvalue: ObjRef, value: Value) {
        match self.heap.get_mut(upvalue) {
            Obj::Upvalue(Upvalue::Open(slot)) => {
                let slot = *slot;
                self.ctx.stack[slot] = value;
            }
            Obj::Upvalue(Upvalue::Closed(closed)) => *closed = value,
            other => panic!("expected upvalue, found {}", other.type_name()),
        }
    }

    /// Handle of upvalue `index` of the running closure
    pub(crate) fn frame_upvalue(&mut self, index: usize) -> ObjRef {
        let closure = self.ctx.frame().closure;
        match self.heap.get(closure) {
            Obj::Closure(c) => c.upvalues[index],
            other => panic!("expected closure, found {}", other.type_name()),
        }
    }
}
