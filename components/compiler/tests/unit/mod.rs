//! Unit test runner for compiler

mod test_errors;
mod test_scanner;

use bytecode_system::{decode, Chunk, OpCode};
use compiler::compile;
use core_types::ObjRef;
use memory_manager::{Function, Heap, NoRoots, Obj};
use std::rc::Rc;

/// Compile `source`, panicking on diagnostics
pub fn compile_ok(source: &str) -> (Heap, ObjRef) {
    let mut heap = Heap::new();
    let script = match compile(source, &mut heap, &NoRoots) {
        Ok(script) => script,
        Err(err) => panic!("unexpected compile error:\n{err}"),
    };
    (heap, script)
}

/// Rendered diagnostics for `source`
pub fn compile_errors(source: &str) -> Vec<String> {
    let mut heap = Heap::new();
    match compile(source, &mut heap, &NoRoots) {
        Ok(_) => Vec::new(),
        Err(err) => err.diagnostics.iter().map(|d| d.to_string()).collect(),
    }
}

pub fn function(heap: &Heap, r: ObjRef) -> &Function {
    heap.get(r).as_function().expect("not a function")
}

pub fn chunk_of(heap: &Heap, r: ObjRef) -> Rc<Chunk> {
    Rc::clone(&function(heap, r).chunk)
}

pub fn opcodes(heap: &Heap, chunk: &Chunk) -> Vec<OpCode> {
    decode(chunk, heap)
        .into_iter()
        .map(|instruction| instruction.opcode.expect("undecodable byte"))
        .collect()
}

/// The function constant named `name` inside `chunk`
pub fn nested(heap: &Heap, chunk: &Chunk, name: &str) -> ObjRef {
    chunk
        .constants()
        .iter()
        .filter_map(|value| value.as_object())
        .find(|r| match heap.get(*r) {
            Obj::Function(f) => f.name.is_some_and(|n| heap.string(n) == name),
            _ => false,
        })
        .unwrap_or_else(|| panic!("no function named {name}"))
}
