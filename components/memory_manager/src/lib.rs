//! Memory Manager - object heap and garbage collection
//!
//! This component provides:
//! - The heap object model (strings, functions, closures, classes, ...)
//! - A slab heap addressed by generation-checked handles
//! - String interning
//! - A stop-the-world tri-color mark-sweep collector

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gc;
pub mod heap;
pub mod interner;
pub mod object;

// Re-export main types
pub use gc::{GcConfig, GcStats, Marker, NoRoots, RootSource};
pub use heap::Heap;
pub use interner::Interner;
pub use object::{
    hash_string, BoundMethod, Class, Closure, Function, Instance, LoxString, Native, NativeFn, Obj,
    Upvalue,
};
