//! Heap object variants.
//!
//! Every object the runtime allocates is one of the [`Obj`] variants. Objects
//! refer to each other only through [`ObjRef`] handles, so the collector can
//! trace them without owning pointers.

use bytecode_system::Chunk;
use core_types::{ObjRef, Value};
use std::collections::HashMap;
use std::mem::size_of;
use std::rc::Rc;

/// Signature of host functions callable from Lox.
///
/// Natives receive their arguments as a slice and either return a value or
/// a message that becomes a runtime error.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// 32-bit FNV-1a hash used for string interning.
pub fn hash_string(text: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in text.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

/// Interned, immutable string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoxString {
    text: Box<str>,
    hash: u32,
}

impl LoxString {
    /// Wrap `text`, computing its hash
    pub fn new(text: impl Into<Box<str>>) -> Self {
        let text = text.into();
        let hash = hash_string(&text);
        Self { text, hash }
    }

    /// Wrap `text` whose FNV-1a hash the caller already computed
    pub fn with_hash(text: impl Into<Box<str>>, hash: u32) -> Self {
        let text = text.into();
        debug_assert_eq!(hash, hash_string(&text));
        Self { text, hash }
    }

    /// String contents
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Precomputed FNV-1a hash
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

/// Compiled function.
#[derive(Debug, Clone)]
pub struct Function {
    /// Number of declared parameters
    pub arity: u8,
    /// Number of variables captured by closures over this function
    pub upvalue_count: usize,
    /// Compiled body, shared with the call frames executing it
    pub chunk: Rc<Chunk>,
    /// Function name; `None` for the top-level script
    pub name: Option<ObjRef>,
}

/// Host function exposed to Lox code.
#[derive(Debug, Clone)]
pub struct Native {
    /// Global name the native was registered under
    pub name: ObjRef,
    /// Required argument count
    pub arity: u8,
    /// Host entry point
    pub function: NativeFn,
}

/// Function plus its captured variables.
#[derive(Debug, Clone)]
pub struct Closure {
    /// The underlying [`Function`]
    pub function: ObjRef,
    /// Captured [`Upvalue`] objects, in capture-descriptor order
    pub upvalues: Vec<ObjRef>,
}

/// A captured variable.
///
/// An upvalue starts open, aliasing a live stack slot, and is closed exactly
/// once when that slot goes out of scope, after which it owns the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Upvalue {
    /// Variable still lives on the VM stack at this absolute slot
    Open(usize),
    /// Variable has been moved off the stack
    Closed(Value),
}

impl Upvalue {
    /// Check if the variable still lives on the stack
    pub fn is_open(&self) -> bool {
        matches!(self, Upvalue::Open(_))
    }
}

/// A class and its methods.
#[derive(Debug, Clone)]
pub struct Class {
    /// Class name
    pub name: ObjRef,
    /// Interned method name to closure
    pub methods: HashMap<ObjRef, ObjRef>,
}

/// An instance of a class.
#[derive(Debug, Clone)]
pub struct Instance {
    /// The instance's class
    pub class: ObjRef,
    /// Interned field name to value
    pub fields: HashMap<ObjRef, Value>,
}

/// A method closure bound to its receiver.
#[derive(Debug, Clone, Copy)]
pub struct BoundMethod {
    /// Value that becomes `this`
    pub receiver: Value,
    /// Method closure
    pub method: ObjRef,
}

/// Any heap-allocated object.
#[derive(Debug, Clone)]
pub enum Obj {
    /// Interned string
    String(LoxString),
    /// Compiled function
    Function(Function),
    /// Host function
    Native(Native),
    /// Closure
    Closure(Closure),
    /// Captured variable
    Upvalue(Upvalue),
    /// Class
    Class(Class),
    /// Class instance
    Instance(Instance),
    /// Bound method
    BoundMethod(BoundMethod),
}

/// Accounted size of one table entry (key + value + hash overhead).
pub(crate) const TABLE_ENTRY_SIZE: usize = size_of::<ObjRef>() + size_of::<Value>() + 8;

impl Obj {
    /// Short type name used in logs and diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Obj::String(_) => "string",
            Obj::Function(_) => "function",
            Obj::Native(_) => "native",
            Obj::Closure(_) => "closure",
            Obj::Upvalue(_) => "upvalue",
            Obj::Class(_) => "class",
            Obj::Instance(_) => "instance",
            Obj::BoundMethod(_) => "bound method",
        }
    }

    /// Bytes charged against the GC threshold for this object
    pub fn byte_size(&self) -> usize {
        size_of::<Obj>()
            + match self {
                Obj::String(s) => s.as_str().len(),
                Obj::Function(f) => f.chunk.byte_size(),
                // Upvalues are pushed after allocation; charge the reserved slots.
                Obj::Closure(c) => c.upvalues.capacity() * size_of::<ObjRef>(),
                Obj::Class(c) => c.methods.len() * TABLE_ENTRY_SIZE,
                Obj::Instance(i) => i.fields.len() * TABLE_ENTRY_SIZE,
                Obj::Native(_) | Obj::Upvalue(_) | Obj::BoundMethod(_) => 0,
            }
    }

    /// Push every object this one references onto `out`
    pub fn trace(&self, out: &mut Vec<ObjRef>) {
        fn value(out: &mut Vec<ObjRef>, v: Value) {
            out.extend(v.as_object());
        }
        match self {
            Obj::String(_) => {}
            Obj::Function(f) => {
                for constant in f.chunk.constants() {
                    value(out, *constant);
                }
                out.extend(f.name);
            }
            Obj::Native(n) => out.push(n.name),
            Obj::Closure(c) => {
                out.push(c.function);
                out.extend(c.upvalues.iter().copied());
            }
            Obj::Upvalue(Upvalue::Closed(v)) => value(out, *v),
            Obj::Upvalue(Upvalue::Open(_)) => {}
            Obj::Class(c) => {
                out.push(c.name);
                for (name, method) in &c.methods {
                    out.push(*name);
                    out.push(*method);
                }
            }
            Obj::Instance(i) => {
                out.push(i.class);
                for (name, field) in &i.fields {
                    out.push(*name);
                    value(out, *field);
                }
            }
            Obj::BoundMethod(b) => {
                value(out, b.receiver);
                out.push(b.method);
            }
        }
    }

    /// The string payload, if this is a string
    pub fn as_string(&self) -> Option<&LoxString> {
        match self {
            Obj::String(s) => Some(s),
            _ => None,
        }
    }

    /// The function payload, if this is a function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Obj::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The closure payload, if this is a closure
    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            Obj::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// The class payload, if this is a class
    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Obj::Class(c) => Some(c),
            _ => None,
        }
    }

    /// The instance payload, if this is an instance
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Obj::Instance(i) => Some(i),
            _ => None,
        }
    }
}
