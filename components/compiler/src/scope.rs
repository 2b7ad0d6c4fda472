//! Per-function compile state: locals, upvalues, loops

use bytecode_system::Chunk;
use core_types::ObjRef;
use std::collections::HashMap;

/// Maximum number of locals (including slot 0) in one function
pub const MAX_LOCALS: usize = 256;

/// Maximum number of captured variables in one function
pub const MAX_UPVALUES: usize = 256;

/// What kind of function is being compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Top-level code
    Script,
    /// Function declaration or anonymous function
    Function,
    /// Class method
    Method,
    /// `init` method
    Initializer,
}

/// A local variable slot
#[derive(Debug, Clone)]
pub(crate) struct Local<'src> {
    pub name: &'src str,
    /// Scope depth, `None` while the initializer is still being compiled
    pub depth: Option<usize>,
    pub is_captured: bool,
}

/// Capture descriptor emitted after `OP_CLOSURE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvalueRef {
    /// Slot or upvalue index in the enclosing function
    pub index: u8,
    /// Whether `index` is an enclosing local slot
    pub is_local: bool,
}

/// An enclosing loop, for `break` and `continue`
#[derive(Debug, Clone)]
pub(crate) struct LoopScope {
    /// Where `continue` jumps back to
    pub continue_target: usize,
    /// Scope depth outside the loop body
    pub scope_depth: usize,
    /// Unpatched `break` jumps
    pub break_jumps: Vec<usize>,
}

/// Compile state of one function
pub(crate) struct FunctionState<'src> {
    pub kind: FunctionKind,
    pub name: Option<ObjRef>,
    pub arity: u8,
    pub chunk: Chunk,
    pub locals: Vec<Local<'src>>,
    pub upvalues: Vec<UpvalueRef>,
    pub scope_depth: usize,
    pub loops: Vec<LoopScope>,
    /// Constant index already holding an identifier
    pub identifiers: HashMap<ObjRef, usize>,
}

impl<'src> FunctionState<'src> {
    pub fn new(kind: FunctionKind, name: Option<ObjRef>) -> Self {
        // Slot 0 holds the callee, or `this` inside methods.
        let receiver = match kind {
            FunctionKind::Method | FunctionKind::Initializer => "this",
            FunctionKind::Script | FunctionKind::Function => "",
        };
        FunctionState {
            kind,
            name,
            arity: 0,
            chunk: Chunk::new(),
            locals: vec![Local {
                name: receiver,
                depth: Some(0),
                is_captured: false,
            }],
            upvalues: Vec::new(),
            scope_depth: 0,
            loops: Vec::new(),
            identifiers: HashMap::new(),
        }
    }

    /// Find a local by name, innermost first
    pub fn resolve_local(&self, name: &str) -> Option<(u8, &Local<'src>)> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name)
            .map(|(slot, local)| (slot as u8, local))
    }

    /// Index of the upvalue capturing `index`, adding it if new
    pub fn add_upvalue(&mut self, index: u8, is_local: bool) -> Result<u8, &'static str> {
        let wanted = UpvalueRef { index, is_local };
        if let Some(existing) = self.upvalues.iter().position(|u| *u == wanted) {
            return Ok(existing as u8);
        }
        if self.upvalues.len() == MAX_UPVALUES {
            return Err("Too many closure variables in function.");
        }
        self.upvalues.push(wanted);
        Ok((self.upvalues.len() - 1) as u8)
    }

    /// Check whether `name` is already declared in the innermost scope
    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.locals
            .iter()
            .rev()
            .take_while(|local| local.depth.map_or(true, |d| d >= self.scope_depth))
            .any(|local| local.name == name)
    }

    /// Locals declared deeper than `depth`, innermost first
    pub fn locals_above(&self, depth: usize) -> impl Iterator<Item = &Local<'src>> {
        self.locals
            .iter()
            .rev()
            .take_while(move |local| local.depth.map_or(true, |d| d > depth))
    }
}
