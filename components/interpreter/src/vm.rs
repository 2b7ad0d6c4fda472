//! Virtual Machine for bytecode execution
//!
//! Main entry point for running Lox programs.

use compiler::{compile_with, CompileOptions};
use core_types::{InterpretError, ObjRef, RuntimeError, StackFrame, Value};
use log::debug;
use memory_manager::{Closure, Heap, Native, NativeFn, NoRoots, Obj};
use std::io::{self, Write};

use crate::config::VmConfig;
use crate::context::ExecutionContext;
use crate::natives::STANDARD_NATIVES;

/// Virtual Machine for executing Lox bytecode
///
/// The VM owns the heap and all runtime state. Globals survive across
/// [`Vm::interpret`] calls, so one VM can serve a whole REPL session; after
/// a runtime error the stacks are reset and the VM is ready for more input.
pub struct Vm {
    pub(crate) heap: Heap,
    pub(crate) ctx: ExecutionContext,
    pub(crate) config: VmConfig,
    pub(crate) output: Box<dyn Write>,
}

impl Vm {
    /// Create a VM with the default configuration, printing to stdout
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Create a VM with an explicit configuration
    pub fn with_config(config: VmConfig) -> Self {
        let mut heap = Heap::with_config(config.gc.clone());
        let init_string = heap.intern("init", &NoRoots);
        let mut vm = Self {
            heap,
            ctx: ExecutionContext::new(init_string),
            config,
            output: Box::new(io::stdout()),
        };
        vm.define_standard_natives();
        vm
    }

    /// Redirect `print` output
    ///
    /// # Example
    ///
    /// ```
    /// use interpreter::Vm;
    ///
    /// let mut vm = Vm::new().with_output(Vec::new());
    /// vm.interpret("print 1;").unwrap();
    /// ```
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    fn define_standard_natives(&mut self) {
        for &(name, arity, function) in STANDARD_NATIVES {
            self.define_native(name, arity, function);
        }
    }

    /// Bind a host function to a global name
    pub fn define_native(&mut self, name: &str, arity: u8, function: NativeFn) {
        let name = self.heap.intern(name, &self.ctx);
        // The pending object's references are roots, so `name` survives
        // a collection triggered here.
        let native = self.heap.alloc(
            Obj::Native(Native {
                name,
                arity,
                function,
            }),
            &self.ctx,
        );
        self.ctx.globals.insert(name, Value::object(native));
    }

    /// Compile and run `source`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The program ran to completion
    /// * `Err(InterpretError::Compile)` - Nothing was executed
    /// * `Err(InterpretError::Runtime)` - Execution stopped at the error
    ///
    /// # Example
    ///
    /// ```
    /// use core_types::InterpretResult;
    /// use interpreter::Vm;
    ///
    /// let mut vm = Vm::new().with_output(Vec::new());
    /// let result = vm.interpret("print -\"a\";");
    /// assert_eq!(InterpretResult::from(&result), InterpretResult::RuntimeError);
    /// ```
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        let options = CompileOptions {
            print_code: self.config.print_code,
        };
        let function = compile_with(source, &mut self.heap, &self.ctx, options)?;

        self.ctx.push(Value::object(function));
        let closure = self.heap.alloc(
            Obj::Closure(Closure {
                function,
                upvalues: Vec::new(),
            }),
            &self.ctx,
        );
        self.ctx.pop();
        self.ctx.push(Value::object(closure));

        self.call_closure(closure, 0)
            .and_then(|()| self.run())
            .map_err(|error| InterpretError::Runtime(self.unwind(error)))
    }

    /// Attach the call stack to `error` and reset the machine
    fn unwind(&mut self, mut error: RuntimeError) -> RuntimeError {
        error.stack = self
            .ctx
            .frames
            .iter()
            .rev()
            .map(|frame| StackFrame {
                function_name: self.function_name(frame.closure),
                line: frame.current_line(),
            })
            .collect();
        debug!("runtime error: {}", error.message);
        // Closures that escaped keep working once the stack is gone.
        self.close_upvalues(0);
        self.ctx.reset();
        error
    }

    fn function_name(&self, closure: ObjRef) -> Option<String> {
        let function = self.heap.get(closure).as_closure()?.function;
        let name = self.heap.get(function).as_function()?.name?;
        Some(self.heap.string(name).to_string())
    }

    /// Current value of a global, if defined
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = self.heap.find_string(name)?;
        self.ctx.globals.get(&name).copied()
    }

    /// Render a value the way `print` does
    pub fn format_value(&self, value: Value) -> String {
        self.heap.format_value(value)
    }

    /// The object heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Run a full collection now
    pub fn collect_garbage(&mut self) {
        self.heap.collect_garbage(&self.ctx);
    }

    /// Number of values on the stack
    pub fn stack_depth(&self) -> usize {
        self.ctx.stack.len()
    }

    /// Number of active call frames
    pub fn frame_depth(&self) -> usize {
        self.ctx.frames.len()
    }

    /// VM configuration
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Drop every global and free every heap object
    ///
    /// The VM is left as if freshly created: the standard natives are
    /// defined again and all previously returned handles are stale.
    pub fn shutdown(&mut self) {
        self.ctx.reset();
        self.ctx.globals.clear();
        self.heap.free_all();
        self.ctx.init_string = self.heap.intern("init", &NoRoots);
        self.define_standard_natives();
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("config", &self.config)
            .field("stack_depth", &self.ctx.stack.len())
            .field("frame_depth", &self.ctx.frames.len())
            .field("globals", &self.ctx.globals.len())
            .field("objects", &self.heap.object_count())
            .finish()
    }
}
