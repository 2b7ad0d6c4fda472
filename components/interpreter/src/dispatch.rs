//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution and the call protocol. Every handler
//! returns `Result<_, RuntimeError>`; the caller in [`crate::vm`] attaches
//! the stack trace and resets the machine.

use bytecode_system::{disassemble_instruction, OpCode};
use core_types::{ObjRef, RuntimeError, RuntimeErrorKind, Value};
use log::trace;
use memory_manager::{BoundMethod, Class, Closure, Instance, NativeFn, Obj};
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::call_frame::CallFrame;
use crate::vm::Vm;

/// What a called value turned out to be
enum Callee {
    Bound { receiver: Value, method: ObjRef },
    Class { initializer: Option<ObjRef> },
    Closure,
    Native { arity: u8, function: NativeFn },
    NotCallable,
}

fn type_error(message: &str) -> RuntimeError {
    RuntimeError::new(RuntimeErrorKind::TypeError, message)
}

fn arity_error(expected: u8, got: u8) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::ArityMismatch,
        format!("Expected {expected} arguments but got {got}."),
    )
}

impl Vm {
    /// Execute until the outermost frame returns
    pub(crate) fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            if self.config.trace_execution {
                self.trace_instruction();
            }

            let byte = self.ctx.frame().read_byte();
            let Some(op) = OpCode::from_byte(byte) else {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::InvalidBytecode,
                    format!("Unknown opcode {byte}."),
                ));
            };

            match op {
                OpCode::Constant => {
                    let value = self.ctx.frame().read_constant();
                    self.ctx.push(value);
                }
                OpCode::ConstantLong => {
                    let value = self.ctx.frame().read_constant_long();
                    self.ctx.push(value);
                }
                OpCode::Nil => self.ctx.push(Value::nil()),
                OpCode::True => self.ctx.push(Value::boolean(true)),
                OpCode::False => self.ctx.push(Value::boolean(false)),
                OpCode::Pop => {
                    self.ctx.pop();
                }
                OpCode::GetLocal => {
                    let slot = self.read_slot();
                    let value = self.ctx.stack[slot];
                    self.ctx.push(value);
                }
                OpCode::SetLocal => {
                    let slot = self.read_slot();
                    self.ctx.stack[slot] = self.ctx.peek(0);
                }
                OpCode::GetGlobal | OpCode::GetGlobalLong => {
                    let name = self.read_name(op == OpCode::GetGlobalLong);
                    match self.ctx.globals.get(&name) {
                        Some(&value) => self.ctx.push(value),
                        None => return Err(self.undefined_variable(name)),
                    }
                }
                OpCode::DefineGlobal | OpCode::DefineGlobalLong => {
                    let name = self.read_name(op == OpCode::DefineGlobalLong);
                    let value = self.ctx.peek(0);
                    self.ctx.globals.insert(name, value);
                    self.ctx.pop();
                }
                OpCode::SetGlobal | OpCode::SetGlobalLong => {
                    let name = self.read_name(op == OpCode::SetGlobalLong);
                    let value = self.ctx.peek(0);
                    match self.ctx.globals.get_mut(&name) {
                        Some(slot) => *slot = value,
                        None => return Err(self.undefined_variable(name)),
                    }
                }
                OpCode::GetUpvalue => {
                    let index = usize::from(self.ctx.frame().read_byte());
                    let upvalue = self.frame_upvalue(index);
                    let value = self.read_upvalue(upvalue);
                    self.ctx.push(value);
                }
                OpCode::SetUpvalue => {
                    let index = usize::from(self.ctx.frame().read_byte());
                    let upvalue = self.frame_upvalue(index);
                    let value = self.ctx.peek(0);
                    self.write_upvalue(upvalue, value);
                }
                OpCode::GetProperty | OpCode::GetPropertyLong => {
                    let name = self.read_name(op == OpCode::GetPropertyLong);
                    let Some(instance) = self.instance_of(self.ctx.peek(0)) else {
                        return Err(type_error("Only instances have properties."));
                    };
                    let (field, class) = self.lookup_field(instance, name);
                    match field {
                        Some(value) => {
                            self.ctx.pop();
                            self.ctx.push(value);
                        }
                        None => self.bind_method(class, name)?,
                    }
                }
                OpCode::SetProperty | OpCode::SetPropertyLong => {
                    let name = self.read_name(op == OpCode::SetPropertyLong);
                    let Some(instance) = self.instance_of(self.ctx.peek(1)) else {
                        return Err(type_error("Only instances have fields."));
                    };
                    let value = self.ctx.peek(0);
                    self.heap.set_field(instance, name, value);
                    let value = self.ctx.pop();
                    self.ctx.pop();
                    self.ctx.push(value);
                }
                OpCode::GetSuper | OpCode::GetSuperLong => {
                    let name = self.read_name(op == OpCode::GetSuperLong);
                    let superclass = self.pop_object();
                    self.bind_method(superclass, name)?;
                }
                OpCode::Equal => {
                    let b = self.ctx.pop();
                    let a = self.ctx.pop();
                    self.ctx.push(Value::boolean(a == b));
                }
                OpCode::NotEqual => {
                    let b = self.ctx.pop();
                    let a = self.ctx.pop();
                    self.ctx.push(Value::boolean(a != b));
                }
                OpCode::Greater => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::boolean(a > b));
                }
                OpCode::GreaterEqual => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::boolean(a >= b));
                }
                OpCode::Less => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::boolean(a < b));
                }
                OpCode::LessEqual => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::boolean(a <= b));
                }
                OpCode::Add => self.add()?,
                OpCode::Subtract => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::number(a - b));
                }
                OpCode::Multiply => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::number(a * b));
                }
                OpCode::Divide => {
                    let (a, b) = self.number_operands()?;
                    self.ctx.push(Value::number(a / b));
                }
                OpCode::Not => {
                    let value = self.ctx.pop();
                    self.ctx.push(Value::boolean(value.is_falsey()));
                }
                OpCode::Negate => match self.ctx.peek(0).as_number() {
                    Some(n) => self.ctx.set_peek(0, Value::number(-n)),
                    None => return Err(type_error("Operand must be a number.")),
                },
                OpCode::Print => {
                    let value = self.ctx.pop();
                    let text = self.heap.format_value(value);
                    writeln!(self.output, "{text}").map_err(|e| {
                        RuntimeError::new(
                            RuntimeErrorKind::Output,
                            format!("Failed to write output: {e}"),
                        )
                    })?;
                }
                OpCode::Jump => {
                    let frame = self.ctx.frame();
                    let offset = frame.read_u16();
                    frame.ip += usize::from(offset);
                }
                OpCode::JumpIfFalse => {
                    let condition = self.ctx.peek(0);
                    let frame = self.ctx.frame();
                    let offset = frame.read_u16();
                    if condition.is_falsey() {
                        frame.ip += usize::from(offset);
                    }
                }
                OpCode::Loop => {
                    let frame = self.ctx.frame();
                    let offset = frame.read_u16();
                    frame.ip -= usize::from(offset);
                }
                OpCode::Call => {
                    let argc = self.ctx.frame().read_byte();
                    let callee = self.ctx.peek(usize::from(argc));
                    self.call_value(callee, argc)?;
                }
                OpCode::Invoke | OpCode::InvokeLong => {
                    let name = self.read_name(op == OpCode::InvokeLong);
                    let argc = self.ctx.frame().read_byte();
                    self.invoke(name, argc)?;
                }
                OpCode::SuperInvoke | OpCode::SuperInvokeLong => {
                    let name = self.read_name(op == OpCode::SuperInvokeLong);
                    let argc = self.ctx.frame().read_byte();
                    let superclass = self.pop_object();
                    self.invoke_from_class(superclass, name, argc)?;
                }
                OpCode::Closure => self.make_closure(false),
                OpCode::ClosureLong => self.make_closure(true),
                OpCode::CloseUpvalue => {
                    self.close_upvalues(self.ctx.stack.len() - 1);
                    self.ctx.pop();
                }
                OpCode::Return => {
                    let result = self.ctx.pop();
                    let slots = self.ctx.frame().slots;
                    self.close_upvalues(slots);
                    self.ctx.frames.pop();
                    self.ctx.stack.truncate(slots);
                    if self.ctx.frames.is_empty() {
                        return Ok(());
                    }
                    self.ctx.push(result);
                }
                OpCode::Class | OpCode::ClassLong => {
                    let name = self.read_name(op == OpCode::ClassLong);
                    let class = Obj::Class(Class {
                        name,
                        methods: HashMap::new(),
                    });
                    let class = self.heap.alloc(class, &self.ctx);
                    self.ctx.push(Value::object(class));
                }
                OpCode::Inherit => {
                    let methods = match self.ctx.peek(1).as_object().map(|r| self.heap.get(r)) {
                        Some(Obj::Class(superclass)) => superclass.methods.clone(),
                        _ => return Err(type_error("Superclass must be a class.")),
                    };
                    let subclass = self.pop_object();
                    for (name, method) in methods {
                        self.heap.set_method(subclass, name, method);
                    }
                }
                OpCode::Method | OpCode::MethodLong => {
                    let name = self.read_name(op == OpCode::MethodLong);
                    let method = self.pop_object();
                    let class = self.object_at(0);
                    self.heap.set_method(class, name, method);
                }
            }
        }
    }

    // ---- operand helpers -------------------------------------------------

    fn read_slot(&mut self) -> usize {
        let frame = self.ctx.frame();
        frame.slots + usize::from(frame.read_byte())
    }

    fn read_operand_constant(&mut self, long: bool) -> Value {
        let frame = self.ctx.frame();
        if long {
            frame.read_constant_long()
        } else {
            frame.read_constant()
        }
    }

    fn read_name(&mut self, long: bool) -> ObjRef {
        self.read_operand_constant(long)
            .as_object()
            .unwrap_or_else(|| panic!("name operand is not a string constant"))
    }

    fn object_at(&self, distance: usize) -> ObjRef {
        self.ctx
            .peek(distance)
            .as_object()
            .unwrap_or_else(|| panic!("expected an object on the stack"))
    }

    fn pop_object(&mut self) -> ObjRef {
        let r = self.object_at(0);
        self.ctx.pop();
        r
    }

    fn instance_of(&self, value: Value) -> Option<ObjRef> {
        value
            .as_object()
            .filter(|r| matches!(self.heap.get(*r), Obj::Instance(_)))
    }

    fn is_string(&self, value: Value) -> bool {
        value
            .as_object()
            .is_some_and(|r| matches!(self.heap.get(r), Obj::String(_)))
    }

    /// Field value (if any) and class of an instance
    fn lookup_field(&self, instance: ObjRef, name: ObjRef) -> (Option<Value>, ObjRef) {
        match self.heap.get(instance) {
            Obj::Instance(i) => (i.fields.get(&name).copied(), i.class),
            other => panic!("expected instance, found {}", other.type_name()),
        }
    }

    fn find_method(&self, class: ObjRef, name: ObjRef) -> Option<ObjRef> {
        match self.heap.get(class) {
            Obj::Class(c) => c.methods.get(&name).copied(),
            _ => None,
        }
    }

    fn undefined_variable(&self, name: ObjRef) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::UndefinedVariable,
            format!("Undefined variable '{}'.", self.heap.string(name)),
        )
    }

    fn undefined_property(&self, name: ObjRef) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::UndefinedProperty,
            format!("Undefined property '{}'.", self.heap.string(name)),
        )
    }

    // ---- arithmetic -------------------------------------------------------

    fn number_operands(&mut self) -> Result<(f64, f64), RuntimeError> {
        match (self.ctx.peek(1).as_number(), self.ctx.peek(0).as_number()) {
            (Some(a), Some(b)) => {
                self.ctx.pop();
                self.ctx.pop();
                Ok((a, b))
            }
            _ => Err(type_error("Operands must be numbers.")),
        }
    }

    fn add(&mut self) -> Result<(), RuntimeError> {
        let (a, b) = (self.ctx.peek(1), self.ctx.peek(0));
        if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
            self.ctx.pop();
            self.ctx.pop();
            self.ctx.push(Value::number(x + y));
            Ok(())
        } else if self.is_string(a) && self.is_string(b) {
            self.concatenate();
            Ok(())
        } else {
            Err(type_error("Operands must be two numbers or two strings."))
        }
    }

    /// Both operands stay on the stack until the result is interned.
    fn concatenate(&mut self) {
        let (a, b) = (self.object_at(1), self.object_at(0));
        let (left, right) = (self.heap.string(a), self.heap.string(b));
        let mut text = String::with_capacity(left.len() + right.len());
        text.push_str(left);
        text.push_str(right);
        let result = self.heap.intern_owned(text, &self.ctx);
        self.ctx.pop();
        self.ctx.pop();
        self.ctx.push(Value::object(result));
    }

    // ---- calls ------------------------------------------------------------

    fn classify(&self, callee: ObjRef) -> Callee {
        match self.heap.get(callee) {
            Obj::BoundMethod(b) => Callee::Bound {
                receiver: b.receiver,
                method: b.method,
            },
            Obj::Class(c) => Callee::Class {
                initializer: c.methods.get(&self.ctx.init_string).copied(),
            },
            Obj::Closure(_) => Callee::Closure,
            Obj::Native(n) => Callee::Native {
                arity: n.arity,
                function: n.function,
            },
            _ => Callee::NotCallable,
        }
    }

    /// Call `callee`, which sits below `argc` arguments on the stack
    pub(crate) fn call_value(&mut self, callee: Value, argc: u8) -> Result<(), RuntimeError> {
        let not_callable = || {
            RuntimeError::new(
                RuntimeErrorKind::NotCallable,
                "Can only call functions and classes.",
            )
        };
        let Some(target) = callee.as_object() else {
            return Err(not_callable());
        };
        let argc_slots = usize::from(argc);
        match self.classify(target) {
            Callee::Bound { receiver, method } => {
                self.ctx.set_peek(argc_slots, receiver);
                self.call_closure(method, argc)
            }
            Callee::Class { initializer } => {
                let instance = Obj::Instance(Instance {
                    class: target,
                    fields: HashMap::new(),
                });
                let instance = self.heap.alloc(instance, &self.ctx);
                self.ctx.set_peek(argc_slots, Value::object(instance));
                match initializer {
                    Some(init) => self.call_closure(init, argc),
                    None if argc != 0 => Err(arity_error(0, argc)),
                    None => Ok(()),
                }
            }
            Callee::Closure => self.call_closure(target, argc),
            Callee::Native { arity, function } => {
                if argc != arity {
                    return Err(arity_error(arity, argc));
                }
                let start = self.ctx.stack.len() - argc_slots;
                let result = function(&self.ctx.stack[start..])
                    .map_err(|message| RuntimeError::new(RuntimeErrorKind::NativeError, message))?;
                self.ctx.stack.truncate(start - 1);
                self.ctx.push(result);
                Ok(())
            }
            Callee::NotCallable => Err(not_callable()),
        }
    }

    /// Push a frame for `closure` over the top `argc` values
    pub(crate) fn call_closure(&mut self, closure: ObjRef, argc: u8) -> Result<(), RuntimeError> {
        let function = match self.heap.get(closure) {
            Obj::Closure(c) => c.function,
            other => panic!("expected closure, found {}", other.type_name()),
        };
        let (arity, chunk) = match self.heap.get(function) {
            Obj::Function(f) => (f.arity, Rc::clone(&f.chunk)),
            other => panic!("expected function, found {}", other.type_name()),
        };
        if argc != arity {
            return Err(arity_error(arity, argc));
        }

        let slots = self.ctx.stack.len() - usize::from(argc) - 1;
        self.ctx
            .frames
            .try_push(CallFrame::new(closure, chunk, slots))
            .map_err(|_| RuntimeError::new(RuntimeErrorKind::StackOverflow, "Stack overflow."))
    }

    fn invoke(&mut self, name: ObjRef, argc: u8) -> Result<(), RuntimeError> {
        let Some(instance) = self.instance_of(self.ctx.peek(usize::from(argc))) else {
            return Err(type_error("Only instances have methods."));
        };
        let (field, class) = self.lookup_field(instance, name);
        if let Some(value) = field {
            self.ctx.set_peek(usize::from(argc), value);
            return self.call_value(value, argc);
        }
        self.invoke_from_class(class, name, argc)
    }

    fn invoke_from_class(
        &mut self,
        class: ObjRef,
        name: ObjRef,
        argc: u8,
    ) -> Result<(), RuntimeError> {
        match self.find_method(class, name) {
            Some(method) => self.call_closure(method, argc),
            None => Err(self.undefined_property(name)),
        }
    }

    /// Replace the receiver on top of the stack with a bound method
    fn bind_method(&mut self, class: ObjRef, name: ObjRef) -> Result<(), RuntimeError> {
        let Some(method) = self.find_method(class, name) else {
            return Err(self.undefined_property(name));
        };
        let receiver = self.ctx.peek(0);
        let bound = self
            .heap
            .alloc(Obj::BoundMethod(BoundMethod { receiver, method }), &self.ctx);
        self.ctx.pop();
        self.ctx.push(Value::object(bound));
        Ok(())
    }

    fn make_closure(&mut self, long: bool) {
        let function = self
            .read_operand_constant(long)
            .as_object()
            .unwrap_or_else(|| panic!("closure operand is not a function"));
        let upvalue_count = match self.heap.get(function) {
            Obj::Function(f) => f.upvalue_count,
            other => panic!("expected function, found {}", other.type_name()),
        };
        let closure = Obj::Closure(Closure {
            function,
            upvalues: Vec::with_capacity(upvalue_count),
        });
        let closure = self.heap.alloc(closure, &self.ctx);
        self.ctx.push(Value::object(closure));

        for _ in 0..upvalue_count {
            let frame = self.ctx.frame();
            let is_local = frame.read_byte() == 1;
            let index = usize::from(frame.read_byte());
            let slots = frame.slots;
            let upvalue = if is_local {
                self.capture_upvalue(slots + index)
            } else {
                self.frame_upvalue(index)
            };
            if let Obj::Closure(c) = self.heap.get_mut(closure) {
                c.upvalues.push(upvalue);
            }
        }
    }

    fn trace_instruction(&self) {
        let stack: String = self
            .ctx
            .stack
            .iter()
            .map(|value| format!("[ {} ]", self.heap.format_value(*value)))
            .collect();
        trace!("          {stack}");
        if let Some(frame) = self.ctx.frames.last() {
            trace!("{}", disassemble_instruction(&frame.chunk, frame.ip, &self.heap));
        }
    }
}
