//! Single-pass compiler from Lox source to bytecode
//!
//! Tokens are pulled from the [`Scanner`] and bytecode is emitted as soon as
//! each construct is recognised; there is no syntax tree. Expressions are
//! parsed by precedence climbing over the table in [`crate::rules`].

use crate::error::diagnostic_at;
use crate::rules::{rule, Precedence};
use crate::scanner::Scanner;
use crate::scope::{FunctionKind, FunctionState, Local, LoopScope, UpvalueRef, MAX_LOCALS};
use crate::token::{Token, TokenKind};
use bytecode_system::{disassemble_chunk, Chunk, OpCode};
use core_types::{CompileError, Diagnostic, ObjRef, Value};
use log::debug;
use memory_manager::{Function, Heap, Marker, Obj, RootSource};
use std::rc::Rc;

/// Compiler switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Log the disassembly of every finished function at `debug` level
    pub print_code: bool,
}

/// Compile `source` into the top-level script function.
///
/// # Arguments
///
/// * `source` - Lox program text
/// * `heap` - Heap receiving strings and functions
/// * `roots` - Objects the caller needs kept alive if a collection runs
///
/// # Returns
///
/// Handle to the script [`Function`], or every diagnostic that was reported.
///
/// # Example
///
/// ```
/// use compiler::compile;
/// use memory_manager::{Heap, NoRoots, Obj};
///
/// let mut heap = Heap::new();
/// let script = compile("print 1 + 2;", &mut heap, &NoRoots).unwrap();
/// assert!(matches!(heap.get(script), Obj::Function(f) if f.name.is_none()));
/// ```
pub fn compile(
    source: &str,
    heap: &mut Heap,
    roots: &dyn RootSource,
) -> Result<ObjRef, CompileError> {
    compile_with(source, heap, roots, CompileOptions::default())
}

/// [`compile`] with explicit options
pub fn compile_with(
    source: &str,
    heap: &mut Heap,
    roots: &dyn RootSource,
    options: CompileOptions,
) -> Result<ObjRef, CompileError> {
    let mut compiler = Compiler::new(source, heap, roots, options);
    compiler.advance();
    while !compiler.match_token(TokenKind::Eof) {
        compiler.declaration();
    }
    let (function, _) = compiler.end_function();
    if compiler.had_error {
        Err(CompileError {
            diagnostics: compiler.diagnostics,
        })
    } else {
        Ok(function)
    }
}

/// Caller roots plus the constants of every function still being compiled
struct CompilerRoots<'a, 'src> {
    outer: &'a dyn RootSource,
    function: &'a FunctionState<'src>,
    enclosing: &'a [FunctionState<'src>],
}

impl RootSource for CompilerRoots<'_, '_> {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        self.outer.mark_roots(marker);
        for state in self.enclosing.iter().chain(std::iter::once(self.function)) {
            marker.mark_values(state.chunk.constants());
            if let Some(name) = state.name {
                marker.mark_object(name);
            }
        }
    }
}

struct ClassState {
    has_superclass: bool,
}

enum Access {
    Local(u8),
    Upvalue(u8),
    Global(usize),
}

/// Compiler state for one compilation
pub struct Compiler<'src, 'ctx> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    diagnostics: Vec<Diagnostic>,
    function: FunctionState<'src>,
    enclosing: Vec<FunctionState<'src>>,
    classes: Vec<ClassState>,
    heap: &'ctx mut Heap,
    roots: &'ctx dyn RootSource,
    options: CompileOptions,
}

impl<'src, 'ctx> Compiler<'src, 'ctx> {
    fn new(
        source: &'src str,
        heap: &'ctx mut Heap,
        roots: &'ctx dyn RootSource,
        options: CompileOptions,
    ) -> Self {
        let start = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 1,
        };
        Compiler {
            scanner: Scanner::new(source),
            current: start,
            previous: start,
            had_error: false,
            panic_mode: false,
            diagnostics: Vec::new(),
            function: FunctionState::new(FunctionKind::Script, None),
            enclosing: Vec::new(),
            classes: Vec::new(),
            heap,
            roots,
            options,
        }
    }

    // ---- token stream -------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let token = self.current;
            self.error_at(token, token.lexeme);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    // ---- error reporting ------------------------------------------------

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        self.diagnostics.push(diagnostic_at(&token, message));
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon || self.current.kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }

    // ---- heap access ----------------------------------------------------

    fn intern(&mut self, text: &str) -> ObjRef {
        let roots = CompilerRoots {
            outer: self.roots,
            function: &self.function,
            enclosing: &self.enclosing,
        };
        self.heap.intern(text, &roots)
    }

    // ---- emission ---------------------------------------------------------

    fn chunk(&mut self) -> &mut Chunk {
        &mut self.function.chunk
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk().write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.into());
    }

    fn emit_op_byte(&mut self, op: OpCode, operand: u8) {
        self.emit_op(op);
        self.emit_byte(operand);
    }

    /// Emit `op` or its long form, whichever fits `index`
    fn emit_indexed(&mut self, op: OpCode, index: usize) {
        let line = self.previous.line;
        let long = op
            .long_form()
            .unwrap_or_else(|| panic!("{op:?} has no constant operand"));
        if !self.chunk().write_indexed(op, long, index, line) {
            self.error("Too many constants in one chunk.");
        }
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk().len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.chunk().len() - offset - 2;
        let Ok(jump) = u16::try_from(jump) else {
            self.error("Too much code to jump over.");
            return;
        };
        let [high, low] = jump.to_be_bytes();
        self.chunk().patch(offset, high);
        self.chunk().patch(offset + 1, low);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let offset = self.chunk().len() - loop_start + 2;
        let [high, low] = match u16::try_from(offset) {
            Ok(offset) => offset.to_be_bytes(),
            Err(_) => {
                self.error("Loop body too large.");
                [0, 0]
            }
        };
        self.emit_byte(high);
        self.emit_byte(low);
    }

    fn emit_return(&mut self) {
        if self.function.kind == FunctionKind::Initializer {
            self.emit_op_byte(OpCode::GetLocal, 0);
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.emit_op(OpCode::Return);
    }

    fn emit_constant(&mut self, value: Value) {
        let line = self.previous.line;
        if self.chunk().write_constant(value, line).is_none() {
            self.error("Too many constants in one chunk.");
        }
    }

    fn identifier_constant(&mut self, name: &str) -> usize {
        let string = self.intern(name);
        if let Some(&index) = self.function.identifiers.get(&string) {
            return index;
        }
        let index = self.chunk().add_constant(Value::object(string));
        self.function.identifiers.insert(string, index);
        index
    }

    // ---- functions ------------------------------------------------------

    fn begin_function(&mut self, kind: FunctionKind, name: &str) {
        let name = self.intern(name);
        let state = FunctionState::new(kind, Some(name));
        let outer = std::mem::replace(&mut self.function, state);
        self.enclosing.push(outer);
    }

    fn end_function(&mut self) -> (ObjRef, Vec<UpvalueRef>) {
        self.emit_return();
        let outer = self
            .enclosing
            .pop()
            .unwrap_or_else(|| FunctionState::new(FunctionKind::Script, None));
        let state = std::mem::replace(&mut self.function, outer);

        if self.options.print_code && !self.had_error {
            let name = state
                .name
                .map_or("<script>".to_string(), |n| self.heap.string(n).to_string());
            debug!("{}", disassemble_chunk(&state.chunk, &name, &*self.heap));
        }

        let function = Obj::Function(Function {
            arity: state.arity,
            upvalue_count: state.upvalues.len(),
            chunk: Rc::new(state.chunk),
            name: state.name,
        });
        let roots = CompilerRoots {
            outer: self.roots,
            function: &self.function,
            enclosing: &self.enclosing,
        };
        let function = self.heap.alloc(function, &roots);
        (function, state.upvalues)
    }

    fn function(&mut self, kind: FunctionKind, name: &str) {
        self.begin_function(kind, name);
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.function.arity == u8::MAX {
                    self.error_at_current("Can't have more than 255 parameters.");
                } else {
                    self.function.arity += 1;
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        let (function, upvalues) = self.end_function();
        let constant = self.chunk().add_constant(Value::object(function));
        self.emit_indexed(OpCode::Closure, constant);
        for upvalue in upvalues {
            self.emit_byte(u8::from(upvalue.is_local));
            self.emit_byte(upvalue.index);
        }
    }

    // ---- scopes and variables ------------------------------------------

    fn begin_scope(&mut self) {
        self.function.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.function.scope_depth -= 1;
        let depth = self.function.scope_depth;
        while let Some(local) = self.function.locals.last() {
            if local.depth.is_some_and(|d| d <= depth) {
                break;
            }
            let op = if local.is_captured {
                OpCode::CloseUpvalue
            } else {
                OpCode::Pop
            };
            self.emit_op(op);
            self.function.locals.pop();
        }
    }

    /// Emit pops for locals deeper than `depth` without forgetting them
    fn discard_locals(&mut self, depth: usize) {
        let ops: Vec<OpCode> = self
            .function
            .locals_above(depth)
            .map(|local| {
                if local.is_captured {
                    OpCode::CloseUpvalue
                } else {
                    OpCode::Pop
                }
            })
            .collect();
        for op in ops {
            self.emit_op(op);
        }
    }

    fn add_local(&mut self, name: &'src str) {
        if self.function.locals.len() == MAX_LOCALS {
            self.error("Too many local variables in function.");
            return;
        }
        self.function.locals.push(Local {
            name,
            depth: None,
            is_captured: false,
        });
    }

    fn declare_variable(&mut self) {
        if self.function.scope_depth == 0 {
            return;
        }
        let name = self.previous.lexeme;
        if self.function.declared_in_current_scope(name) {
            self.error("Already a variable with this name in this scope.");
        }
        self.add_local(name);
    }

    fn parse_variable(&mut self, message: &str) -> usize {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if self.function.scope_depth > 0 {
            return 0;
        }
        let name = self.previous.lexeme;
        self.identifier_constant(name)
    }

    fn mark_initialized(&mut self) {
        if self.function.scope_depth == 0 {
            return;
        }
        let depth = self.function.scope_depth;
        if let Some(local) = self.function.locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    fn define_variable(&mut self, global: usize) {
        if self.function.scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_indexed(OpCode::DefineGlobal, global);
    }

    fn state_at(&mut self, level: usize) -> &mut FunctionState<'src> {
        if level == self.enclosing.len() {
            &mut self.function
        } else {
            &mut self.enclosing[level]
        }
    }

    fn resolve_local(&mut self, level: usize, name: &str) -> Option<u8> {
        let (slot, initialized) = self
            .state_at(level)
            .resolve_local(name)
            .map(|(slot, local)| (slot, local.depth.is_some()))?;
        if !initialized {
            self.error("Can't read local variable in its own initializer.");
        }
        Some(slot)
    }

    fn resolve_upvalue(&mut self, level: usize, name: &str) -> Option<u8> {
        if level == 0 {
            return None;
        }
        let enclosing = level - 1;
        if let Some(slot) = self.resolve_local(enclosing, name) {
            self.state_at(enclosing).locals[usize::from(slot)].is_captured = true;
            return Some(self.add_upvalue(level, slot, true));
        }
        let index = self.resolve_upvalue(enclosing, name)?;
        Some(self.add_upvalue(level, index, false))
    }

    fn add_upvalue(&mut self, level: usize, index: u8, is_local: bool) -> u8 {
        match self.state_at(level).add_upvalue(index, is_local) {
            Ok(slot) => slot,
            Err(message) => {
                self.error(message);
                0
            }
        }
    }

    fn resolve(&mut self, name: &str) -> Access {
        let level = self.enclosing.len();
        if let Some(slot) = self.resolve_local(level, name) {
            Access::Local(slot)
        } else if let Some(index) = self.resolve_upvalue(level, name) {
            Access::Upvalue(index)
        } else {
            Access::Global(self.identifier_constant(name))
        }
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let access = self.resolve(name.lexeme);
        let assign = can_assign && self.match_token(TokenKind::Equal);
        if assign {
            self.parse_precedence(Precedence::Assignment);
        }
        match (access, assign) {
            (Access::Local(slot), false) => self.emit_op_byte(OpCode::GetLocal, slot),
            (Access::Local(slot), true) => self.emit_op_byte(OpCode::SetLocal, slot),
            (Access::Upvalue(index), false) => self.emit_op_byte(OpCode::GetUpvalue, index),
            (Access::Upvalue(index), true) => self.emit_op_byte(OpCode::SetUpvalue, index),
            (Access::Global(index), false) => {
                self.emit_indexed(OpCode::GetGlobal, index)
            }
            (Access::Global(index), true) => {
                self.emit_indexed(OpCode::SetGlobal, index)
            }
        }
    }

    // ---- expressions ----------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Comma);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = rule(self.previous.kind).infix {
                infix(self, can_assign);
            }
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    pub(crate) fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    pub(crate) fn number(&mut self, _can_assign: bool) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::number(value)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    pub(crate) fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let text = &lexeme[1..lexeme.len() - 1];
        let string = self.intern(text);
        self.emit_constant(Value::object(string));
    }

    pub(crate) fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => unreachable!("literal rule on {:?}", self.previous.kind),
        }
    }

    pub(crate) fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    pub(crate) fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Bang => self.emit_op(OpCode::Not),
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            _ => unreachable!("unary rule on {operator:?}"),
        }
    }

    pub(crate) fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(rule(operator).precedence.next());
        let op = match operator {
            TokenKind::BangEqual => OpCode::NotEqual,
            TokenKind::EqualEqual => OpCode::Equal,
            TokenKind::Greater => OpCode::Greater,
            TokenKind::GreaterEqual => OpCode::GreaterEqual,
            TokenKind::Less => OpCode::Less,
            TokenKind::LessEqual => OpCode::LessEqual,
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            _ => unreachable!("binary rule on {operator:?}"),
        };
        self.emit_op(op);
    }

    pub(crate) fn and(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    pub(crate) fn or(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    pub(crate) fn ternary(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.expression();
        self.consume(TokenKind::Colon, "Expect ':' in ternary expression.");
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Ternary);
        self.patch_jump(end_jump);
    }

    pub(crate) fn comma(&mut self, _can_assign: bool) {
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Comma.next());
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: u8 = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.parse_precedence(Precedence::Assignment);
                if count == u8::MAX {
                    self.error("Can't have more than 255 arguments.");
                } else {
                    count += 1;
                }
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        count
    }

    pub(crate) fn call(&mut self, _can_assign: bool) {
        let count = self.argument_list();
        self.emit_op_byte(OpCode::Call, count);
    }

    pub(crate) fn dot(&mut self, can_assign: bool) {
        self.consume(TokenKind::Identifier, "Expect property name after '.'.");
        let name = self.identifier_constant(self.previous.lexeme);

        if can_assign && self.match_token(TokenKind::Equal) {
            self.parse_precedence(Precedence::Assignment);
            self.emit_indexed(OpCode::SetProperty, name);
        } else if self.match_token(TokenKind::LeftParen) {
            let count = self.argument_list();
            self.emit_indexed(OpCode::Invoke, name);
            self.emit_byte(count);
        } else {
            self.emit_indexed(OpCode::GetProperty, name);
        }
    }

    pub(crate) fn this(&mut self, _can_assign: bool) {
        if self.classes.is_empty() {
            self.error("Can't use 'this' outside of a class.");
            return;
        }
        self.variable(false);
    }

    pub(crate) fn super_(&mut self, _can_assign: bool) {
        match self.classes.last() {
            None => self.error("Can't use 'super' outside of a class."),
            Some(class) if !class.has_superclass => {
                self.error("Can't use 'super' in a class with no superclass.")
            }
            Some(_) => {}
        }

        self.consume(TokenKind::Dot, "Expect '.' after 'super'.");
        self.consume(TokenKind::Identifier, "Expect superclass method name.");
        let name = self.identifier_constant(self.previous.lexeme);

        let line = self.previous.line;
        self.named_variable(Token::synthetic("this", line), false);
        if self.match_token(TokenKind::LeftParen) {
            let count = self.argument_list();
            self.named_variable(Token::synthetic("super", line), false);
            self.emit_indexed(OpCode::SuperInvoke, name);
            self.emit_byte(count);
        } else {
            self.named_variable(Token::synthetic("super", line), false);
            self.emit_indexed(OpCode::GetSuper, name);
        }
    }

    pub(crate) fn lambda(&mut self, _can_assign: bool) {
        self.function(FunctionKind::Function, "lambda");
    }

    // ---- declarations ---------------------------------------------------

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Class) {
            self.class_declaration();
        } else if self.match_token(TokenKind::Fun) {
            self.fun_declaration();
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn class_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "Expect class name.");
        let class_name = self.previous;
        let name_constant = self.identifier_constant(class_name.lexeme);
        self.declare_variable();

        self.emit_indexed(OpCode::Class, name_constant);
        self.define_variable(name_constant);

        self.classes.push(ClassState {
            has_superclass: false,
        });

        if self.match_token(TokenKind::Less) {
            self.consume(TokenKind::Identifier, "Expect superclass name.");
            self.variable(false);
            if class_name.lexeme == self.previous.lexeme {
                self.error("A class can't inherit from itself.");
            }

            self.begin_scope();
            self.add_local("super");
            self.define_variable(0);

            self.named_variable(class_name, false);
            self.emit_op(OpCode::Inherit);
            if let Some(class) = self.classes.last_mut() {
                class.has_superclass = true;
            }
        }

        self.named_variable(class_name, false);
        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.");
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.method();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.");
        self.emit_op(OpCode::Pop);

        if self.classes.pop().is_some_and(|class| class.has_superclass) {
            self.end_scope();
        }
    }

    fn method(&mut self) {
        self.consume(TokenKind::Identifier, "Expect method name.");
        let name = self.previous.lexeme;
        let constant = self.identifier_constant(name);
        let kind = if name == "init" {
            FunctionKind::Initializer
        } else {
            FunctionKind::Method
        };
        self.function(kind, name);
        self.emit_indexed(OpCode::Method, constant);
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        self.mark_initialized();
        let name = self.previous.lexeme;
        self.function(FunctionKind::Function, name);
        self.define_variable(global);
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");

        if self.match_token(TokenKind::Equal) {
            self.parse_precedence(Precedence::Assignment);
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );

        self.define_variable(global);
    }

    // ---- statements -----------------------------------------------------

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.match_token(TokenKind::Break) {
            self.break_statement();
        } else if self.match_token(TokenKind::Continue) {
            self.continue_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn return_statement(&mut self) {
        if self.function.kind == FunctionKind::Script {
            self.error("Can't return from top-level code.");
        }

        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            if self.function.kind == FunctionKind::Initializer {
                self.error("Can't return a value from an initializer.");
            }
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
            self.emit_op(OpCode::Return);
        }
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn begin_loop(&mut self, continue_target: usize) {
        let scope_depth = self.function.scope_depth;
        self.function.loops.push(LoopScope {
            continue_target,
            scope_depth,
            break_jumps: Vec::new(),
        });
    }

    fn end_loop(&mut self) {
        if let Some(finished) = self.function.loops.pop() {
            for jump in finished.break_jumps {
                self.patch_jump(jump);
            }
        }
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk().len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.begin_loop(loop_start);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
        self.end_loop();
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");
        if self.match_token(TokenKind::Semicolon) {
            // No initializer.
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk().len();
        let mut exit_jump = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.match_token(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.chunk().len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.begin_loop(loop_start);
        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }
        self.end_loop();
        self.end_scope();
    }

    fn break_statement(&mut self) {
        let Some(depth) = self.function.loops.last().map(|l| l.scope_depth) else {
            self.error("Can't use 'break' outside of a loop.");
            self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.");
            return;
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.");
        self.discard_locals(depth);
        let jump = self.emit_jump(OpCode::Jump);
        if let Some(current) = self.function.loops.last_mut() {
            current.break_jumps.push(jump);
        }
    }

    fn continue_statement(&mut self) {
        let Some((depth, target)) = self
            .function
            .loops
            .last()
            .map(|l| (l.scope_depth, l.continue_target))
        else {
            self.error("Can't use 'continue' outside of a loop.");
            self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.");
            return;
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.");
        self.discard_locals(depth);
        self.emit_loop(target);
    }
}
