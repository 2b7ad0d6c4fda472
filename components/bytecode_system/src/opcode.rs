//! Bytecode opcodes for the Lox VM
//!
//! Every instruction is a one-byte opcode followed by zero or more operand
//! bytes. [`OpCode::operands`] describes the operand layout so the
//! disassembler and tests can walk a chunk without executing it.

/// Bytecode opcodes for the stack-based VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Constants and literals
    /// Push constant at a 1-byte pool index
    Constant,
    /// Push constant at a 3-byte little-endian pool index
    ConstantLong,
    /// Push `nil`
    Nil,
    /// Push `true`
    True,
    /// Push `false`
    False,
    /// Discard the top of stack
    Pop,

    // Variables
    /// Push the local in a frame slot
    GetLocal,
    /// Store top of stack into a frame slot
    SetLocal,
    /// Push a global named by a 1-byte constant
    GetGlobal,
    /// Push a global named by a 3-byte constant
    GetGlobalLong,
    /// Define a global named by a 1-byte constant
    DefineGlobal,
    /// Define a global named by a 3-byte constant
    DefineGlobalLong,
    /// Assign an existing global named by a 1-byte constant
    SetGlobal,
    /// Assign an existing global named by a 3-byte constant
    SetGlobalLong,
    /// Push a captured variable of the running closure
    GetUpvalue,
    /// Assign a captured variable of the running closure
    SetUpvalue,
    /// Read a field or bind a method
    GetProperty,
    /// `GetProperty` with a 3-byte name constant
    GetPropertyLong,
    /// Write a field
    SetProperty,
    /// `SetProperty` with a 3-byte name constant
    SetPropertyLong,
    /// Bind a superclass method to `this`
    GetSuper,
    /// `GetSuper` with a 3-byte name constant
    GetSuperLong,

    // Comparison
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,

    // Arithmetic
    /// `+` on numbers or strings
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// Logical `!`
    Not,
    /// Unary `-`
    Negate,

    /// Pop and print a value
    Print,

    // Control flow
    /// Unconditional forward jump
    Jump,
    /// Forward jump when top of stack is falsey (does not pop)
    JumpIfFalse,
    /// Backward jump
    Loop,

    // Calls and closures
    /// Call the value below the arguments
    Call,
    /// Fused property lookup and call
    Invoke,
    /// `Invoke` with a 3-byte name constant
    InvokeLong,
    /// Fused superclass method lookup and call
    SuperInvoke,
    /// `SuperInvoke` with a 3-byte name constant
    SuperInvokeLong,
    /// Create a closure, followed by capture descriptors
    Closure,
    /// `Closure` with a 3-byte function constant
    ClosureLong,
    /// Close the upvalue for the top stack slot and pop it
    CloseUpvalue,
    /// Return from the current function
    Return,

    // Classes
    /// Create a class
    Class,
    /// `Class` with a 3-byte name constant
    ClassLong,
    /// Copy superclass methods into the subclass
    Inherit,
    /// Add a method to the class below it
    Method,
    /// `Method` with a 3-byte name constant
    MethodLong,
}

/// Operand layout following an opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// No operands
    None,
    /// One raw byte (slot, upvalue index, argument count)
    Byte,
    /// One-byte constant pool index
    Constant,
    /// Three-byte little-endian constant pool index
    ConstantLong,
    /// Two-byte big-endian forward offset
    JumpForward,
    /// Two-byte big-endian backward offset
    JumpBackward,
    /// One-byte constant pool index then argument count
    Invoke,
    /// Three-byte constant pool index then argument count
    InvokeLong,
    /// One-byte function constant then `(is_local, index)` pairs
    Closure,
    /// Three-byte function constant then `(is_local, index)` pairs
    ClosureLong,
}

impl OpCode {
    /// Every opcode, indexed by its byte encoding
    pub const ALL: [OpCode; 52] = [
        OpCode::Constant,
        OpCode::ConstantLong,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::GetGlobal,
        OpCode::GetGlobalLong,
        OpCode::DefineGlobal,
        OpCode::DefineGlobalLong,
        OpCode::SetGlobal,
        OpCode::SetGlobalLong,
        OpCode::GetUpvalue,
        OpCode::SetUpvalue,
        OpCode::GetProperty,
        OpCode::GetPropertyLong,
        OpCode::SetProperty,
        OpCode::SetPropertyLong,
        OpCode::GetSuper,
        OpCode::GetSuperLong,
        OpCode::Equal,
        OpCode::NotEqual,
        OpCode::Greater,
        OpCode::GreaterEqual,
        OpCode::Less,
        OpCode::LessEqual,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Print,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::Loop,
        OpCode::Call,
        OpCode::Invoke,
        OpCode::InvokeLong,
        OpCode::SuperInvoke,
        OpCode::SuperInvokeLong,
        OpCode::Closure,
        OpCode::ClosureLong,
        OpCode::CloseUpvalue,
        OpCode::Return,
        OpCode::Class,
        OpCode::ClassLong,
        OpCode::Inherit,
        OpCode::Method,
        OpCode::MethodLong,
    ];

    /// Decode an opcode byte
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Listing name, e.g. `OP_CONSTANT`
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::ConstantLong => "OP_CONSTANT_LONG",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::GetGlobalLong => "OP_GET_GLOBAL_LONG",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::DefineGlobalLong => "OP_DEFINE_GLOBAL_LONG",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::SetGlobalLong => "OP_SET_GLOBAL_LONG",
            OpCode::GetUpvalue => "OP_GET_UPVALUE",
            OpCode::SetUpvalue => "OP_SET_UPVALUE",
            OpCode::GetProperty => "OP_GET_PROPERTY",
            OpCode::GetPropertyLong => "OP_GET_PROPERTY_LONG",
            OpCode::SetProperty => "OP_SET_PROPERTY",
            OpCode::SetPropertyLong => "OP_SET_PROPERTY_LONG",
            OpCode::GetSuper => "OP_GET_SUPER",
            OpCode::GetSuperLong => "OP_GET_SUPER_LONG",
            OpCode::Equal => "OP_EQUAL",
            OpCode::NotEqual => "OP_NOT_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::GreaterEqual => "OP_GREATER_EQUAL",
            OpCode::Less => "OP_LESS",
            OpCode::LessEqual => "OP_LESS_EQUAL",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Print => "OP_PRINT",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Loop => "OP_LOOP",
            OpCode::Call => "OP_CALL",
            OpCode::Invoke => "OP_INVOKE",
            OpCode::InvokeLong => "OP_INVOKE_LONG",
            OpCode::SuperInvoke => "OP_SUPER_INVOKE",
            OpCode::SuperInvokeLong => "OP_SUPER_INVOKE_LONG",
            OpCode::Closure => "OP_CLOSURE",
            OpCode::ClosureLong => "OP_CLOSURE_LONG",
            OpCode::CloseUpvalue => "OP_CLOSE_UPVALUE",
            OpCode::Return => "OP_RETURN",
            OpCode::Class => "OP_CLASS",
            OpCode::ClassLong => "OP_CLASS_LONG",
            OpCode::Inherit => "OP_INHERIT",
            OpCode::Method => "OP_METHOD",
            OpCode::MethodLong => "OP_METHOD_LONG",
        }
    }

    /// Operand layout of this opcode
    pub fn operands(self) -> Operands {
        match self {
            OpCode::Constant
            | OpCode::GetGlobal
            | OpCode::DefineGlobal
            | OpCode::SetGlobal
            | OpCode::GetProperty
            | OpCode::SetProperty
            | OpCode::GetSuper
            | OpCode::Class
            | OpCode::Method => Operands::Constant,
            OpCode::ConstantLong
            | OpCode::GetGlobalLong
            | OpCode::DefineGlobalLong
            | OpCode::SetGlobalLong
            | OpCode::GetPropertyLong
            | OpCode::SetPropertyLong
            | OpCode::GetSuperLong
            | OpCode::ClassLong
            | OpCode::MethodLong => Operands::ConstantLong,
            OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetUpvalue
            | OpCode::SetUpvalue
            | OpCode::Call => Operands::Byte,
            OpCode::Jump | OpCode::JumpIfFalse => Operands::JumpForward,
            OpCode::Loop => Operands::JumpBackward,
            OpCode::Invoke | OpCode::SuperInvoke => Operands::Invoke,
            OpCode::InvokeLong | OpCode::SuperInvokeLong => Operands::InvokeLong,
            OpCode::Closure => Operands::Closure,
            OpCode::ClosureLong => Operands::ClosureLong,
            OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::Pop
            | OpCode::Equal
            | OpCode::NotEqual
            | OpCode::Greater
            | OpCode::GreaterEqual
            | OpCode::Less
            | OpCode::LessEqual
            | OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Not
            | OpCode::Negate
            | OpCode::Print
            | OpCode::CloseUpvalue
            | OpCode::Return
            | OpCode::Inherit => Operands::None,
        }
    }

    /// The three-byte-operand variant of a constant-indexed opcode
    pub fn long_form(self) -> Option<OpCode> {
        let long = match self {
            OpCode::Constant => OpCode::ConstantLong,
            OpCode::GetGlobal => OpCode::GetGlobalLong,
            OpCode::DefineGlobal => OpCode::DefineGlobalLong,
            OpCode::SetGlobal => OpCode::SetGlobalLong,
            OpCode::GetProperty => OpCode::GetPropertyLong,
            OpCode::SetProperty => OpCode::SetPropertyLong,
            OpCode::GetSuper => OpCode::GetSuperLong,
            OpCode::Invoke => OpCode::InvokeLong,
            OpCode::SuperInvoke => OpCode::SuperInvokeLong,
            OpCode::Closure => OpCode::ClosureLong,
            OpCode::Class => OpCode::ClassLong,
            OpCode::Method => OpCode::MethodLong,
            _ => return None,
        };
        Some(long)
    }

    /// Check if this opcode transfers control
    pub fn is_jump(self) -> bool {
        matches!(self, OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::from_byte(byte).ok_or(byte)
    }
}
