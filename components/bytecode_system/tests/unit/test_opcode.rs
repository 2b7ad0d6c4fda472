//! Tests for OpCode encoding

use bytecode_system::{OpCode, Operands};

#[test]
fn test_opcode_bytes_round_trip() {
    for op in OpCode::ALL {
        assert_eq!(OpCode::from_byte(u8::from(op)), Some(op));
    }
}

#[test]
fn test_opcode_count() {
    assert_eq!(OpCode::ALL.len(), 52);
    assert_eq!(OpCode::from_byte(52), None);
}

#[test]
fn test_operand_layouts() {
    assert_eq!(OpCode::Constant.operands(), Operands::Constant);
    assert_eq!(OpCode::GetLocal.operands(), Operands::Byte);
    assert_eq!(OpCode::Call.operands(), Operands::Byte);
    assert_eq!(OpCode::JumpIfFalse.operands(), Operands::JumpForward);
    assert_eq!(OpCode::Loop.operands(), Operands::JumpBackward);
    assert_eq!(OpCode::Invoke.operands(), Operands::Invoke);
    assert_eq!(OpCode::SuperInvoke.operands(), Operands::Invoke);
    assert_eq!(OpCode::Closure.operands(), Operands::Closure);
    assert_eq!(OpCode::ClosureLong.operands(), Operands::ClosureLong);
    assert_eq!(OpCode::InvokeLong.operands(), Operands::InvokeLong);
    assert_eq!(OpCode::GetPropertyLong.operands(), Operands::ConstantLong);
    assert_eq!(OpCode::Return.operands(), Operands::None);
}

#[test]
fn test_mnemonics() {
    assert_eq!(OpCode::NotEqual.mnemonic(), "OP_NOT_EQUAL");
    assert_eq!(OpCode::CloseUpvalue.mnemonic(), "OP_CLOSE_UPVALUE");
    assert_eq!(OpCode::SuperInvoke.mnemonic(), "OP_SUPER_INVOKE");
    assert_eq!(OpCode::SuperInvokeLong.mnemonic(), "OP_SUPER_INVOKE_LONG");
}

#[test]
fn test_long_form_lookup() {
    assert_eq!(OpCode::Method.long_form(), Some(OpCode::MethodLong));
    assert_eq!(OpCode::GetSuper.long_form(), Some(OpCode::GetSuperLong));
    assert_eq!(OpCode::GetLocal.long_form(), None);
}
